// src/bidding/exchange_client.rs

use std::time::Instant;

use futures::future::join_all;
use reqwest::Client;
use tokio::time::{timeout, Duration};
use tracing::debug;

use crate::model::adapters::{RequestData, ResponseData};

/// 没有 tmax 时的默认超时（毫秒）
pub const DEFAULT_TIMEOUT_MS: u64 = 250;

/// 单次出站调用的结果
#[derive(Debug)]
pub struct ExchangeCall {
    pub request: RequestData,
    pub outcome: ExchangeOutcome,
    pub elapsed_ms: u128,
}

#[derive(Debug)]
pub enum ExchangeOutcome {
    Response(ResponseData),
    Timeout,
    Failed(String),
}

impl ExchangeOutcome {
    /// 写入竞价日志的状态描述
    pub fn status(&self) -> &'static str {
        match self {
            ExchangeOutcome::Response(_) => "success",
            ExchangeOutcome::Timeout => "timeout",
            ExchangeOutcome::Failed(_) => "invalid_response",
        }
    }
}

/// 把适配器产出的 RequestData 真正发出去
#[derive(Clone)]
pub struct ExchangeClient {
    client: Client,
}

impl ExchangeClient {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// 并发发送所有请求，每个请求各自受 tmax 约束
    pub async fn execute_all(&self, requests: Vec<RequestData>, tmax: Option<u64>) -> Vec<ExchangeCall> {
        let timeout_duration = Duration::from_millis(tmax.unwrap_or(DEFAULT_TIMEOUT_MS));
        let tasks = requests
            .into_iter()
            .map(|request| self.execute(request, timeout_duration));
        join_all(tasks).await
    }

    async fn execute(&self, request: RequestData, timeout_duration: Duration) -> ExchangeCall {
        let start = Instant::now();
        let send = self
            .client
            .request(request.method.clone(), &request.uri)
            .headers(request.headers.clone())
            .body(request.body.clone())
            .send();

        let outcome = match timeout(timeout_duration, send).await {
            Ok(Ok(resp)) => {
                let status_code = resp.status().as_u16();
                let headers = resp.headers().clone();
                match resp.bytes().await {
                    Ok(body) => ExchangeOutcome::Response(ResponseData {
                        status_code,
                        body: body.to_vec(),
                        headers,
                    }),
                    Err(e) => ExchangeOutcome::Failed(e.to_string()),
                }
            }
            Ok(Err(e)) => ExchangeOutcome::Failed(e.to_string()),
            Err(_) => ExchangeOutcome::Timeout,
        };

        let elapsed_ms = start.elapsed().as_millis();
        debug!(uri = %request.uri, status = outcome.status(), elapsed_ms = elapsed_ms as u64, "exchange call finished");

        ExchangeCall {
            request,
            outcome,
            elapsed_ms,
        }
    }
}
