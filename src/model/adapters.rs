// src/model/adapters.rs

use std::collections::HashMap;
use std::fmt;

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::Method;
use serde::{Deserialize, Serialize};

use crate::errors::AdapterError;
use crate::openrtb::request::BidRequest;
use crate::openrtb::response::Bid;

/// 发往交易所的一次 HTTP 请求描述，由框架负责真正发送
#[derive(Debug, Clone)]
pub struct RequestData {
    pub method: Method,
    pub uri: String,
    pub body: Vec<u8>,
    pub headers: HeaderMap,
}

/// 交易所的 HTTP 响应
#[derive(Debug, Clone, Default)]
pub struct ResponseData {
    pub status_code: u16,
    pub body: Vec<u8>,
    pub headers: HeaderMap,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BidType {
    Banner,
    Video,
    Audio,
    Native,
}

impl fmt::Display for BidType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BidType::Banner => "banner",
            BidType::Video => "video",
            BidType::Audio => "audio",
            BidType::Native => "native",
        };
        f.write_str(name)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TypedBid {
    pub bid: Bid,
    #[serde(rename = "type")]
    pub bid_type: BidType,
}

/// 归一化后的出价结果
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct BidderResponse {
    pub currency: String,
    pub bids: Vec<TypedBid>,
}

impl BidderResponse {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            currency: String::new(),
            bids: Vec::with_capacity(capacity),
        }
    }
}

/// 框架随请求附带的上下文，目前只有汇率换算
#[derive(Debug, Clone, Default)]
pub struct ExtraRequestInfo {
    /// from -> (to -> rate)
    pub currency_rates: HashMap<String, HashMap<String, f64>>,
}

impl ExtraRequestInfo {
    pub fn convert_currency(&self, value: f64, from: &str, to: &str) -> Result<f64, AdapterError> {
        if from.eq_ignore_ascii_case(to) {
            return Ok(value);
        }
        let direct = self
            .currency_rates
            .get(from)
            .and_then(|rates| rates.get(to))
            .copied();
        // 只有反向汇率时取倒数
        let inverse = || {
            self.currency_rates
                .get(to)
                .and_then(|rates| rates.get(from))
                .filter(|rate| **rate != 0.0)
                .map(|rate| 1.0 / rate)
        };
        direct
            .or_else(inverse)
            .map(|rate| value * rate)
            .ok_or_else(|| AdapterError::BadInput(format!("Currency conversion rate not found: '{}' => '{}'", from, to)))
    }
}

/// 框架与适配器之间的契约：构造出站请求、解析入站响应
#[async_trait]
pub trait Bidder: Send + Sync {
    async fn make_requests(
        &self,
        request: &BidRequest,
        request_info: &ExtraRequestInfo,
    ) -> (Vec<RequestData>, Vec<AdapterError>);

    fn make_bids(
        &self,
        internal_request: &BidRequest,
        external_request: &RequestData,
        response: &ResponseData,
    ) -> (Option<BidderResponse>, Vec<AdapterError>);
}
