use std::time::Duration;

use reqwest::Client;
use tokio::time::timeout;
use tracing::debug;

use crate::errors::TargetingFailure;
use crate::targeting::segments::TargetingResponse;

/// 定向服务客户端：一次 GET，一次 JSON 解码，不重试
#[derive(Clone, Debug)]
pub struct TargetingClient {
    client: Client,
    deadline: Option<Duration>,
}

impl TargetingClient {
    pub fn new(client: Client, deadline: Option<Duration>) -> Self {
        Self { client, deadline }
    }

    /// 与框架默认的连接池配置保持一致：每个 host 最多 2 个空闲连接，50ms 空闲回收
    pub fn build_http_client() -> Result<Client, reqwest::Error> {
        reqwest::ClientBuilder::new()
            .pool_max_idle_per_host(2)
            .pool_idle_timeout(Some(Duration::from_millis(50)))
            .build()
    }

    pub async fn fetch(&self, url: &str) -> Result<TargetingResponse, TargetingFailure> {
        let request = self
            .client
            .get(url)
            .build()
            .map_err(|e| TargetingFailure::RequestInstantiation(e.to_string()))?;

        let send = self.client.execute(request);
        let response = match self.deadline {
            Some(deadline) => timeout(deadline, send)
                .await
                .map_err(|_| TargetingFailure::RequestExecution(format!("timed out after {:?}", deadline)))?,
            None => send.await,
        }
        .map_err(|e| TargetingFailure::RequestExecution(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            debug!(status = status.as_u16(), "targeting service returned failure status");
            return Err(TargetingFailure::Network { status: status.as_u16() });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| TargetingFailure::Decoding(e.to_string()))?;

        serde_json::from_slice::<TargetingResponse>(&body).map_err(|e| TargetingFailure::Decoding(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(deadline: Option<Duration>) -> TargetingClient {
        TargetingClient::new(Client::new(), deadline)
    }

    #[tokio::test]
    async fn decodes_targeting_response() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/property/site1/content_segments"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"uuid": "test_uuid", "data": {"media_id": "test_id", "base_segments": ["1", "2"], "targeting_profiles": ["5"]}}"#,
            ))
            .mount(&mock_server)
            .await;

        let url = format!("{}/property/site1/content_segments", mock_server.uri());
        let response = client(None).fetch(&url).await.unwrap();
        assert_eq!(response.uuid, "test_uuid");
        assert_eq!(response.data.media_id, "test_id");
        assert_eq!(response.data.all_jwpsegs(), vec!["1", "2", "5"]);
    }

    #[tokio::test]
    async fn failure_status_is_a_network_error() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(433))
            .mount(&mock_server)
            .await;

        let err = client(None).fetch(&mock_server.uri()).await.unwrap_err();
        assert_eq!(err, TargetingFailure::Network { status: 433 });
        assert_eq!(err.code(), 304433);
    }

    #[tokio::test]
    async fn truncated_body_is_a_decoding_error() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"uuid": "test_uuid", "data": {"base_segments": ["1", "2", "#))
            .mount(&mock_server)
            .await;

        let err = client(None).fetch(&mock_server.uri()).await.unwrap_err();
        assert!(matches!(err, TargetingFailure::Decoding(_)));
    }

    #[tokio::test]
    async fn deadline_turns_slow_responses_into_execution_errors() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)).set_body_string("{}"))
            .mount(&mock_server)
            .await;

        let err = client(Some(Duration::from_millis(20))).fetch(&mock_server.uri()).await.unwrap_err();
        assert!(matches!(err, TargetingFailure::RequestExecution(_)));
    }

    #[tokio::test]
    async fn invalid_url_fails_to_instantiate() {
        let err = client(None).fetch("not a url").await.unwrap_err();
        assert!(matches!(err, TargetingFailure::RequestInstantiation(_)));
    }

    #[tokio::test]
    async fn unreachable_host_fails_to_execute() {
        let err = client(None).fetch("http://127.0.0.1:1/segments").await.unwrap_err();
        assert!(matches!(err, TargetingFailure::RequestExecution(_)));
    }
}
