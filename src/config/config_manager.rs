use serde::Deserialize;
use std::time::Duration;

pub const DEFAULT_TARGETING_ENDPOINT: &str = "https://content-targeting-api.longtailvideo.com/property/{{.SiteId}}/content_segments?content_url=%{{.MediaUrl}}&title={{.Title}}&description={{.Description}}";

/// 适配器的框架级配置：交易所地址 + 不透明的 extra info JSON
#[derive(Clone, Debug, Default)]
pub struct AdapterConfig {
    pub endpoint: String,
    pub extra_adapter_info: String,
}

impl AdapterConfig {
    pub fn new(endpoint: &str, extra_adapter_info: &str) -> Self {
        AdapterConfig {
            endpoint: endpoint.to_string(),
            extra_adapter_info: extra_adapter_info.to_string(),
        }
    }

    pub fn extra_info(&self) -> ExtraInfo {
        ExtraInfo::parse(&self.extra_adapter_info)
    }
}

/// extra info 中识别的字段
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct ExtraInfo {
    #[serde(default)]
    pub targeting_endpoint: String,
    /// 内容定向请求的截止时间（毫秒），缺省时只受 HTTP 客户端自身约束
    #[serde(default)]
    pub targeting_timeout_ms: Option<u64>,
}

impl ExtraInfo {
    /// 解析失败或未配置时回落到默认的定向地址模板
    pub fn parse(raw: &str) -> Self {
        let mut extra_info: ExtraInfo = serde_json::from_str(raw).unwrap_or_default();
        if extra_info.targeting_endpoint.is_empty() {
            extra_info.targeting_endpoint = DEFAULT_TARGETING_ENDPOINT.to_string();
        }
        extra_info
    }

    pub fn targeting_timeout(&self) -> Option<Duration> {
        self.targeting_timeout_ms.map(Duration::from_millis)
    }
}
