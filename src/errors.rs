use thiserror::Error;

/// 错误严重级别：Fatal 会让框架丢弃该次出价请求，Warning 只做记录
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Fatal,
    Warning,
}

/// `make_requests` / `make_bids` 返回给框架的错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AdapterError {
    #[error("{0}")]
    BadInput(String),

    #[error("{0}")]
    BadServerResponse(String),

    #[error("Failed to encode bid request: {0}")]
    Encoding(String),

    #[error("Failed to decode bid response: {0}")]
    Decoding(String),

    #[error("Invalid adapter configuration: {0}")]
    Configuration(String),

    #[error(transparent)]
    Targeting(#[from] TargetingFailure),
}

impl AdapterError {
    pub fn severity(&self) -> Severity {
        match self {
            AdapterError::Targeting(_) => Severity::Warning,
            _ => Severity::Fatal,
        }
    }
}

pub const ENDPOINT_TEMPLATE_ERROR_CODE: u32 = 301001;
pub const MISSING_TARGETING_URL_ERROR_CODE: u32 = 301002;
pub const MISSING_DISTRIBUTION_CHANNEL_ERROR_CODE: u32 = 302000;
pub const MISSING_CONTENT_BLOCK_ERROR_CODE: u32 = 302001;
pub const MISSING_SITE_ID_ERROR_CODE: u32 = 302002;
pub const MISSING_MEDIA_URL_ERROR_CODE: u32 = 302003;
pub const EMPTY_TARGETING_SEGMENTS_ERROR_CODE: u32 = 302004;
pub const MACRO_RESOLVE_ERROR_CODE: u32 = 302005;
pub const HTTP_REQUEST_INSTANTIATION_ERROR_CODE: u32 = 303000;
pub const HTTP_REQUEST_EXECUTION_ERROR_CODE: u32 = 303050;
pub const BASE_NETWORK_ERROR_CODE: u32 = 304000;
pub const BASE_DECODING_ERROR_CODE: u32 = 305000;

/// 内容定向失败原因。所有变体都是 Warning：请求照常发出，只是不带定向信息。
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TargetingFailure {
    #[error("unable to parse targeting url template: {0}")]
    EndpointTemplate(String),

    #[error("Targeting url resolved to an empty string")]
    MissingTargetingUrl,

    #[error("Missing $.site and $.app")]
    MissingDistributionChannel,

    #[error("Missing $.content")]
    MissingContentBlock,

    #[error("Missing SiteId")]
    MissingSiteId,

    #[error("Missing Media Url")]
    MissingMediaUrl,

    #[error("Empty Targeting Segments")]
    EmptyTargetingSegments,

    #[error("Failed to insert macros into targeting url: {0}")]
    MacroResolve(String),

    #[error("Failed to instantiate request: {0}")]
    RequestInstantiation(String),

    #[error("Request Execution failure: {0}")]
    RequestExecution(String),

    #[error("Server responded with failure status: {status}.")]
    Network { status: u16 },

    #[error("Failed to decode targeting response: {0}")]
    Decoding(String),
}

impl TargetingFailure {
    /// 对外暴露的稳定错误码，由变体推导
    pub fn code(&self) -> u32 {
        match self {
            TargetingFailure::EndpointTemplate(_) => ENDPOINT_TEMPLATE_ERROR_CODE,
            TargetingFailure::MissingTargetingUrl => MISSING_TARGETING_URL_ERROR_CODE,
            TargetingFailure::MissingDistributionChannel => MISSING_DISTRIBUTION_CHANNEL_ERROR_CODE,
            TargetingFailure::MissingContentBlock => MISSING_CONTENT_BLOCK_ERROR_CODE,
            TargetingFailure::MissingSiteId => MISSING_SITE_ID_ERROR_CODE,
            TargetingFailure::MissingMediaUrl => MISSING_MEDIA_URL_ERROR_CODE,
            TargetingFailure::EmptyTargetingSegments => EMPTY_TARGETING_SEGMENTS_ERROR_CODE,
            TargetingFailure::MacroResolve(_) => MACRO_RESOLVE_ERROR_CODE,
            TargetingFailure::RequestInstantiation(_) => HTTP_REQUEST_INSTANTIATION_ERROR_CODE,
            TargetingFailure::RequestExecution(_) => HTTP_REQUEST_EXECUTION_ERROR_CODE,
            TargetingFailure::Network { status } => BASE_NETWORK_ERROR_CODE + u32::from(*status),
            TargetingFailure::Decoding(_) => BASE_DECODING_ERROR_CODE,
        }
    }
}
