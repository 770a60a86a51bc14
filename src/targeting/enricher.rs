use async_trait::async_trait;
use tracing::debug;

use crate::bidding::xandr::write_to_xandr_keywords;
use crate::config::ExtraInfo;
use crate::errors::{AdapterError, TargetingFailure};
use crate::openrtb::request::{BidRequest, Content};
use crate::targeting::client::TargetingClient;
use crate::targeting::endpoint::{build_targeting_endpoint, EndpointTemplate};
use crate::targeting::metadata::{is_valid_media_url, ContentMetadata};
use crate::targeting::segments::{existing_jwpsegs, make_ortb_datum};

/// 请求增强的接缝，测试里可替换为不发网络请求的实现
#[async_trait]
pub trait Enricher: Send + Sync {
    /// 成功时写回 keywords 与 `content.data`；失败时请求保持不变
    async fn enrich_request(&self, request: &mut BidRequest, site_id: &str) -> Result<(), TargetingFailure>;
}

/// 基于 JW Player 内容定向服务的增强实现
#[derive(Debug, Clone)]
pub struct ContentTargeting {
    client: TargetingClient,
    endpoint: EndpointTemplate,
}

impl ContentTargeting {
    pub fn new(client: TargetingClient, endpoint: EndpointTemplate) -> Self {
        Self { client, endpoint }
    }

    /// 模板解析失败属于配置错误，直接拒绝构建
    pub fn from_extra_info(extra_info: &ExtraInfo) -> Result<Self, AdapterError> {
        let endpoint = EndpointTemplate::parse(&extra_info.targeting_endpoint)
            .map_err(|e| AdapterError::Configuration(e.to_string()))?;
        let http = TargetingClient::build_http_client()
            .map_err(|e| AdapterError::Configuration(format!("failed to build targeting client: {}", e)))?;

        Ok(Self::new(TargetingClient::new(http, extra_info.targeting_timeout()), endpoint))
    }

    async fn fetch_jwpsegs(&self, site_id: &str, content: &Content) -> Result<Vec<String>, TargetingFailure> {
        if site_id.is_empty() {
            return Err(TargetingFailure::MissingSiteId);
        }

        let metadata = ContentMetadata::from_content(content);
        if !is_valid_media_url(&metadata.url) {
            return Err(TargetingFailure::MissingMediaUrl);
        }

        let url = build_targeting_endpoint(&self.endpoint, site_id, &metadata)?;
        debug!(url = %url, "fetching content targeting");

        let response = self.client.fetch(&url).await?;
        let jwpsegs = response.data.all_jwpsegs();
        if jwpsegs.is_empty() {
            return Err(TargetingFailure::EmptyTargetingSegments);
        }
        Ok(jwpsegs)
    }
}

#[async_trait]
impl Enricher for ContentTargeting {
    async fn enrich_request(&self, request: &mut BidRequest, site_id: &str) -> Result<(), TargetingFailure> {
        let (keywords, content) = match (request.site.as_mut(), request.app.as_mut()) {
            (Some(site), _) => site.targeting_fields(),
            (None, Some(app)) => app.targeting_fields(),
            (None, None) => return Err(TargetingFailure::MissingDistributionChannel),
        };
        let content = content.ok_or(TargetingFailure::MissingContentBlock)?;

        if let Some(jwpsegs) = existing_jwpsegs(&content.data) {
            debug!(count = jwpsegs.len(), "content already carries jwpsegs");
            write_to_xandr_keywords(keywords, &jwpsegs);
            return Ok(());
        }

        let jwpsegs = self.fetch_jwpsegs(site_id, content).await?;
        write_to_xandr_keywords(keywords, &jwpsegs);
        content.data.push(make_ortb_datum(&jwpsegs));
        Ok(())
    }
}
