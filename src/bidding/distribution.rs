use crate::errors::AdapterError;
use crate::model::params::{PublisherExt, PublisherParams};
use crate::openrtb::request::{BidRequest, Publisher};

/// 确定分发渠道（site 或 app），清空 Xandr 不接受的 id，并解析 `publisher.ext.jwplayer`
pub fn resolve_publisher_params(request: &mut BidRequest) -> Result<PublisherParams, AdapterError> {
    let publisher = match (request.site.as_mut(), request.app.as_mut()) {
        (Some(_), Some(_)) => {
            return Err(AdapterError::BadInput(
                "The bid request must contain either $.site or $.app, not both".to_string(),
            ))
        }
        (None, None) => {
            return Err(AdapterError::BadInput("The bid request is missing $.site and $.app".to_string()))
        }
        // Xandr 把 site.id / app.id 当作自己的 placement code / tinytag code 解析，placement 已经写在 imp.tagid 上
        (Some(site), None) => {
            site.id.clear();
            site.publisher.as_mut()
        }
        (None, Some(app)) => {
            app.id.clear();
            app.publisher.as_mut()
        }
    };

    let publisher = publisher.ok_or_else(|| AdapterError::BadInput("Missing $.publisher".to_string()))?;
    // 同理，publisher.id 会被当作 Xandr 的 publisher code
    publisher.id.clear();

    parse_publisher_params(publisher)
}

pub fn parse_publisher_params(publisher: &Publisher) -> Result<PublisherParams, AdapterError> {
    let ext = publisher
        .ext
        .as_ref()
        .ok_or_else(|| AdapterError::BadInput("Missing $.publisher.ext".to_string()))?;

    let publisher_ext: PublisherExt = serde_json::from_value(ext.clone())
        .map_err(|e| AdapterError::BadInput(format!("Invalid $.publisher.ext: {}", e)))?;

    let params = publisher_ext
        .jwplayer
        .ok_or_else(|| AdapterError::BadInput("Missing $.publisher.ext.jwplayer".to_string()))?;

    if params.publisher_id.is_empty() {
        return Err(AdapterError::BadInput("Missing $.publisher.ext.jwplayer.publisherId".to_string()));
    }
    Ok(params)
}
