use serde::Deserialize;
use url::{ParseError, Url};

use crate::openrtb::request::Content;

/// 一次定向调用所需的媒体元数据
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentMetadata {
    pub url: String,
    pub title: String,
    pub description: String,
}

#[derive(Deserialize, Default)]
struct ContentExt {
    #[serde(default)]
    description: String,
}

impl ContentMetadata {
    /// description 取自 `content.ext.description`，ext 不合法时留空
    pub fn from_content(content: &Content) -> Self {
        let description = content
            .ext
            .as_ref()
            .and_then(|ext| serde_json::from_value::<ContentExt>(ext.clone()).ok())
            .unwrap_or_default()
            .description;

        ContentMetadata {
            url: content.url.clone(),
            title: content.title.clone(),
            description,
        }
    }
}

/// 媒体地址必须是可从外部访问的绝对地址。
/// 接受 `http(s)://host/...` 与协议相对的 `//host/...`；
/// 拒绝空串、相对路径、`file://`、以及 `localhost:9999/...` 这类不带协议的 host:port。
pub fn is_valid_media_url(raw: &str) -> bool {
    if raw.is_empty() {
        return false;
    }

    match Url::parse(raw) {
        Ok(url) => url.scheme() != "file" && !url.cannot_be_a_base() && url.has_host(),
        Err(ParseError::RelativeUrlWithoutBase) => is_protocol_relative(raw),
        Err(_) => false,
    }
}

fn is_protocol_relative(raw: &str) -> bool {
    match raw.strip_prefix("//") {
        Some(rest) if !rest.is_empty() && !rest.starts_with('/') => {
            Url::parse(&format!("https:{}", raw)).map(|url| url.has_host()).unwrap_or(false)
        }
        _ => false,
    }
}
