use url::form_urlencoded;

use crate::errors::TargetingFailure;
use crate::targeting::metadata::ContentMetadata;

/// 定向地址模板，占位符写法为 `{{.SiteId}}`、`{{.MediaUrl}}`、`{{.Title}}`、`{{.Description}}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointTemplate {
    pieces: Vec<Piece>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Piece {
    Literal(String),
    Field(String),
}

/// 渲染模板的参数，除 site_id 外都已完成转义
#[derive(Debug, Clone, Default)]
pub struct EndpointParams {
    pub site_id: String,
    pub media_url: String,
    pub title: String,
    pub description: String,
}

impl EndpointTemplate {
    pub fn parse(raw: &str) -> Result<Self, TargetingFailure> {
        let mut pieces = Vec::new();
        let mut rest = raw;

        while let Some(start) = rest.find("{{") {
            if start > 0 {
                pieces.push(Piece::Literal(rest[..start].to_string()));
            }
            let after_open = &rest[start + 2..];
            let end = after_open.find("}}").ok_or_else(|| {
                TargetingFailure::EndpointTemplate(format!("unclosed action in {:?}", raw))
            })?;

            let action = after_open[..end].trim();
            let field = action
                .strip_prefix('.')
                .filter(|name| !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'))
                .ok_or_else(|| TargetingFailure::EndpointTemplate(format!("unsupported action {{{{{}}}}}", action)))?;

            pieces.push(Piece::Field(field.to_string()));
            rest = &after_open[end + 2..];
        }

        if !rest.is_empty() {
            pieces.push(Piece::Literal(rest.to_string()));
        }

        Ok(EndpointTemplate { pieces })
    }

    pub fn render(&self, params: &EndpointParams) -> Result<String, TargetingFailure> {
        let mut rendered = String::new();
        for piece in &self.pieces {
            match piece {
                Piece::Literal(text) => rendered.push_str(text),
                Piece::Field(name) => {
                    let value = match name.as_str() {
                        "SiteId" => &params.site_id,
                        "MediaUrl" => &params.media_url,
                        "Title" => &params.title,
                        "Description" => &params.description,
                        other => {
                            return Err(TargetingFailure::MacroResolve(format!("can't evaluate field {}", other)))
                        }
                    };
                    rendered.push_str(value);
                }
            }
        }
        Ok(rendered)
    }
}

/// 按 query 规则转义：空格转为 `+`，只保留字母数字和 `-_.~`
pub fn query_escape(value: &str) -> String {
    let escaped: String = form_urlencoded::byte_serialize(value.as_bytes()).collect();
    // form 编码保留 `*` 而转义 `~`，这里调换成 query 字符串的写法
    escaped.replace('*', "%2A").replace("%7E", "~")
}

pub fn build_targeting_endpoint(
    template: &EndpointTemplate,
    site_id: &str,
    metadata: &ContentMetadata,
) -> Result<String, TargetingFailure> {
    let params = EndpointParams {
        site_id: site_id.to_string(),
        media_url: query_escape(&metadata.url),
        title: query_escape(&metadata.title),
        description: query_escape(&metadata.description),
    };

    let url = template.render(&params)?;
    if url.is_empty() {
        return Err(TargetingFailure::MissingTargetingUrl);
    }
    Ok(url)
}
