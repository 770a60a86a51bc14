// src/model/params.rs

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// `imp.ext` 的外层结构：`{"bidder": {...}}`
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ExtImpBidder {
    pub bidder: Value,
}

/// `imp.ext.bidder` 中 jwplayer 的参数
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ImpExtJwPlayer {
    #[serde(default)]
    pub placement_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publisher_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub viewability_percentage: Option<f64>,
}

/// `publisher.ext.jwplayer`
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PublisherParams {
    #[serde(default)]
    pub publisher_id: String,
    /// 为空时不做内容定向
    #[serde(default)]
    pub site_id: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct PublisherExt {
    #[serde(default)]
    pub jwplayer: Option<PublisherParams>,
}
