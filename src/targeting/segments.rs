use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::openrtb::request::{Data, Segment};

pub const JWPLAYER_DOMAIN: &str = "jwplayer.com";
/// IAB segment taxonomy code registered for JW Player
pub const JWPLAYER_SEGTAX: i64 = 502;

/// 定向服务的响应体
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct TargetingResponse {
    #[serde(default)]
    pub uuid: String,
    #[serde(default)]
    pub data: TargetingData,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct TargetingData {
    #[serde(default)]
    pub media_id: String,
    #[serde(default)]
    pub base_segments: Vec<String>,
    #[serde(default)]
    pub targeting_profiles: Vec<String>,
}

impl TargetingData {
    /// base segments 在前，targeting profiles 在后，不去重
    pub fn all_jwpsegs(&self) -> Vec<String> {
        self.base_segments
            .iter()
            .chain(self.targeting_profiles.iter())
            .cloned()
            .collect()
    }
}

#[derive(Deserialize)]
struct DataExt {
    segtax: i64,
}

/// 是否是 JW Player 已写入的定向数据：名字、segtax 都匹配且至少有一个 segment
pub fn has_jwpsegs(datum: &Data) -> bool {
    let segtax = datum
        .ext
        .as_ref()
        .and_then(|ext| serde_json::from_value::<DataExt>(ext.clone()).ok())
        .map(|ext| ext.segtax);

    datum.name == JWPLAYER_DOMAIN && segtax == Some(JWPLAYER_SEGTAX) && !datum.segment.is_empty()
}

/// 取第一条 JW Player 数据中的 segment 值，保持原有顺序
pub fn existing_jwpsegs(data: &[Data]) -> Option<Vec<String>> {
    data.iter().find(|datum| has_jwpsegs(datum)).map(|datum| parse_jwpsegs(&datum.segment))
}

pub fn parse_jwpsegs(segments: &[Segment]) -> Vec<String> {
    segments.iter().map(|segment| segment.value.clone()).collect()
}

pub fn make_ortb_segments(jwpsegs: &[String]) -> Vec<Segment> {
    jwpsegs
        .iter()
        .map(|jwpseg| Segment {
            value: jwpseg.clone(),
            ..Default::default()
        })
        .collect()
}

/// 构造写回 `content.data` 的记录，重复执行时 `existing_jwpsegs` 会识别它
pub fn make_ortb_datum(jwpsegs: &[String]) -> Data {
    Data {
        name: JWPLAYER_DOMAIN.to_string(),
        segment: make_ortb_segments(jwpsegs),
        ext: Some(json!({ "segtax": JWPLAYER_SEGTAX })),
        ..Default::default()
    }
}
