// src/bidding/xandr.rs

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::convert::TryFrom;

use crate::openrtb::request::{SupplyChain, Video};

const JWPSEG_KEYWORD_PREFIX: &str = "jwpseg=";

/// Xandr 视频上下文，序列化为整数
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(try_from = "u8", into = "u8")]
pub enum XandrContext {
    Unknown = 0,
    PreRoll = 1,
    MidRoll = 2,
    PostRoll = 3,
    Outstream = 4,
}

impl TryFrom<u8> for XandrContext {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(XandrContext::Unknown),
            1 => Ok(XandrContext::PreRoll),
            2 => Ok(XandrContext::MidRoll),
            3 => Ok(XandrContext::PostRoll),
            4 => Ok(XandrContext::Outstream),
            _ => Err(format!("Invalid value for XandrContext: {}", value)),
        }
    }
}

impl From<XandrContext> for u8 {
    fn from(context: XandrContext) -> Self {
        context as u8
    }
}

fn is_zero(value: &i64) -> bool {
    *value == 0
}

#[derive(Serialize, Debug)]
struct XandrImpExtParams {
    #[serde(skip_serializing_if = "is_zero")]
    placement_id: i64,
}

#[derive(Serialize, Debug)]
struct XandrImpExt {
    appnexus: XandrImpExtParams,
}

#[derive(Serialize, Debug)]
struct XandrVideoExtParams {
    context: XandrContext,
}

#[derive(Serialize, Debug)]
struct XandrVideoExt {
    appnexus: XandrVideoExtParams,
}

/// Xandr 只认 `$.ext.schain`（OpenRTB 2.4 的写法）
#[derive(Serialize, Debug)]
struct XandrRequestExt<'a> {
    schain: &'a SupplyChain,
}

/// `{"appnexus":{"placement_id":<int>}}`；placement id 不是整数时返回 None
pub fn xandr_imp_ext(placement_id: &str) -> Option<Value> {
    let id = placement_id.parse::<i64>().ok()?;
    serde_json::to_value(XandrImpExt {
        appnexus: XandrImpExtParams { placement_id: id },
    })
    .ok()
}

pub fn xandr_context(video: &Video) -> XandrContext {
    let placement = match video.placement {
        None | Some(0) => return XandrContext::Unknown,
        Some(placement) => placement,
    };

    // 1 = in-stream
    if placement != 1 {
        return XandrContext::Outstream;
    }

    match video.startdelay {
        Some(startdelay) => context_from_startdelay(startdelay),
        None => XandrContext::Unknown,
    }
}

pub fn context_from_startdelay(startdelay: i64) -> XandrContext {
    // 大于 0 表示广告在第几秒插入
    if startdelay > 0 {
        return XandrContext::MidRoll;
    }

    match startdelay {
        0 => XandrContext::PreRoll,
        -1 => XandrContext::MidRoll,
        -2 => XandrContext::PostRoll,
        _ => XandrContext::Unknown,
    }
}

/// 上下文可确定时覆盖 `video.ext`，否则保持原样
pub fn set_xandr_video_ext(video: &mut Video) {
    let context = xandr_context(video);
    if context == XandrContext::Unknown {
        return;
    }

    if let Ok(ext) = serde_json::to_value(XandrVideoExt {
        appnexus: XandrVideoExtParams { context },
    }) {
        video.ext = Some(ext);
    }
}

/// `jwpseg=1,jwpseg=2,...`
pub fn convert_to_xandr_keywords(jwpsegs: &[String]) -> String {
    jwpsegs
        .iter()
        .map(|jwpseg| format!("{}{}", JWPSEG_KEYWORD_PREFIX, jwpseg))
        .collect::<Vec<_>>()
        .join(",")
}

pub fn write_to_xandr_keywords(keywords: &mut String, jwpsegs: &[String]) {
    if jwpsegs.is_empty() {
        return;
    }

    if !keywords.is_empty() {
        keywords.push(',');
    }
    keywords.push_str(&convert_to_xandr_keywords(jwpsegs));
}

pub fn xandr_request_ext(schain: &SupplyChain) -> Result<Value, serde_json::Error> {
    serde_json::to_value(XandrRequestExt { schain })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::openrtb::request::SupplyChainNode;
    use proptest::prelude::*;
    use serde_json::json;

    fn video(placement: Option<i64>, startdelay: Option<i64>) -> Video {
        Video {
            placement,
            startdelay,
            ..Default::default()
        }
    }

    #[test]
    fn imp_ext_carries_numeric_placement_id() {
        assert_eq!(xandr_imp_ext("1234"), Some(json!({"appnexus": {"placement_id": 1234}})));
        assert_eq!(xandr_imp_ext("abc"), None);
        assert_eq!(xandr_imp_ext(""), None);
    }

    #[test]
    fn context_follows_placement_and_startdelay() {
        assert_eq!(xandr_context(&video(None, Some(0))), XandrContext::Unknown);
        assert_eq!(xandr_context(&video(Some(0), Some(0))), XandrContext::Unknown);
        assert_eq!(xandr_context(&video(Some(3), None)), XandrContext::Outstream);
        assert_eq!(xandr_context(&video(Some(1), None)), XandrContext::Unknown);
        assert_eq!(xandr_context(&video(Some(1), Some(0))), XandrContext::PreRoll);
        assert_eq!(xandr_context(&video(Some(1), Some(-1))), XandrContext::MidRoll);
        assert_eq!(xandr_context(&video(Some(1), Some(30))), XandrContext::MidRoll);
        assert_eq!(xandr_context(&video(Some(1), Some(-2))), XandrContext::PostRoll);
        assert_eq!(xandr_context(&video(Some(1), Some(-3))), XandrContext::Unknown);
    }

    #[test]
    fn video_ext_is_written_only_for_known_contexts() {
        let mut preroll = video(Some(1), Some(0));
        set_xandr_video_ext(&mut preroll);
        assert_eq!(preroll.ext, Some(json!({"appnexus": {"context": 1}})));

        let mut unknown = video(Some(1), None);
        unknown.ext = Some(json!({"kept": true}));
        set_xandr_video_ext(&mut unknown);
        assert_eq!(unknown.ext, Some(json!({"kept": true})));
    }

    #[test]
    fn keywords_are_appended_with_separator() {
        let jwpsegs = vec!["1".to_string(), "2".to_string()];

        let mut empty = String::new();
        write_to_xandr_keywords(&mut empty, &jwpsegs);
        assert_eq!(empty, "jwpseg=1,jwpseg=2");

        let mut existing = "key=value".to_string();
        write_to_xandr_keywords(&mut existing, &jwpsegs);
        assert_eq!(existing, "key=value,jwpseg=1,jwpseg=2");

        let mut untouched = "key=value".to_string();
        write_to_xandr_keywords(&mut untouched, &[]);
        assert_eq!(untouched, "key=value");
        assert_eq!(convert_to_xandr_keywords(&[]), "");
    }

    #[test]
    fn request_ext_wraps_the_schain() {
        let schain = SupplyChain {
            complete: 1,
            ver: "1.0".to_string(),
            nodes: vec![SupplyChainNode {
                asi: "jwplayer.com".to_string(),
                sid: "pub".to_string(),
                rid: "req".to_string(),
                hp: Some(1),
                ..Default::default()
            }],
            ext: None,
        };

        assert_eq!(
            xandr_request_ext(&schain).unwrap(),
            json!({"schain": {"complete": 1, "ver": "1.0", "nodes": [{"asi": "jwplayer.com", "sid": "pub", "rid": "req", "hp": 1}]}})
        );
    }

    proptest! {
        #[test]
        fn every_jwpseg_becomes_one_keyword(jwpsegs in prop::collection::vec("[a-z0-9]{1,8}", 1..10)) {
            let keywords = convert_to_xandr_keywords(&jwpsegs);
            let decoded: Vec<&str> = keywords.split(',').map(|k| k.trim_start_matches("jwpseg=")).collect();
            prop_assert_eq!(decoded, jwpsegs.iter().map(String::as_str).collect::<Vec<_>>());
        }

        #[test]
        fn existing_keywords_stay_as_prefix(prefix in "[a-z=]{0,12}", jwpsegs in prop::collection::vec("[0-9]{1,4}", 0..5)) {
            let mut keywords = prefix.clone();
            write_to_xandr_keywords(&mut keywords, &jwpsegs);
            prop_assert!(keywords.starts_with(&prefix));
            if jwpsegs.is_empty() {
                prop_assert_eq!(&keywords, &prefix);
            }
        }

        #[test]
        fn positive_startdelay_is_midroll(startdelay in 1i64..100_000) {
            prop_assert_eq!(context_from_startdelay(startdelay), XandrContext::MidRoll);
        }

        #[test]
        fn non_instream_placement_is_outstream(placement in 2i64..10) {
            prop_assert_eq!(xandr_context(&video(Some(placement), Some(0))), XandrContext::Outstream);
        }
    }
}
