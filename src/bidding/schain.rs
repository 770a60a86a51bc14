use serde_json::Value;

use crate::openrtb::request::{Source, SupplyChain, SupplyChainNode};
use crate::targeting::segments::JWPLAYER_DOMAIN;

pub const SCHAIN_VERSION: &str = "1.0";

/// 从 source 中取出上游的 schain，优先 2.6 的 `source.schain`，其次 2.5 的 `source.ext.schain`。
/// 两处都会被移除；`source.ext` 被取空后置为 None。`ext.schain` 无法解析时视为没有上游链。
pub fn take_publisher_schain(source: &mut Source) -> Option<SupplyChain> {
    let native = source.schain.take();
    let extended = take_ext_schain(&mut source.ext);
    native.or(extended)
}

fn take_ext_schain(ext: &mut Option<Value>) -> Option<SupplyChain> {
    let object = ext.as_mut()?.as_object_mut()?;
    let raw = object.remove("schain");
    if object.is_empty() {
        *ext = None;
    }
    raw.and_then(|raw| serde_json::from_value(raw).ok())
}

pub fn make_schain_node(publisher_id: &str, request_id: &str) -> SupplyChainNode {
    SupplyChainNode {
        asi: JWPLAYER_DOMAIN.to_string(),
        sid: publisher_id.to_string(),
        rid: request_id.to_string(),
        hp: Some(1),
        ..Default::default()
    }
}

/// 上游节点按原顺序保留，自身节点追加在最后；complete 继承上游，没有上游时为 1
pub fn make_schain(publisher_id: &str, request_id: &str, publisher_schain: Option<SupplyChain>) -> SupplyChain {
    let (complete, mut nodes) = match publisher_schain {
        Some(schain) => (schain.complete, schain.nodes),
        None => (1, Vec::new()),
    };
    nodes.push(make_schain_node(publisher_id, request_id));

    SupplyChain {
        complete,
        nodes,
        ver: SCHAIN_VERSION.to_string(),
        ext: None,
    }
}
