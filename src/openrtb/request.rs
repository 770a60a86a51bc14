use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// OpenRTB BidRequest 结构体。
///
/// 适配器只改写少数字段，其余未建模的字段统一落在 `extra` 中原样透传，
/// 保证转发给 Xandr 的请求不会丢失上游信息。
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct BidRequest {
    pub id: String,

    /// 广告展示请求列表
    #[serde(default)]
    pub imp: Vec<Imp>,

    /// 网站信息
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site: Option<Site>,

    /// 应用信息
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app: Option<App>,

    /// 设备信息
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device: Option<Device>,

    /// 请求来源信息（含 schain）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<Source>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tmax: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cur: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ext: Option<Value>,

    /// user / regs / test / at / bcat 等其它字段
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// 单个广告展示请求
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Imp {
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video: Option<Video>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub tagid: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bidfloor: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ext: Option<Value>,

    /// banner / native / pmp 等
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// 视频广告位信息
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Video {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mimes: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub w: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub h: Option<i64>,

    /// 开始延迟：>0 为秒数，0 前贴，-1 中贴，-2 后贴
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub startdelay: Option<i64>,

    /// 播放位置类型：1 = in-stream，其它为 outstream 类
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placement: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ext: Option<Value>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// 网站信息
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Site {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publisher: Option<Publisher>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Content>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub keywords: String,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// 应用信息
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct App {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bundle: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publisher: Option<Publisher>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Content>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub keywords: String,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Publisher {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ext: Option<Value>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// 媒体内容信息，内容定向的输入与输出都落在这里
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub url: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub title: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub data: Vec<Data>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ext: Option<Value>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Data {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub segment: Vec<Segment>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ext: Option<Value>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Segment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub value: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ext: Option<Value>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// 设备信息，Xandr 要求 `$.device` 必须存在
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Device {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ua: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// 请求来源信息
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Source {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fd: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tid: Option<String>,

    /// OpenRTB 2.6 的原生 schain 字段
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schain: Option<SupplyChain>,

    /// OpenRTB 2.5 时代 schain 放在 `source.ext.schain`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ext: Option<Value>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// 供应链（SupplyChain）对象
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct SupplyChain {
    #[serde(default)]
    pub complete: i8,

    #[serde(default)]
    pub nodes: Vec<SupplyChainNode>,

    #[serde(default)]
    pub ver: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ext: Option<Value>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct SupplyChainNode {
    #[serde(default)]
    pub asi: String,

    #[serde(default)]
    pub sid: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub rid: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hp: Option<i8>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ext: Option<Value>,
}

impl Site {
    /// 同时借出 keywords 与 content，供内容定向写回
    pub fn targeting_fields(&mut self) -> (&mut String, Option<&mut Content>) {
        (&mut self.keywords, self.content.as_mut())
    }
}

impl App {
    pub fn targeting_fields(&mut self) -> (&mut String, Option<&mut Content>) {
        (&mut self.keywords, self.content.as_mut())
    }
}
