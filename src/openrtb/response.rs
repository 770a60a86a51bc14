use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// OpenRTB Bid Response
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct BidResponse {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub seatbid: Vec<SeatBid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bidid: Option<String>,
    /// 币种，原样透传给框架
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub cur: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nbr: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ext: Option<Value>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct SeatBid {
    #[serde(default)]
    pub bid: Vec<Bid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seat: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<i32>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Bid {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub impid: String,
    #[serde(default)]
    pub price: f64, // 缺省按 0 处理
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub adm: Option<String>, // Ad markup (VAST for video)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nurl: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub adomain: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dealid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub w: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub h: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ext: Option<Value>,
    /// burl / lurl / cat / attr 等
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
