use serde::{Serialize, Deserialize};
use chrono::Utc;

use crate::errors::{AdapterError, Severity};

/// **单次竞价的结构化日志**
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct AuctionLog {
    pub timestamp: String,      // 记录时间
    pub log_type: String,       // 日志类型，固定为 "jwplayer_auction"
    pub request_id: String,     // OpenRTB `BidRequest.id`
    pub imp_count: usize,       // 入站 imp 数量
    pub status: String,         // "success" / "no_bid" / "rejected"
    pub targeting_code: Option<u32>, // 内容定向失败时的错误码
    pub errors: Vec<AdapterErrorLog>,
    pub exchange_calls: Vec<ExchangeCallLog>,
    pub bid_count: usize,
    pub currency: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct AdapterErrorLog {
    pub severity: String,       // "fatal" / "warning"
    pub message: String,
}

/// **交易所调用日志**
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ExchangeCallLog {
    pub uri: String,
    pub status: String,         // "success", "timeout", "invalid_response"
    pub status_code: Option<u16>,
    pub elapsed_ms: u128,
}

impl AuctionLog {
    pub fn new(request_id: &str, imp_count: usize) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
            log_type: "jwplayer_auction".to_string(),
            request_id: request_id.to_string(),
            imp_count,
            status: "rejected".to_string(),  // 默认未发出请求，后续更新
            targeting_code: None,
            errors: Vec::new(),
            exchange_calls: Vec::new(),
            bid_count: 0,
            currency: None,
        }
    }

    pub fn add_errors(&mut self, errors: &[AdapterError]) {
        for error in errors {
            if let AdapterError::Targeting(failure) = error {
                self.targeting_code = Some(failure.code());
            }
            let severity = match error.severity() {
                Severity::Fatal => "fatal",
                Severity::Warning => "warning",
            };
            self.errors.push(AdapterErrorLog {
                severity: severity.to_string(),
                message: error.to_string(),
            });
        }
    }

    pub fn add_exchange_call(&mut self, uri: &str, status: &str, status_code: Option<u16>, elapsed_ms: u128) {
        self.exchange_calls.push(ExchangeCallLog {
            uri: uri.to_string(),
            status: status.to_string(),
            status_code,
            elapsed_ms,
        });
        self.status = "no_bid".to_string();
    }

    pub fn set_bids(&mut self, bid_count: usize, currency: &str) {
        self.bid_count += bid_count;
        if bid_count > 0 {
            self.status = "success".to_string();
            self.currency = Some(currency.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::TargetingFailure;

    #[test]
    fn records_targeting_code_and_severity() {
        let mut log = AuctionLog::new("req", 2);
        log.add_errors(&[
            AdapterError::BadInput("imp[1] (id: b): missing imp.ext".to_string()),
            AdapterError::Targeting(TargetingFailure::MissingSiteId),
        ]);

        assert_eq!(log.targeting_code, Some(302002));
        assert_eq!(log.errors[0].severity, "fatal");
        assert_eq!(log.errors[1].severity, "warning");
        assert_eq!(log.errors[1].message, "Missing SiteId");
    }

    #[test]
    fn status_follows_the_auction() {
        let mut log = AuctionLog::new("req", 1);
        assert_eq!(log.status, "rejected");

        log.add_exchange_call("http://xandr.test", "success", Some(204), 12);
        log.set_bids(0, "");
        assert_eq!(log.status, "no_bid");
        assert_eq!(log.currency, None);

        log.set_bids(2, "USD");
        assert_eq!(log.status, "success");
        assert_eq!(log.bid_count, 2);
        assert_eq!(log.currency.as_deref(), Some("USD"));
    }
}
