// src/bidding/adapter.rs

use std::sync::Arc;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::Method;
use tracing::{debug, warn};

use crate::bidding::distribution::resolve_publisher_params;
use crate::bidding::imp::sanitize_imps;
use crate::bidding::schain::{make_schain, take_publisher_schain};
use crate::bidding::xandr::xandr_request_ext;
use crate::config::AdapterConfig;
use crate::errors::AdapterError;
use crate::model::adapters::{BidType, Bidder, BidderResponse, ExtraRequestInfo, RequestData, ResponseData, TypedBid};
use crate::openrtb::request::{BidRequest, Device};
use crate::openrtb::response::BidResponse;
use crate::targeting::{ContentTargeting, Enricher};

/// 出站请求统一携带的头
static OUTBOUND_HEADERS: Lazy<HeaderMap> = Lazy::new(|| {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    headers
});

/// JW Player -> Xandr 适配器。实例只持有不可变配置，可在多个请求间共享。
pub struct JwPlayerAdapter {
    endpoint: String,
    enricher: Arc<dyn Enricher>,
}

impl JwPlayerAdapter {
    /// 根据框架配置构建：解析 extra info、定向地址模板，并创建定向 HTTP 客户端
    pub fn builder(config: &AdapterConfig) -> Result<Self, AdapterError> {
        let extra_info = config.extra_info();
        let enricher = ContentTargeting::from_extra_info(&extra_info)?;
        debug!(endpoint = %config.endpoint, targeting_endpoint = %extra_info.targeting_endpoint, "jwplayer adapter built");
        Ok(Self::new(&config.endpoint, Arc::new(enricher)))
    }

    pub fn new(endpoint: &str, enricher: Arc<dyn Enricher>) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            enricher,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl Bidder for JwPlayerAdapter {
    async fn make_requests(
        &self,
        request: &BidRequest,
        _request_info: &ExtraRequestInfo,
    ) -> (Vec<RequestData>, Vec<AdapterError>) {
        let mut request = request.clone();

        let (imps, mut errors) = sanitize_imps(std::mem::take(&mut request.imp));
        if imps.is_empty() {
            return (Vec::new(), errors);
        }
        request.imp = imps;

        let publisher_params = match resolve_publisher_params(&mut request) {
            Ok(params) => params,
            Err(err) => {
                errors.push(err);
                return (Vec::new(), errors);
            }
        };

        // 定向失败只是告警，请求照常发出
        if let Err(failure) = self.enricher.enrich_request(&mut request, &publisher_params.site_id).await {
            warn!(request_id = %request.id, code = failure.code(), error = %failure, "content targeting failed");
            errors.push(AdapterError::Targeting(failure));
        }

        let publisher_schain = request.source.as_mut().and_then(take_publisher_schain);
        let schain = make_schain(&publisher_params.publisher_id, &request.id, publisher_schain);
        match xandr_request_ext(&schain) {
            Ok(ext) => request.ext = Some(ext),
            Err(e) => {
                errors.push(AdapterError::Encoding(e.to_string()));
                return (Vec::new(), errors);
            }
        }

        // Xandr 要求 $.device 存在
        request.device.get_or_insert_with(Device::default);

        let body = match serde_json::to_vec(&request) {
            Ok(body) => body,
            Err(e) => {
                errors.push(AdapterError::Encoding(e.to_string()));
                return (Vec::new(), errors);
            }
        };

        debug!(request_id = %request.id, imps = request.imp.len(), bytes = body.len(), "xandr request ready");

        let request_data = RequestData {
            method: Method::POST,
            uri: self.endpoint.clone(),
            body,
            headers: OUTBOUND_HEADERS.clone(),
        };
        (vec![request_data], errors)
    }

    fn make_bids(
        &self,
        internal_request: &BidRequest,
        _external_request: &RequestData,
        response: &ResponseData,
    ) -> (Option<BidderResponse>, Vec<AdapterError>) {
        match response.status_code {
            200 => {}
            204 => return (None, Vec::new()),
            400 => {
                return (
                    None,
                    vec![AdapterError::BadInput(
                        "Unexpected status code: 400. Bad request from publisher. Run with request.debug = 1 for more info."
                            .to_string(),
                    )],
                )
            }
            status => {
                return (
                    None,
                    vec![AdapterError::BadServerResponse(format!(
                        "Unexpected status code: {}. Run with request.debug = 1 for more info.",
                        status
                    ))],
                )
            }
        }

        // simd-json 需要可写缓冲区
        let mut body = response.body.clone();
        let bid_response: BidResponse = match simd_json::serde::from_slice(&mut body) {
            Ok(bid_response) => bid_response,
            Err(e) => return (None, vec![AdapterError::Decoding(e.to_string())]),
        };

        let mut bidder_response = BidderResponse::with_capacity(internal_request.imp.len());
        bidder_response.currency = bid_response.cur;
        for seat_bid in bid_response.seatbid {
            for bid in seat_bid.bid {
                bidder_response.bids.push(TypedBid {
                    bid,
                    bid_type: BidType::Video,
                });
            }
        }

        (Some(bidder_response), Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{Severity, TargetingFailure};
    use crate::openrtb::request::{Imp, Publisher, Site, Source, SupplyChain, SupplyChainNode};
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// 不发网络请求的增强实现，记录调用次数
    struct StubEnricher {
        result: Result<(), TargetingFailure>,
        calls: AtomicUsize,
    }

    impl StubEnricher {
        fn new(result: Result<(), TargetingFailure>) -> Arc<Self> {
            Arc::new(Self {
                result,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl Enricher for StubEnricher {
        async fn enrich_request(&self, request: &mut BidRequest, site_id: &str) -> Result<(), TargetingFailure> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.result.is_ok() {
                if let Some(site) = request.site.as_mut() {
                    site.keywords = format!("site={}", site_id);
                }
            }
            self.result.clone()
        }
    }

    fn adapter(enricher: Arc<StubEnricher>) -> JwPlayerAdapter {
        JwPlayerAdapter::new("http://xandr.test/openrtb2", enricher)
    }

    fn bid_request() -> BidRequest {
        BidRequest {
            id: "test-request-id".to_string(),
            imp: vec![Imp {
                id: "test-imp-id".to_string(),
                ext: Some(json!({"bidder": {"placementId": "1"}})),
                ..Default::default()
            }],
            site: Some(Site {
                id: "site-id".to_string(),
                publisher: Some(Publisher {
                    id: "pub-id".to_string(),
                    ext: Some(json!({"jwplayer": {"publisherId": "jwp-pub", "siteId": "jwp-site"}})),
                    ..Default::default()
                }),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    fn body_of(request_data: &RequestData) -> Value {
        serde_json::from_slice(&request_data.body).unwrap()
    }

    #[tokio::test]
    async fn builds_one_post_for_xandr() {
        let enricher = StubEnricher::new(Ok(()));
        let (requests, errors) = adapter(enricher.clone())
            .make_requests(&bid_request(), &ExtraRequestInfo::default())
            .await;

        assert!(errors.is_empty(), "{:?}", errors);
        assert_eq!(requests.len(), 1);
        assert_eq!(enricher.calls.load(Ordering::SeqCst), 1);

        let request_data = &requests[0];
        assert_eq!(request_data.method, Method::POST);
        assert_eq!(request_data.uri, "http://xandr.test/openrtb2");
        assert_eq!(request_data.headers[CONTENT_TYPE], "application/json");
        assert_eq!(request_data.headers[ACCEPT], "application/json");

        let body = body_of(request_data);
        assert_eq!(body["imp"][0]["tagid"], "1");
        assert_eq!(body["imp"][0]["ext"], json!({"appnexus": {"placement_id": 1}}));
        assert_eq!(body["imp"][0]["video"], json!({}));
        assert_eq!(body["site"].get("id"), None);
        assert_eq!(body["site"]["publisher"].get("id"), None);
        assert_eq!(body["site"]["keywords"], "site=jwp-site");
        assert_eq!(body["device"], json!({}));
        assert_eq!(
            body["ext"],
            json!({"schain": {"complete": 1, "ver": "1.0", "nodes": [
                {"asi": "jwplayer.com", "sid": "jwp-pub", "rid": "test-request-id", "hp": 1}
            ]}})
        );
    }

    #[tokio::test]
    async fn caller_request_is_not_modified() {
        let original = bid_request();
        let _ = adapter(StubEnricher::new(Ok(())))
            .make_requests(&original, &ExtraRequestInfo::default())
            .await;
        assert_eq!(original, bid_request());
    }

    #[tokio::test]
    async fn targeting_failure_is_a_warning() {
        let enricher = StubEnricher::new(Err(TargetingFailure::Network { status: 404 }));
        let (requests, errors) = adapter(enricher)
            .make_requests(&bid_request(), &ExtraRequestInfo::default())
            .await;

        assert_eq!(requests.len(), 1);
        assert_eq!(errors, vec![AdapterError::Targeting(TargetingFailure::Network { status: 404 })]);
        assert_eq!(errors[0].severity(), Severity::Warning);
        assert_eq!(body_of(&requests[0])["site"].get("keywords"), None);
    }

    #[tokio::test]
    async fn invalid_imps_are_dropped() {
        let mut request = bid_request();
        request.imp.push(Imp {
            id: "broken".to_string(),
            ext: Some(json!({"bidder": {}})),
            ..Default::default()
        });

        let (requests, errors) = adapter(StubEnricher::new(Ok(())))
            .make_requests(&request, &ExtraRequestInfo::default())
            .await;

        assert_eq!(requests.len(), 1);
        assert_eq!(errors.len(), 1);
        assert_eq!(body_of(&requests[0])["imp"].as_array().map(Vec::len), Some(1));
    }

    #[tokio::test]
    async fn no_valid_imps_means_no_request() {
        let mut request = bid_request();
        request.imp[0].ext = None;

        let enricher = StubEnricher::new(Ok(()));
        let (requests, errors) = adapter(enricher.clone())
            .make_requests(&request, &ExtraRequestInfo::default())
            .await;

        assert!(requests.is_empty());
        assert_eq!(errors.len(), 2);
        assert_eq!(enricher.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn missing_publisher_params_are_fatal() {
        let mut request = bid_request();
        if let Some(site) = request.site.as_mut() {
            site.publisher = None;
        }

        let enricher = StubEnricher::new(Ok(()));
        let (requests, errors) = adapter(enricher.clone())
            .make_requests(&request, &ExtraRequestInfo::default())
            .await;

        assert!(requests.is_empty());
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].severity(), Severity::Fatal);
        assert_eq!(enricher.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn upstream_schain_is_extended_and_existing_device_kept() {
        let mut request = bid_request();
        request.device = Some(Device {
            ua: Some("agent".to_string()),
            ..Default::default()
        });
        request.ext = Some(json!({"prebid": {"debug": true}}));
        request.source = Some(Source {
            tid: Some("tid".to_string()),
            schain: Some(SupplyChain {
                complete: 0,
                nodes: vec![SupplyChainNode {
                    asi: "upstream.com".to_string(),
                    sid: "u".to_string(),
                    hp: Some(1),
                    ..Default::default()
                }],
                ver: "1.0".to_string(),
                ext: None,
            }),
            ..Default::default()
        });

        let (requests, _) = adapter(StubEnricher::new(Ok(())))
            .make_requests(&request, &ExtraRequestInfo::default())
            .await;
        let body = body_of(&requests[0]);

        assert_eq!(body["device"], json!({"ua": "agent"}));
        assert_eq!(body["source"], json!({"tid": "tid"}));
        assert_eq!(body["ext"]["schain"]["complete"], 0);
        assert_eq!(body["ext"]["schain"]["nodes"].as_array().map(Vec::len), Some(2));
        assert_eq!(body["ext"]["schain"]["nodes"][0]["asi"], "upstream.com");
        assert_eq!(body["ext"].get("prebid"), None);
    }

    fn response(status_code: u16, body: &str) -> ResponseData {
        ResponseData {
            status_code,
            body: body.as_bytes().to_vec(),
            ..Default::default()
        }
    }

    fn request_data() -> RequestData {
        RequestData {
            method: Method::POST,
            uri: "http://xandr.test/openrtb2".to_string(),
            body: Vec::new(),
            headers: OUTBOUND_HEADERS.clone(),
        }
    }

    #[test]
    fn no_content_yields_nothing() {
        let (bids, errors) = adapter(StubEnricher::new(Ok(()))).make_bids(&bid_request(), &request_data(), &response(204, ""));
        assert!(bids.is_none());
        assert!(errors.is_empty());
    }

    #[test]
    fn bad_request_is_bad_input() {
        let (bids, errors) = adapter(StubEnricher::new(Ok(()))).make_bids(&bid_request(), &request_data(), &response(400, ""));
        assert!(bids.is_none());
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], AdapterError::BadInput(_)));
    }

    #[test]
    fn other_statuses_are_server_errors() {
        let (bids, errors) = adapter(StubEnricher::new(Ok(()))).make_bids(&bid_request(), &request_data(), &response(502, ""));
        assert!(bids.is_none());
        assert_eq!(errors.len(), 1);
        match &errors[0] {
            AdapterError::BadServerResponse(message) => assert!(message.contains("502")),
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn malformed_body_is_a_decoding_error() {
        let (bids, errors) = adapter(StubEnricher::new(Ok(()))).make_bids(&bid_request(), &request_data(), &response(200, "{\"id\": "));
        assert!(bids.is_none());
        assert!(matches!(errors[..], [AdapterError::Decoding(_)]));
    }

    #[test]
    fn bid_without_price_keeps_its_siblings() {
        let body = json!({
            "seatbid": [{"bid": [
                {"id": "b", "impid": "1"},
                {"id": "c", "impid": "1", "price": 2}
            ]}]
        })
        .to_string();

        let (bids, errors) = adapter(StubEnricher::new(Ok(()))).make_bids(&bid_request(), &request_data(), &response(200, &body));
        assert!(errors.is_empty(), "{:?}", errors);

        let bids = bids.unwrap();
        assert_eq!(bids.bids.len(), 2);
        assert_eq!(bids.bids[0].bid.price, 0.0);
        assert_eq!(bids.bids[1].bid.price, 2.0);
    }

    #[test]
    fn every_bid_becomes_a_video_bid() {
        let body = json!({
            "id": "test-request-id",
            "cur": "EUR",
            "seatbid": [
                {"seat": "a", "bid": [
                    {"id": "b1", "impid": "test-imp-id", "price": 0.5, "adm": "<VAST/>", "crid": "c1"},
                    {"id": "b2", "impid": "test-imp-id", "price": 0.7}
                ]},
                {"seat": "b", "bid": [{"id": "b3", "impid": "test-imp-id", "price": 1.2, "burl": "http://billing"}]}
            ]
        })
        .to_string();

        let (bids, errors) = adapter(StubEnricher::new(Ok(()))).make_bids(&bid_request(), &request_data(), &response(200, &body));
        assert!(errors.is_empty());

        let bids = bids.unwrap();
        assert_eq!(bids.currency, "EUR");
        assert_eq!(bids.bids.len(), 3);
        assert!(bids.bids.iter().all(|b| b.bid_type == BidType::Video));
        let ids: Vec<_> = bids.bids.iter().map(|b| b.bid.id.as_str()).collect();
        assert_eq!(ids, vec!["b1", "b2", "b3"]);
        assert_eq!(bids.bids[2].bid.extra["burl"], "http://billing");
    }
}
