use axum::{extract::State, http::StatusCode, response::{IntoResponse, Response}, Json};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

use crate::bidding::exchange_client::{ExchangeClient, ExchangeOutcome};
use crate::logging::auction_log::AuctionLog;
use crate::logging::runtime_logger::RuntimeLogger;
use crate::model::adapters::{Bidder, ExtraRequestInfo, TypedBid};
use crate::openrtb::request::BidRequest;

pub struct AppState {
    pub bidder: Arc<dyn Bidder>,
    pub exchange: ExchangeClient,
    pub runtime_logger: Arc<RuntimeLogger>,
}

/// 对外返回的归一化出价结果
#[derive(Serialize, Debug)]
pub struct HarnessResponse {
    pub currency: String,
    pub bids: Vec<TypedBid>,
    pub errors: Vec<String>,
}

/// **处理 OpenRTB 竞价请求**：构造 Xandr 请求、发出、解析出价
pub async fn handle_openrtb_request(
    State(state): State<Arc<AppState>>,
    Json(bid_request): Json<BidRequest>,
) -> Response {
    let mut auction_log = AuctionLog::new(&bid_request.id, bid_request.imp.len());

    let (requests, errors) = state
        .bidder
        .make_requests(&bid_request, &ExtraRequestInfo::default())
        .await;
    auction_log.add_errors(&errors);
    let mut messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();

    let mut harness_response = HarnessResponse {
        currency: String::new(),
        bids: Vec::new(),
        errors: Vec::new(),
    };

    let calls = state.exchange.execute_all(requests, bid_request.tmax).await;
    for call in calls {
        let status_code = match &call.outcome {
            ExchangeOutcome::Response(response) => Some(response.status_code),
            _ => None,
        };
        auction_log.add_exchange_call(&call.request.uri, call.outcome.status(), status_code, call.elapsed_ms);

        match call.outcome {
            ExchangeOutcome::Response(response) => {
                let (bidder_response, bid_errors) = state.bidder.make_bids(&bid_request, &call.request, &response);
                auction_log.add_errors(&bid_errors);
                messages.extend(bid_errors.iter().map(|e| e.to_string()));
                if let Some(bidder_response) = bidder_response {
                    auction_log.set_bids(bidder_response.bids.len(), &bidder_response.currency);
                    harness_response.currency = bidder_response.currency;
                    harness_response.bids.extend(bidder_response.bids);
                }
            }
            ExchangeOutcome::Timeout => {
                warn!(request_id = %bid_request.id, uri = %call.request.uri, "exchange call timed out");
                messages.push(format!("exchange call to {} timed out", call.request.uri));
            }
            ExchangeOutcome::Failed(reason) => {
                warn!(request_id = %bid_request.id, uri = %call.request.uri, "exchange call failed: {}", reason);
                messages.push(format!("exchange call to {} failed: {}", call.request.uri, reason));
            }
        }
    }

    state.runtime_logger.log_auction(&auction_log).await;

    if harness_response.bids.is_empty() {
        info!(request_id = %bid_request.id, errors = messages.len(), "no bids");
        return StatusCode::NO_CONTENT.into_response();
    }

    info!(request_id = %bid_request.id, bids = harness_response.bids.len(), "auction finished");
    harness_response.errors = messages;
    (StatusCode::OK, Json(harness_response)).into_response()
}
