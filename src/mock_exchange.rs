use axum::extract::{Path, Query};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{routing::{get, post}, Json, Router};
use axum::serve;
use rand::Rng;
use serde::Deserialize;
use tokio::net::TcpListener;
use tokio::time::{sleep, Duration};
use tracing::info;
use uuid::Uuid;

use crate::openrtb::request::BidRequest;
use crate::openrtb::response::{Bid, BidResponse, SeatBid};
use crate::targeting::segments::{TargetingData, TargetingResponse};

/// 模拟 Xandr 竞价：每个带 tagid 的 imp 返回一个视频出价，没有可出价的 imp 时返回 204
async fn handle_exchange_bid(Json(request): Json<BidRequest>) -> Response {
    info!(
        "Mock exchange received BidRequest: id={}, imp_count={}",
        request.id,
        request.imp.len()
    );

    // 模拟交易所处理延迟（10 ~ 50 毫秒）
    let delay_ms = rand::thread_rng().gen_range(10..50);
    sleep(Duration::from_millis(delay_ms)).await;

    let bids: Vec<Bid> = request
        .imp
        .iter()
        .filter(|imp| !imp.tagid.is_empty())
        .map(|imp| {
            let bid_id = format!("bid-{}", imp.id);
            let bidfloor = imp.bidfloor.unwrap_or(0.5);
            let price = bidfloor * rand::thread_rng().gen_range(1.0..2.5);
            Bid {
                id: bid_id.clone(),
                impid: imp.id.clone(),
                price,
                adm: Some(mock_vast(&bid_id)),
                crid: Some(format!("creative-{}", imp.tagid)),
                adomain: Some(vec!["advertiser.example".to_string()]),
                ..Default::default()
            }
        })
        .collect();

    if bids.is_empty() {
        return StatusCode::NO_CONTENT.into_response();
    }

    Json(BidResponse {
        id: request.id.clone(),
        seatbid: vec![SeatBid {
            bid: bids,
            seat: Some("mock_xandr_seat".to_string()),
            group: Some(0),
        }],
        bidid: Some(Uuid::new_v4().to_string()),
        cur: "USD".to_string(),
        ..Default::default()
    })
    .into_response()
}

fn mock_vast(bid_id: &str) -> String {
    format!(
        r#"<VAST version="3.0">
  <Ad id="{bid_id}">
    <InLine>
      <AdSystem>Mock Xandr</AdSystem>
      <AdTitle>Mock Video Ad</AdTitle>
      <Impression><![CDATA[http://exchange-tracker.local/impression?bid={bid_id}]]></Impression>
      <Creatives>
        <Creative>
          <Linear>
            <Duration>00:00:30</Duration>
            <MediaFiles>
              <MediaFile delivery="progressive" type="video/mp4" width="640" height="360" bitrate="500">
                http://example.com/video.mp4
              </MediaFile>
            </MediaFiles>
          </Linear>
        </Creative>
      </Creatives>
    </InLine>
  </Ad>
</VAST>"#,
        bid_id = bid_id
    )
}

#[derive(Deserialize, Debug)]
struct ContentSegmentsQuery {
    #[serde(default)]
    content_url: String,
}

/// 模拟内容定向服务，segment 由 content_url 稳定推导
async fn handle_content_segments(
    Path(site_id): Path<String>,
    Query(query): Query<ContentSegmentsQuery>,
) -> Json<TargetingResponse> {
    info!("Mock targeting lookup: site_id={}, content_url={}", site_id, query.content_url);

    let seed = query.content_url.bytes().fold(0u32, |acc, b| acc.wrapping_mul(31).wrapping_add(u32::from(b)));
    Json(TargetingResponse {
        uuid: Uuid::new_v4().to_string(),
        data: TargetingData {
            media_id: format!("{:08x}", seed),
            base_segments: vec![format!("{}", 80_000_000 + seed % 1_000_000)],
            targeting_profiles: vec![format!("{}", 90_000_000 + seed % 1_000)],
        },
    })
}

pub fn router() -> Router {
    Router::new()
        .route("/openrtb2", post(handle_exchange_bid))
        .route("/property/{site_id}/content_segments", get(handle_content_segments))
}

/// 启动 Mock 交易所 + 内容定向服务
pub async fn start_mock_exchange_server(port: u16) -> std::io::Result<()> {
    let addr = format!("0.0.0.0:{}", port);
    info!("Mock exchange running at http://{}", addr);

    let listener = TcpListener::bind(&addr).await?;
    serve(listener, router()).await
}
