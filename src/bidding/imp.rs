use tracing::debug;

use crate::bidding::xandr::{set_xandr_video_ext, xandr_imp_ext};
use crate::errors::AdapterError;
use crate::model::params::{ExtImpBidder, ImpExtJwPlayer};
use crate::openrtb::request::{Imp, Video};

pub const NO_VALID_IMPS_MESSAGE: &str = "The bid request did not contain valid Imp objects.";

/// 解析 `imp.ext.bidder`，任何失败都指明 imp 的下标与 id
pub fn parse_bidder_params(index: usize, imp: &Imp) -> Result<ImpExtJwPlayer, AdapterError> {
    let bad_input = |reason: String| AdapterError::BadInput(format!("imp[{}] (id: {}): {}", index, imp.id, reason));

    let ext = imp.ext.as_ref().ok_or_else(|| bad_input("missing imp.ext".to_string()))?;
    let imp_ext = serde_json::from_value::<ExtImpBidder>(ext.clone())
        .map_err(|e| bad_input(format!("invalid imp.ext: {}", e)))?;
    let params: ImpExtJwPlayer = serde_json::from_value(imp_ext.bidder)
        .map_err(|e| bad_input(format!("invalid imp.ext.bidder: {}", e)))?;

    if params.placement_id.is_empty() {
        return Err(bad_input("Empty ext.prebid.bidder.jwplayer.placementId".to_string()));
    }
    Ok(params)
}

/// 按 Xandr 的要求改写 imp：tagid、`ext.appnexus.placement_id`、必须存在的 video
pub fn prepare_imp(imp: &mut Imp, placement_id: &str) {
    imp.tagid = placement_id.to_string();
    imp.ext = xandr_imp_ext(placement_id);

    let video = imp.video.get_or_insert_with(Video::default);
    set_xandr_video_ext(video);
}

/// 返回保留下来的 imp 以及被丢弃 imp 的错误
pub fn sanitize_imps(imps: Vec<Imp>) -> (Vec<Imp>, Vec<AdapterError>) {
    let mut valid_imps = Vec::with_capacity(imps.len());
    let mut errors = Vec::new();

    for (index, mut imp) in imps.into_iter().enumerate() {
        match parse_bidder_params(index, &imp) {
            Ok(params) => {
                prepare_imp(&mut imp, &params.placement_id);
                valid_imps.push(imp);
            }
            Err(err) => {
                debug!(index, imp_id = %imp.id, error = %err, "dropping imp");
                errors.push(err);
            }
        }
    }

    if valid_imps.is_empty() {
        errors.push(AdapterError::BadInput(NO_VALID_IMPS_MESSAGE.to_string()));
    }

    (valid_imps, errors)
}
