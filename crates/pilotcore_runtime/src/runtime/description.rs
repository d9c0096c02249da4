//! Renders a grounded call's `DescriptionSpec` (§4.5 "description producer")
//! into the content blocks shown in a tool-review request: text fragments
//! plus, for point/arrow targets, a stored highlighted screenshot.

use pilotcore_core::{ContentBlock, ImageRef};
use pilotcore_store::SessionStore;
use pilotcore_tools::DescriptionSpec;
use pilotcore_vision::{HighlightTarget, RgbaColor, ScreenGeometry, Tiler};

use crate::error::Result;

const HIGHLIGHT_WIDTH: u32 = 4;

/// Builds the description parts for one grounded call and, if it highlights
/// a screen target, stores the annotated PNG under `review-<reviewId>.png`.
pub(crate) async fn describe(
    store: &SessionStore,
    session_id: &str,
    geometry: &ScreenGeometry,
    screenshot_png: &[u8],
    review_id: &str,
    spec: &DescriptionSpec,
) -> Result<Vec<ContentBlock>> {
    let tiler = Tiler::new(geometry);

    match spec {
        DescriptionSpec::Plain { text } => Ok(vec![ContentBlock::text(text.clone())]),

        DescriptionSpec::Point { text, target } => {
            let png = tiler.highlight_box(screenshot_png, target.tile_index, target.bbox, RgbaColor::RED, HIGHLIGHT_WIDTH)?;
            let reference = store_review_image(store, session_id, review_id, &png).await?;
            Ok(vec![ContentBlock::text(text.clone()), ContentBlock::image(reference)])
        }

        DescriptionSpec::Arrow { text, start, end } => {
            let png = tiler.highlight_arrow(
                screenshot_png,
                HighlightTarget { tile_index: start.tile_index, bbox: start.bbox },
                HighlightTarget { tile_index: end.tile_index, bbox: end.bbox },
                (RgbaColor::RED, RgbaColor::RED),
                (HIGHLIGHT_WIDTH, HIGHLIGHT_WIDTH),
            )?;
            let reference = store_review_image(store, session_id, review_id, &png).await?;
            Ok(vec![ContentBlock::text(text.clone()), ContentBlock::image(reference)])
        }
    }
}

async fn store_review_image(store: &SessionStore, session_id: &str, review_id: &str, png: &[u8]) -> Result<ImageRef> {
    let file_name = format!("review-{review_id}.png");
    let sanitized = store.put_image(session_id, &file_name, png).await?;
    Ok(ImageRef::new(session_id, sanitized))
}
