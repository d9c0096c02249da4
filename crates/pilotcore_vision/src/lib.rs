//! Screenshot tiling, screen-coordinate de-normalization, and highlight
//! overlay rendering (§3, §4.3).

pub mod error;
pub mod geometry;
pub mod tiler;

pub use error::{Result, VisionError};
pub use geometry::{Direction, GroundingTarget, NormalizedBox, ScreenCoord, ScreenGeometry, TILE_SIDE_PX};
pub use tiler::{png_dimensions, HighlightTarget, RgbaColor, Tiler};
