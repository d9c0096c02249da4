use thiserror::Error;

#[derive(Error, Debug)]
pub enum VisionError {
    #[error("screenshot resolution {actual_w}x{actual_h} does not match the geometry that created this tiler ({expected_w}x{expected_h})")]
    ResolutionMismatch {
        expected_w: u32,
        expected_h: u32,
        actual_w: u32,
        actual_h: u32,
    },

    #[error("tile index {index} out of range (geometry has {count} tile(s))")]
    TileIndexOutOfRange { index: usize, count: usize },

    #[error("failed to decode image: {0}")]
    Decode(String),

    #[error("failed to encode PNG: {0}")]
    Encode(String),
}

pub type Result<T> = std::result::Result<T, VisionError>;
