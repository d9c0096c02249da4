use thiserror::Error;

/// Errors from the Grounding Pipeline (§4.4, §7 "Grounding errors").
#[derive(Error, Debug)]
pub enum GroundingError {
    #[error("tile index {index} out of range (tiler produced {count} tiles)")]
    TileOutOfRange { index: usize, count: usize },

    #[error("grounding call failed: {0}")]
    Llm(#[from] pilotcore_llm::LlmError),

    #[error("grounding model returned no detection")]
    EmptyResponse,

    #[error("grounding model returned malformed JSON: {0}")]
    MalformedJson(String),

    #[error("box_2d must have exactly four elements, got {0}")]
    WrongBoxLength(usize),

    #[error("box_2d coordinate {0} is out of the [0, 1000] range")]
    CoordinateOutOfRange(i64),

    #[error("box_2d has ymin >= ymax ({ymin} >= {ymax})")]
    InvertedYRange { ymin: i32, ymax: i32 },

    #[error("box_2d has xmin >= xmax ({xmin} >= {xmax})")]
    InvertedXRange { xmin: i32, xmax: i32 },
}

pub type Result<T> = std::result::Result<T, GroundingError>;
