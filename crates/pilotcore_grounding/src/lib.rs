//! The Grounding Pipeline (§4.4): converts a natural-language element
//! description, within a given tile, into a concrete screen coordinate.

pub mod error;
pub mod pipeline;
pub mod schema;

pub use error::{GroundingError, Result};
pub use pipeline::{GroundingDetector, GroundingOutcome, GroundingPipeline, GroundingStreamSink};
pub use schema::Detection;
