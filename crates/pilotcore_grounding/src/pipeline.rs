//! Converts a textual element description + tile identifier into a screen
//! coordinate (§4.4).

use std::sync::Arc;

use async_trait::async_trait;
use pilotcore_llm::{
    ContentGenerator, GenerateConfig, GenerateRequest, RequestMessage, RequestPart, RequestRole,
};
use pilotcore_vision::geometry::{GroundingTarget, NormalizedBox, ScreenCoord, ScreenGeometry};
use tokio_util::sync::CancellationToken;

use crate::error::{GroundingError, Result};
use crate::schema::{parse_detection, response_schema};

/// The outcome of a successful grounding call (§4.4 "Output on success").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroundingOutcome {
    pub tile_index: usize,
    pub bbox: NormalizedBox,
    pub screen_coordinate: ScreenCoord,
    pub label: Option<String>,
}

/// A callback invoked with every thought/text delta streamed from the
/// grounding model (§4.4: "surfaced via the same streaming channel ... tagged
/// `grounding_model`"). The runtime supplies one that forwards to
/// `SessionEvent::StreamMessage`.
pub trait GroundingStreamSink: Send + Sync {
    fn on_delta(&self, thought: Option<&str>, text: Option<&str>);
}

impl<F: Fn(Option<&str>, Option<&str>) + Send + Sync> GroundingStreamSink for F {
    fn on_delta(&self, thought: Option<&str>, text: Option<&str>) {
        self(thought, text)
    }
}

/// Narrow trait implemented by `GroundingPipeline`, depended on by the Tool
/// Catalog so tools don't need to know about the LLM boundary or the
/// screenshot geometry directly.
#[async_trait]
pub trait GroundingDetector: Send + Sync {
    /// Number of tiles available this turn, so callers can reject an
    /// out-of-range `image_id` before spending a model call (§4.5).
    fn tile_count(&self) -> usize;

    async fn detect(
        &self,
        tile_index: usize,
        element_description: &str,
    ) -> std::result::Result<GroundingOutcome, String>;
}

/// Detects one UI element within one tile by invoking the LLM in bounded-JSON
/// mode (§4.4). Built fresh per turn alongside the `ScreenGeometry` it is
/// bound to (§9: never a process-level singleton).
pub struct GroundingPipeline {
    generator: Arc<dyn ContentGenerator>,
    model: String,
    geometry: ScreenGeometry,
    tiles: Vec<Vec<u8>>,
    cancel: CancellationToken,
}

impl GroundingPipeline {
    pub fn new(
        generator: Arc<dyn ContentGenerator>,
        model: impl Into<String>,
        geometry: ScreenGeometry,
        tiles: Vec<Vec<u8>>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            generator,
            model: model.into(),
            geometry,
            tiles,
            cancel,
        }
    }

    pub fn geometry(&self) -> &ScreenGeometry {
        &self.geometry
    }

    /// Runs the full §4.4 algorithm for one tile/description pair, streaming
    /// thought/text deltas to `sink` as they arrive.
    pub async fn detect(
        &self,
        tile_index: usize,
        element_description: &str,
        sink: &dyn GroundingStreamSink,
    ) -> Result<GroundingOutcome> {
        let tile_png = self.tiles.get(tile_index).ok_or(GroundingError::TileOutOfRange {
            index: tile_index,
            count: self.tiles.len(),
        })?;
        if tile_index >= self.geometry.tile_count() {
            return Err(GroundingError::TileOutOfRange {
                index: tile_index,
                count: self.geometry.tile_count(),
            });
        }

        let request = GenerateRequest {
            model: self.model.clone(),
            contents: vec![RequestMessage {
                role: RequestRole::User,
                parts: vec![
                    RequestPart::Text(detection_prompt(element_description)),
                    RequestPart::InlineImage {
                        mime_type: "image/png",
                        data_base64: base64_encode(tile_png),
                    },
                ],
            }],
            config: GenerateConfig::grounding(response_schema()),
        };

        if self.cancel.is_cancelled() {
            return Err(GroundingError::Llm(pilotcore_llm::LlmError::Cancelled));
        }

        let mut stream = self.generator.generate_content_stream(request).await?;
        let mut text = String::new();

        use futures::StreamExt;
        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    return Err(GroundingError::Llm(pilotcore_llm::LlmError::Cancelled));
                }
                next = stream.next() => {
                    match next {
                        None => break,
                        Some(Err(e)) => return Err(GroundingError::Llm(e)),
                        Some(Ok(chunk)) => {
                            sink.on_delta(chunk.thought.as_deref(), chunk.text.as_deref());
                            if let Some(t) = chunk.text {
                                text.push_str(&t);
                            }
                        }
                    }
                }
            }
        }

        if text.trim().is_empty() {
            return Err(GroundingError::EmptyResponse);
        }

        let detection = parse_detection(&text)?;
        let bbox = detection.into_validated_box()?;

        let screen_coordinate = self
            .geometry
            .to_screen_coord(tile_index, GroundingTarget::Box(bbox))
            .ok_or(GroundingError::TileOutOfRange {
                index: tile_index,
                count: self.geometry.tile_count(),
            })?;

        Ok(GroundingOutcome {
            tile_index,
            bbox,
            screen_coordinate,
            label: detection.label,
        })
    }
}

#[async_trait]
impl GroundingDetector for GroundingPipeline {
    fn tile_count(&self) -> usize {
        self.tiles.len()
    }

    async fn detect(
        &self,
        tile_index: usize,
        element_description: &str,
    ) -> std::result::Result<GroundingOutcome, String> {
        GroundingPipeline::detect(self, tile_index, element_description, &|_, _| {})
            .await
            .map_err(|e| e.to_string())
    }
}

fn detection_prompt(element_description: &str) -> String {
    format!(
        "Locate the following UI element in this image and return its bounding box.\n\
         Element: {element_description}\n\
         Respond with a JSON object {{\"box_2d\": [ymin, xmin, ymax, xmax], \"label\": \"...\"}} \
         where each coordinate is an integer in [0, 1000] normalized to the image size."
    )
}

fn base64_encode(bytes: &[u8]) -> String {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    STANDARD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pilotcore_llm::fake::{FakeContentGenerator, ScriptedReply};
    use pilotcore_llm::ResponseChunk;

    fn geometry_and_tiles() -> (ScreenGeometry, Vec<Vec<u8>>) {
        let geometry = ScreenGeometry::new(1000, 1000);
        (geometry, vec![vec![0u8; 4]])
    }

    #[tokio::test]
    async fn detects_valid_box_and_converts_to_screen_coord() {
        let (geometry, tiles) = geometry_and_tiles();
        let generator = Arc::new(FakeContentGenerator::new().with_chunks(vec![ResponseChunk::text(
            r#"{"box_2d": [100, 100, 300, 300], "label": "File menu"}"#,
        )]));
        let pipeline = GroundingPipeline::new(
            generator,
            "grounding-model",
            geometry,
            tiles,
            CancellationToken::new(),
        );

        let outcome = pipeline
            .detect(0, "File menu", &|_, _| {})
            .await
            .unwrap();
        assert_eq!(outcome.tile_index, 0);
        assert_eq!(outcome.screen_coordinate, ScreenCoord { x: 200, y: 200 });
        assert_eq!(outcome.label.as_deref(), Some("File menu"));
    }

    #[tokio::test]
    async fn rejects_out_of_range_tile_index() {
        let (geometry, tiles) = geometry_and_tiles();
        let generator = Arc::new(FakeContentGenerator::new());
        let pipeline =
            GroundingPipeline::new(generator, "m", geometry, tiles, CancellationToken::new());
        let err = pipeline.detect(5, "x", &|_, _| {}).await.unwrap_err();
        assert!(matches!(err, GroundingError::TileOutOfRange { .. }));
    }

    #[tokio::test]
    async fn rejects_inverted_box() {
        let (geometry, tiles) = geometry_and_tiles();
        let generator = Arc::new(FakeContentGenerator::new().with_chunks(vec![ResponseChunk::text(
            r#"{"box_2d": [10, 10, 5, 20]}"#,
        )]));
        let pipeline =
            GroundingPipeline::new(generator, "m", geometry, tiles, CancellationToken::new());
        let err = pipeline.detect(0, "x", &|_, _| {}).await.unwrap_err();
        assert!(matches!(err, GroundingError::InvertedYRange { .. }));
    }

    #[tokio::test]
    async fn takes_first_element_when_response_is_array() {
        let (geometry, tiles) = geometry_and_tiles();
        let generator = Arc::new(FakeContentGenerator::new().with_chunks(vec![ResponseChunk::text(
            r#"[{"box_2d": [0, 0, 100, 100]}, {"box_2d": [900, 900, 950, 950]}]"#,
        )]));
        let pipeline =
            GroundingPipeline::new(generator, "m", geometry, tiles, CancellationToken::new());
        let outcome = pipeline.detect(0, "x", &|_, _| {}).await.unwrap();
        assert_eq!(outcome.bbox.xmax, 100);
    }

    #[tokio::test]
    async fn empty_stream_is_an_error() {
        let (geometry, tiles) = geometry_and_tiles();
        let generator = Arc::new(FakeContentGenerator::new().with_reply(ScriptedReply::Chunks(vec![])));
        let pipeline =
            GroundingPipeline::new(generator, "m", geometry, tiles, CancellationToken::new());
        let err = pipeline.detect(0, "x", &|_, _| {}).await.unwrap_err();
        assert!(matches!(err, GroundingError::EmptyResponse));
    }

    #[tokio::test]
    async fn stream_sink_receives_thought_and_text_deltas() {
        let (geometry, tiles) = geometry_and_tiles();
        let generator = Arc::new(FakeContentGenerator::new().with_chunks(vec![
            ResponseChunk::thought("looking for the button"),
            ResponseChunk::text(r#"{"box_2d": [0, 0, 10, 10]}"#),
        ]));
        let pipeline =
            GroundingPipeline::new(generator, "m", geometry, tiles, CancellationToken::new());

        let seen = std::sync::Mutex::new(Vec::new());
        let sink = |thought: Option<&str>, text: Option<&str>| {
            seen.lock()
                .unwrap()
                .push((thought.map(str::to_string), text.map(str::to_string)));
        };
        pipeline.detect(0, "x", &sink).await.unwrap();
        let seen = seen.into_inner().unwrap();
        assert_eq!(seen[0].0.as_deref(), Some("looking for the button"));
        assert!(seen[1].1.is_some());
    }
}
