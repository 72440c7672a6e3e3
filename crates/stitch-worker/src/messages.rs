//! JSON messages exchanged with the stitching task.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

use stitch_core::{Image, Progress, StitchOutcome};

use crate::{Result, WorkerError};

/// Start message from the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WorkerRequest {
    FindMatches { images: Vec<ImagePayload> },
}

/// One image on the wire. `pixels` is the RGBA buffer in standard base64.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImagePayload {
    pub pixels: String,
    pub width: u32,
    pub height: u32,
}

impl ImagePayload {
    pub fn encode(width: u32, height: u32, pixels: &[u8]) -> Self {
        Self {
            pixels: STANDARD.encode(pixels),
            width,
            height,
        }
    }

    /// Decode into a validated core image with the given index.
    pub fn decode(&self, index: usize) -> Result<Image> {
        let bytes = STANDARD
            .decode(&self.pixels)
            .map_err(|source| WorkerError::Decode { index, source })?;
        Ok(Image::from_rgba(index, self.width, self.height, bytes)?)
    }
}

/// Decode every payload, indexing images by their position in the request.
pub fn decode_images(images: &[ImagePayload]) -> Result<Vec<Image>> {
    images
        .iter()
        .enumerate()
        .map(|(index, payload)| payload.decode(index))
        .collect()
}

/// Events sent back to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WorkerEvent {
    Progress {
        step: String,
        percent: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        detail: Option<String>,
    },
    Result {
        positions: Vec<PositionPayload>,
        bounds: BoundsPayload,
        /// Indices no usable match reached; renderers should skip them.
        unplaced: Vec<usize>,
    },
    Error {
        message: String,
    },
}

impl WorkerEvent {
    /// Whether this event ends the run.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Progress { .. })
    }

    pub fn error(err: impl std::fmt::Display) -> Self {
        Self::Error {
            message: err.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionPayload {
    pub index: usize,
    pub x: f64,
    pub y: f64,
    pub scale: f64,
    pub placed: bool,
}

/// Canvas size plus the translation applied to every position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundsPayload {
    pub width: u32,
    pub height: u32,
    pub offset_x: f64,
    pub offset_y: f64,
}

impl From<Progress> for WorkerEvent {
    fn from(p: Progress) -> Self {
        Self::Progress {
            step: p.stage.as_str().to_string(),
            percent: p.percent,
            detail: p.detail,
        }
    }
}

impl From<&StitchOutcome> for WorkerEvent {
    fn from(outcome: &StitchOutcome) -> Self {
        let positions = outcome
            .positions
            .iter()
            .map(|p| PositionPayload {
                index: p.index,
                x: p.x,
                y: p.y,
                scale: p.scale,
                placed: p.placed,
            })
            .collect();
        Self::Result {
            positions,
            bounds: BoundsPayload {
                width: outcome.canvas.width,
                height: outcome.canvas.height,
                offset_x: outcome.canvas.offset_x,
                offset_y: outcome.canvas.offset_y,
            },
            unplaced: outcome.unplaced(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stitch_core::{Stage, StitchError};

    #[test]
    fn parses_find_matches_request() {
        let payload = serde_json::json!({
            "type": "find_matches",
            "images": [
                { "pixels": "AAAA/w==", "width": 1, "height": 1 },
                { "pixels": "/wAA/w==", "width": 1, "height": 1 }
            ]
        });
        let req: WorkerRequest = serde_json::from_value(payload).unwrap();
        let WorkerRequest::FindMatches { images } = req;
        assert_eq!(images.len(), 2);
        assert_eq!(images[1].pixels, "/wAA/w==");
    }

    #[test]
    fn rejects_unknown_request_type() {
        let payload = serde_json::json!({ "type": "stitch_now", "images": [] });
        assert!(serde_json::from_value::<WorkerRequest>(payload).is_err());
    }

    #[test]
    fn decode_builds_indexed_image() {
        let payload = ImagePayload::encode(2, 1, &[1, 2, 3, 255, 4, 5, 6, 255]);
        let img = payload.decode(7).unwrap();
        assert_eq!(img.index(), 7);
        assert_eq!(img.pixels(), &[1, 2, 3, 255, 4, 5, 6, 255]);
    }

    #[test]
    fn decode_rejects_bad_base64() {
        let payload = ImagePayload {
            pixels: "not base64!".into(),
            width: 1,
            height: 1,
        };
        let err = payload.decode(3).unwrap_err();
        assert!(matches!(err, WorkerError::Decode { index: 3, .. }));
    }

    #[test]
    fn decode_rejects_wrong_length() {
        let payload = ImagePayload::encode(2, 2, &[0; 4]);
        let err = payload.decode(0).unwrap_err();
        assert!(matches!(
            err,
            WorkerError::Core(StitchError::BufferSize { .. })
        ));
    }

    #[test]
    fn progress_event_shape() {
        let event = WorkerEvent::from(Progress {
            stage: Stage::Matching,
            percent: 40.0,
            detail: Some("pair 1/2".into()),
        });
        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            serde_json::json!({
                "type": "progress",
                "step": "matching",
                "percent": 40.0,
                "detail": "pair 1/2"
            })
        );
        assert!(!event.is_terminal());
    }

    #[test]
    fn progress_without_detail_omits_field() {
        let event = WorkerEvent::Progress {
            step: "done".into(),
            percent: 100.0,
            detail: None,
        };
        let value = serde_json::to_value(&event).unwrap();
        assert!(value.get("detail").is_none());
    }

    #[test]
    fn result_event_uses_camel_case_bounds() {
        let event = WorkerEvent::Result {
            positions: vec![PositionPayload {
                index: 0,
                x: 0.0,
                y: 0.0,
                scale: 1.0,
                placed: true,
            }],
            bounds: BoundsPayload {
                width: 170,
                height: 100,
                offset_x: 0.0,
                offset_y: -5.0,
            },
            unplaced: vec![],
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "result");
        assert_eq!(value["bounds"]["offsetY"], -5.0);
        assert_eq!(value["positions"][0]["placed"], true);
        assert!(event.is_terminal());
    }

    #[test]
    fn error_event_shape() {
        let event = WorkerEvent::error("boom");
        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            serde_json::json!({ "type": "error", "message": "boom" })
        );
    }
}
