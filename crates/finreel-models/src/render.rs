//! Rendering service request and response bodies.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::object_path::ObjectPath;

/// Default slate duration in seconds.
pub const DEFAULT_SLATE_DURATION_SECS: f64 = 8.0;
/// Default slate width.
pub const DEFAULT_SLATE_WIDTH: u32 = 1920;
/// Default slate height.
pub const DEFAULT_SLATE_HEIGHT: u32 = 1080;

/// Longest slate the service will synthesize.
pub const MAX_SLATE_DURATION_SECS: f64 = 600.0;
/// Longest overlay text accepted, in characters.
pub const MAX_SLATE_TEXT_CHARS: usize = 1000;
/// Most clips accepted in one concatenation.
pub const MAX_CONCAT_CLIPS: usize = 500;

const MIN_DIMENSION: u32 = 16;
const MAX_WIDTH: u32 = 7680;
const MAX_HEIGHT: u32 = 4320;

/// Concatenate clips into one video.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConcatRequest {
    /// Source clips in playback order
    #[serde(default)]
    pub clip_paths: Vec<String>,
    /// Destination of the stitched video
    #[serde(default)]
    pub output_path: String,
}

impl ConcatRequest {
    pub fn new(clip_paths: Vec<String>, output_path: impl Into<String>) -> Self {
        Self {
            clip_paths,
            output_path: output_path.into(),
        }
    }

    /// Validate the request.
    pub fn validate(&self) -> Result<(), String> {
        if self.clip_paths.is_empty() || self.output_path.trim().is_empty() {
            return Err("clipPaths[] and outputPath required".to_string());
        }
        if self.clip_paths.len() > MAX_CONCAT_CLIPS {
            return Err(format!(
                "clipPaths cannot contain more than {} entries",
                MAX_CONCAT_CLIPS
            ));
        }
        for (i, path) in self.clip_paths.iter().enumerate() {
            ObjectPath::parse(path).map_err(|e| format!("clipPaths[{}]: {}", i, e))?;
        }
        ObjectPath::parse(&self.output_path).map_err(|e| format!("outputPath: {}", e))?;
        Ok(())
    }
}

/// Synthesize a title card.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SlateRequest {
    /// Overlay text, rendered verbatim
    #[serde(default)]
    pub text: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_sec: Option<f64>,

    /// Destination of the slate video
    #[serde(default)]
    pub output_path: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

impl SlateRequest {
    pub fn new(text: impl Into<String>, output_path: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            output_path: output_path.into(),
            ..Default::default()
        }
    }

    pub fn with_duration(mut self, secs: f64) -> Self {
        self.duration_sec = Some(secs);
        self
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    /// Requested duration, or the default.
    pub fn duration_secs(&self) -> f64 {
        self.duration_sec.unwrap_or(DEFAULT_SLATE_DURATION_SECS)
    }

    pub fn width(&self) -> u32 {
        self.width.unwrap_or(DEFAULT_SLATE_WIDTH)
    }

    pub fn height(&self) -> u32 {
        self.height.unwrap_or(DEFAULT_SLATE_HEIGHT)
    }

    /// Validate the request.
    pub fn validate(&self) -> Result<(), String> {
        if self.text.trim().is_empty() || self.output_path.trim().is_empty() {
            return Err("text and outputPath required".to_string());
        }
        if self.text.chars().count() > MAX_SLATE_TEXT_CHARS {
            return Err(format!(
                "text cannot exceed {} characters",
                MAX_SLATE_TEXT_CHARS
            ));
        }
        if self.text.contains('\0') {
            return Err("text cannot contain NUL characters".to_string());
        }

        let duration = self.duration_secs();
        if !duration.is_finite() || duration <= 0.0 || duration > MAX_SLATE_DURATION_SECS {
            return Err(format!(
                "durationSec must be greater than 0 and at most {}",
                MAX_SLATE_DURATION_SECS
            ));
        }

        let (width, height) = (self.width(), self.height());
        if !(MIN_DIMENSION..=MAX_WIDTH).contains(&width) {
            return Err(format!("width must be between {} and {}", MIN_DIMENSION, MAX_WIDTH));
        }
        if !(MIN_DIMENSION..=MAX_HEIGHT).contains(&height) {
            return Err(format!("height must be between {} and {}", MIN_DIMENSION, MAX_HEIGHT));
        }
        // yuv420p needs even dimensions
        if width % 2 != 0 || height % 2 != 0 {
            return Err("width and height must be even".to_string());
        }

        ObjectPath::parse(&self.output_path).map_err(|e| format!("outputPath: {}", e))?;
        Ok(())
    }
}

/// Successful render response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RenderResponse {
    pub ok: bool,
    pub output_path: String,
}

impl RenderResponse {
    pub fn ok(output_path: impl Into<String>) -> Self {
        Self {
            ok: true,
            output_path: output_path.into(),
        }
    }
}
