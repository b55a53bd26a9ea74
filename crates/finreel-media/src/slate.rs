//! Title slate synthesis.
//!
//! The overlay text never enters the filter graph. It is written to a file
//! that `drawtext` reads with `expansion=none`, so characters that are
//! special to FFmpeg (`:` `'` `\` `%` `,` ...) render literally.

use std::path::Path;

use finreel_models::EncodingProfile;

use crate::command::FfmpegCommand;

/// Name of the text side-channel inside the scratch directory.
pub const SLATE_TEXT_FILE: &str = "slate.txt";

/// Name of the slate output inside the scratch directory.
pub const SLATE_OUTPUT_FILE: &str = "slate.mp4";

/// Font used when none is configured.
pub const DEFAULT_FONT_FILE: &str = "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf";

/// Visual style of the slate.
#[derive(Debug, Clone)]
pub struct SlateStyle {
    pub font_file: String,
    pub font_size: u32,
    pub font_color: String,
    pub background_color: String,
    pub box_color: String,
    pub box_border: u32,
}

impl Default for SlateStyle {
    fn default() -> Self {
        Self {
            font_file: DEFAULT_FONT_FILE.to_string(),
            font_size: 64,
            font_color: "white".to_string(),
            background_color: "black".to_string(),
            box_color: "black@0.4".to_string(),
            box_border: 24,
        }
    }
}

impl SlateStyle {
    pub fn with_font_file(mut self, font_file: impl Into<String>) -> Self {
        self.font_file = font_file.into();
        self
    }
}

/// Dimensions and length of a slate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlateGeometry {
    pub duration_secs: f64,
    pub width: u32,
    pub height: u32,
}

// =============================================================================
// Filter escaping
// =============================================================================

/// Escape a value for use inside a filter option in a `-vf` argument.
///
/// FFmpeg unescapes filter arguments twice: once when splitting the graph
/// (`\ ' [ ] , ;`) and once when splitting options (`\ ' : =`).
pub fn escape_filter_value(value: &str) -> String {
    escape_chars(&escape_chars(value, &['\\', '\'', ':', '=']), &['\\', '\'', '[', ']', ',', ';'])
}

/// Inverse of [`escape_filter_value`].
pub fn unescape_filter_value(escaped: &str) -> String {
    unescape_once(&unescape_once(escaped))
}

fn escape_chars(value: &str, special: &[char]) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if special.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn unescape_once(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(c);
        }
    }
    out
}

// =============================================================================
// Command composition
// =============================================================================

/// `drawtext` filter reading its text from `text_file`.
pub fn drawtext_filter(style: &SlateStyle, text_file: &Path) -> String {
    format!(
        "drawtext=fontfile={}:textfile={}:expansion=none:fontcolor={}:fontsize={}:box=1:boxcolor={}:boxborderw={}:x=(w-text_w)/2:y=(h-text_h)/2",
        escape_filter_value(&style.font_file),
        escape_filter_value(&text_file.to_string_lossy()),
        style.font_color,
        style.font_size,
        style.box_color,
        style.box_border,
    )
}

/// Solid background plus silent stereo audio with centered text.
pub fn slate_command(
    geometry: SlateGeometry,
    style: &SlateStyle,
    text_file: &Path,
    output: &Path,
    profile: &EncodingProfile,
) -> FfmpegCommand {
    let duration = geometry.duration_secs.to_string();

    FfmpegCommand::new(output)
        .lavfi_input(format!(
            "color=c={}:s={}x{}:d={}",
            style.background_color, geometry.width, geometry.height, duration
        ))
        .input_with_args(
            ["-f", "lavfi", "-t", duration.as_str()],
            "anullsrc=channel_layout=stereo:sample_rate=44100",
        )
        .shortest()
        .video_filter(drawtext_filter(style, text_file))
        .profile(profile)
}
