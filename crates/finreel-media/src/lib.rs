//! FFmpeg CLI wrapper for rendering.
//!
//! This crate provides:
//! - Type-safe FFmpeg command building
//! - A runner with timeout, kill and stderr capture
//! - Concat demuxer and slate command composition
//! - Filter value escaping
//! - Self-cleaning scratch directories

pub mod command;
pub mod concat;
pub mod encoder;
pub mod error;
pub mod progress;
pub mod scratch;
pub mod slate;

pub use command::{FfmpegCommand, FfmpegRunner, DEFAULT_TIMEOUT_SECS};
pub use concat::{clip_file_name, concat_command, concat_list, write_concat_list};
pub use encoder::Encoder;
pub use error::{MediaError, MediaResult};
pub use progress::FfmpegProgress;
pub use scratch::ScratchDir;
pub use slate::{escape_filter_value, slate_command, unescape_filter_value, SlateGeometry, SlateStyle};
