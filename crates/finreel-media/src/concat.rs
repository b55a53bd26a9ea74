//! Clip concatenation via the concat demuxer.

use std::path::{Path, PathBuf};

use finreel_models::EncodingProfile;

use crate::command::FfmpegCommand;
use crate::error::MediaResult;

/// Name of the demuxer list inside the scratch directory.
pub const CONCAT_LIST_FILE: &str = "concat.txt";

/// Name of the stitched output inside the scratch directory.
pub const CONCAT_OUTPUT_FILE: &str = "final.mp4";

/// Local file name for the clip at `index`; names sort in input order.
pub fn clip_file_name(index: usize) -> String {
    format!("clip-{:04}.mp4", index)
}

/// Quote a path for a concat list entry.
///
/// Inside single quotes only `'` is special; it becomes `'\''`.
pub fn quote_concat_path(path: &Path) -> String {
    format!("'{}'", path.to_string_lossy().replace('\'', r"'\''"))
}

/// Demuxer list referencing `clips` in order.
pub fn concat_list(clips: &[PathBuf]) -> String {
    clips
        .iter()
        .map(|clip| format!("file {}\n", quote_concat_path(clip)))
        .collect()
}

/// Write the demuxer list for `clips` to `list_path`.
pub async fn write_concat_list(list_path: &Path, clips: &[PathBuf]) -> MediaResult<()> {
    tokio::fs::write(list_path, concat_list(clips)).await?;
    Ok(())
}

/// Re-encode the clips named in `list_path` into `output`.
pub fn concat_command(list_path: &Path, output: &Path, profile: &EncodingProfile) -> FfmpegCommand {
    FfmpegCommand::new(output)
        .input_with_args(["-f", "concat", "-safe", "0"], list_path.to_string_lossy())
        .profile(profile)
}
