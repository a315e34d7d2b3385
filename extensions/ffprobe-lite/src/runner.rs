//! Locating and running the ffprobe executable

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use serde::Deserialize;
use serde_json::{Map, Value};
use tokio::process::Command;

use crate::types::{MediaError, MediaResult};

/// Arguments placed before the media path
pub const FFPROBE_ARGS: [&str; 6] = [
    "-v",
    "quiet",
    "-print_format",
    "json",
    "-show_format",
    "-show_streams",
];

/// Parsed ffprobe output; absent sections are empty
#[derive(Debug, Default, Deserialize)]
pub struct FfprobeReport {
    #[serde(default)]
    pub format: Map<String, Value>,
    #[serde(default)]
    pub streams: Vec<Value>,
}

/// Find `binary` on `PATH`, or check it directly when it names a path
pub fn locate(binary: &str) -> Option<PathBuf> {
    let candidate = Path::new(binary);
    if candidate.components().count() > 1 {
        return candidate.is_file().then(|| candidate.to_path_buf());
    }

    let search = std::env::var_os("PATH")?;
    std::env::split_paths(&search)
        .map(|dir| dir.join(binary))
        .find(|path| path.is_file())
}

/// Run ffprobe on `media`, killing it if `timeout` passes first
pub async fn run(binary: &Path, media: &Path, timeout: Duration) -> MediaResult<FfprobeReport> {
    let mut cmd = Command::new(binary);
    cmd.args(FFPROBE_ARGS)
        .arg(media)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .kill_on_drop(true);

    let output = match tokio::time::timeout(timeout, cmd.output()).await {
        Ok(Ok(output)) => output,
        Ok(Err(e)) => return Err(MediaError::Failed(e.to_string())),
        Err(_elapsed) => {
            tracing::warn!(timeout_secs = timeout.as_secs(), "ffprobe timed out");
            return Err(MediaError::Timeout(timeout.as_secs()));
        }
    };

    if !output.status.success() {
        return Err(MediaError::Failed(output.status.to_string()));
    }

    serde_json::from_slice(&output.stdout).map_err(|e| MediaError::InvalidOutput(e.to_string()))
}
