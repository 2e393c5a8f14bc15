//! Sample event rendering.

use std::path::Path;

use pkgbuild_shared::{PkgBuildError, Result};

/// File holding the sample event of a data stream.
const SAMPLE_EVENT_FILE: &str = "sample_event.json";

/// Render `sample_event.json` of a data stream as a fenced JSON block.
pub(crate) fn render_sample_event(data_stream: &str, data_stream_dir: &Path) -> Result<String> {
    let path = data_stream_dir.join(SAMPLE_EVENT_FILE);
    let content = std::fs::read_to_string(&path).map_err(|e| PkgBuildError::io(&path, e))?;

    let value: serde_json::Value = serde_json::from_str(&content).map_err(|e| {
        PkgBuildError::template(
            path.display().to_string(),
            format!("invalid sample event: {e}"),
        )
    })?;
    let pretty = serde_json::to_string_pretty(&value).map_err(|e| {
        PkgBuildError::template(path.display().to_string(), e.to_string())
    })?;

    Ok(format!(
        "An example event for `{data_stream}` looks as following:\n\n```json\n{pretty}\n```"
    ))
}
