use crate::pipeline::PipelineResult;
use crate::{PagemarkError, Result};

/// Render a pipeline result as JSON.
///
/// Success serializes as `{"status":"ok","markdown":…,"title":…,"url":…}`,
/// failure as `{"status":"err","message":…}`.
pub fn to_json(result: &PipelineResult, pretty: bool) -> Result<String> {
    let json = if pretty { serde_json::to_string_pretty(result) } else { serde_json::to_string(result) };
    json.map_err(|e| PagemarkError::Serialization(e.to_string()))
}
