// Analysis payload definitions
//
// The analysis service answers an upload with one JSON document holding the
// shot breakdown, the head tracking samples and the video metadata. This
// module parses that document leniently: bad tracking entries are dropped,
// missing metadata reads as an unsized video, and an analysis the service
// itself failed to produce is reported as an error.

use crate::overlay::types::{TrackingSample, VideoMetadata};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PayloadError {
    #[error("Failed to read payload {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid payload JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Payload is not a JSON object")]
    NotAnObject,

    #[error("Analysis failed upstream: {message}")]
    AnalysisFailed {
        message: String,
        raw_response: Option<String>,
    },
}

/// Outcome of one shot attempt
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(from = "String", rename_all = "lowercase")]
pub enum ShotResult {
    Made,
    Missed,
}

impl From<String> for ShotResult {
    fn from(value: String) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "made" => ShotResult::Made,
            "missed" => ShotResult::Missed,
            other => {
                tracing::warn!("Unknown shot result '{}', treating as missed", other);
                ShotResult::Missed
            }
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ShotRecord {
    pub result: ShotResult,
    #[serde(default)]
    pub shot_type: String,
    /// Outcome time as reported, e.g. "0:05.0"
    #[serde(default)]
    pub timestamp_of_outcome: String,
    #[serde(default)]
    pub feedback: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_shots_made_so_far: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_shots_missed_so_far: Option<u32>,
}

/// Shot breakdown; list order is display order.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct AnalysisResult {
    #[serde(default)]
    pub shots: Vec<ShotRecord>,
}

/// Parsed service response
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct AnalysisPayload {
    pub analysis: AnalysisResult,
    pub tracking: Vec<TrackingSample>,
    pub metadata: VideoMetadata,
    /// Tracking entries dropped for missing or non-finite fields
    #[serde(skip)]
    pub skipped_samples: usize,
}

impl AnalysisPayload {
    pub fn from_path(path: &Path) -> Result<Self, PayloadError> {
        let content = fs::read_to_string(path).map_err(|source| PayloadError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        content.parse()
    }

    pub fn from_value(value: Value) -> Result<Self, PayloadError> {
        let Value::Object(mut root) = value else {
            return Err(PayloadError::NotAnObject);
        };

        let analysis = parse_analysis(root.remove("analysis"))?;

        let (tracking, skipped_samples) = match root.remove("tracking") {
            Some(Value::Array(entries)) => parse_tracking(entries),
            Some(Value::Null) | None => (Vec::new(), 0),
            Some(other) => {
                tracing::warn!("Ignoring non-array tracking field: {}", other);
                (Vec::new(), 0)
            }
        };

        let metadata = match root.remove("metadata") {
            Some(Value::Null) | None => VideoMetadata::default(),
            Some(v) => serde_json::from_value(v)?,
        };

        Ok(Self {
            analysis,
            tracking,
            metadata,
            skipped_samples,
        })
    }

    pub fn shots(&self) -> &[ShotRecord] {
        &self.analysis.shots
    }
}

impl FromStr for AnalysisPayload {
    type Err = PayloadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: Value = serde_json::from_str(strip_code_fence(s))?;
        Self::from_value(value)
    }
}

fn parse_analysis(value: Option<Value>) -> Result<AnalysisResult, PayloadError> {
    let Some(value) = value else {
        return Ok(AnalysisResult::default());
    };
    if let Some(error) = value.get("error") {
        let message = error
            .as_str()
            .map(str::to_string)
            .unwrap_or_else(|| error.to_string());
        let raw_response = value
            .get("raw_response")
            .and_then(Value::as_str)
            .map(str::to_string);
        return Err(PayloadError::AnalysisFailed {
            message,
            raw_response,
        });
    }
    if value.is_null() {
        return Ok(AnalysisResult::default());
    }
    Ok(serde_json::from_value(value)?)
}

fn parse_tracking(entries: Vec<Value>) -> (Vec<TrackingSample>, usize) {
    let total = entries.len();
    let samples: Vec<TrackingSample> = entries
        .into_iter()
        .filter_map(|entry| serde_json::from_value::<TrackingSample>(entry).ok())
        .filter(|s| s.timestamp.is_finite() && s.head_x.is_finite() && s.head_y.is_finite())
        .collect();
    let skipped = total - samples.len();
    if skipped > 0 {
        tracing::warn!("Skipped {} of {} tracking samples", skipped, total);
    }
    (samples, skipped)
}

/// Model output sometimes arrives wrapped in a Markdown code block.
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = rest.strip_prefix("json").unwrap_or(rest);
    let body = body.strip_suffix("```").unwrap_or(body);
    body.trim()
}
