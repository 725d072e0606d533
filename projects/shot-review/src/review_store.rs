use crate::analysis::AnalysisPayload;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

pub const PAYLOAD_FILE: &str = "payload.json";
pub const REVIEW_FILE: &str = "review.json";

#[derive(Error, Debug)]
#[error("Review already exists: {0}")]
pub struct ReviewExists(pub String);

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ReviewMetadata {
    pub original_name: String,
    pub created_at: DateTime<Utc>,
    pub review_id: String,
    #[serde(skip)]
    pub review_dir: PathBuf,
}

impl ReviewMetadata {
    pub fn payload_path(&self) -> PathBuf {
        self.review_dir.join(PAYLOAD_FILE)
    }
}

/// A stored review with its parsed payload
#[derive(Debug, Clone)]
pub struct Review {
    pub metadata: ReviewMetadata,
    pub payload: AnalysisPayload,
}

/// Find analysis payload files (`*.json`) under `payload_root`.
pub fn list_payloads(payload_root: &Path) -> Vec<PathBuf> {
    WalkDir::new(payload_root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| {
            e.path()
                .extension()
                .and_then(|s| s.to_str())
                .map(|s| s.to_lowercase() == "json")
                .unwrap_or(false)
        })
        .map(|e| e.path().to_path_buf())
        .collect()
}

/// Import a payload file as a new review named after the file stem.
/// The payload is validated, then stored verbatim.
pub fn create_review(review_root: &Path, payload_path: &Path) -> Result<ReviewMetadata> {
    let stem = payload_path
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| anyhow::anyhow!("Invalid payload name: {:?}", payload_path))?;

    let review_dir = review_root.join(stem);
    if review_dir.exists() {
        return Err(ReviewExists(stem.to_string()).into());
    }

    let payload = AnalysisPayload::from_path(payload_path)
        .with_context(|| format!("Rejected payload {:?}", payload_path))?;
    if payload.tracking.is_empty() {
        tracing::warn!("Review {} has no tracking data; overlay will stay hidden", stem);
    }

    let original_name = payload_path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or(stem)
        .to_string();
    let metadata = ReviewMetadata {
        original_name,
        created_at: Utc::now(),
        review_id: stem.to_string(),
        review_dir,
    };

    install_review(&metadata, payload_path)?;
    tracing::info!("Created review {} from {:?}", stem, payload_path);

    Ok(metadata)
}

/// Create the review directory and its files. A partially written directory
/// is removed again so the id stays available.
fn install_review(metadata: &ReviewMetadata, payload_path: &Path) -> Result<()> {
    let review_dir = &metadata.review_dir;
    fs::create_dir_all(review_dir)?;
    let result = write_review_files(metadata, payload_path);
    if result.is_err() {
        if let Err(e) = fs::remove_dir_all(review_dir) {
            tracing::warn!("Failed to clean up {:?}: {}", review_dir, e);
        }
    }
    result
}

fn write_review_files(metadata: &ReviewMetadata, payload_path: &Path) -> Result<()> {
    let review_dir = &metadata.review_dir;
    fs::copy(payload_path, review_dir.join(PAYLOAD_FILE))
        .with_context(|| format!("Failed to copy payload into {:?}", review_dir))?;
    let content = serde_json::to_string_pretty(metadata)?;
    fs::write(review_dir.join(REVIEW_FILE), content)?;
    Ok(())
}

pub fn list_reviews(review_root: &Path) -> Result<Vec<(String, ReviewMetadata)>> {
    let mut reviews = Vec::new();
    if !review_root.exists() {
        return Ok(reviews);
    }

    for entry in fs::read_dir(review_root)? {
        let entry = entry?;
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        let metadata_path = path.join(REVIEW_FILE);
        if !metadata_path.exists() {
            continue;
        }
        let content = fs::read_to_string(&metadata_path)?;
        let mut metadata: ReviewMetadata = serde_json::from_str(&content)
            .with_context(|| format!("Corrupt review metadata {:?}", metadata_path))?;
        metadata.review_dir = path.clone();
        let name = path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("unknown")
            .to_string();
        reviews.push((name, metadata));
    }

    reviews.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(reviews)
}

/// Load a stored review by id. `Ok(None)` when no such review exists.
pub fn load_review(review_root: &Path, review_id: &str) -> Result<Option<Review>> {
    let Some((_, metadata)) = list_reviews(review_root)?
        .into_iter()
        .find(|(id, _)| id == review_id)
    else {
        return Ok(None);
    };
    let payload = AnalysisPayload::from_path(&metadata.payload_path())
        .with_context(|| format!("Failed to load review {}", review_id))?;
    Ok(Some(Review { metadata, payload }))
}
