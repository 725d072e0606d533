// Loaded review cache
//
// Reviews are immutable once imported, so each one is parsed and indexed on
// first use and then shared read-only across request tasks.

use crate::overlay::matcher::SampleIndex;
use crate::review_store::{load_review, Review};
use anyhow::{anyhow, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

lazy_static::lazy_static! {
    static ref REVIEW_CACHE: RwLock<HashMap<PathBuf, Arc<LoadedReview>>> =
        RwLock::new(HashMap::new());
}

/// A review ready for overlay queries
#[derive(Debug)]
pub struct LoadedReview {
    pub review: Review,
    pub index: SampleIndex,
}

impl LoadedReview {
    pub fn new(review: Review) -> Self {
        let index = SampleIndex::new(review.payload.tracking.clone().into());
        Self { review, index }
    }
}

/// Fetch a review from the cache, loading it from disk on a miss.
/// `Ok(None)` when the review does not exist.
pub fn get_review(review_root: &Path, review_id: &str) -> Result<Option<Arc<LoadedReview>>> {
    let key = review_root.join(review_id);
    if let Some(loaded) = REVIEW_CACHE
        .read()
        .map_err(|_| anyhow!("Review cache poisoned"))?
        .get(&key)
    {
        return Ok(Some(loaded.clone()));
    }

    let Some(review) = load_review(review_root, review_id)? else {
        return Ok(None);
    };
    tracing::info!(
        "Loaded review {} ({} shots, {} tracking samples)",
        review_id,
        review.payload.shots().len(),
        review.payload.tracking.len()
    );
    let loaded = Arc::new(LoadedReview::new(review));
    REVIEW_CACHE
        .write()
        .map_err(|_| anyhow!("Review cache poisoned"))?
        .insert(key, loaded.clone());
    Ok(Some(loaded))
}

