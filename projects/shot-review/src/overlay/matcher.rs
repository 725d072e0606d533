// Tracking sample matcher
//
// Picks the tracking sample closest in time to the playback position.
// Samples arrive in whatever order the analysis service produced them, so
// nothing here assumes they are sorted. On an exact distance tie the sample
// that comes first in the original sequence wins.

use crate::overlay::types::TrackingSample;
use std::sync::Arc;

/// Absolute time distance, with NaN treated as infinitely far away.
fn distance(sample: &TrackingSample, query_time: f64) -> f64 {
    let d = (sample.timestamp - query_time).abs();
    if d.is_nan() {
        f64::INFINITY
    } else {
        d
    }
}

/// Index of the sample nearest to `query_time`, by full linear scan.
pub fn nearest_index(samples: &[TrackingSample], query_time: f64) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, sample) in samples.iter().enumerate() {
        let d = distance(sample, query_time);
        match best {
            // strict comparison keeps the earliest sample on ties
            Some((_, best_d)) if d >= best_d => {}
            _ => best = Some((i, d)),
        }
    }
    best.map(|(i, _)| i)
}

/// Sample nearest to `query_time`. `None` only when `samples` is empty.
pub fn nearest_sample(samples: &[TrackingSample], query_time: f64) -> Option<&TrackingSample> {
    nearest_index(samples, query_time).map(|i| &samples[i])
}

/// Presorted view over a tracking sequence for O(log n) lookups.
///
/// Entries are ordered by `(timestamp, original index)`, so a binary search
/// followed by a walk over equidistant neighbours yields exactly the sample
/// [`nearest_index`] would pick. Samples with a non-finite timestamp are left
/// out of the sorted order; they can never beat a finite one.
#[derive(Debug, Clone)]
pub struct SampleIndex {
    samples: Arc<[TrackingSample]>,
    order: Vec<usize>,
}

impl SampleIndex {
    pub fn new(samples: Arc<[TrackingSample]>) -> Self {
        let mut order: Vec<usize> = (0..samples.len())
            .filter(|&i| samples[i].timestamp.is_finite())
            .collect();
        order.sort_by(|&a, &b| {
            samples[a]
                .timestamp
                .total_cmp(&samples[b].timestamp)
                .then(a.cmp(&b))
        });
        Self { samples, order }
    }

    pub fn samples(&self) -> &Arc<[TrackingSample]> {
        &self.samples
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Earliest and latest finite timestamps.
    pub fn time_span(&self) -> Option<(f64, f64)> {
        let first = self.order.first()?;
        let last = self.order.last()?;
        Some((self.samples[*first].timestamp, self.samples[*last].timestamp))
    }

    pub fn nearest_index(&self, query_time: f64) -> Option<usize> {
        if self.samples.is_empty() {
            return None;
        }
        if self.order.is_empty() || !query_time.is_finite() {
            return nearest_index(&self.samples, query_time);
        }

        let split = self
            .order
            .partition_point(|&i| self.samples[i].timestamp < query_time);

        let below = split.checked_sub(1).map(|p| self.dist_at(p, query_time));
        let above = (split < self.order.len()).then(|| self.dist_at(split, query_time));
        let best_d = match (below, above) {
            (Some(b), Some(a)) => b.min(a),
            (Some(b), None) => b,
            (None, Some(a)) => a,
            (None, None) => return None,
        };

        // Distances grow monotonically away from the split point, so every
        // sample at exactly `best_d` is contiguous around it.
        let mut winner = usize::MAX;
        let mut p = split;
        while p > 0 && self.dist_at(p - 1, query_time) == best_d {
            p -= 1;
            winner = winner.min(self.order[p]);
        }
        let mut p = split;
        while p < self.order.len() && self.dist_at(p, query_time) == best_d {
            winner = winner.min(self.order[p]);
            p += 1;
        }
        Some(winner)
    }

    pub fn nearest(&self, query_time: f64) -> Option<&TrackingSample> {
        self.nearest_index(query_time).map(|i| &self.samples[i])
    }

    fn dist_at(&self, pos: usize, query_time: f64) -> f64 {
        distance(&self.samples[self.order[pos]], query_time)
    }
}
