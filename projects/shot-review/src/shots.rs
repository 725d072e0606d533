// Shot list presentation
//
// Formats shot records into display cards and tracks which card is
// highlighted. Records themselves are never modified.

use crate::analysis::{ShotRecord, ShotResult};
use serde::Serialize;
use std::fmt::Write as _;

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct BadgePalette {
    pub background: &'static str,
    pub text: &'static str,
}

pub const MADE_PALETTE: BadgePalette = BadgePalette {
    background: "#dcfce7",
    text: "#166534",
};

pub const MISSED_PALETTE: BadgePalette = BadgePalette {
    background: "#fee2e2",
    text: "#991b1b",
};

impl ShotResult {
    pub fn badge(&self) -> &'static str {
        match self {
            ShotResult::Made => "MADE",
            ShotResult::Missed => "MISSED",
        }
    }

    pub fn palette(&self) -> BadgePalette {
        match self {
            ShotResult::Made => MADE_PALETTE,
            ShotResult::Missed => MISSED_PALETTE,
        }
    }
}

/// One formatted entry of the shot breakdown
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ShotCard {
    pub index: usize,
    pub badge: &'static str,
    pub palette: BadgePalette,
    pub timestamp: String,
    /// Outcome time in seconds, when the timestamp could be read
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome_secs: Option<f64>,
    pub shot_type: String,
    pub feedback: String,
    pub active: bool,
}

pub fn present_shot(index: usize, shot: &ShotRecord, active: bool) -> ShotCard {
    ShotCard {
        index,
        badge: shot.result.badge(),
        palette: shot.result.palette(),
        timestamp: shot.timestamp_of_outcome.clone(),
        outcome_secs: parse_outcome_timestamp(&shot.timestamp_of_outcome),
        shot_type: shot.shot_type.clone(),
        feedback: shot.feedback.clone(),
        active,
    }
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq)]
pub struct ShotSummary {
    pub attempts: usize,
    pub made: usize,
    pub missed: usize,
    /// Made / attempts, 0 when there were no attempts
    pub percentage: f64,
}

pub fn summarize(shots: &[ShotRecord]) -> ShotSummary {
    let made = shots
        .iter()
        .filter(|s| s.result == ShotResult::Made)
        .count();
    let attempts = shots.len();
    let percentage = if attempts > 0 {
        made as f64 / attempts as f64 * 100.0
    } else {
        0.0
    };
    ShotSummary {
        attempts,
        made,
        missed: attempts - made,
        percentage,
    }
}

/// Read an outcome timestamp such as "0:05.0", "01:12.5", "1:02:03" or "7.5"
/// into seconds.
pub fn parse_outcome_timestamp(text: &str) -> Option<f64> {
    let parts: Vec<&str> = text.trim().split(':').collect();
    if parts.len() > 3 || parts.iter().any(|p| p.trim().is_empty()) {
        return None;
    }
    let mut total = 0.0;
    for part in &parts {
        let value: f64 = part.trim().parse().ok()?;
        if !value.is_finite() || value < 0.0 {
            return None;
        }
        total = total * 60.0 + value;
    }
    Some(total)
}

/// Shot breakdown with a highlighted entry. Selection starts at the first
/// shot and only ever changes the highlight.
#[derive(Debug, Clone)]
pub struct ShotList {
    shots: Vec<ShotRecord>,
    active: usize,
}

impl ShotList {
    pub fn new(shots: Vec<ShotRecord>) -> Self {
        Self { shots, active: 0 }
    }

    /// Highlight the shot at `index`. Out-of-range selections are ignored.
    pub fn select(&mut self, index: usize) -> bool {
        if index < self.shots.len() {
            self.active = index;
            true
        } else {
            false
        }
    }

    pub fn active(&self) -> usize {
        self.active
    }

    pub fn shots(&self) -> &[ShotRecord] {
        &self.shots
    }

    pub fn cards(&self) -> Vec<ShotCard> {
        self.shots
            .iter()
            .enumerate()
            .map(|(i, shot)| present_shot(i, shot, i == self.active))
            .collect()
    }

    pub fn summary(&self) -> ShotSummary {
        summarize(&self.shots)
    }

    /// Plain-text rendering for terminals.
    pub fn render_text(&self) -> String {
        let mut out = String::from("Shot Breakdown\n");
        if self.shots.is_empty() {
            out.push_str("  (no shots detected)\n");
            return out;
        }
        for card in self.cards() {
            let marker = if card.active { '>' } else { ' ' };
            let _ = writeln!(
                out,
                "{} #{:<2} [{:<6}] {:>8}  {}",
                marker,
                card.index + 1,
                card.badge,
                card.timestamp,
                card.shot_type
            );
            if !card.feedback.is_empty() {
                let _ = writeln!(out, "      {}", card.feedback);
            }
        }
        let summary = self.summary();
        let _ = writeln!(
            out,
            "{} made / {} missed ({:.1}%)",
            summary.made, summary.missed, summary.percentage
        );
        out
    }
}
