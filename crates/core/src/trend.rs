//! Score aggregation rules shared by reports and display code.

use serde::{Deserialize, Serialize};

/// Minimum gap between half-period means before a trend is called.
pub const TREND_THRESHOLD: f64 = 0.5;

/// Direction of a student's recent performance relative to earlier in the period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Improving,
    Stable,
    Declining,
}

/// Display band for a 0–10 score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreBand {
    Good,
    Medium,
    Low,
}

/// `>= 8` good, `6..8` medium, below 6 low.
#[must_use]
pub fn score_band(score: f64) -> ScoreBand {
    if score >= 8.0 {
        ScoreBand::Good
    } else if score >= 6.0 {
        ScoreBand::Medium
    } else {
        ScoreBand::Low
    }
}

/// Arithmetic mean, `None` for an empty slice.
#[must_use]
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    #[allow(clippy::cast_precision_loss)]
    let len = values.len() as f64;
    Some(values.iter().sum::<f64>() / len)
}

/// Classify a chronologically ordered list of scores.
///
/// The list is split into a first and second half of `len / 2` scores each;
/// with an odd length the middle score belongs to neither half. The second
/// half's mean must beat the first by more than [`TREND_THRESHOLD`] to count
/// as improving (or trail it by more than that to count as declining).
/// Fewer than two scores is always stable.
#[must_use]
pub fn classify_trend(scores: &[f64]) -> Trend {
    let half = scores.len() / 2;
    if half == 0 {
        return Trend::Stable;
    }
    let (Some(early), Some(recent)) = (
        mean(&scores[..half]),
        mean(&scores[scores.len() - half..]),
    ) else {
        return Trend::Stable;
    };

    let delta = recent - early;
    if delta > TREND_THRESHOLD {
        Trend::Improving
    } else if delta < -TREND_THRESHOLD {
        Trend::Declining
    } else {
        Trend::Stable
    }
}
