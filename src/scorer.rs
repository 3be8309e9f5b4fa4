//! Day scoring
//!
//! A day score is the weighted sum of every active habit's rating, scaled so
//! that all-10 ratings give 100. Unrated habits score as the minimum rating
//! here, unlike the window averages which leave them out entirely.

use chrono::NaiveDate;

use crate::calendar::classify;
use crate::normalizer::WeightNormalizer;
use crate::store::HabitStore;
use crate::types::{DayBreakdown, DayEntry, DayKind, Habit, HabitContribution};

/// Lowest rating a habit can carry
pub const MIN_RATING: u8 = 1;

/// Highest rating a habit can carry
pub const MAX_RATING: u8 = 10;

/// Scorer for turning one day's ratings into a composite score
pub struct DayScorer;

impl DayScorer {
    /// Composite 0-100 score for `entry` under `kind` weights
    pub fn score(entry: &DayEntry, kind: DayKind, habits: &[Habit]) -> u8 {
        let weights = WeightNormalizer::normalize(habits, kind);

        let total: f64 = habits
            .iter()
            .filter(|h| h.active)
            .map(|h| {
                let rating = clamp_rating(entry.rating(&h.id));
                let weight = weights.get(&h.id).copied().unwrap_or(0.0);
                contribution(rating, weight)
            })
            .sum();

        to_score(total)
    }

    /// Score with the per-habit weights and contributions behind it
    pub fn breakdown(entry: &DayEntry, date: NaiveDate, habits: &[Habit]) -> DayBreakdown {
        let kind = classify(date);
        let weights = WeightNormalizer::normalize(habits, kind);

        let contributions: Vec<HabitContribution> = habits
            .iter()
            .filter(|h| h.active)
            .map(|h| {
                let rating = clamp_rating(entry.rating(&h.id));
                let weight = weights.get(&h.id).copied().unwrap_or(0.0);
                HabitContribution {
                    id: h.id.clone(),
                    name: h.name.clone(),
                    weight,
                    rating,
                    contribution: contribution(rating, weight),
                }
            })
            .collect();

        let total: f64 = contributions.iter().map(|c| c.contribution).sum();

        DayBreakdown {
            date,
            kind,
            score: to_score(total),
            habits: contributions,
        }
    }

    /// Score the stored entry for `date`, or an empty entry if none exists
    pub fn score_date<S: HabitStore + ?Sized>(store: &S, date: NaiveDate) -> u8 {
        let kind = classify(date);
        match store.entry(date) {
            Some(entry) => Self::score(entry, kind, store.habits()),
            None => Self::score(&DayEntry::empty(date), kind, store.habits()),
        }
    }
}

/// Coerce a stored rating into 1-10.
///
/// Missing, zero and NaN ratings become the minimum; everything else is
/// rounded and clamped.
pub fn clamp_rating(raw: Option<f64>) -> u8 {
    let value = match raw {
        Some(v) if v != 0.0 && !v.is_nan() => v,
        _ => MIN_RATING as f64,
    };
    value
        .round()
        .clamp(MIN_RATING as f64, MAX_RATING as f64) as u8
}

/// Points a rating adds to the day at the given weight percentage
pub fn contribution(rating: u8, weight: f64) -> f64 {
    (rating as f64 / MAX_RATING as f64) * weight
}

fn to_score(total: f64) -> u8 {
    total.round().clamp(0.0, 100.0) as u8
}
