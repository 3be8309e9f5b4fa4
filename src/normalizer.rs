//! Weight normalization
//!
//! This module turns raw per-habit weights into day-kind percentages.
//! - Only active habits take part
//! - Percentages sum to 100 over the habits considered
//! - Non-positive totals degrade to an even split instead of failing

use std::collections::HashSet;

use tracing::debug;

use crate::types::{DayKind, Habit, NormalizedWeights, WeightTotals};

/// Normalizer for converting raw habit weights to percentages
pub struct WeightNormalizer;

impl WeightNormalizer {
    /// Normalize active habits' weights for `kind`.
    ///
    /// No active habits gives an empty map; callers must handle that case.
    pub fn normalize(habits: &[Habit], kind: DayKind) -> NormalizedWeights {
        distribute(habits.iter().filter(|h| h.active).collect(), kind)
    }

    /// Normalize over the active habits whose id is in `subset`.
    ///
    /// Ids that are unknown or inactive are ignored.
    pub fn normalize_subset<S: AsRef<str>>(
        habits: &[Habit],
        kind: DayKind,
        subset: &[S],
    ) -> NormalizedWeights {
        let wanted: HashSet<&str> = subset.iter().map(|s| s.as_ref()).collect();
        distribute(
            habits
                .iter()
                .filter(|h| h.active && wanted.contains(h.id.as_str()))
                .collect(),
            kind,
        )
    }

    /// Raw weight totals of active habits, per kind
    pub fn weight_totals(habits: &[Habit]) -> WeightTotals {
        let mut totals = WeightTotals::default();
        for habit in habits.iter().filter(|h| h.active) {
            totals.weekday += raw_weight(habit, DayKind::Weekday);
            totals.fri += raw_weight(habit, DayKind::Fri);
            totals.sat += raw_weight(habit, DayKind::Sat);
            totals.sun += raw_weight(habit, DayKind::Sun);
        }
        totals
    }

    /// Copy of `habits` with active weights rewritten to their percentages.
    ///
    /// Percentages are rounded to two decimals; an even split is not rounded.
    /// Inactive habits come back untouched.
    pub fn rebalanced(habits: &[Habit]) -> Vec<Habit> {
        let totals = Self::weight_totals(habits);
        let active_count = habits.iter().filter(|h| h.active).count().max(1);

        habits
            .iter()
            .map(|habit| {
                let mut habit = habit.clone();
                if !habit.active {
                    return habit;
                }
                for kind in DayKind::ALL {
                    let sum = totals.get(kind);
                    let weight = if sum <= 0.0 {
                        100.0 / active_count as f64
                    } else {
                        round2(raw_weight(&habit, kind) / sum * 100.0)
                    };
                    habit.weights.set(kind, weight);
                }
                habit
            })
            .collect()
    }
}

/// Raw weight with negative and non-finite values treated as zero
fn raw_weight(habit: &Habit, kind: DayKind) -> f64 {
    let weight = habit.weights.get(kind);
    if weight.is_finite() && weight > 0.0 {
        weight
    } else {
        0.0
    }
}

fn distribute(selected: Vec<&Habit>, kind: DayKind) -> NormalizedWeights {
    if selected.is_empty() {
        debug!(kind = %kind, "no active habits to normalize");
        return NormalizedWeights::new();
    }

    let sum: f64 = selected.iter().map(|h| raw_weight(h, kind)).sum();

    if sum <= 0.0 {
        let even = 100.0 / selected.len() as f64;
        debug!(kind = %kind, habits = selected.len(), "weights sum to zero, splitting evenly");
        return selected.iter().map(|h| (h.id.clone(), even)).collect();
    }

    selected
        .iter()
        .map(|h| (h.id.clone(), raw_weight(h, kind) / sum * 100.0))
        .collect()
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
