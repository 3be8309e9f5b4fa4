//! Core types for the Dayscore engine
//!
//! This module defines the records the engine consumes (habits, day entries)
//! and the derived values it produces (day records, averages, breakdowns).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::StoreError;

/// Day-of-week category that selects which weight column applies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayKind {
    /// Monday through Thursday
    Weekday,
    Fri,
    Sat,
    Sun,
}

impl DayKind {
    /// Every kind, in weight-column order
    pub const ALL: [DayKind; 4] = [DayKind::Weekday, DayKind::Fri, DayKind::Sat, DayKind::Sun];

    pub fn as_str(&self) -> &'static str {
        match self {
            DayKind::Weekday => "weekday",
            DayKind::Fri => "fri",
            DayKind::Sat => "sat",
            DayKind::Sun => "sun",
        }
    }

    /// Friday, Saturday and Sunday all count as weekend in the weekday/weekend split
    pub fn is_weekend(&self) -> bool {
        !matches!(self, DayKind::Weekday)
    }
}

impl fmt::Display for DayKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for DayKind {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "weekday" => Ok(DayKind::Weekday),
            "fri" => Ok(DayKind::Fri),
            "sat" => Ok(DayKind::Sat),
            "sun" => Ok(DayKind::Sun),
            other => Err(StoreError::UnknownDayKind(other.to_string())),
        }
    }
}

/// Raw habit weights, one column per day kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DayWeights {
    #[serde(default)]
    pub weekday: f64,
    #[serde(default)]
    pub fri: f64,
    #[serde(default)]
    pub sat: f64,
    #[serde(default)]
    pub sun: f64,
}

impl DayWeights {
    pub fn new(weekday: f64, fri: f64, sat: f64, sun: f64) -> Self {
        Self {
            weekday,
            fri,
            sat,
            sun,
        }
    }

    /// Same weight for every kind
    pub fn uniform(weight: f64) -> Self {
        Self::new(weight, weight, weight, weight)
    }

    pub fn get(&self, kind: DayKind) -> f64 {
        match kind {
            DayKind::Weekday => self.weekday,
            DayKind::Fri => self.fri,
            DayKind::Sat => self.sat,
            DayKind::Sun => self.sun,
        }
    }

    pub fn set(&mut self, kind: DayKind, weight: f64) {
        match kind {
            DayKind::Weekday => self.weekday = weight,
            DayKind::Fri => self.fri = weight,
            DayKind::Sat => self.sat = weight,
            DayKind::Sun => self.sun = weight,
        }
    }
}

/// A tracked habit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Habit {
    /// Stable identifier, never changes after creation
    pub id: String,
    /// Display name
    pub name: String,
    /// Raw weights per day kind
    pub weights: DayWeights,
    /// Inactive habits stay in the store but are ignored by the engine
    pub active: bool,
}

/// Free-text journal answers; carried through untouched
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Answers {
    #[serde(default)]
    pub felt_good: String,
    #[serde(default)]
    pub learn_improve: String,
    #[serde(default)]
    pub other: String,
}

/// One day's journal entry and habit ratings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayEntry {
    pub date: NaiveDate,
    #[serde(default)]
    pub answers: Answers,
    /// Habit id to raw rating (1-10 when well formed)
    #[serde(default)]
    pub habits: BTreeMap<String, f64>,
}

impl DayEntry {
    /// Entry with no answers and no ratings
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            answers: Answers::default(),
            habits: BTreeMap::new(),
        }
    }

    /// Raw rating for a habit, if one was recorded
    pub fn rating(&self, habit_id: &str) -> Option<f64> {
        self.habits.get(habit_id).copied()
    }

    /// Builder-style rating insert, mostly for callers assembling snapshots in code
    pub fn with_rating(mut self, habit_id: impl Into<String>, rating: f64) -> Self {
        self.habits.insert(habit_id.into(), rating);
        self
    }
}

/// Habit id to percentage; sums to 100 over the habits it covers, or is empty
pub type NormalizedWeights = BTreeMap<String, f64>;

/// Sum of raw active weights per day kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct WeightTotals {
    pub weekday: f64,
    pub fri: f64,
    pub sat: f64,
    pub sun: f64,
}

impl WeightTotals {
    pub fn get(&self, kind: DayKind) -> f64 {
        match kind {
            DayKind::Weekday => self.weekday,
            DayKind::Fri => self.fri,
            DayKind::Sat => self.sat,
            DayKind::Sun => self.sun,
        }
    }

    /// Whether this kind's total rounds to exactly 100
    pub fn is_kind_balanced(&self, kind: DayKind) -> bool {
        self.get(kind).round() == 100.0
    }

    /// Whether every kind's total rounds to exactly 100
    pub fn is_balanced(&self) -> bool {
        DayKind::ALL.iter().all(|k| self.is_kind_balanced(*k))
    }
}

/// One row of the trailing window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayRecord {
    /// Short `MM-DD` label
    pub label: String,
    pub date: NaiveDate,
    pub kind: DayKind,
    /// Composite score, 0-100
    pub score: u8,
}

/// Average rating of one habit over the window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HabitAverage {
    pub id: String,
    pub name: String,
    /// Mean over recorded days only, one decimal; 0 when never recorded
    pub average: f64,
}

/// Mean composite score on weekdays vs. Fri/Sat/Sun
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct WeekdayWeekend {
    pub weekday: f64,
    pub weekend: f64,
}

/// One habit's share of a day score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HabitContribution {
    pub id: String,
    pub name: String,
    /// Normalized weight for the day's kind (percent)
    pub weight: f64,
    /// Rating after defaulting and clamping
    pub rating: u8,
    /// `(rating / 10) * weight`
    pub contribution: f64,
}

/// Day score with per-habit detail
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayBreakdown {
    pub date: NaiveDate,
    pub kind: DayKind,
    pub score: u8,
    pub habits: Vec<HabitContribution>,
}

/// Every window aggregation for one anchor date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyReport {
    pub anchor: NaiveDate,
    pub days: Vec<DayRecord>,
    pub weekly_average: f64,
    pub habit_averages: Vec<HabitAverage>,
    pub weekday_vs_weekend: WeekdayWeekend,
    /// Habit ids the subset average was computed over
    pub subset: Vec<String>,
    pub subset_average: f64,
}
