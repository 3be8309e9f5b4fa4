//! Lenient loader for stored snapshots
//!
//! Stored JSON may come from older app versions, hand edits or imports. The
//! loader keeps everything it can, coerces what it can't keep as-is, and
//! reports each coercion so callers can surface it.

use chrono::NaiveDate;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashSet};
use thiserror::Error;
use tracing::warn;
use uuid::Uuid;

use crate::calendar::parse_date;
use crate::error::StoreError;
use crate::store::snapshot::{default_habits, Store};
use crate::types::{Answers, DayEntry, DayKind, DayWeights, Habit};

/// A value the loader had to coerce or drop
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("habits is not an array; default habits used")]
    HabitsNotArray,

    #[error("entries is not an object; no entries loaded")]
    EntriesNotObject,

    #[error("habit #{index} is not an object; skipped")]
    HabitNotObject { index: usize },

    #[error("habit #{index} has no id; assigned {assigned}")]
    MissingHabitId { index: usize, assigned: String },

    #[error("duplicate habit id {id}; later definition dropped")]
    DuplicateHabitId { id: String },

    #[error("habit {id} has no text name; using empty name")]
    InvalidHabitName { id: String },

    #[error("habit {id} has invalid {kind} weight {value}; using 0")]
    InvalidWeight {
        id: String,
        kind: DayKind,
        value: String,
    },

    #[error("habit {id} active flag is {value}; treated as inactive")]
    InvalidActiveFlag { id: String, value: String },

    #[error("entry key {key:?} is not a YYYY-MM-DD date; entry dropped")]
    InvalidEntryDate { key: String },

    #[error("entry {date} is not an object; entry dropped")]
    EntryNotObject { date: NaiveDate },

    #[error("entry {date} ratings are not an object; ratings dropped")]
    RatingsNotObject { date: NaiveDate },

    #[error("entry {date} rating for {habit} is {value}; rating dropped")]
    NonNumericRating {
        date: NaiveDate,
        habit: String,
        value: String,
    },

    #[error("entry {date} rating for {habit} is {value}, not an integer in 1-10; will be coerced")]
    InvalidRating {
        date: NaiveDate,
        habit: String,
        value: f64,
    },
}

/// A loaded snapshot plus everything that was coerced to produce it
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedStore {
    pub store: Store,
    pub issues: Vec<ValidationError>,
}

impl LoadedStore {
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Adapter for converting stored JSON to a typed [`Store`]
pub struct StoreAdapter;

impl StoreAdapter {
    /// Load a snapshot leniently.
    ///
    /// Only malformed JSON or a non-object root is an error. A missing or
    /// malformed `habits` falls back to the default habits; a missing or
    /// malformed `entries` falls back to no entries.
    pub fn parse(json: &str) -> Result<LoadedStore, StoreError> {
        let root = parse_root(json)?;
        let mut issues = Vec::new();

        let habits = match root.get("habits") {
            Some(Value::Array(items)) => parse_habits(items, &mut issues),
            Some(_) => {
                issues.push(ValidationError::HabitsNotArray);
                default_habits()
            }
            None => default_habits(),
        };

        let entries = match root.get("entries") {
            Some(Value::Object(map)) => parse_entries(map, &mut issues),
            Some(_) => {
                issues.push(ValidationError::EntriesNotObject);
                BTreeMap::new()
            }
            None => BTreeMap::new(),
        };

        Ok(finish(Store { habits, entries }, issues))
    }

    /// Merge an exported snapshot into `base`.
    ///
    /// `habits` and `entries` are each replaced wholesale when the import
    /// carries them; anything the import omits is kept from `base`.
    pub fn import(base: &Store, json: &str) -> Result<LoadedStore, StoreError> {
        let root = parse_root(json)?;
        let mut issues = Vec::new();
        let mut store = base.clone();

        match root.get("habits") {
            Some(Value::Array(items)) => store.habits = parse_habits(items, &mut issues),
            Some(_) => issues.push(ValidationError::HabitsNotArray),
            None => {}
        }

        match root.get("entries") {
            Some(Value::Object(map)) => store.entries = parse_entries(map, &mut issues),
            Some(_) => issues.push(ValidationError::EntriesNotObject),
            None => {}
        }

        Ok(finish(store, issues))
    }

    /// Issues found in `json` without keeping the loaded snapshot
    pub fn validate(json: &str) -> Result<Vec<ValidationError>, StoreError> {
        Ok(Self::parse(json)?.issues)
    }
}

fn parse_root(json: &str) -> Result<Map<String, Value>, StoreError> {
    match serde_json::from_str::<Value>(json)? {
        Value::Object(map) => Ok(map),
        other => Err(StoreError::InvalidRoot(json_type_name(&other).to_string())),
    }
}

fn finish(store: Store, issues: Vec<ValidationError>) -> LoadedStore {
    for issue in &issues {
        warn!(%issue, "coerced stored value");
    }
    LoadedStore { store, issues }
}

fn parse_habits(items: &[Value], issues: &mut Vec<ValidationError>) -> Vec<Habit> {
    let mut seen = HashSet::new();
    let mut habits = Vec::with_capacity(items.len());

    for (index, item) in items.iter().enumerate() {
        let Some(obj) = item.as_object() else {
            issues.push(ValidationError::HabitNotObject { index });
            continue;
        };

        let id = match obj.get("id").and_then(Value::as_str) {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => {
                let assigned = Uuid::new_v4().to_string();
                issues.push(ValidationError::MissingHabitId {
                    index,
                    assigned: assigned.clone(),
                });
                assigned
            }
        };

        if !seen.insert(id.clone()) {
            issues.push(ValidationError::DuplicateHabitId { id });
            continue;
        }

        let name = match obj.get("name").and_then(Value::as_str) {
            Some(name) => name.to_string(),
            None => {
                issues.push(ValidationError::InvalidHabitName { id: id.clone() });
                String::new()
            }
        };

        let weights = parse_weights(&id, obj.get("weights"), issues);

        let active = match obj.get("active") {
            Some(Value::Bool(flag)) => *flag,
            other => {
                issues.push(ValidationError::InvalidActiveFlag {
                    id: id.clone(),
                    value: describe(other),
                });
                false
            }
        };

        habits.push(Habit {
            id,
            name,
            weights,
            active,
        });
    }

    habits
}

fn parse_weights(id: &str, value: Option<&Value>, issues: &mut Vec<ValidationError>) -> DayWeights {
    let obj = value.and_then(Value::as_object);
    let mut weights = DayWeights::default();

    for kind in DayKind::ALL {
        let raw = obj.and_then(|o| o.get(kind.as_str()));
        match raw.and_then(as_number) {
            Some(w) if w.is_finite() && w >= 0.0 => weights.set(kind, w),
            _ => issues.push(ValidationError::InvalidWeight {
                id: id.to_string(),
                kind,
                value: describe(raw),
            }),
        }
    }

    weights
}

fn parse_entries(
    map: &Map<String, Value>,
    issues: &mut Vec<ValidationError>,
) -> BTreeMap<NaiveDate, DayEntry> {
    let mut entries = BTreeMap::new();

    for (key, value) in map {
        let date = match parse_date(key) {
            Ok(date) => date,
            Err(_) => {
                issues.push(ValidationError::InvalidEntryDate { key: key.clone() });
                continue;
            }
        };

        let Some(obj) = value.as_object() else {
            issues.push(ValidationError::EntryNotObject { date });
            continue;
        };

        let answers = obj.get("answers").map(parse_answers).unwrap_or_default();

        let habits = match obj.get("habits") {
            Some(Value::Object(ratings)) => parse_ratings(date, ratings, issues),
            Some(_) => {
                issues.push(ValidationError::RatingsNotObject { date });
                BTreeMap::new()
            }
            None => BTreeMap::new(),
        };

        entries.insert(
            date,
            DayEntry {
                date,
                answers,
                habits,
            },
        );
    }

    entries
}

fn parse_ratings(
    date: NaiveDate,
    ratings: &Map<String, Value>,
    issues: &mut Vec<ValidationError>,
) -> BTreeMap<String, f64> {
    let mut out = BTreeMap::new();

    for (habit, value) in ratings {
        let Some(rating) = as_number(value) else {
            issues.push(ValidationError::NonNumericRating {
                date,
                habit: habit.clone(),
                value: describe(Some(value)),
            });
            continue;
        };

        if rating.fract() != 0.0 || !(1.0..=10.0).contains(&rating) {
            issues.push(ValidationError::InvalidRating {
                date,
                habit: habit.clone(),
                value: rating,
            });
        }

        out.insert(habit.clone(), rating);
    }

    out
}

/// Answers are opaque; take whatever text is there
fn parse_answers(value: &Value) -> Answers {
    let text = |key: &str| {
        value
            .get(key)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    };
    Answers {
        felt_good: text("feltGood"),
        learn_improve: text("learnImprove"),
        other: text("other"),
    }
}

/// Numbers, and strings that hold a number
fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
        _ => None,
    }
}

fn describe(value: Option<&Value>) -> String {
    match value {
        None => "missing".to_string(),
        Some(v) => v.to_string(),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
