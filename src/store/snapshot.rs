//! Store snapshot definition
//!
//! The snapshot shape matches the exported JSON:
//! `{ "habits": [...], "entries": { "YYYY-MM-DD": {...} } }`.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::error::StoreError;
use crate::scorer::clamp_rating;
use crate::types::{Answers, DayEntry, DayKind, DayWeights, Habit};

/// Weight given to every kind on a freshly added habit
pub const DEFAULT_PLACEHOLDER_WEIGHT: f64 = 5.0;

/// Name given to a freshly added habit
pub const DEFAULT_PLACEHOLDER_NAME: &str = "New Habit";

/// Read access the engine needs from a habit store.
///
/// The engine never writes through this trait; callers own the data and are
/// responsible for not mutating it while an aggregation runs.
pub trait HabitStore {
    /// Every habit, active or not, in display order
    fn habits(&self) -> &[Habit];

    /// Stored entry for `date`, if any
    fn entry(&self, date: NaiveDate) -> Option<&DayEntry>;

    /// Ids of active habits, in display order
    fn active_ids(&self) -> Vec<String> {
        self.habits()
            .iter()
            .filter(|h| h.active)
            .map(|h| h.id.clone())
            .collect()
    }
}

/// In-memory snapshot of habits and dated entries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Store {
    #[serde(default)]
    pub habits: Vec<Habit>,
    #[serde(default)]
    pub entries: BTreeMap<NaiveDate, DayEntry>,
}

impl Default for Store {
    fn default() -> Self {
        Self::new(default_habits())
    }
}

impl Store {
    /// Snapshot with the given habits and no entries
    pub fn new(habits: Vec<Habit>) -> Self {
        Self {
            habits,
            entries: BTreeMap::new(),
        }
    }

    /// Look up a habit by id
    pub fn habit(&self, id: &str) -> Option<&Habit> {
        self.habits.iter().find(|h| h.id == id)
    }

    /// Mutable access to a habit by id
    pub fn habit_mut(&mut self, id: &str) -> Result<&mut Habit, StoreError> {
        self.habits
            .iter_mut()
            .find(|h| h.id == id)
            .ok_or_else(|| StoreError::UnknownHabit(id.to_string()))
    }

    /// Append a habit at the end of the display order
    pub fn add_habit(&mut self, habit: Habit) -> &mut Habit {
        self.habits.push(habit);
        let last = self.habits.len() - 1;
        &mut self.habits[last]
    }

    /// Drop a habit. Ratings already stored under its id stay in the entries.
    pub fn remove_habit(&mut self, id: &str) -> Result<Habit, StoreError> {
        let index = self
            .habits
            .iter()
            .position(|h| h.id == id)
            .ok_or_else(|| StoreError::UnknownHabit(id.to_string()))?;
        Ok(self.habits.remove(index))
    }

    /// Record ratings for `date` on top of whatever is stored for that day.
    ///
    /// Ratings are rounded and clamped to 1..=10 before they are stored.
    /// Every id must name a habit in the store; nothing is written otherwise.
    pub fn rate(
        &mut self,
        date: NaiveDate,
        ratings: &[(String, f64)],
        edit_answers: impl FnOnce(&mut Answers),
    ) -> Result<&DayEntry, StoreError> {
        if let Some((id, _)) = ratings.iter().find(|(id, _)| self.habit(id).is_none()) {
            return Err(StoreError::UnknownHabit(id.clone()));
        }

        let mut entry = self.entry_or_empty(date);
        for (id, rating) in ratings {
            entry.habits.insert(id.clone(), clamp_rating(Some(*rating)) as f64);
        }
        edit_answers(&mut entry.answers);
        self.put_entry(entry);

        Ok(&self.entries[&date])
    }

    /// Stored entry for `date`, or an empty one
    pub fn entry_or_empty(&self, date: NaiveDate) -> DayEntry {
        self.entries
            .get(&date)
            .cloned()
            .unwrap_or_else(|| DayEntry::empty(date))
    }

    /// Insert or replace the entry for its date
    pub fn put_entry(&mut self, entry: DayEntry) {
        self.entries.insert(entry.date, entry);
    }

    /// Strict load: the JSON must already match the snapshot shape
    pub fn from_json(json: &str) -> Result<Self, StoreError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize the snapshot to compact JSON
    pub fn to_json(&self) -> Result<String, StoreError> {
        serde_json::to_string(self).map_err(|e| StoreError::EncodingError(e.to_string()))
    }

    /// Serialize the snapshot to indented JSON, as used for exports
    pub fn to_json_pretty(&self) -> Result<String, StoreError> {
        serde_json::to_string_pretty(self).map_err(|e| StoreError::EncodingError(e.to_string()))
    }
}

impl HabitStore for Store {
    fn habits(&self) -> &[Habit] {
        &self.habits
    }

    fn entry(&self, date: NaiveDate) -> Option<&DayEntry> {
        self.entries.get(&date)
    }
}

impl Habit {
    /// Active habit with a fresh random id
    pub fn new(name: impl Into<String>, weights: DayWeights) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            weights,
            active: true,
        }
    }

    /// The habit added by "add habit" before the user edits it
    pub fn placeholder() -> Self {
        Self::new(
            DEFAULT_PLACEHOLDER_NAME,
            DayWeights::uniform(DEFAULT_PLACEHOLDER_WEIGHT),
        )
    }

    /// Set the raw weight for one day kind; negative or non-finite weights are rejected
    pub fn set_weight(&mut self, kind: DayKind, weight: f64) -> Result<(), StoreError> {
        if !weight.is_finite() || weight < 0.0 {
            return Err(StoreError::InvalidWeight(kind.to_string()));
        }
        self.weights.set(kind, weight);
        Ok(())
    }
}

/// Seed habits for a new journal; every day kind totals 100
pub fn default_habits() -> Vec<Habit> {
    vec![
        Habit::new("🛌 Sleep", DayWeights::new(25.0, 25.0, 20.0, 20.0)),
        Habit::new("🤝 Build & Nurture", DayWeights::new(15.0, 20.0, 20.0, 20.0)),
        Habit::new("🍽️ Eat", DayWeights::new(10.0, 5.0, 5.0, 5.0)),
        Habit::new("💼 Work", DayWeights::new(15.0, 15.0, 5.0, 5.0)),
        Habit::new("🧘 Meditate", DayWeights::new(20.0, 20.0, 20.0, 20.0)),
        Habit::new("🏋️ Workout", DayWeights::new(10.0, 10.0, 15.0, 15.0)),
        Habit::new("📚 Learn", DayWeights::new(5.0, 5.0, 15.0, 15.0)),
    ]
}
