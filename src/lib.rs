//! Dayscore - weighted daily habit scoring engine
//!
//! Dayscore turns self-reported 1-10 habit ratings into a single 0-100 day
//! score, using habit weights that differ by day of week, and derives rolling
//! analytics over the trailing 7 days:
//! calendar classification → weight normalization → day scoring → window aggregation.
//!
//! The engine is pure: every function reads a [`Store`] snapshot (or any
//! [`HabitStore`]) and returns derived numbers without touching it.
//!
//! ## Modules
//!
//! - **Engine**: `calendar`, `normalizer`, `scorer`, `aggregator`
//! - **Store boundary**: typed snapshot plus a lenient JSON loader that reports coercions
//! - **FFI**: C ABI over JSON strings for host applications

pub mod aggregator;
pub mod calendar;
pub mod error;
pub mod normalizer;
pub mod scorer;
pub mod store;
pub mod types;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use aggregator::WindowAggregator;
pub use calendar::{classify, parse_date, WINDOW_DAYS};
pub use error::StoreError;
pub use normalizer::WeightNormalizer;
pub use scorer::DayScorer;
pub use store::{HabitStore, LoadedStore, Store, StoreAdapter, ValidationError};
pub use types::{
    DayBreakdown, DayEntry, DayKind, DayRecord, DayWeights, Habit, HabitAverage,
    NormalizedWeights, WeekdayWeekend, WeeklyReport, WeightTotals,
};

/// Dayscore version reported by the CLI and the C ABI
pub const DAYSCORE_VERSION: &str = env!("CARGO_PKG_VERSION");
