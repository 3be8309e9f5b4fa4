//! Trailing-window analytics
//!
//! Every aggregation here looks at the 7 calendar days ending on an anchor
//! date. Two conventions for unrated habits coexist on purpose:
//! - day scores (and the averages built on them) count an unrated habit as 1
//! - per-habit and subset averages leave unrated habits out, i.e. count them as 0

use chrono::NaiveDate;
use std::collections::HashSet;

use crate::calendar::{classify, short_label, trailing_dates};
use crate::normalizer::WeightNormalizer;
use crate::scorer::{clamp_rating, contribution, DayScorer};
use crate::store::HabitStore;
use crate::types::{DayRecord, HabitAverage, WeekdayWeekend, WeeklyReport};

/// Read-only analytics over a habit store
pub struct WindowAggregator<'a, S: HabitStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: HabitStore + ?Sized> WindowAggregator<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// The 7 days ending on `anchor`, oldest first, each with its day score
    pub fn trailing_window(&self, anchor: NaiveDate) -> Vec<DayRecord> {
        trailing_dates(anchor)
            .into_iter()
            .map(|date| DayRecord {
                label: short_label(date),
                date,
                kind: classify(date),
                score: DayScorer::score_date(self.store, date),
            })
            .collect()
    }

    /// Mean day score over the window
    pub fn weekly_average(&self, anchor: NaiveDate) -> f64 {
        let scores: Vec<f64> = self
            .trailing_window(anchor)
            .iter()
            .map(|r| r.score as f64)
            .collect();
        round1(mean(&scores))
    }

    /// Mean rating per active habit, counting only days it was rated
    pub fn per_habit_averages(&self, anchor: NaiveDate) -> Vec<HabitAverage> {
        let dates = trailing_dates(anchor);

        self.store
            .habits()
            .iter()
            .filter(|h| h.active)
            .map(|habit| {
                let recorded: Vec<f64> = dates
                    .iter()
                    .filter_map(|date| self.store.entry(*date))
                    .filter_map(|entry| entry.rating(&habit.id))
                    .filter(|rating| *rating != 0.0 && !rating.is_nan())
                    .collect();

                HabitAverage {
                    id: habit.id.clone(),
                    name: habit.name.clone(),
                    average: round1(mean(&recorded)),
                }
            })
            .collect()
    }

    /// Mean day score on Mon-Thu vs. Fri-Sun
    pub fn weekday_vs_weekend(&self, anchor: NaiveDate) -> WeekdayWeekend {
        let (weekend, weekday): (Vec<DayRecord>, Vec<DayRecord>) = self
            .trailing_window(anchor)
            .into_iter()
            .partition(|r| r.kind.is_weekend());

        let scores = |records: &[DayRecord]| -> Vec<f64> {
            records.iter().map(|r| r.score as f64).collect()
        };

        WeekdayWeekend {
            weekday: round1(mean(&scores(&weekday))),
            weekend: round1(mean(&scores(&weekend))),
        }
    }

    /// Mean day score using only the habits in `subset`.
    ///
    /// Each day's weights are renormalized over the subset so they sum to
    /// 100 again, however small the subset's share was. Unrated habits count
    /// as 0. Unknown and inactive ids are ignored.
    pub fn subset_weekly_average<T: AsRef<str>>(&self, anchor: NaiveDate, subset: &[T]) -> f64 {
        let habits = self.store.habits();

        let daily: Vec<f64> = trailing_dates(anchor)
            .into_iter()
            .map(|date| {
                let weights = WeightNormalizer::normalize_subset(habits, classify(date), subset);
                let entry = self.store.entry(date);

                weights
                    .iter()
                    .map(|(id, weight)| {
                        let rating = entry.and_then(|e| e.rating(id));
                        subset_points(rating, *weight)
                    })
                    .sum()
            })
            .collect();

        round1(mean(&daily))
    }

    /// Every aggregation for `anchor` in one report.
    ///
    /// With no subset (or an empty one) the subset average covers all
    /// active habits. Repeated ids are kept once, in the order first given.
    pub fn report(&self, anchor: NaiveDate, subset: Option<&[String]>) -> WeeklyReport {
        let active = self.store.active_ids();
        let subset: Vec<String> = match subset {
            Some(ids) if !ids.is_empty() => {
                let mut seen = HashSet::new();
                ids.iter()
                    .filter(|id| active.contains(*id) && seen.insert(id.as_str()))
                    .cloned()
                    .collect()
            }
            _ => active,
        };

        let days = self.trailing_window(anchor);
        let scores: Vec<f64> = days.iter().map(|r| r.score as f64).collect();

        WeeklyReport {
            anchor,
            weekly_average: round1(mean(&scores)),
            habit_averages: self.per_habit_averages(anchor),
            weekday_vs_weekend: self.weekday_vs_weekend(anchor),
            subset_average: self.subset_weekly_average(anchor, &subset),
            subset,
            days,
        }
    }
}

/// Subset-mode points: unrated (or zero) counts as nothing, rated values are clamped
fn subset_points(rating: Option<f64>, weight: f64) -> f64 {
    match rating {
        Some(r) if r != 0.0 && !r.is_nan() => contribution(clamp_rating(Some(r)), weight),
        _ => 0.0,
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Round to one decimal place
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::{parse_date, WINDOW_DAYS};
    use crate::store::Store;
    use crate::types::{DayKind, DayWeights, Habit};
    use pretty_assertions::assert_eq;

    fn day(s: &str) -> NaiveDate {
        parse_date(s).unwrap()
    }

    fn habit(id: &str, weights: DayWeights) -> Habit {
        Habit {
            id: id.to_string(),
            name: id.to_uppercase(),
            weights,
            active: true,
        }
    }

    /// Two habits whose weights already total 100 for every kind
    fn two_habit_store() -> Store {
        Store::new(vec![
            habit("a", DayWeights::new(60.0, 50.0, 30.0, 20.0)),
            habit("b", DayWeights::new(40.0, 50.0, 70.0, 80.0)),
        ])
    }

    fn rate(store: &mut Store, date: &str, ratings: &[(&str, f64)]) {
        let entry = ratings
            .iter()
            .fold(store.entry_or_empty(day(date)), |e, (id, r)| {
                e.with_rating(*id, *r)
            });
        store.put_entry(entry);
    }

    #[test]
    fn test_trailing_window_shape() {
        let store = two_habit_store();
        let window = WindowAggregator::new(&store).trailing_window(day("2024-03-02"));

        assert_eq!(window.len(), WINDOW_DAYS);
        assert_eq!(window[0].date, day("2024-02-25"));
        assert_eq!(window[0].label, "02-25");
        assert_eq!(window[6].date, day("2024-03-02"));
        assert_eq!(window[6].kind, DayKind::Sat);
        assert!(window.windows(2).all(|w| w[0].date < w[1].date));
        // nothing stored: every habit counts as rated 1
        assert!(window.iter().all(|r| r.score == 10));
    }

    #[test]
    fn test_weekly_average() {
        let mut store = two_habit_store();
        rate(&mut store, "2024-01-15", &[("a", 10.0), ("b", 10.0)]);
        rate(&mut store, "2024-01-16", &[("a", 5.0), ("b", 5.0)]);
        let agg = WindowAggregator::new(&store);

        // 100 + 50 + five unrated days at 10
        assert_eq!(agg.weekly_average(day("2024-01-21")), 28.6);
        // window moved past both rated days
        assert_eq!(agg.weekly_average(day("2024-01-30")), 10.0);
    }

    #[test]
    fn test_no_habits_everything_zero() {
        let store = Store::new(vec![]);
        let agg = WindowAggregator::new(&store);
        let anchor = day("2024-01-21");

        assert_eq!(agg.weekly_average(anchor), 0.0);
        assert!(agg.per_habit_averages(anchor).is_empty());
        assert_eq!(agg.weekday_vs_weekend(anchor), WeekdayWeekend::default());
        assert_eq!(agg.subset_weekly_average(anchor, &["a"]), 0.0);
    }

    #[test]
    fn test_no_entries_rating_averages_zero() {
        let store = two_habit_store();
        let agg = WindowAggregator::new(&store);
        let anchor = day("2024-01-21");

        assert!(agg.per_habit_averages(anchor).iter().all(|h| h.average == 0.0));
        assert_eq!(agg.subset_weekly_average(anchor, &["a", "b"]), 0.0);
    }

    #[test]
    fn test_per_habit_average_excludes_unrated_days() {
        let mut store = two_habit_store();
        rate(&mut store, "2024-01-17", &[("a", 8.0)]);
        rate(&mut store, "2024-01-18", &[("b", 3.0), ("a", 0.0)]);
        rate(&mut store, "2024-01-19", &[("b", 4.0)]);
        rate(&mut store, "2024-01-10", &[("a", 1.0)]); // outside the window

        let averages = WindowAggregator::new(&store).per_habit_averages(day("2024-01-21"));
        assert_eq!(
            averages,
            vec![
                HabitAverage {
                    id: "a".to_string(),
                    name: "A".to_string(),
                    average: 8.0,
                },
                HabitAverage {
                    id: "b".to_string(),
                    name: "B".to_string(),
                    average: 3.5,
                },
            ]
        );
    }

    #[test]
    fn test_per_habit_average_skips_inactive() {
        let mut store = two_habit_store();
        store.habits[1].active = false;
        rate(&mut store, "2024-01-17", &[("a", 6.0), ("b", 9.0)]);

        let averages = WindowAggregator::new(&store).per_habit_averages(day("2024-01-21"));
        assert_eq!(averages.len(), 1);
        assert_eq!(averages[0].id, "a");
    }

    #[test]
    fn test_weekday_vs_weekend_split() {
        let mut store = Store::new(vec![habit("a", DayWeights::uniform(100.0))]);
        // Mon 15 .. Thu 18 rated 5, Fri 19 .. Sun 21 rated 8
        for d in 15..=18 {
            rate(&mut store, &format!("2024-01-{d}"), &[("a", 5.0)]);
        }
        for d in 19..=21 {
            rate(&mut store, &format!("2024-01-{d}"), &[("a", 8.0)]);
        }

        let split = WindowAggregator::new(&store).weekday_vs_weekend(day("2024-01-21"));
        assert_eq!(
            split,
            WeekdayWeekend {
                weekday: 50.0,
                weekend: 80.0
            }
        );

        // anchored mid-week the window still holds Fri-Sun of the week before
        let split = WindowAggregator::new(&store).weekday_vs_weekend(day("2024-01-24"));
        // Thu 18 = 50, Mon-Wed 22-24 unrated = 10 each
        assert_eq!(split.weekday, 20.0);
        assert_eq!(split.weekend, 80.0);
    }

    #[test]
    fn test_subset_full_set_matches_weekly() {
        let mut store = two_habit_store();
        let ratings = [
            (7.0, 4.0),
            (9.0, 9.0),
            (2.0, 6.0),
            (5.0, 5.0),
            (8.0, 1.0),
            (3.0, 10.0),
            (6.0, 7.0),
        ];
        for (offset, (a, b)) in ratings.iter().enumerate() {
            let date = format!("2024-01-{}", 15 + offset);
            rate(&mut store, &date, &[("a", *a), ("b", *b)]);
        }
        let agg = WindowAggregator::new(&store);
        let anchor = day("2024-01-21");

        let weekly = agg.weekly_average(anchor);
        let subset = agg.subset_weekly_average(anchor, &["a", "b"]);
        // day scores are rounded, subset day totals are not
        assert!((weekly - subset).abs() <= 0.6, "{weekly} vs {subset}");
    }

    #[test]
    fn test_subset_renormalizes_and_counts_unrated_as_zero() {
        let mut store = two_habit_store();
        rate(&mut store, "2024-01-15", &[("a", 6.0), ("b", 10.0)]);
        let agg = WindowAggregator::new(&store);
        let anchor = day("2024-01-21");

        // only "a" on one day: 6/10 * 100, six empty days at 0
        assert_eq!(agg.subset_weekly_average(anchor, &["a"]), round1(60.0 / 7.0));
        // both habits on the rated weekday: 0.6*60 + 1.0*40 = 76
        assert_eq!(agg.subset_weekly_average(anchor, &["a", "b"]), round1(76.0 / 7.0));
        // unknown ids contribute nothing
        assert_eq!(agg.subset_weekly_average(anchor, &["zz"]), 0.0);
    }

    #[test]
    fn test_subset_with_zero_kind_weights() {
        let mut store = Store::new(vec![
            habit("a", DayWeights::new(50.0, 50.0, 0.0, 0.0)),
            habit("b", DayWeights::new(50.0, 50.0, 100.0, 100.0)),
        ]);
        rate(&mut store, "2024-01-20", &[("a", 7.0)]); // Saturday

        let avg = WindowAggregator::new(&store).subset_weekly_average(day("2024-01-21"), &["a"]);
        assert_eq!(avg, 10.0);
    }

    #[test]
    fn test_report_defaults_subset_to_active_habits() {
        let mut store = two_habit_store();
        store.habits.push(Habit {
            active: false,
            ..habit("c", DayWeights::uniform(10.0))
        });
        rate(&mut store, "2024-01-19", &[("a", 9.0), ("b", 7.0)]);
        let agg = WindowAggregator::new(&store);
        let anchor = day("2024-01-21");

        let report = agg.report(anchor, None);
        assert_eq!(report.anchor, anchor);
        assert_eq!(report.days.len(), 7);
        assert_eq!(report.subset, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(report.weekly_average, agg.weekly_average(anchor));
        assert_eq!(report.weekday_vs_weekend, agg.weekday_vs_weekend(anchor));
        assert_eq!(report.habit_averages, agg.per_habit_averages(anchor));
        assert_eq!(
            report.subset_average,
            agg.subset_weekly_average(anchor, &["a", "b"])
        );

        let picked = vec!["b".to_string(), "c".to_string(), "ghost".to_string()];
        let report = agg.report(anchor, Some(&picked));
        assert_eq!(report.subset, vec!["b".to_string()]);
        assert_eq!(report.subset_average, agg.subset_weekly_average(anchor, &["b"]));
    }

    #[test]
    fn test_report_keeps_repeated_subset_ids_once() {
        let store = two_habit_store();
        let agg = WindowAggregator::new(&store);
        let anchor = day("2024-01-21");

        let picked: Vec<String> = ["b", "a", "b", "a"].iter().map(|s| s.to_string()).collect();
        let report = agg.report(anchor, Some(&picked));
        assert_eq!(report.subset, vec!["b".to_string(), "a".to_string()]);
        assert_eq!(
            report.subset_average,
            agg.subset_weekly_average(anchor, &["a", "b"])
        );
    }

    #[test]
    fn test_window_at_earliest_date_does_not_panic() {
        let store = two_habit_store();
        let agg = WindowAggregator::new(&store);

        let window = agg.trailing_window(NaiveDate::MIN);
        assert_eq!(window.len(), 1);
        assert_eq!(window[0].date, NaiveDate::MIN);
        assert_eq!(agg.weekly_average(NaiveDate::MIN), window[0].score as f64);
        assert_eq!(agg.report(NaiveDate::MIN, None).days, window);
    }

    #[test]
    fn test_round1() {
        assert_eq!(round1(28.571428), 28.6);
        assert_eq!(round1(33.349), 33.3);
        assert_eq!(round1(0.0), 0.0);
    }

    #[test]
    fn test_aggregator_over_trait_object() {
        let mut store = two_habit_store();
        rate(&mut store, "2024-01-21", &[("a", 10.0), ("b", 10.0)]);
        let dyn_store: &dyn HabitStore = &store;

        let window = WindowAggregator::new(dyn_store).trailing_window(day("2024-01-21"));
        assert_eq!(window[6].score, 100);
    }
}
