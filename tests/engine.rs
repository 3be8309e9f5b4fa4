use chrono::NaiveDate;
use pretty_assertions::assert_eq;

use dayscore::{
    DayKind, DayScorer, Store, StoreAdapter, ValidationError, WeightNormalizer, WindowAggregator,
};

fn date(s: &str) -> NaiveDate {
    dayscore::parse_date(s).unwrap()
}

const TWO_HABIT_STORE: &str = r#"{
    "habits": [
        {"id": "sleep", "name": "Sleep", "active": true,
         "weights": {"weekday": 60, "fri": 50, "sat": 50, "sun": 50}},
        {"id": "read", "name": "Read", "active": true,
         "weights": {"weekday": 40, "fri": 50, "sat": 50, "sun": 50}}
    ],
    "entries": {
        "2024-01-15": {"date": "2024-01-15", "habits": {"sleep": 10, "read": 10}},
        "2024-01-20": {"date": "2024-01-20",
                       "answers": {"feltGood": "long walk"},
                       "habits": {"sleep": 8, "read": 2}}
    }
}"#;

#[test]
fn test_fresh_store_scores_floor_every_day() {
    let store = Store::default();
    assert!(WeightNormalizer::weight_totals(&store.habits).is_balanced());

    let report = WindowAggregator::new(&store).report(date("2024-01-21"), None);

    assert_eq!(report.days.len(), 7);
    assert!(report.days.iter().all(|d| d.score == 10));
    assert_eq!(report.weekly_average, 10.0);
    assert_eq!(report.weekday_vs_weekend.weekday, 10.0);
    assert_eq!(report.weekday_vs_weekend.weekend, 10.0);
    assert!(report.habit_averages.iter().all(|h| h.average == 0.0));
    assert_eq!(report.subset.len(), store.habits.len());
    assert_eq!(report.subset_average, 0.0);
}

#[test]
fn test_weekly_report_from_loaded_store() {
    let loaded = StoreAdapter::parse(TWO_HABIT_STORE).unwrap();
    assert!(loaded.is_clean());
    let store = loaded.store;

    let subset = vec!["read".to_string()];
    let report =
        WindowAggregator::new(&store).report(date("2024-01-21"), Some(subset.as_slice()));

    let scores: Vec<u8> = report.days.iter().map(|d| d.score).collect();
    assert_eq!(scores, vec![100, 10, 10, 10, 10, 50, 10]);
    assert_eq!(report.days[0].label, "01-15");
    assert_eq!(report.days[6].kind, DayKind::Sun);

    assert_eq!(report.weekly_average, 28.6);
    assert_eq!(report.weekday_vs_weekend.weekday, 32.5);
    assert_eq!(report.weekday_vs_weekend.weekend, 23.3);

    let average = |id: &str| {
        report
            .habit_averages
            .iter()
            .find(|h| h.id == id)
            .map(|h| h.average)
    };
    assert_eq!(average("sleep"), Some(9.0));
    assert_eq!(average("read"), Some(6.0));

    assert_eq!(report.subset, vec!["read".to_string()]);
    assert_eq!(report.subset_average, 17.1);
}

#[test]
fn test_breakdown_matches_window_score() {
    let store = StoreAdapter::parse(TWO_HABIT_STORE).unwrap().store;
    let saturday = date("2024-01-20");

    let breakdown = DayScorer::breakdown(&store.entry_or_empty(saturday), saturday, &store.habits);

    assert_eq!(breakdown.kind, DayKind::Sat);
    assert_eq!(breakdown.score, 50);
    assert_eq!(breakdown.score, DayScorer::score_date(&store, saturday));
    let total: f64 = breakdown.habits.iter().map(|h| h.contribution).sum();
    assert!((total - 50.0).abs() < 1e-9);
}

#[test]
fn test_import_then_rebalance() {
    let base = Store::default();
    let imported = StoreAdapter::import(
        &base,
        r#"{"habits": [
            {"id": "a", "name": "A", "active": true,
             "weights": {"weekday": 30, "fri": 10, "sat": 0, "sun": 5}},
            {"id": "b", "name": "B", "active": true,
             "weights": {"weekday": 30, "fri": 30, "sat": 0, "sun": 15}}
        ]}"#,
    )
    .unwrap();

    let mut store = imported.store;
    assert_eq!(store.habits.len(), 2);
    assert!(store.entries.is_empty());
    assert!(!WeightNormalizer::weight_totals(&store.habits).is_balanced());

    store.habits = WeightNormalizer::rebalanced(&store.habits);
    assert!(WeightNormalizer::weight_totals(&store.habits).is_balanced());

    let restored = Store::from_json(&store.to_json().unwrap()).unwrap();
    assert_eq!(restored, store);
}

#[test]
fn test_validate_reports_coercions() {
    let issues = StoreAdapter::validate(
        r#"{
            "habits": [
                {"id": "x", "name": "X", "weights": {"weekday": 10, "fri": 10, "sat": 10, "sun": 10}}
            ],
            "entries": {
                "2024-01-15": {"habits": {"x": "high"}},
                "yesterday": {}
            }
        }"#,
    )
    .unwrap();

    assert_eq!(issues.len(), 3);
    assert!(issues
        .iter()
        .any(|i| matches!(i, ValidationError::InvalidActiveFlag { id, .. } if id == "x")));
    assert!(issues
        .iter()
        .any(|i| matches!(i, ValidationError::NonNumericRating { habit, .. } if habit == "x")));
    assert!(issues
        .iter()
        .any(|i| matches!(i, ValidationError::InvalidEntryDate { key } if key == "yesterday")));
}

#[test]
fn test_non_object_root_is_an_error() {
    assert!(StoreAdapter::parse("[1, 2, 3]").is_err());
    assert!(StoreAdapter::parse("not json").is_err());
}
