//! Dayscore CLI - Command-line interface for the Dayscore engine
//!
//! Commands:
//! - init: Write a store seeded with the default habits
//! - score: Score one day with its per-habit breakdown
//! - report: Weekly analytics for the 7 days ending on a date
//! - weights: Normalized weights and raw totals per day kind
//! - validate: Report what the store loader would coerce
//! - rebalance: Rewrite habit weights so every day kind totals 100
//! - import: Merge an exported store into an existing one
//! - rate: Record a day's ratings and journal answers
//! - habit: Add, edit, toggle or remove habits

use chrono::{Local, NaiveDate};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::EnvFilter;

use dayscore::normalizer::WeightNormalizer;
use dayscore::scorer::DayScorer;
use dayscore::store::{Store, StoreAdapter, ValidationError};
use dayscore::types::{Answers, DayBreakdown, DayKind, Habit, WeeklyReport};
use dayscore::{parse_date, WindowAggregator, DAYSCORE_VERSION};

/// Dayscore - weighted daily habit scoring
#[derive(Parser)]
#[command(name = "dayscore")]
#[command(version = DAYSCORE_VERSION)]
#[command(about = "Score daily habit ratings and report weekly trends", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a store seeded with the default habits
    Init {
        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,
    },

    /// Score one day with its per-habit breakdown
    Score {
        /// Store file path (use - for stdin)
        #[arg(short, long)]
        store: PathBuf,

        /// Date to score (YYYY-MM-DD, defaults to today)
        #[arg(short, long)]
        date: Option<String>,

        /// Output format
        #[arg(long, default_value = "text")]
        output_format: OutputFormat,
    },

    /// Weekly analytics for the 7 days ending on a date
    Report {
        /// Store file path (use - for stdin)
        #[arg(short, long)]
        store: PathBuf,

        /// Last day of the window (YYYY-MM-DD, defaults to today)
        #[arg(short, long)]
        anchor: Option<String>,

        /// Habit id to include in the selected-habits average (repeatable; all active if omitted)
        #[arg(long = "habit")]
        habits: Vec<String>,

        /// Output format
        #[arg(long, default_value = "text")]
        output_format: OutputFormat,
    },

    /// Normalized weights and raw totals per day kind
    Weights {
        /// Store file path (use - for stdin)
        #[arg(short, long)]
        store: PathBuf,

        /// Only show this day kind
        #[arg(long, value_enum)]
        kind: Option<KindArg>,

        /// Output format
        #[arg(long, default_value = "text")]
        output_format: OutputFormat,
    },

    /// Report what the store loader would coerce
    Validate {
        /// Store file path (use - for stdin)
        #[arg(short, long)]
        store: PathBuf,

        /// Output validation report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Rewrite habit weights so every day kind totals 100
    Rebalance {
        /// Store file path (use - for stdin)
        #[arg(short, long)]
        store: PathBuf,

        /// Output file path (use - for stdout)
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Merge an exported store into an existing one
    Import {
        /// Store file path to merge into
        #[arg(short, long)]
        store: PathBuf,

        /// Exported store to import (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file path (use - for stdout)
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Record a day's ratings and journal answers
    Rate {
        /// Store file path (use - for stdin)
        #[arg(short, long)]
        store: PathBuf,

        /// Date to record (YYYY-MM-DD, defaults to today)
        #[arg(short, long)]
        date: Option<String>,

        /// Rating as HABIT_ID=N, 1-10 (repeatable)
        #[arg(long = "habit", value_parser = parse_rating)]
        ratings: Vec<(String, f64)>,

        #[command(flatten)]
        answers: AnswerFlags,

        /// Output file path (defaults to the store path)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Add, edit, toggle or remove habits
    Habit {
        #[command(subcommand)]
        action: HabitAction,
    },
}

#[derive(Args)]
struct AnswerFlags {
    /// What felt good today
    #[arg(long)]
    felt_good: Option<String>,

    /// What to learn or improve
    #[arg(long)]
    learn_improve: Option<String>,

    /// Anything else
    #[arg(long)]
    other: Option<String>,
}

impl AnswerFlags {
    /// Replace only the answers given on the command line
    fn apply(self, answers: &mut Answers) {
        if let Some(text) = self.felt_good {
            answers.felt_good = text;
        }
        if let Some(text) = self.learn_improve {
            answers.learn_improve = text;
        }
        if let Some(text) = self.other {
            answers.other = text;
        }
    }
}

#[derive(Subcommand)]
enum HabitAction {
    /// Append a new habit (named "New Habit" with weight 5 unless overridden)
    Add {
        #[command(flatten)]
        target: StoreTarget,

        #[command(flatten)]
        edit: HabitEdit,
    },

    /// Rename a habit or change its weights
    Set {
        /// Habit id
        id: String,

        #[command(flatten)]
        target: StoreTarget,

        #[command(flatten)]
        edit: HabitEdit,
    },

    /// Flip a habit between active and inactive
    Toggle {
        /// Habit id
        id: String,

        #[command(flatten)]
        target: StoreTarget,
    },

    /// Delete a habit (its stored ratings are kept)
    Remove {
        /// Habit id
        id: String,

        #[command(flatten)]
        target: StoreTarget,
    },
}

#[derive(Args)]
struct StoreTarget {
    /// Store file path (use - for stdin)
    #[arg(short, long)]
    store: PathBuf,

    /// Output file path (defaults to the store path)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

impl StoreTarget {
    fn output(&self) -> &Path {
        self.output.as_deref().unwrap_or(&self.store)
    }
}

#[derive(Args)]
struct HabitEdit {
    /// Display name
    #[arg(long)]
    name: Option<String>,

    /// Raw weight for Monday-Thursday
    #[arg(long)]
    weekday: Option<f64>,

    /// Raw weight for Friday
    #[arg(long)]
    fri: Option<f64>,

    /// Raw weight for Saturday
    #[arg(long)]
    sat: Option<f64>,

    /// Raw weight for Sunday
    #[arg(long)]
    sun: Option<f64>,
}

impl HabitEdit {
    fn apply(self, habit: &mut Habit) -> Result<(), DayscoreCliError> {
        if let Some(name) = self.name {
            habit.name = name;
        }
        let weights = [
            (DayKind::Weekday, self.weekday),
            (DayKind::Fri, self.fri),
            (DayKind::Sat, self.sat),
            (DayKind::Sun, self.sun),
        ];
        for (kind, weight) in weights {
            if let Some(weight) = weight {
                habit.set_weight(kind, weight)?;
            }
        }
        Ok(())
    }
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Human-readable text
    Text,
    /// Compact JSON
    Json,
    /// Pretty-printed JSON
    JsonPretty,
}

#[derive(Clone, Copy, ValueEnum)]
enum KindArg {
    Weekday,
    Fri,
    Sat,
    Sun,
}

impl From<KindArg> for DayKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Weekday => DayKind::Weekday,
            KindArg::Fri => DayKind::Fri,
            KindArg::Sat => DayKind::Sat,
            KindArg::Sun => DayKind::Sun,
        }
    }
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

/// Log to stderr; filter from DAYSCORE_LOG, then RUST_LOG, else warnings only
fn init_tracing() {
    let filter = EnvFilter::try_from_env("DAYSCORE_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> Result<(), DayscoreCliError> {
    match cli.command {
        Commands::Init { output } => cmd_init(&output),

        Commands::Score {
            store,
            date,
            output_format,
        } => cmd_score(&store, date.as_deref(), output_format),

        Commands::Report {
            store,
            anchor,
            habits,
            output_format,
        } => cmd_report(&store, anchor.as_deref(), &habits, output_format),

        Commands::Weights {
            store,
            kind,
            output_format,
        } => cmd_weights(&store, kind.map(DayKind::from), output_format),

        Commands::Validate { store, json } => cmd_validate(&store, json),

        Commands::Rebalance { store, output } => cmd_rebalance(&store, &output),

        Commands::Import {
            store,
            input,
            output,
        } => cmd_import(&store, &input, &output),

        Commands::Rate {
            store,
            date,
            ratings,
            answers,
            output,
        } => {
            let output = output.unwrap_or_else(|| store.clone());
            cmd_rate(&store, date.as_deref(), &ratings, answers, &output)
        }

        Commands::Habit { action } => cmd_habit(action),
    }
}

fn cmd_init(output: &Path) -> Result<(), DayscoreCliError> {
    let store = Store::default();
    write_output(output, &store.to_json_pretty()?)?;
    info!(habits = store.habits.len(), "wrote default store");
    Ok(())
}

fn cmd_score(
    store_path: &Path,
    date: Option<&str>,
    output_format: OutputFormat,
) -> Result<(), DayscoreCliError> {
    let store = load_store(store_path)?;
    let date = resolve_date(date)?;

    let entry = store.entry_or_empty(date);
    let breakdown = DayScorer::breakdown(&entry, date, &store.habits);

    let rendered = match output_format {
        OutputFormat::Text => render_breakdown(&breakdown),
        OutputFormat::Json => serde_json::to_string(&breakdown)?,
        OutputFormat::JsonPretty => serde_json::to_string_pretty(&breakdown)?,
    };
    println!("{}", rendered);
    Ok(())
}

fn cmd_report(
    store_path: &Path,
    anchor: Option<&str>,
    habits: &[String],
    output_format: OutputFormat,
) -> Result<(), DayscoreCliError> {
    let store = load_store(store_path)?;
    let anchor = resolve_date(anchor)?;

    let report = WindowAggregator::new(&store).report(anchor, Some(habits));

    let rendered = match output_format {
        OutputFormat::Text => render_report(&report, &store),
        OutputFormat::Json => serde_json::to_string(&report)?,
        OutputFormat::JsonPretty => serde_json::to_string_pretty(&report)?,
    };
    println!("{}", rendered);
    Ok(())
}

fn cmd_weights(
    store_path: &Path,
    kind: Option<DayKind>,
    output_format: OutputFormat,
) -> Result<(), DayscoreCliError> {
    let store = load_store(store_path)?;
    let kinds: Vec<DayKind> = match kind {
        Some(kind) => vec![kind],
        None => DayKind::ALL.to_vec(),
    };
    let totals = WeightNormalizer::weight_totals(&store.habits);

    let report = WeightsReport {
        kinds: kinds
            .iter()
            .map(|kind| KindWeights {
                kind: *kind,
                raw_total: totals.get(*kind),
                balanced: totals.is_kind_balanced(*kind),
                weights: WeightNormalizer::normalize(&store.habits, *kind),
            })
            .collect(),
    };

    let rendered = match output_format {
        OutputFormat::Text => render_weights(&report, &store),
        OutputFormat::Json => serde_json::to_string(&report)?,
        OutputFormat::JsonPretty => serde_json::to_string_pretty(&report)?,
    };
    println!("{}", rendered);
    Ok(())
}

fn cmd_validate(store_path: &Path, json: bool) -> Result<(), DayscoreCliError> {
    let issues = StoreAdapter::validate(&read_input(store_path)?)?;

    let report = ValidationReport {
        issue_count: issues.len(),
        issues: issues.iter().map(ValidationError::to_string).collect(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Validation Report");
        println!("=================");
        println!("Issues: {}", report.issue_count);

        if !report.issues.is_empty() {
            println!("\nCoerced values:");
            for issue in &report.issues {
                println!("  - {}", issue);
            }
        }
    }

    if report.issue_count > 0 {
        Err(DayscoreCliError::ValidationFailed(report.issue_count))
    } else {
        Ok(())
    }
}

fn cmd_rebalance(store_path: &Path, output: &Path) -> Result<(), DayscoreCliError> {
    let mut store = load_store(store_path)?;
    store.habits = WeightNormalizer::rebalanced(&store.habits);
    write_output(output, &store.to_json_pretty()?)?;
    Ok(())
}

fn cmd_import(store_path: &Path, input: &Path, output: &Path) -> Result<(), DayscoreCliError> {
    let base = load_store(store_path)?;
    let imported = StoreAdapter::import(&base, &read_input(input)?)?;
    info!(
        habits = imported.store.habits.len(),
        entries = imported.store.entries.len(),
        issues = imported.issues.len(),
        "import complete"
    );
    write_output(output, &imported.store.to_json_pretty()?)?;
    Ok(())
}

fn cmd_rate(
    store_path: &Path,
    date: Option<&str>,
    ratings: &[(String, f64)],
    answers: AnswerFlags,
    output: &Path,
) -> Result<(), DayscoreCliError> {
    let mut store = load_store(store_path)?;
    let date = resolve_date(date)?;

    let entry = store.rate(date, ratings, |stored| answers.apply(stored))?;
    info!(%date, ratings = entry.habits.len(), "recorded entry");

    write_output(output, &store.to_json_pretty()?)?;
    Ok(())
}

fn cmd_habit(action: HabitAction) -> Result<(), DayscoreCliError> {
    match action {
        HabitAction::Add { target, edit } => {
            let mut store = load_store(&target.store)?;
            let habit = store.add_habit(Habit::placeholder());
            edit.apply(habit)?;
            eprintln!("added habit {}", habit.id);
            write_output(target.output(), &store.to_json_pretty()?)
        }
        HabitAction::Set { id, target, edit } => {
            let mut store = load_store(&target.store)?;
            edit.apply(store.habit_mut(&id)?)?;
            write_output(target.output(), &store.to_json_pretty()?)
        }
        HabitAction::Toggle { id, target } => {
            let mut store = load_store(&target.store)?;
            let habit = store.habit_mut(&id)?;
            habit.active = !habit.active;
            info!(id = %habit.id, active = habit.active, "toggled habit");
            write_output(target.output(), &store.to_json_pretty()?)
        }
        HabitAction::Remove { id, target } => {
            let mut store = load_store(&target.store)?;
            let removed = store.remove_habit(&id)?;
            info!(id = %removed.id, name = %removed.name, "removed habit");
            write_output(target.output(), &store.to_json_pretty()?)
        }
    }
}

// Helper functions

/// Parse `HABIT_ID=N` for `rate --habit`
fn parse_rating(s: &str) -> Result<(String, f64), String> {
    let (id, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected HABIT_ID=N, got {s:?}"))?;
    let id = id.trim();
    if id.is_empty() {
        return Err(format!("missing habit id in {s:?}"));
    }
    let rating: f64 = value
        .trim()
        .parse()
        .map_err(|_| format!("rating in {s:?} is not a number"))?;
    if !rating.is_finite() {
        return Err(format!("rating in {s:?} is not a number"));
    }
    Ok((id.to_string(), rating))
}

fn read_input(path: &Path) -> Result<String, DayscoreCliError> {
    if path.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(path)?)
    }
}

fn write_output(path: &Path, data: &str) -> Result<(), DayscoreCliError> {
    if path.to_string_lossy() == "-" {
        println!("{}", data);
    } else {
        fs::write(path, data)?;
    }
    Ok(())
}

fn load_store(path: &Path) -> Result<Store, DayscoreCliError> {
    let loaded = StoreAdapter::parse(&read_input(path)?)?;
    if !loaded.is_clean() {
        info!(issues = loaded.issues.len(), "store loaded with coercions");
    }
    Ok(loaded.store)
}

fn resolve_date(date: Option<&str>) -> Result<NaiveDate, DayscoreCliError> {
    match date {
        Some(s) => Ok(parse_date(s)?),
        None => Ok(Local::now().date_naive()),
    }
}

fn habit_name<'a>(store: &'a Store, id: &'a str) -> &'a str {
    store.habit(id).map(|h| h.name.as_str()).unwrap_or(id)
}

fn render_breakdown(breakdown: &DayBreakdown) -> String {
    let mut lines = vec![format!(
        "{} ({}): {}",
        breakdown.date,
        breakdown.kind.as_str().to_uppercase(),
        breakdown.score
    )];
    for habit in &breakdown.habits {
        lines.push(format!(
            "  {:<24} {:>5.1}%  rating {:>2}  +{:.1}",
            habit.name, habit.weight, habit.rating, habit.contribution
        ));
    }
    lines.join("\n")
}

fn render_report(report: &WeeklyReport, store: &Store) -> String {
    let start = report.days.first().map(|d| d.date).unwrap_or(report.anchor);
    let mut lines = vec![
        format!("Weekly Report ({} to {})", start, report.anchor),
        "=================================".to_string(),
        format!("Weekly average:   {:.1}", report.weekly_average),
        format!("Weekday average:  {:.1}", report.weekday_vs_weekend.weekday),
        format!("Weekend average:  {:.1}", report.weekday_vs_weekend.weekend),
        format!(
            "Selected average: {:.1} ({} habits)",
            report.subset_average,
            report.subset.len()
        ),
        String::new(),
        "Last 7 days:".to_string(),
    ];

    for day in &report.days {
        lines.push(format!("  {}  {:<7}  {:>3}", day.label, day.kind, day.score));
    }

    lines.push(String::new());
    lines.push("Per-habit averages (1-10):".to_string());
    for habit in &report.habit_averages {
        lines.push(format!("  {:<24} {:.1}", habit.name, habit.average));
    }

    if !report.subset.is_empty() {
        lines.push(String::new());
        let names: Vec<&str> = report.subset.iter().map(|id| habit_name(store, id)).collect();
        lines.push(format!("Selected habits: {}", names.join(", ")));
    }

    lines.join("\n")
}

fn render_weights(report: &WeightsReport, store: &Store) -> String {
    let mut lines = Vec::new();
    for kind in &report.kinds {
        let status = if kind.balanced { "[OK]" } else { "[FIX]" };
        lines.push(format!(
            "{} {}: raw total {:.0}%",
            status,
            kind.kind.as_str().to_uppercase(),
            kind.raw_total
        ));
        for (id, pct) in &kind.weights {
            lines.push(format!("  {:<24} {:>5.1}%", habit_name(store, id), pct));
        }
    }
    lines.join("\n")
}

// Error types

#[derive(Debug)]
enum DayscoreCliError {
    Io(io::Error),
    Store(dayscore::StoreError),
    Json(serde_json::Error),
    ValidationFailed(usize),
}

impl From<io::Error> for DayscoreCliError {
    fn from(e: io::Error) -> Self {
        DayscoreCliError::Io(e)
    }
}

impl From<dayscore::StoreError> for DayscoreCliError {
    fn from(e: dayscore::StoreError) -> Self {
        DayscoreCliError::Store(e)
    }
}

impl From<serde_json::Error> for DayscoreCliError {
    fn from(e: serde_json::Error) -> Self {
        DayscoreCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<DayscoreCliError> for CliError {
    fn from(e: DayscoreCliError) -> Self {
        match e {
            DayscoreCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            DayscoreCliError::Store(e) => {
                let hint = match &e {
                    dayscore::StoreError::UnknownHabit(_) => {
                        "Habit ids are listed by 'dayscore weights --output-format json'"
                    }
                    dayscore::StoreError::InvalidWeight(_) => "Weights are numbers >= 0",
                    _ => "Dates are YYYY-MM-DD; stores are JSON objects",
                };
                CliError {
                    code: "STORE_ERROR".to_string(),
                    message: e.to_string(),
                    hint: Some(hint.to_string()),
                }
            }
            DayscoreCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            DayscoreCliError::ValidationFailed(count) => CliError {
                code: "VALIDATION_FAILED".to_string(),
                message: format!("{} stored values needed coercion", count),
                hint: Some("Run 'dayscore rebalance' or fix the listed values".to_string()),
            },
        }
    }
}

// Report types

#[derive(serde::Serialize)]
struct ValidationReport {
    issue_count: usize,
    issues: Vec<String>,
}

#[derive(serde::Serialize)]
struct WeightsReport {
    kinds: Vec<KindWeights>,
}

#[derive(serde::Serialize)]
struct KindWeights {
    kind: DayKind,
    raw_total: f64,
    balanced: bool,
    weights: dayscore::NormalizedWeights,
}
