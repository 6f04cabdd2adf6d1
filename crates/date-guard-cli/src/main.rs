//! `date-guard` CLI: validate dates, ranges and leave requests from JSON.
//!
//! ## Usage
//!
//! ```sh
//! # Single date (stdin → stdout)
//! echo '{"date":"2026-03-20"}' | date-guard date
//!
//! # Range with options, from a file
//! date-guard range -i request.json
//!
//! # Leave request against TOML defaults, on a pinned "today"
//! date-guard --config guard.toml --today 2026-03-16 leave -i leave.json
//!
//! # Recurring leave
//! echo '{"start":"2026-03-23","end":"2026-04-19","user_id":"u1",
//!        "pattern":{"rrule":"FREQ=WEEKLY;BYDAY=MO"}}' | date-guard recurring
//! ```
//!
//! Every command prints a JSON report `{valid, errors, context}` and exits
//! with 0 when valid, 1 when invalid and 2 on unreadable input or bad
//! options.

use std::collections::HashMap;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use date_guard::{
    DateInput, ErrorAccumulator, FixedClock, GuardConfig, LeaveValidator, RecurrencePattern,
    RecurringOptions, RecurringReport, SystemClock, ValidationContext, ValidationOptions,
    ValidationSession,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Parser)]
#[command(
    name = "date-guard",
    version,
    about = "Validate dates, date ranges and leave requests"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// TOML file with timezone, leave, cache and recurring defaults
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Evaluate as if today were this date (YYYY-MM-DD)
    #[arg(long, global = true)]
    today: Option<NaiveDate>,

    /// Log rule decisions to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a single date
    Date {
        /// Input JSON file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<PathBuf>,
    },
    /// Validate a start/end date range
    Range {
        /// Input JSON file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<PathBuf>,
    },
    /// Validate a leave request using the configured leave defaults
    Leave {
        /// Input JSON file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<PathBuf>,
    },
    /// Validate a recurring leave request
    Recurring {
        /// Input JSON file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<PathBuf>,
    },
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct DateRequest {
    #[serde(default)]
    date: DateInput,
    #[serde(default = "default_date_field")]
    field: String,
    options: Option<Value>,
    context: Option<ValidationContext>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RangeRequest {
    #[serde(default)]
    start: DateInput,
    #[serde(default)]
    end: DateInput,
    #[serde(default = "default_start_field")]
    start_field: String,
    #[serde(default = "default_end_field")]
    end_field: String,
    options: Option<Value>,
    context: Option<ValidationContext>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct LeaveRequest {
    #[serde(default)]
    start: DateInput,
    #[serde(default)]
    end: DateInput,
    user_id: String,
    /// Days already taken this year by `user_id`.
    used_days: Option<i64>,
    options: Option<Value>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RecurringRequest {
    #[serde(default)]
    start: DateInput,
    #[serde(default)]
    end: DateInput,
    user_id: String,
    pattern: RecurrencePattern,
    used_days: Option<i64>,
    options: Option<Value>,
}

fn default_date_field() -> String {
    "date".to_string()
}

fn default_start_field() -> String {
    "start".to_string()
}

fn default_end_field() -> String {
    "end".to_string()
}

#[derive(Serialize)]
struct Report<'a> {
    valid: bool,
    errors: &'a ErrorAccumulator,
    context: &'a ValidationContext,
    #[serde(skip_serializing_if = "Option::is_none")]
    recurring: Option<RecurringReport>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_max_level(level)
        .init();

    match run(cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(2)
        }
    }
}

/// Execute the command and print its report. Returns the validation outcome.
fn run(cli: Cli) -> Result<bool> {
    let config = match &cli.config {
        Some(path) => GuardConfig::load(path)
            .with_context(|| format!("Failed to load config: {}", path.display()))?,
        None => GuardConfig::default(),
    };
    let session = build_session(&config, cli.today)?;

    match cli.command {
        Commands::Date { input } => {
            let request: DateRequest = read_request(input.as_ref())?;
            let options: ValidationOptions = overlay(&ValidationOptions::default(), request.options)?;
            let mut session = session;
            if let Some(context) = request.context {
                session.set_context(context);
            }
            let valid = session
                .validate_date(request.date, &request.field, &options)
                .context("Invalid options")?;
            print_report(valid, &session, None)?;
            Ok(valid)
        }
        Commands::Range { input } => {
            let request: RangeRequest = read_request(input.as_ref())?;
            let options: ValidationOptions = overlay(&ValidationOptions::default(), request.options)?;
            let mut session = session;
            if let Some(context) = request.context {
                session.set_context(context);
            }
            let valid = session
                .validate_date_range(
                    request.start,
                    request.end,
                    &request.start_field,
                    &request.end_field,
                    &options,
                )
                .context("Invalid options")?;
            print_report(valid, &session, None)?;
            Ok(valid)
        }
        Commands::Leave { input } => {
            let request: LeaveRequest = read_request(input.as_ref())?;
            let mut validator = leave_validator(session, &config, &request.user_id, request.used_days);
            let options: ValidationOptions = overlay(&validator.default_options(), request.options)?;
            let valid = validator
                .validate_leave_request(request.start, request.end, &request.user_id, &options)
                .context("Invalid options")?;
            print_report(valid, validator.session(), None)?;
            Ok(valid)
        }
        Commands::Recurring { input } => {
            let request: RecurringRequest = read_request(input.as_ref())?;
            let mut validator = leave_validator(session, &config, &request.user_id, request.used_days);
            let defaults = RecurringOptions::from_defaults(validator.default_options(), &config.recurring);
            let options: RecurringOptions = overlay(&defaults, request.options)?;
            let report = validator
                .validate_recurring_leave_request(
                    request.start,
                    request.end,
                    &request.user_id,
                    &request.pattern,
                    &options,
                )
                .context("Failed to validate recurring request")?;
            let valid = report.valid;
            print_report(valid, validator.session(), Some(report))?;
            Ok(valid)
        }
    }
}

fn build_session(config: &GuardConfig, today: Option<NaiveDate>) -> Result<ValidationSession> {
    let tz = config.tz()?;
    Ok(match today {
        Some(day) => ValidationSession::with_clock(FixedClock(day), tz),
        None => ValidationSession::with_clock(SystemClock::new(tz), tz),
    })
}

fn leave_validator(
    session: ValidationSession,
    config: &GuardConfig,
    user_id: &str,
    used_days: Option<i64>,
) -> LeaveValidator {
    let validator = LeaveValidator::with_config(session, config);
    match used_days {
        Some(used) => validator.with_quota_source(HashMap::from([(user_id.to_string(), used)])),
        None => validator,
    }
}

/// Apply the request's `options` object key by key on top of `base`.
fn overlay<T: Serialize + DeserializeOwned>(base: &T, patch: Option<Value>) -> Result<T> {
    let mut merged = serde_json::to_value(base).context("Failed to serialize default options")?;
    match (&mut merged, patch) {
        (_, None) => {}
        (Value::Object(fields), Some(Value::Object(patch))) => fields.extend(patch),
        (_, Some(other)) => anyhow::bail!("\"options\" must be a JSON object, got: {}", other),
    }
    serde_json::from_value(merged).context("Failed to parse options")
}

fn read_request<T: DeserializeOwned>(path: Option<&PathBuf>) -> Result<T> {
    let text = match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read file: {}", path.display()))?,
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read from stdin")?;
            buf
        }
    };
    serde_json::from_str(&text).context("Failed to parse request JSON")
}

fn print_report(
    valid: bool,
    session: &ValidationSession,
    recurring: Option<RecurringReport>,
) -> Result<()> {
    let report = Report {
        valid,
        errors: session.errors(),
        context: session.context(),
        recurring,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
