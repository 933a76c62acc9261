//! `roster sync`: reconcile every member's contacts against the directory.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use dialoguer::Input;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use roster_core::{MemberFailure, ReconcileEvent, ReconcileReport, RunSummary};
use roster_sync::{pipeline, BatchDriver, BatchOutcome, Reconciler};

use crate::config::{self, LogFormat};
use crate::context::RunContext;
use crate::logging::init_tracing;

/// Arguments for `roster sync`.
#[derive(Args, Debug)]
pub struct SyncArgs {
    /// Config file (default: ~/.roster/config.yaml when present).
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Reconcile only the first N members of the roster.
    #[arg(long, value_name = "N")]
    pub limit: Option<usize>,

    /// Show the roster size and ask how many members to process.
    #[arg(long, conflicts_with = "limit")]
    pub interactive: bool,

    /// Plan changes without creating or deleting any contact.
    #[arg(long)]
    pub dry_run: bool,

    /// Members reconciled in parallel.
    #[arg(long, value_name = "N")]
    pub concurrency: Option<usize>,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,

    /// Log record format on stderr (or the configured log file).
    #[arg(long, value_enum, value_name = "FORMAT")]
    pub log_format: Option<LogFormat>,
}

impl SyncArgs {
    pub fn run(self) -> Result<()> {
        let mut config = config::load(self.config.as_deref())?;
        if let Some(limit) = self.limit {
            config.limit = Some(limit);
        }
        if let Some(concurrency) = self.concurrency {
            config.concurrency = concurrency;
        }
        if let Some(format) = self.log_format {
            config.logging.format = format;
        }
        init_tracing(&config.logging)?;

        let ctx = RunContext::bootstrap(&config)?;
        let reconciler = Reconciler::new(
            &ctx.people,
            &ctx.sleeper,
            config.reconcile_options(self.dry_run),
        );
        let driver = BatchDriver::new(&ctx.delegator, reconciler).with_concurrency(config.concurrency);

        let outcome = if self.interactive {
            let roster = pipeline::fetch_roster(&ctx.directory, &config.customer_id)
                .context("failed to list directory members")?;
            let limit = prompt_limit(roster.len())?;
            driver.run(&roster, limit)
        } else {
            pipeline::run(&ctx.directory, &config.customer_id, &driver, config.limit)
                .context("failed to list directory members")?
        };

        if self.json {
            print_json(&outcome, self.dry_run)
        } else {
            print_table(&outcome, self.dry_run);
            Ok(())
        }
    }
}

// The prompt goes to stderr so `--json` stdout stays parseable.
fn prompt_limit(roster_size: usize) -> Result<Option<usize>> {
    let answer = Input::<String>::new()
        .with_prompt(limit_prompt(roster_size))
        .allow_empty(true)
        .validate_with(|input: &String| -> Result<(), String> {
            let trimmed = input.trim();
            if trimmed.is_empty() || trimmed.parse::<usize>().is_ok() {
                Ok(())
            } else {
                Err(format!("'{trimmed}' is not a number"))
            }
        })
        .interact_text()
        .context("failed to read member limit")?;
    parse_limit(&answer)
}

fn limit_prompt(roster_size: usize) -> String {
    format!("{roster_size} members in the directory. How many to process? (blank for all)")
}

fn parse_limit(answer: &str) -> Result<Option<usize>> {
    let trimmed = answer.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    let limit = trimmed
        .parse()
        .with_context(|| format!("'{trimmed}' is not a number"))?;
    Ok(Some(limit))
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct SyncJson<'a> {
    dry_run: bool,
    elapsed_ms: u64,
    summary: RunSummary,
    members: &'a [ReconcileReport],
    failures: &'a [MemberFailure],
}

#[derive(Tabled)]
struct MemberRow {
    #[tabled(rename = "member")]
    member: String,
    #[tabled(rename = "contacts")]
    existing: usize,
    #[tabled(rename = "added")]
    added: usize,
    #[tabled(rename = "deleted")]
    deleted: usize,
    #[tabled(rename = "failed")]
    failed: usize,
}

#[derive(Tabled)]
struct ChangeRow {
    #[tabled(rename = "member")]
    member: String,
    #[tabled(rename = "change")]
    change: String,
    #[tabled(rename = "contact")]
    contact: String,
    #[tabled(rename = "detail")]
    detail: String,
}

fn print_json(outcome: &BatchOutcome, dry_run: bool) -> Result<()> {
    let payload = SyncJson {
        dry_run,
        elapsed_ms: outcome.elapsed.as_millis() as u64,
        summary: outcome.summary(),
        members: &outcome.reports,
        failures: &outcome.failures,
    };
    println!(
        "{}",
        serde_json::to_string_pretty(&payload).context("failed to serialize sync JSON")?
    );
    Ok(())
}

fn print_table(outcome: &BatchOutcome, dry_run: bool) {
    let prefix = if dry_run { "[dry-run] " } else { "" };
    let summary = outcome.summary();

    if outcome.reports.is_empty() && outcome.failures.is_empty() {
        println!("{prefix}No members to process.");
        return;
    }

    let rows: Vec<MemberRow> = outcome
        .reports
        .iter()
        .map(|report| MemberRow {
            member: report.member.to_string(),
            existing: report.existing_contacts,
            added: if dry_run {
                report.planned_additions()
            } else {
                report.added()
            },
            deleted: if dry_run {
                report.planned_deletions()
            } else {
                report.deleted()
            },
            failed: report.failures(),
        })
        .collect();
    if !rows.is_empty() {
        let mut table = Table::new(rows);
        table.with(Style::rounded());
        println!("{table}");
    }

    let changes: Vec<ChangeRow> = outcome
        .reports
        .iter()
        .flat_map(|report| report.events.iter().map(move |event| change_row(report, event)))
        .collect();
    if !changes.is_empty() {
        let mut table = Table::new(changes);
        table.with(Style::rounded());
        println!("{table}");
    }

    for failure in &outcome.failures {
        println!("{} {}: {}", "✗".red().bold(), failure.member, failure.error);
    }

    let line = if dry_run {
        format!(
            "[dry-run] {} members processed | would add {} | would delete {} | {} failures",
            summary.members_processed,
            summary.planned_additions,
            summary.planned_deletions,
            summary.total_failures(),
        )
    } else {
        format!(
            "{} members processed | added {} | deleted {} | {} failures",
            summary.members_processed,
            summary.contacts_added,
            summary.contacts_deleted,
            summary.total_failures(),
        )
    };
    if summary.total_failures() > 0 {
        println!("{} {line}", "!".yellow().bold());
    } else {
        println!("{} {line}", "✓".green().bold());
    }
}

fn change_row(report: &ReconcileReport, event: &ReconcileEvent) -> ChangeRow {
    let (change, detail) = match event {
        ReconcileEvent::Added { attempts, .. } => {
            ("added".green().to_string(), format!("{attempts} attempt(s)"))
        }
        ReconcileEvent::CreateFailed {
            attempts, error, ..
        } => (
            "add failed".red().to_string(),
            format!("{error} ({attempts} attempt(s))"),
        ),
        ReconcileEvent::Deleted { resource_name, .. } => {
            ("deleted".yellow().to_string(), resource_name.to_string())
        }
        ReconcileEvent::DeleteFailed {
            resource_name,
            error,
            ..
        } => (
            "delete failed".red().to_string(),
            format!("{resource_name}: {error}"),
        ),
        ReconcileEvent::WouldAdd { .. } => ("would add".cyan().to_string(), String::new()),
        ReconcileEvent::WouldDelete { resource_name, .. } => {
            ("would delete".cyan().to_string(), resource_name.to_string())
        }
    };
    ChangeRow {
        member: report.member.to_string(),
        change,
        contact: event.email().to_string(),
        detail,
    }
}
