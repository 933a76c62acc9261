//! `roster members`: print the directory roster.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use tabled::{settings::Style, Table, Tabled};

use roster_sync::pipeline;

use crate::config;
use crate::context::RunContext;
use crate::logging::init_tracing;

#[derive(Args, Debug)]
pub struct MembersArgs {
    /// Config file (default: ~/.roster/config.yaml when present).
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Tabled)]
struct MemberRow {
    #[tabled(rename = "email")]
    email: String,
    #[tabled(rename = "name")]
    name: String,
    #[tabled(rename = "phone")]
    phone: String,
}

impl MembersArgs {
    pub fn run(self) -> Result<()> {
        let config = config::load(self.config.as_deref())?;
        init_tracing(&config.logging)?;

        let ctx = RunContext::bootstrap(&config)?;
        let roster = pipeline::fetch_roster(&ctx.directory, &config.customer_id)
            .context("failed to list directory members")?;

        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&roster).context("failed to serialize roster JSON")?
            );
            return Ok(());
        }

        println!("{} members in customer '{}'", roster.len(), config.customer_id);
        if roster.is_empty() {
            return Ok(());
        }
        let rows: Vec<MemberRow> = roster
            .iter()
            .map(|member| MemberRow {
                email: member.primary_email.to_string(),
                name: member.full_name.clone(),
                phone: member.phone_numbers.first().cloned().unwrap_or_default(),
            })
            .collect();
        let mut table = Table::new(rows);
        table.with(Style::rounded());
        println!("{table}");
        Ok(())
    }
}
