//! `roster config init` and `roster config show`

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Args, Subcommand};

use crate::config::{self, AppConfig};
use crate::paths;

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Write a starter config file.
    Init(InitArgs),

    /// Print the effective configuration after every layer is applied.
    Show(ShowArgs),
}

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Where to write the file (default: ~/.roster/config.yaml).
    #[arg(long, value_name = "PATH")]
    pub path: Option<PathBuf>,

    /// Overwrite an existing file.
    #[arg(long)]
    pub force: bool,
}

#[derive(Args, Debug)]
pub struct ShowArgs {
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

pub fn run(cmd: ConfigCommand) -> Result<()> {
    match cmd {
        ConfigCommand::Init(args) => init(args),
        ConfigCommand::Show(args) => show(args),
    }
}

fn starter() -> Result<AppConfig> {
    Ok(AppConfig {
        service_account_key: Some(paths::roster_home()?.join("service-account.json")),
        admin_email: Some("admin@example.com".to_string()),
        ..AppConfig::default()
    })
}

fn init(args: InitArgs) -> Result<()> {
    let path = match args.path {
        Some(path) => path,
        None => paths::default_config_path()?,
    };
    if path.exists() && !args.force {
        bail!(
            "'{}' already exists; pass --force to overwrite",
            path.display()
        );
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("cannot create '{}'", parent.display()))?;
    }

    let yaml = serde_yaml::to_string(&starter()?).context("failed to serialize config")?;
    std::fs::write(&path, yaml).with_context(|| format!("cannot write '{}'", path.display()))?;

    println!("✓ Wrote {}", path.display());
    println!("  Set service_account_key and admin_email before running `roster sync`.");
    Ok(())
}

fn show(args: ShowArgs) -> Result<()> {
    let config = config::load(args.config.as_deref())?;
    let yaml = serde_yaml::to_string(&config).context("failed to serialize config")?;
    print!("{yaml}");
    Ok(())
}
