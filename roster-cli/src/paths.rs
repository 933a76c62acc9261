//! Well-known locations under `~/.roster`.

use std::path::PathBuf;

use anyhow::{Context, Result};

pub const ROSTER_DIR: &str = ".roster";
pub const CONFIG_FILE: &str = "config.yaml";

pub fn roster_home() -> Result<PathBuf> {
    let home = dirs::home_dir().context("could not determine home directory")?;
    Ok(home.join(ROSTER_DIR))
}

/// `~/.roster/config.yaml`
pub fn default_config_path() -> Result<PathBuf> {
    Ok(roster_home()?.join(CONFIG_FILE))
}
