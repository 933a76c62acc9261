//! Shared entrypoints used by the CLI commands.

use roster_core::{DirectoryError, DirectoryService, Roster};

use crate::batch::{BatchDriver, BatchOutcome};

/// Fetch the roster once for the run.
pub fn fetch_roster(
    directory: &dyn DirectoryService,
    customer_id: &str,
) -> Result<Roster, DirectoryError> {
    let members = directory.list_members(customer_id)?;
    tracing::info!(customer_id, members = members.len(), "fetched directory roster");
    Ok(Roster::new(members))
}

/// Fetch the roster and reconcile up to `limit` members.
pub fn run(
    directory: &dyn DirectoryService,
    customer_id: &str,
    driver: &BatchDriver<'_>,
    limit: Option<usize>,
) -> Result<BatchOutcome, DirectoryError> {
    let roster = fetch_roster(directory, customer_id)?;
    Ok(driver.run(&roster, limit))
}
