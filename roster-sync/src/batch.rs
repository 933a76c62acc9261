//! Batch driver: reconcile every member, isolating per-member failures.

use std::time::{Duration, Instant};

use rayon::prelude::*;

use roster_core::{
    CredentialDelegator, DirectoryMember, MemberFailure, ReconcileReport, Roster, RunSummary,
};

use crate::error::MemberError;
use crate::reconcile::Reconciler;

/// Reports for every reconciled member and failures for the rest, both in
/// roster order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    pub reports: Vec<ReconcileReport>,
    pub failures: Vec<MemberFailure>,
    pub elapsed: Duration,
}

impl BatchOutcome {
    pub fn summary(&self) -> RunSummary {
        RunSummary::from_parts(&self.reports, &self.failures)
    }
}

pub struct BatchDriver<'a> {
    delegator: &'a dyn CredentialDelegator,
    reconciler: Reconciler<'a>,
    concurrency: usize,
}

impl<'a> BatchDriver<'a> {
    pub fn new(delegator: &'a dyn CredentialDelegator, reconciler: Reconciler<'a>) -> Self {
        Self {
            delegator,
            reconciler,
            concurrency: 1,
        }
    }

    /// Reconcile up to `n` members at once. `0` and `1` mean sequential.
    pub fn with_concurrency(mut self, n: usize) -> Self {
        self.concurrency = n.max(1);
        self
    }

    /// Reconcile the first `limit` roster members (all when `None`).
    ///
    /// Never fails: a member that cannot be delegated or whose contacts
    /// cannot be read is logged and recorded in [`BatchOutcome::failures`].
    pub fn run(&self, roster: &Roster, limit: Option<usize>) -> BatchOutcome {
        let started = Instant::now();
        let take = limit.unwrap_or(roster.len()).min(roster.len());
        let selected = &roster.members()[..take];
        tracing::info!(
            members = take,
            roster = roster.len(),
            concurrency = self.concurrency,
            dry_run = self.reconciler.options().dry_run,
            "starting batch"
        );

        let results = self.process_all(selected, roster);

        let mut outcome = BatchOutcome::default();
        for (member, result) in selected.iter().zip(results) {
            match result {
                Ok(report) => outcome.reports.push(report),
                Err(err) => outcome.failures.push(MemberFailure {
                    member: member.primary_email.clone(),
                    error: err.to_string(),
                }),
            }
        }
        outcome.elapsed = started.elapsed();

        let summary = outcome.summary();
        tracing::info!(
            members_processed = summary.members_processed,
            members_failed = summary.members_failed,
            contacts_added = summary.contacts_added,
            contacts_deleted = summary.contacts_deleted,
            failures = summary.total_failures(),
            elapsed_ms = outcome.elapsed.as_millis() as u64,
            "batch complete"
        );
        outcome
    }

    fn process_all(
        &self,
        selected: &[DirectoryMember],
        roster: &Roster,
    ) -> Vec<Result<ReconcileReport, MemberError>> {
        if self.concurrency > 1 && selected.len() > 1 {
            match rayon::ThreadPoolBuilder::new()
                .num_threads(self.concurrency)
                .thread_name(|i| format!("roster-worker-{i}"))
                .build()
            {
                Ok(pool) => {
                    return pool.install(|| {
                        selected
                            .par_iter()
                            .map(|member| self.process_member(member, roster))
                            .collect()
                    });
                }
                Err(err) => {
                    tracing::warn!(error = %err, "worker pool unavailable, running sequentially");
                }
            }
        }

        selected
            .iter()
            .map(|member| self.process_member(member, roster))
            .collect()
    }

    fn process_member(
        &self,
        member: &DirectoryMember,
        roster: &Roster,
    ) -> Result<ReconcileReport, MemberError> {
        let result = self
            .delegator
            .delegate(member.primary_email.as_str())
            .map_err(MemberError::from)
            .and_then(|credential| self.reconciler.reconcile(member, roster, &credential));

        match &result {
            Ok(report) => tracing::info!(
                member = %member.primary_email,
                added = report.added(),
                deleted = report.deleted(),
                failures = report.failures(),
                "member reconciled"
            ),
            Err(err) => tracing::error!(
                member = %member.primary_email,
                error = %err,
                "failed to process member"
            ),
        }
        result
    }
}
