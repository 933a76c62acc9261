//! # roster-sync
//!
//! Contact reconciliation and the batch driver.
//!
//! [`Reconciler::reconcile`] brings one member's contacts in line with the
//! roster; [`BatchDriver::run`] does so for every member, isolating failures.

pub mod batch;
pub mod error;
pub mod pipeline;
pub mod reconcile;

pub use batch::{BatchDriver, BatchOutcome};
pub use error::MemberError;
pub use reconcile::{plan, ContactPlan, ReconcileOptions, Reconciler};
