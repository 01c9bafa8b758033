//! Service layer over the print ledger.

pub mod reconciliation;
pub mod stats;

pub use reconciliation::{PrintRequest, Reconciliation};
pub use stats::PrintStats;
