//! Abstract interfaces for badge-ledger components.
//!
//! These traits define the contracts for:
//! - Print ledger (history + badge status persistence)
//! - Label printers (device delivery) live in [`crate::printer`]

pub mod ledger;

pub use ledger::{ErrorKind, LedgerError, PrintLedger};
