//! badge-ledger - event badge and label printing ledger
//!
//! Tracks which attendee companies have had visitor badges printed, keeps
//! the history of every print job (badges, wine labels, employee labels)
//! and renders printer-ready ZPL label markup.
//!
//! ## Architecture
//! ```text
//! LabelRenderer --markup--> LabelPrinter (device) --ok--> Reconciliation
//!                                                             |
//!                                                             v
//!                                      PrintLedger: print_history + badge_status
//! ```

pub mod config;
pub mod interfaces;
pub mod label;
pub mod model;
pub mod printer;
pub mod range;
pub mod services;
pub mod storage;
pub mod utils;

pub use interfaces::{ErrorKind, LedgerError, PrintLedger};
pub use label::{render_badge_label, render_employee_label, render_wine_label};
pub use model::{BadgeStatus, NewPrint, PrintEvent, PrintType, RosterEntry};
pub use range::parse_range_input;
pub use services::{PrintRequest, PrintStats, Reconciliation};
