//! Print ledger interface.

use async_trait::async_trait;

use crate::model::{BadgeStatus, NewPrint, PrintEvent, RosterEntry};
use crate::printer::PrintError;

/// Result type for ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;

/// Errors that can occur during ledger operations.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("Unknown print type: {0}")]
    UnknownPrintType(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Printer error: {0}")]
    Device(#[from] PrintError),
}

/// Coarse error classes a transport layer maps to status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Storage could not commit or stored data could not be read. State is unchanged.
    Storage,
    /// Request rejected before any storage access.
    Validation,
    /// The label printer refused or could not be reached. Nothing was recorded.
    Device,
}

impl LedgerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LedgerError::Database(_)
            | LedgerError::InvalidTimestamp(_)
            | LedgerError::UnknownPrintType(_) => ErrorKind::Storage,
            LedgerError::Validation(_) => ErrorKind::Validation,
            LedgerError::Device(_) => ErrorKind::Device,
        }
    }
}

/// Interface for the print ledger.
///
/// The ledger owns the append-only print history and the per-company badge
/// status projection derived from it. Every mutating operation is atomic:
/// both tables change together or not at all.
///
/// Implementations:
/// - `SqliteLedger`: SQLite storage
#[async_trait]
pub trait PrintLedger: Send + Sync {
    /// Append a print event.
    ///
    /// Badge prints also upsert the company's badge status, accumulating
    /// `quantity` and refreshing `printed_at`, in the same transaction.
    async fn record_print(&self, print: NewPrint) -> Result<PrintEvent>;

    /// All print events, most recent first.
    async fn history(&self) -> Result<Vec<PrintEvent>>;

    /// All badge status rows ordered by company number.
    async fn badge_status(&self) -> Result<Vec<BadgeStatus>>;

    /// Badge status rows whose name or number contains `query`, ignoring case.
    async fn search_badges(&self, query: &str) -> Result<Vec<BadgeStatus>>;

    /// Zero every badge status row in place and drop badge-type history.
    async fn reset_badges(&self) -> Result<()>;

    /// Drop print history of every type. Badge status is left as is.
    async fn clear_history(&self) -> Result<()>;

    /// `reset_badges` and `clear_history` as one transaction.
    async fn reset_all(&self) -> Result<()>;

    /// Ensure a badge status row exists for every roster company.
    ///
    /// Unknown companies start as never printed; known companies only get
    /// their name refreshed. Returns the number of rows written.
    async fn seed_roster(&self, roster: &[RosterEntry]) -> Result<u64>;
}
