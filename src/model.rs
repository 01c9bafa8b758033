//! Ledger record types.
//!
//! These are the rows of the two ledger tables plus the inputs that
//! produce them. All of them serialize to `snake_case` JSON so a transport
//! layer can hand them out unchanged.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::interfaces::ledger::LedgerError;

/// Largest quantity a single print may carry.
pub const MAX_QUANTITY: i64 = u32::MAX as i64;

/// Kind of label a print event produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrintType {
    Wine,
    Badge,
    Employee,
}

impl PrintType {
    /// Stored text form.
    pub fn as_str(self) -> &'static str {
        match self {
            PrintType::Wine => "wine",
            PrintType::Badge => "badge",
            PrintType::Employee => "employee",
        }
    }
}

impl fmt::Display for PrintType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PrintType {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "wine" => Ok(PrintType::Wine),
            "badge" => Ok(PrintType::Badge),
            "employee" => Ok(PrintType::Employee),
            other => Err(LedgerError::UnknownPrintType(other.to_string())),
        }
    }
}

/// One completed physical print action. Immutable once stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrintEvent {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: PrintType,
    pub item_id: i64,
    pub item_name: String,
    pub item_number: i64,
    pub quantity: i64,
    pub timestamp: DateTime<Utc>,
}

/// Input for appending a print event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPrint {
    #[serde(rename = "type")]
    pub kind: PrintType,
    pub item_id: i64,
    pub item_name: String,
    /// Badge or wine number; `0` for employee labels.
    pub item_number: i64,
    pub quantity: i64,
}

impl NewPrint {
    pub fn new(
        kind: PrintType,
        item_id: i64,
        item_name: impl Into<String>,
        item_number: i64,
        quantity: i64,
    ) -> Self {
        Self {
            kind,
            item_id,
            item_name: item_name.into(),
            item_number,
            quantity,
        }
    }

    /// Badge print for a roster company. The company number doubles as item id.
    pub fn badge(company_number: i64, company_name: impl Into<String>, quantity: i64) -> Self {
        Self::new(
            PrintType::Badge,
            company_number,
            company_name,
            company_number,
            quantity,
        )
    }

    /// Employee label; the stored name is `"{name} – {function}"`.
    pub fn employee(item_id: i64, name: &str, function: &str, quantity: i64) -> Self {
        Self::new(
            PrintType::Employee,
            item_id,
            format!("{name} – {function}"),
            0,
            quantity,
        )
    }

    /// Reject inputs that must never reach storage.
    pub fn validate(&self) -> Result<(), LedgerError> {
        if !(1..=MAX_QUANTITY).contains(&self.quantity) {
            return Err(LedgerError::Validation(format!(
                "quantity must be between 1 and {MAX_QUANTITY}, got {}",
                self.quantity
            )));
        }
        if self.item_name.trim().is_empty() {
            return Err(LedgerError::Validation("item name is required".to_string()));
        }
        Ok(())
    }
}

/// Per-company badge projection row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BadgeStatus {
    pub company_number: i64,
    pub company_name: String,
    pub is_printed: bool,
    pub printed_at: Option<DateTime<Utc>>,
    pub quantity: i64,
}

/// Attendee roster line used to pre-seed the badge projection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterEntry {
    pub company_number: i64,
    pub company_name: String,
    pub people_count: i64,
}

impl RosterEntry {
    pub fn new(company_number: i64, company_name: impl Into<String>, people_count: i64) -> Self {
        Self {
            company_number,
            company_name: company_name.into(),
            people_count,
        }
    }
}
