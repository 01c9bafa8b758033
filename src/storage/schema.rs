//! Database schema definitions using sea-query.
//!
//! These define the table and column identifiers for type-safe query building.

use sea_query::Iden;

/// Print history table schema.
#[derive(Iden)]
pub enum PrintHistory {
    Table,
    #[iden = "id"]
    Id,
    #[iden = "type"]
    Type,
    #[iden = "item_id"]
    ItemId,
    #[iden = "item_name"]
    ItemName,
    #[iden = "item_number"]
    ItemNumber,
    #[iden = "quantity"]
    Quantity,
    #[iden = "timestamp"]
    Timestamp,
}

/// Badge status table schema.
#[derive(Iden)]
pub enum BadgeStatuses {
    #[iden = "badge_status"]
    Table,
    #[iden = "company_number"]
    CompanyNumber,
    #[iden = "company_name"]
    CompanyName,
    #[iden = "is_printed"]
    IsPrinted,
    #[iden = "printed_at"]
    PrintedAt,
    #[iden = "quantity"]
    Quantity,
}

/// SQL for creating the print history table.
///
/// Timestamps are fixed-width RFC 3339 UTC text, so ordering by the column
/// orders by time.
pub const CREATE_PRINT_HISTORY_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS print_history (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    type TEXT NOT NULL,
    item_id INTEGER NOT NULL,
    item_name TEXT NOT NULL,
    item_number INTEGER NOT NULL,
    quantity INTEGER NOT NULL CHECK (quantity BETWEEN 1 AND 4294967295),
    timestamp TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_print_history_type ON print_history(type);
CREATE INDEX IF NOT EXISTS idx_print_history_timestamp ON print_history(timestamp);
"#;

/// SQL for creating the badge status table.
///
/// SQLite turns an overflowing integer sum into REAL; the `typeof` check
/// makes such an update fail instead of storing an undecodable quantity.
pub const CREATE_BADGE_STATUS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS badge_status (
    company_number INTEGER PRIMARY KEY,
    company_name TEXT NOT NULL,
    is_printed BOOLEAN NOT NULL DEFAULT 0,
    printed_at TEXT,
    quantity INTEGER NOT NULL DEFAULT 0
        CHECK (typeof(quantity) = 'integer' AND quantity >= 0)
);
"#;
