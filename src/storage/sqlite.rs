//! SQLite implementation of the print ledger.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use sea_query::{Expr, OnConflict, Order, Query, SqliteQueryBuilder};
use sea_query_binder::SqlxBinder;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, Sqlite, SqliteConnection, SqlitePool, Transaction};
use tracing::{debug, info, warn};

use crate::interfaces::ledger::{LedgerError, PrintLedger, Result};
use crate::model::{BadgeStatus, NewPrint, PrintEvent, PrintType, RosterEntry};

use super::schema::{
    BadgeStatuses, PrintHistory, CREATE_BADGE_STATUS_TABLE, CREATE_PRINT_HISTORY_TABLE,
};

/// SQLite implementation of PrintLedger.
pub struct SqliteLedger {
    pool: SqlitePool,
}

impl SqliteLedger {
    /// Create a new SQLite ledger.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Initialize the database schema.
    pub async fn init(&self) -> Result<()> {
        sqlx::raw_sql(CREATE_PRINT_HISTORY_TABLE)
            .execute(&self.pool)
            .await?;
        sqlx::raw_sql(CREATE_BADGE_STATUS_TABLE)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Get the underlying pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Open a write transaction.
    ///
    /// IMMEDIATE takes the write lock upfront, preventing deadlocks when
    /// concurrent DEFERRED transactions race to upgrade from shared to
    /// exclusive. Dropping the transaction before commit rolls it back.
    async fn begin(&self) -> Result<Transaction<'static, Sqlite>> {
        Ok(self.pool.begin_with("BEGIN IMMEDIATE").await?)
    }

    /// Append the event and apply it to the badge projection.
    async fn insert_print(conn: &mut SqliteConnection, print: &NewPrint) -> Result<PrintEvent> {
        let timestamp = Self::next_timestamp(conn).await?;
        let stamp = format_timestamp(timestamp);

        let (sql, values) = Query::insert()
            .into_table(PrintHistory::Table)
            .columns([
                PrintHistory::Type,
                PrintHistory::ItemId,
                PrintHistory::ItemName,
                PrintHistory::ItemNumber,
                PrintHistory::Quantity,
                PrintHistory::Timestamp,
            ])
            .values_panic([
                print.kind.as_str().into(),
                print.item_id.into(),
                print.item_name.clone().into(),
                print.item_number.into(),
                print.quantity.into(),
                stamp.clone().into(),
            ])
            .build_sqlx(SqliteQueryBuilder);

        let id = sqlx::query_with(&sql, values)
            .execute(&mut *conn)
            .await?
            .last_insert_rowid();

        if print.kind == PrintType::Badge {
            // Single conflict-resolving write: no read-then-write window.
            let (sql, values) = Query::insert()
                .into_table(BadgeStatuses::Table)
                .columns([
                    BadgeStatuses::CompanyNumber,
                    BadgeStatuses::CompanyName,
                    BadgeStatuses::IsPrinted,
                    BadgeStatuses::PrintedAt,
                    BadgeStatuses::Quantity,
                ])
                .values_panic([
                    print.item_number.into(),
                    print.item_name.clone().into(),
                    true.into(),
                    stamp.into(),
                    print.quantity.into(),
                ])
                .on_conflict(
                    OnConflict::column(BadgeStatuses::CompanyNumber)
                        .values([
                            (
                                BadgeStatuses::CompanyName,
                                Expr::cust("excluded.company_name"),
                            ),
                            (BadgeStatuses::IsPrinted, Expr::val(true).into()),
                            (BadgeStatuses::PrintedAt, Expr::cust("excluded.printed_at")),
                            (
                                BadgeStatuses::Quantity,
                                Expr::col((BadgeStatuses::Table, BadgeStatuses::Quantity))
                                    .add(Expr::cust("excluded.quantity")),
                            ),
                        ])
                        .to_owned(),
                )
                .build_sqlx(SqliteQueryBuilder);

            sqlx::query_with(&sql, values).execute(&mut *conn).await?;
        }

        Ok(PrintEvent {
            id,
            kind: print.kind,
            item_id: print.item_id,
            item_name: print.item_name.clone(),
            item_number: print.item_number,
            quantity: print.quantity,
            timestamp,
        })
    }

    /// Current time, never earlier than the latest stored event.
    async fn next_timestamp(conn: &mut SqliteConnection) -> Result<DateTime<Utc>> {
        let (sql, values) = Query::select()
            .expr(Expr::col(PrintHistory::Timestamp).max())
            .from(PrintHistory::Table)
            .build_sqlx(SqliteQueryBuilder);

        let row = sqlx::query_with(&sql, values).fetch_one(&mut *conn).await?;
        let latest: Option<String> = row.try_get(0)?;

        let now = Utc::now().trunc_subsecs(6);
        match latest {
            Some(latest) => Ok(now.max(parse_timestamp(&latest)?)),
            None => Ok(now),
        }
    }

    async fn zero_badges(conn: &mut SqliteConnection) -> Result<u64> {
        let (sql, values) = Query::update()
            .table(BadgeStatuses::Table)
            .values([
                (BadgeStatuses::IsPrinted, Expr::val(false).into()),
                (BadgeStatuses::PrintedAt, Expr::val(Option::<String>::None).into()),
                (BadgeStatuses::Quantity, Expr::val(0i64).into()),
            ])
            .build_sqlx(SqliteQueryBuilder);

        let result = sqlx::query_with(&sql, values).execute(&mut *conn).await?;
        Ok(result.rows_affected())
    }

    async fn delete_history(conn: &mut SqliteConnection, kind: Option<PrintType>) -> Result<u64> {
        let mut delete = Query::delete();
        delete.from_table(PrintHistory::Table);
        if let Some(kind) = kind {
            delete.and_where(Expr::col(PrintHistory::Type).eq(kind.as_str()));
        }
        let (sql, values) = delete.build_sqlx(SqliteQueryBuilder);

        let result = sqlx::query_with(&sql, values).execute(&mut *conn).await?;
        Ok(result.rows_affected())
    }

    async fn upsert_roster(conn: &mut SqliteConnection, roster: &[RosterEntry]) -> Result<u64> {
        let mut insert = Query::insert();
        insert.into_table(BadgeStatuses::Table).columns([
            BadgeStatuses::CompanyNumber,
            BadgeStatuses::CompanyName,
            BadgeStatuses::IsPrinted,
            BadgeStatuses::Quantity,
        ]);
        for entry in roster {
            insert.values_panic([
                entry.company_number.into(),
                entry.company_name.clone().into(),
                false.into(),
                0i64.into(),
            ]);
        }
        insert.on_conflict(
            OnConflict::column(BadgeStatuses::CompanyNumber)
                .value(BadgeStatuses::CompanyName, Expr::cust("excluded.company_name"))
                .to_owned(),
        );
        let (sql, values) = insert.build_sqlx(SqliteQueryBuilder);

        let result = sqlx::query_with(&sql, values).execute(&mut *conn).await?;
        Ok(result.rows_affected())
    }

    async fn select_badges(&self) -> Result<Vec<BadgeStatus>> {
        let (sql, values) = Query::select()
            .columns([
                BadgeStatuses::CompanyNumber,
                BadgeStatuses::CompanyName,
                BadgeStatuses::IsPrinted,
                BadgeStatuses::PrintedAt,
                BadgeStatuses::Quantity,
            ])
            .from(BadgeStatuses::Table)
            .order_by(BadgeStatuses::CompanyNumber, Order::Asc)
            .build_sqlx(SqliteQueryBuilder);

        let rows = sqlx::query_with(&sql, values).fetch_all(&self.pool).await?;
        rows.iter().map(badge_from_row).collect()
    }
}

#[async_trait]
impl PrintLedger for SqliteLedger {
    async fn record_print(&self, print: NewPrint) -> Result<PrintEvent> {
        print.validate()?;

        let mut tx = self.begin().await?;
        let result = Self::insert_print(&mut tx, &print).await;
        let event = finish(tx, result).await?;

        info!(
            id = event.id,
            kind = %event.kind,
            item_number = event.item_number,
            quantity = event.quantity,
            "Print recorded"
        );
        Ok(event)
    }

    async fn history(&self) -> Result<Vec<PrintEvent>> {
        let (sql, values) = Query::select()
            .columns([
                PrintHistory::Id,
                PrintHistory::Type,
                PrintHistory::ItemId,
                PrintHistory::ItemName,
                PrintHistory::ItemNumber,
                PrintHistory::Quantity,
                PrintHistory::Timestamp,
            ])
            .from(PrintHistory::Table)
            .order_by(PrintHistory::Timestamp, Order::Desc)
            .order_by(PrintHistory::Id, Order::Desc)
            .build_sqlx(SqliteQueryBuilder);

        let rows = sqlx::query_with(&sql, values).fetch_all(&self.pool).await?;
        debug!(count = rows.len(), "Loaded print history");
        rows.iter().map(event_from_row).collect()
    }

    async fn badge_status(&self) -> Result<Vec<BadgeStatus>> {
        self.select_badges().await
    }

    async fn search_badges(&self, query: &str) -> Result<Vec<BadgeStatus>> {
        // Matched here rather than with LIKE, which only folds ASCII case.
        let needle = query.trim().to_lowercase();
        let found: Vec<BadgeStatus> = self
            .select_badges()
            .await?
            .into_iter()
            .filter(|badge| matches_query(badge, &needle))
            .collect();

        debug!(query, count = found.len(), "Searched badge status");
        Ok(found)
    }

    async fn reset_badges(&self) -> Result<()> {
        let mut tx = self.begin().await?;
        let result = async {
            let zeroed = Self::zero_badges(&mut tx).await?;
            let removed = Self::delete_history(&mut tx, Some(PrintType::Badge)).await?;
            Ok::<_, LedgerError>((zeroed, removed))
        }
        .await;
        let (zeroed, removed) = finish(tx, result).await?;

        info!(zeroed, removed, "Badge status reset");
        Ok(())
    }

    async fn clear_history(&self) -> Result<()> {
        let mut tx = self.begin().await?;
        let result = Self::delete_history(&mut tx, None).await;
        let removed = finish(tx, result).await?;

        info!(removed, "Print history cleared");
        Ok(())
    }

    async fn reset_all(&self) -> Result<()> {
        let mut tx = self.begin().await?;
        let result = async {
            let zeroed = Self::zero_badges(&mut tx).await?;
            let removed = Self::delete_history(&mut tx, None).await?;
            Ok::<_, LedgerError>((zeroed, removed))
        }
        .await;
        let (zeroed, removed) = finish(tx, result).await?;

        info!(zeroed, removed, "Ledger reset");
        Ok(())
    }

    async fn seed_roster(&self, roster: &[RosterEntry]) -> Result<u64> {
        if roster.is_empty() {
            return Ok(0);
        }

        let mut tx = self.begin().await?;
        let result = Self::upsert_roster(&mut tx, roster).await;
        let written = finish(tx, result).await?;

        info!(companies = roster.len(), written, "Roster seeded");
        Ok(written)
    }
}

/// Commit on success, roll back on failure.
///
/// A failed commit rolls back when the transaction drops.
async fn finish<T>(tx: Transaction<'_, Sqlite>, result: Result<T>) -> Result<T> {
    match result {
        Ok(value) => {
            if let Err(e) = tx.commit().await {
                warn!(error = %e, "Commit failed; ledger transaction rolled back");
                return Err(e.into());
            }
            Ok(value)
        }
        Err(error) => {
            warn!(error = %error, "Rolling back ledger transaction");
            if let Err(e) = tx.rollback().await {
                warn!(error = %e, "Rollback failed");
            }
            Err(error)
        }
    }
}

fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| LedgerError::InvalidTimestamp(format!("{value}: {e}")))
}

/// Substring match on the company name or its decimal number.
///
/// `needle` must already be lowercased.
fn matches_query(badge: &BadgeStatus, needle: &str) -> bool {
    badge.company_name.to_lowercase().contains(needle)
        || badge.company_number.to_string().contains(needle)
}

fn event_from_row(row: &SqliteRow) -> Result<PrintEvent> {
    let kind: String = row.try_get("type")?;
    let timestamp: String = row.try_get("timestamp")?;

    Ok(PrintEvent {
        id: row.try_get("id")?,
        kind: kind.parse()?,
        item_id: row.try_get("item_id")?,
        item_name: row.try_get("item_name")?,
        item_number: row.try_get("item_number")?,
        quantity: row.try_get("quantity")?,
        timestamp: parse_timestamp(&timestamp)?,
    })
}

fn badge_from_row(row: &SqliteRow) -> Result<BadgeStatus> {
    let printed_at: Option<String> = row.try_get("printed_at")?;

    Ok(BadgeStatus {
        company_number: row.try_get("company_number")?,
        company_name: row.try_get("company_name")?,
        is_printed: row.try_get("is_printed")?,
        printed_at: printed_at.as_deref().map(parse_timestamp).transpose()?,
        quantity: row.try_get("quantity")?,
    })
}
