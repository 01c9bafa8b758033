//! Reconciliation service.
//!
//! The call surface the transport layer drives: record prints, read back
//! history and badge status, reset, and render labels. Device delivery
//! always happens before the ledger is touched, so a failed print leaves no
//! trace in the ledger.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::interfaces::ledger::{LedgerError, PrintLedger, Result};
use crate::label::LabelRenderer;
use crate::model::{BadgeStatus, NewPrint, PrintEvent, PrintType, RosterEntry};
use crate::printer::LabelPrinter;
use crate::range;

use super::stats::PrintStats;

/// A print as submitted by a client: what was printed plus where and how.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrintRequest {
    #[serde(rename = "type")]
    pub kind: PrintType,
    pub item_id: i64,
    pub item_name: String,
    pub item_number: i64,
    pub quantity: i64,
    /// Device handle of the printer the markup is (or was) sent to.
    #[serde(default)]
    pub device: Option<String>,
    /// Rendered label markup.
    #[serde(default)]
    pub markup: Option<String>,
}

impl PrintRequest {
    /// Ledger entry for this request.
    pub fn to_new_print(&self) -> NewPrint {
        NewPrint::new(
            self.kind,
            self.item_id,
            self.item_name.clone(),
            self.item_number,
            self.quantity,
        )
    }

    /// Check every field before anything leaves the process.
    ///
    /// Returns the device handle and markup.
    fn validate(&self) -> Result<(&str, &str)> {
        let device = self
            .device
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .ok_or_else(|| LedgerError::Validation("missing required field: device".to_string()))?;
        let markup = self
            .markup
            .as_deref()
            .filter(|m| !m.trim().is_empty())
            .ok_or_else(|| LedgerError::Validation("missing required field: markup".to_string()))?;

        self.to_new_print().validate()?;
        Ok((device, markup))
    }
}

/// Reconciliation service.
///
/// Shares one ledger between all callers; constructed once at startup.
pub struct Reconciliation {
    ledger: Arc<dyn PrintLedger>,
    renderer: LabelRenderer,
}

impl Reconciliation {
    pub fn new(ledger: Arc<dyn PrintLedger>, renderer: LabelRenderer) -> Self {
        Self { ledger, renderer }
    }

    pub fn renderer(&self) -> &LabelRenderer {
        &self.renderer
    }

    pub async fn record_print(
        &self,
        kind: PrintType,
        item_id: i64,
        item_name: &str,
        item_number: i64,
        quantity: i64,
    ) -> Result<PrintEvent> {
        self.ledger
            .record_print(NewPrint::new(kind, item_id, item_name, item_number, quantity))
            .await
    }

    /// Record a print the client already delivered to its device.
    pub async fn acknowledge(&self, request: PrintRequest) -> Result<PrintEvent> {
        if let Err(e) = request.validate() {
            error!(error = %e, kind = %request.kind, "Rejected print acknowledgement");
            return Err(e);
        }
        self.ledger.record_print(request.to_new_print()).await
    }

    /// Deliver the markup to the device, then record the print.
    ///
    /// Nothing is recorded when validation or delivery fails.
    pub async fn dispatch<P: LabelPrinter>(
        &self,
        printer: &P,
        request: PrintRequest,
    ) -> Result<PrintEvent> {
        let (device, markup) = request.validate()?;

        if let Err(e) = printer.send(device, markup).await {
            error!(device, error = %e, "Label delivery failed; nothing recorded");
            return Err(e.into());
        }

        let event = self.ledger.record_print(request.to_new_print()).await?;
        info!(device, id = event.id, "Print dispatched and recorded");
        Ok(event)
    }

    pub async fn history(&self) -> Result<Vec<PrintEvent>> {
        self.ledger.history().await
    }

    pub async fn badge_status(&self) -> Result<Vec<BadgeStatus>> {
        self.ledger.badge_status().await
    }

    /// Matching badge rows; a blank query lists every row.
    pub async fn search_badges(&self, query: &str) -> Result<Vec<BadgeStatus>> {
        if query.trim().is_empty() {
            return self.ledger.badge_status().await;
        }
        self.ledger.search_badges(query).await
    }

    pub async fn reset_badges(&self) -> Result<()> {
        self.ledger.reset_badges().await
    }

    pub async fn clear_history(&self) -> Result<()> {
        self.ledger.clear_history().await
    }

    pub async fn reset_all(&self) -> Result<()> {
        self.ledger.reset_all().await
    }

    pub async fn seed_roster(&self, roster: &[RosterEntry]) -> Result<u64> {
        self.ledger.seed_roster(roster).await
    }

    /// Printing progress of `roster` against the current badge status.
    pub async fn stats(&self, roster: &[RosterEntry]) -> Result<PrintStats> {
        let statuses = self.ledger.badge_status().await?;
        Ok(PrintStats::compute(roster, &statuses))
    }

    pub fn parse_range_input(&self, text: &str) -> Vec<u32> {
        range::parse_range_input(text)
    }

    pub fn render_badge_label(&self, company_name: &str, number: i64) -> String {
        self.renderer.badge_label(company_name, number)
    }

    pub fn render_wine_label(&self, number: i64, name: &str) -> String {
        self.renderer.wine_label(number, name)
    }

    pub fn render_employee_label(&self, name: &str, function: &str) -> String {
        self.renderer.employee_label(name, function)
    }
}
