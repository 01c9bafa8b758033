//! Badge printing progress.

use serde::Serialize;

use crate::model::{BadgeStatus, RosterEntry};

/// How far badge printing has progressed against the attendee roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrintStats {
    /// Companies on the roster.
    pub total_companies: usize,
    /// Companies with at least one badge printed.
    pub printed_companies: usize,
    /// Badges printed across all printed companies.
    pub badges_printed: i64,
    /// Sum of people over the roster.
    pub badges_possible: i64,
    /// `printed_companies / total_companies`, rounded to a whole percent.
    pub companies_percent: u32,
    /// `badges_printed / badges_possible`, rounded to a whole percent.
    pub badges_percent: u32,
}

impl PrintStats {
    pub fn compute(roster: &[RosterEntry], statuses: &[BadgeStatus]) -> Self {
        let total_companies = roster.len();
        let printed_companies = statuses.iter().filter(|s| s.is_printed).count();
        let badges_printed = statuses
            .iter()
            .filter(|s| s.is_printed)
            .map(|s| s.quantity)
            .sum();
        let badges_possible = roster.iter().map(|r| r.people_count).sum();

        Self {
            total_companies,
            printed_companies,
            badges_printed,
            badges_possible,
            companies_percent: percent(printed_companies as i64, total_companies as i64),
            badges_percent: percent(badges_printed, badges_possible),
        }
    }
}

fn percent(part: i64, total: i64) -> u32 {
    if total <= 0 {
        return 0;
    }
    (part as f64 / total as f64 * 100.0).round().max(0.0) as u32
}
