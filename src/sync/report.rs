use serde::Serialize;
use std::fmt;
use tracing::info;

use crate::mirror::TableReport;

/// Lifecycle of one sync pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SyncState {
    Idle,
    Fetching,
    Applying,
    Committed,
    RolledBack,
}

impl SyncState {
    pub fn is_terminal(self) -> bool {
        matches!(self, SyncState::Committed | SyncState::RolledBack)
    }

    /// Moves to `next`, tracing the transition.
    pub(crate) fn advance(&mut self, next: SyncState, run_id: &str) {
        info!(run_id, from = %self, to = %next, "sync state");
        *self = next;
    }

    /// Ends a pass that stopped short of a terminal state. Success, which
    /// includes a pass with nothing to apply, ends in `COMMITTED`; any
    /// failure ends in `ROLLED_BACK`. A terminal state is left as is.
    pub(crate) fn settle(&mut self, succeeded: bool, run_id: &str) -> SyncState {
        if !self.is_terminal() {
            let next = if succeeded {
                SyncState::Committed
            } else {
                SyncState::RolledBack
            };
            self.advance(next, run_id);
        }
        *self
    }
}

impl fmt::Display for SyncState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SyncState::Idle => "IDLE",
            SyncState::Fetching => "FETCHING",
            SyncState::Applying => "APPLYING",
            SyncState::Committed => "COMMITTED",
            SyncState::RolledBack => "ROLLED_BACK",
        })
    }
}

/// What a committed pass did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub run_id: String,
    pub mode: String,
    pub from_version: Option<String>,
    /// `None` when a delta carried no `newVersion`; the cursor was left as is.
    pub to_version: Option<String>,
    pub tables: Vec<TableReport>,
}

impl SyncReport {
    pub fn upserted(&self) -> u64 {
        self.tables.iter().map(|t| t.upserted).sum()
    }

    pub fn deleted(&self) -> u64 {
        self.tables.iter().map(|t| t.deleted).sum()
    }

    pub fn table(&self, name: &str) -> Option<&TableReport> {
        self.tables.iter().find(|t| t.table == name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "detail", rename_all = "snake_case")]
pub enum SyncOutcome {
    Committed(SyncReport),
    /// The remote reported nothing new; nothing was touched.
    NoChanges,
    /// The remote reported a mode this build does not know; nothing was
    /// touched.
    UnknownMode(String),
}

impl SyncOutcome {
    pub fn report(&self) -> Option<&SyncReport> {
        match self {
            SyncOutcome::Committed(report) => Some(report),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_change_pass_ends_committed() {
        let mut state = SyncState::Fetching;
        assert_eq!(state.settle(true, "run"), SyncState::Committed);
    }

    #[test]
    fn failure_before_the_transaction_ends_rolled_back() {
        let mut state = SyncState::Applying;
        assert_eq!(state.settle(false, "run"), SyncState::RolledBack);

        let mut state = SyncState::Fetching;
        assert_eq!(state.settle(false, "run"), SyncState::RolledBack);
    }

    #[test]
    fn terminal_state_is_kept() {
        let mut state = SyncState::RolledBack;
        assert_eq!(state.settle(true, "run"), SyncState::RolledBack);

        let mut state = SyncState::Committed;
        assert_eq!(state.settle(false, "run"), SyncState::Committed);
    }
}
