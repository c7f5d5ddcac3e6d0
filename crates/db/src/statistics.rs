//! Session and transaction counters kept per session factory.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Live counters shared by a factory and every session it opens.
#[derive(Debug, Default)]
pub struct SessionStatistics {
    sessions_opened: AtomicU64,
    sessions_closed: AtomicU64,
    transactions_begun: AtomicU64,
    transactions_committed: AtomicU64,
    transactions_rolled_back: AtomicU64,
}

/// Point-in-time copy of [`SessionStatistics`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatisticsSnapshot {
    pub sessions_opened: u64,
    pub sessions_closed: u64,
    pub transactions_begun: u64,
    pub transactions_committed: u64,
    pub transactions_rolled_back: u64,
}

impl StatisticsSnapshot {
    /// Sessions opened but not yet closed.
    pub fn open_sessions(&self) -> u64 {
        self.sessions_opened.saturating_sub(self.sessions_closed)
    }
}

impl SessionStatistics {
    pub(crate) fn session_opened(&self) {
        self.sessions_opened.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn session_closed(&self) {
        self.sessions_closed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn transaction_begun(&self) {
        self.transactions_begun.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn transaction_committed(&self) {
        self.transactions_committed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn transaction_rolled_back(&self) {
        self.transactions_rolled_back.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatisticsSnapshot {
        StatisticsSnapshot {
            sessions_opened: self.sessions_opened.load(Ordering::Relaxed),
            sessions_closed: self.sessions_closed.load(Ordering::Relaxed),
            transactions_begun: self.transactions_begun.load(Ordering::Relaxed),
            transactions_committed: self.transactions_committed.load(Ordering::Relaxed),
            transactions_rolled_back: self.transactions_rolled_back.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_reflects_counters() {
        let stats = SessionStatistics::default();
        stats.session_opened();
        stats.session_opened();
        stats.session_closed();
        stats.transaction_begun();
        stats.transaction_rolled_back();

        let snap = stats.snapshot();
        assert_eq!(snap.sessions_opened, 2);
        assert_eq!(snap.sessions_closed, 1);
        assert_eq!(snap.open_sessions(), 1);
        assert_eq!(snap.transactions_begun, 1);
        assert_eq!(snap.transactions_committed, 0);
        assert_eq!(snap.transactions_rolled_back, 1);
    }
}
