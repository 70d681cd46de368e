//! Reconciliation log for write half-failures (spec §7 item 7: "document
//! present in LexicalIndex but not VectorIndex (or vice versa): record in an
//! implementation-defined reconciliation log").
//!
//! Kept as a simple bounded in-memory log rather than the teacher's
//! durable WAL (`store/log.rs`) — this engine has no on-disk recovery
//! story, so there is nothing to replay it against, only something to
//! inspect after the fact.

use parking_lot::RwLock;

use chrono::{DateTime, Utc};

/// Which leg of a document write failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailedLeg {
    Vector,
    Lexical,
}

#[derive(Debug, Clone)]
pub struct ReconciliationEntry {
    pub doc_id: String,
    pub failed_leg: FailedLeg,
    pub reason: String,
    pub recorded_at: DateTime<Utc>,
}

/// Bounded append-only record of half-indexed documents. Never causes a
/// request to fail; it exists purely for operators to inspect.
pub struct ReconciliationLog {
    entries: RwLock<Vec<ReconciliationEntry>>,
    cap: usize,
}

impl ReconciliationLog {
    pub fn new(cap: usize) -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
            cap,
        }
    }

    pub fn record(&self, doc_id: &str, failed_leg: FailedLeg, reason: impl Into<String>) {
        let mut entries = self.entries.write();
        entries.push(ReconciliationEntry {
            doc_id: doc_id.to_string(),
            failed_leg,
            reason: reason.into(),
            recorded_at: Utc::now(),
        });
        if entries.len() > self.cap {
            let overflow = entries.len() - self.cap;
            entries.drain(0..overflow);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn snapshot(&self) -> Vec<ReconciliationEntry> {
        self.entries.read().clone()
    }
}

impl Default for ReconciliationLog {
    fn default() -> Self {
        Self::new(1000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_and_caps_entries() {
        let log = ReconciliationLog::new(2);
        log.record("a", FailedLeg::Vector, "timeout");
        log.record("b", FailedLeg::Vector, "timeout");
        log.record("c", FailedLeg::Lexical, "embed failure");
        assert_eq!(log.len(), 2);
        let snap = log.snapshot();
        assert_eq!(snap[0].doc_id, "b");
        assert_eq!(snap[1].doc_id, "c");
    }
}
