//! Process-wide execution counters.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use folio_core::ErrorKind;
use serde::{Deserialize, Serialize};

const KINDS: usize = ErrorKind::ALL.len();

fn slot(kind: ErrorKind) -> usize {
    ErrorKind::ALL
        .iter()
        .position(|k| *k == kind)
        .unwrap_or(KINDS - 1)
}

/// Counters shared by every request an engine serves.
#[derive(Debug, Default)]
pub struct EngineMetrics {
    executions: AtomicU64,
    successes: AtomicU64,
    failures: [AtomicU64; KINDS],
    pages_registered: AtomicU64,
    pages_evicted: AtomicU64,
    cleanup_failures: AtomicU64,
}

impl EngineMetrics {
    /// Create zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the start of an execution.
    pub fn record_execution(&self) {
        self.executions.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a successful execution.
    pub fn record_success(&self) {
        self.successes.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a failed execution.
    pub fn record_failure(&self, kind: ErrorKind) {
        self.failures[slot(kind)].fetch_add(1, Ordering::Relaxed);
    }

    /// Record a page entering the registry.
    pub fn record_registered(&self) {
        self.pages_registered.fetch_add(1, Ordering::Relaxed);
    }

    /// Record pages leaving the registry through eviction.
    pub fn record_evicted(&self, count: usize) {
        self.pages_evicted.fetch_add(count as u64, Ordering::Relaxed);
    }

    /// Record temporary files that could not be deleted.
    pub fn record_cleanup_failures(&self, count: usize) {
        self.cleanup_failures.fetch_add(count as u64, Ordering::Relaxed);
    }

    /// Failures recorded for one kind.
    pub fn failures(&self, kind: ErrorKind) -> u64 {
        self.failures[slot(kind)].load(Ordering::Relaxed)
    }

    /// Copy the current values.
    pub fn snapshot(&self) -> MetricsSnapshot {
        let failures = ErrorKind::ALL
            .iter()
            .filter_map(|kind| {
                let count = self.failures(*kind);
                (count > 0).then(|| (kind.as_str().to_string(), count))
            })
            .collect();

        MetricsSnapshot {
            executions: self.executions.load(Ordering::Relaxed),
            successes: self.successes.load(Ordering::Relaxed),
            failures,
            pages_registered: self.pages_registered.load(Ordering::Relaxed),
            pages_evicted: self.pages_evicted.load(Ordering::Relaxed),
            cleanup_failures: self.cleanup_failures.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`EngineMetrics`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    /// Executions started.
    pub executions: u64,
    /// Executions that completed without error.
    pub successes: u64,
    /// Failed executions by kind label; kinds never seen are omitted.
    pub failures: BTreeMap<String, u64>,
    /// Pages stored in the registry.
    pub pages_registered: u64,
    /// Pages removed by idle eviction.
    pub pages_evicted: u64,
    /// Temporary files left behind.
    pub cleanup_failures: u64,
}

impl MetricsSnapshot {
    /// Total failed executions.
    pub fn total_failures(&self) -> u64 {
        self.failures.values().sum()
    }

    /// Format as JSON.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Format as human-readable summary.
    pub fn to_summary(&self) -> String {
        let mut lines = vec![
            format!(
                "Executions: {} ({} ok, {} failed)",
                self.executions,
                self.successes,
                self.total_failures()
            ),
            format!("  Pages registered: {}", self.pages_registered),
            format!("  Pages evicted: {}", self.pages_evicted),
        ];

        if self.cleanup_failures > 0 {
            lines.push(format!("  Cleanup failures: {}", self.cleanup_failures));
        }

        for (kind, count) in &self.failures {
            lines.push(format!("  {}: {}", kind, count));
        }

        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_accumulate() {
        let metrics = EngineMetrics::new();
        metrics.record_execution();
        metrics.record_execution();
        metrics.record_success();
        metrics.record_failure(ErrorKind::NonceMissing);
        metrics.record_registered();
        metrics.record_evicted(3);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.executions, 2);
        assert_eq!(snapshot.successes, 1);
        assert_eq!(snapshot.failures.get("nonce_missing"), Some(&1));
        assert_eq!(snapshot.total_failures(), 1);
        assert_eq!(snapshot.pages_registered, 1);
        assert_eq!(snapshot.pages_evicted, 3);
    }

    #[test]
    fn test_every_kind_has_its_own_slot() {
        let metrics = EngineMetrics::new();
        for kind in ErrorKind::ALL {
            metrics.record_failure(kind);
        }
        for kind in ErrorKind::ALL {
            assert_eq!(metrics.failures(kind), 1, "{}", kind.as_str());
        }
    }

    #[test]
    fn test_snapshot_json() {
        let metrics = EngineMetrics::new();
        metrics.record_failure(ErrorKind::PageNotFound);

        let json = metrics.snapshot().to_json();
        assert!(json.contains("\"page_not_found\":1"));

        let summary = metrics.snapshot().to_summary();
        assert!(summary.contains("page_not_found: 1"));
    }
}
