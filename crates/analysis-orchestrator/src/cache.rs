use std::time::{Duration, Instant};

use analysis_core::{AnalysisReport, ReportCache};
use dashmap::DashMap;

/// Internal cache entry with expiry
struct CacheEntry {
    report: AnalysisReport,
    /// `None` when the TTL reaches past what `Instant` can represent
    expires_at: Option<Instant>,
}

impl CacheEntry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.map_or(true, |expires_at| now < expires_at)
    }
}

/// In-memory report cache keyed by asset address.
///
/// Expired entries count as misses and are dropped on the next lookup or
/// `purge_expired` call.
#[derive(Default)]
pub struct TtlCache {
    entries: DashMap<String, CacheEntry>,
}

impl TtlCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Remove every expired entry, returning how many were dropped
    pub fn purge_expired(&self) -> usize {
        let before = self.entries.len();
        let now = Instant::now();
        self.entries.retain(|_, entry| entry.is_live(now));
        before.saturating_sub(self.entries.len())
    }
}

impl ReportCache for TtlCache {
    fn get(&self, key: &str) -> Option<AnalysisReport> {
        let expired = match self.entries.get(key) {
            Some(entry) if entry.is_live(Instant::now()) => return Some(entry.report.clone()),
            Some(_) => true,
            None => false,
        };

        if expired {
            self.entries
                .remove_if(key, |_, entry| !entry.is_live(Instant::now()));
        }
        None
    }

    fn set(&self, key: String, report: AnalysisReport, ttl: Duration) {
        self.entries.insert(
            key,
            CacheEntry {
                report,
                expires_at: Instant::now().checked_add(ttl),
            },
        );
    }
}
