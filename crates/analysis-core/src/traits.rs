use std::time::Duration;

use async_trait::async_trait;

use crate::{AnalysisError, AnalysisReport, PricePoint, Timeframe};

/// Source of raw price history for one asset and timeframe.
///
/// Implementations own their own retry and timeout policy; callers treat any
/// error as "no data" for that timeframe.
#[async_trait]
pub trait PriceFeed: Send + Sync {
    async fn price_history(
        &self,
        address: &str,
        timeframe: Timeframe,
        from_unix: i64,
        to_unix: i64,
    ) -> Result<Vec<PricePoint>, AnalysisError>;
}

/// Key-value store for finished reports with a per-entry time to live.
pub trait ReportCache: Send + Sync {
    fn get(&self, key: &str) -> Option<AnalysisReport>;
    fn set(&self, key: String, report: AnalysisReport, ttl: Duration);
}
