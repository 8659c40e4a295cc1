use analysis_core::{
    AnalysisError, AnalysisReport, PriceFeed, PricePoint, ReportCache, Timeframe,
};
use chrono::Utc;
use dashmap::DashMap;
use serde::Serialize;
use std::sync::Arc;
use technical_analysis::TechnicalAnalysisEngine;
use tokio::sync::OnceCell;

pub mod cache;
pub mod config;

pub use cache::TtlCache;
pub use config::AnalysisConfig;

/// Result of one timeframe fetch, kept tagged so degrade causes stay visible
pub type FetchOutcome = Result<Vec<PricePoint>, AnalysisError>;

/// How a report was produced
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReportStatus {
    /// Fresh computation over all three timeframes
    Computed,
    /// Served from the report cache
    Cached,
    /// The feed answered but a timeframe had fewer than two points
    InsufficientData { timeframe: Timeframe },
    /// The feed failed for a timeframe
    FeedFailure { timeframe: Timeframe, reason: String },
}

impl ReportStatus {
    pub fn is_degraded(&self) -> bool {
        matches!(
            self,
            ReportStatus::InsufficientData { .. } | ReportStatus::FeedFailure { .. }
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisOutcome {
    pub report: AnalysisReport,
    pub status: ReportStatus,
}

type PendingOutcome = Arc<OnceCell<AnalysisOutcome>>;

pub struct AnalysisOrchestrator {
    feed: Arc<dyn PriceFeed>,
    engine: TechnicalAnalysisEngine,
    cache: Arc<dyn ReportCache>,
    /// Computations in progress per address; concurrent callers share one
    in_flight: DashMap<String, PendingOutcome>,
    config: AnalysisConfig,
}

impl AnalysisOrchestrator {
    pub fn new(feed: Arc<dyn PriceFeed>) -> Self {
        Self {
            feed,
            engine: TechnicalAnalysisEngine::new(),
            cache: Arc::new(TtlCache::new()),
            in_flight: DashMap::new(),
            config: AnalysisConfig::default(),
        }
    }

    pub fn with_config(mut self, config: AnalysisConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace the default in-memory cache
    pub fn with_cache(mut self, cache: Arc<dyn ReportCache>) -> Self {
        self.cache = cache;
        self
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Number of addresses with a computation currently in progress
    pub fn pending_requests(&self) -> usize {
        self.in_flight.len()
    }

    /// Technical report for an asset; never fails, degrading to the default report
    pub async fn analyze(&self, address: &str) -> AnalysisReport {
        self.analyze_with_status(address).await.report
    }

    /// Technical report together with how it was produced
    pub async fn analyze_with_status(&self, address: &str) -> AnalysisOutcome {
        if let Some(report) = self.cache.get(address) {
            tracing::debug!("Cache hit for {}", address);
            return AnalysisOutcome {
                report,
                status: ReportStatus::Cached,
            };
        }

        let pending = self
            .in_flight
            .entry(address.to_string())
            .or_insert_with(|| Arc::new(OnceCell::new()))
            .clone();

        let outcome = pending
            .get_or_init(|| self.compute(address))
            .await
            .clone();

        self.in_flight
            .remove_if(address, |_, current| Arc::ptr_eq(current, &pending));

        outcome
    }

    async fn compute(&self, address: &str) -> AnalysisOutcome {
        let to = Utc::now();
        let lookback = self.config.lookback();
        let (from, to) = ((to - lookback).timestamp(), to.timestamp());

        tracing::info!("Starting technical analysis for {} ({} days)", address, lookback.num_days());

        let (minute15, hour1, hour4) = tokio::join!(
            self.fetch(address, Timeframe::Minute15, from, to),
            self.fetch(address, Timeframe::Hour1, from, to),
            self.fetch(address, Timeframe::Hour4, from, to),
        );

        let outcome = self.assemble(address, &minute15, &hour1, &hour4);

        if outcome.status == ReportStatus::Computed {
            self.cache
                .set(address.to_string(), outcome.report.clone(), self.config.cache_ttl);
        }

        outcome
    }

    async fn fetch(&self, address: &str, timeframe: Timeframe, from: i64, to: i64) -> FetchOutcome {
        let result = self.feed.price_history(address, timeframe, from, to).await;
        match &result {
            Ok(points) => tracing::debug!("Fetched {} {} points for {}", points.len(), timeframe, address),
            Err(e) => tracing::warn!("Price feed failed for {} ({}): {}", address, timeframe, e),
        }
        result
    }

    /// Turn the three fetch outcomes into a report, checking timeframes in fetch order
    fn assemble(
        &self,
        address: &str,
        minute15: &FetchOutcome,
        hour1: &FetchOutcome,
        hour4: &FetchOutcome,
    ) -> AnalysisOutcome {
        fn points(outcome: &FetchOutcome) -> &[PricePoint] {
            outcome.as_deref().unwrap_or(&[])
        }

        let bars = self
            .engine
            .build_timeframe_bars(points(minute15), points(hour1), points(hour4));

        let outcomes = [
            (Timeframe::Minute15, minute15),
            (Timeframe::Hour1, hour1),
            (Timeframe::Hour4, hour4),
        ];

        for (timeframe, outcome) in outcomes {
            let status = match outcome {
                Err(e) => ReportStatus::FeedFailure {
                    timeframe,
                    reason: e.to_string(),
                },
                Ok(_) if bars.get(timeframe).is_empty() => ReportStatus::InsufficientData { timeframe },
                Ok(_) => continue,
            };

            tracing::info!("Returning default report for {}: {:?}", address, status);
            return AnalysisOutcome {
                report: AnalysisReport::insufficient_data(),
                status,
            };
        }

        let report = self.engine.analyze(&bars);
        tracing::info!(
            "Analysis for {} complete: short={} medium={} confidence={:.2} patterns={}",
            address,
            report.trend.short_term,
            report.trend.medium_term,
            report.trend.confidence,
            report.patterns.len()
        );

        AnalysisOutcome {
            report,
            status: ReportStatus::Computed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// In-memory feed returning fixed series and recording every request
    struct FakeFeed {
        series: HashMap<Timeframe, FetchOutcome>,
        delay: std::time::Duration,
        calls: AtomicUsize,
        windows: Mutex<Vec<(i64, i64)>>,
    }

    impl FakeFeed {
        fn new(series: HashMap<Timeframe, FetchOutcome>) -> Self {
            Self {
                series,
                delay: std::time::Duration::ZERO,
                calls: AtomicUsize::new(0),
                windows: Mutex::new(Vec::new()),
            }
        }

        fn healthy() -> Self {
            Self::new(HashMap::from([
                (Timeframe::Minute15, Ok(points(672, 900, 0.05))),
                (Timeframe::Hour1, Ok(points(168, 3600, 0.2))),
                (Timeframe::Hour4, Ok(points(42, 14400, 0.8))),
            ]))
        }

        fn with_delay(mut self, delay: std::time::Duration) -> Self {
            self.delay = delay;
            self
        }

        fn with_series(mut self, timeframe: Timeframe, outcome: FetchOutcome) -> Self {
            self.series.insert(timeframe, outcome);
            self
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl PriceFeed for FakeFeed {
        async fn price_history(
            &self,
            _address: &str,
            timeframe: Timeframe,
            from_unix: i64,
            to_unix: i64,
        ) -> Result<Vec<PricePoint>, AnalysisError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.windows.lock().unwrap().push((from_unix, to_unix));
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            self.series.get(&timeframe).cloned().unwrap_or_else(|| Ok(Vec::new()))
        }
    }

    fn points(n: usize, step_secs: i64, drift: f64) -> Vec<PricePoint> {
        (0..n)
            .map(|i| {
                let wave = ((i % 5) as f64 - 2.0) * 0.5;
                PricePoint::new(1_700_000_000 + i as i64 * step_secs, 50.0 + drift * i as f64 + wave)
            })
            .collect()
    }

    const ADDRESS: &str = "So11111111111111111111111111111111111111112";

    #[tokio::test]
    async fn test_computed_report_matches_engine() {
        let feed = Arc::new(FakeFeed::healthy());
        let orchestrator = AnalysisOrchestrator::new(feed.clone());

        let outcome = orchestrator.analyze_with_status(ADDRESS).await;
        assert_eq!(outcome.status, ReportStatus::Computed);
        assert_eq!(feed.calls(), 3);

        let engine = TechnicalAnalysisEngine::new();
        let bars = engine.build_timeframe_bars(
            &points(672, 900, 0.05),
            &points(168, 3600, 0.2),
            &points(42, 14400, 0.8),
        );
        assert_eq!(outcome.report, engine.analyze(&bars));
        assert_eq!(orchestrator.pending_requests(), 0);
    }

    #[tokio::test]
    async fn test_cache_hit_skips_fetch() {
        let feed = Arc::new(FakeFeed::healthy());
        let orchestrator = AnalysisOrchestrator::new(feed.clone());

        let first = orchestrator.analyze(ADDRESS).await;
        let second = orchestrator.analyze_with_status(ADDRESS).await;

        assert_eq!(second.status, ReportStatus::Cached);
        assert_eq!(second.report, first);
        assert_eq!(feed.calls(), 3);
    }

    #[tokio::test]
    async fn test_expired_cache_refetches() {
        let feed = Arc::new(FakeFeed::healthy());
        let config = AnalysisConfig {
            cache_ttl: std::time::Duration::ZERO,
            ..AnalysisConfig::default()
        };
        let orchestrator = AnalysisOrchestrator::new(feed.clone()).with_config(config);

        orchestrator.analyze(ADDRESS).await;
        let second = orchestrator.analyze_with_status(ADDRESS).await;

        assert_eq!(second.status, ReportStatus::Computed);
        assert_eq!(feed.calls(), 6);
    }

    #[tokio::test]
    async fn test_fetch_window_spans_lookback() {
        let feed = Arc::new(FakeFeed::healthy());
        let orchestrator = AnalysisOrchestrator::new(feed.clone());

        orchestrator.analyze(ADDRESS).await;

        let windows = feed.windows.lock().unwrap().clone();
        assert_eq!(windows.len(), 3);
        for (from, to) in windows {
            assert_eq!(to - from, 7 * 24 * 3600);
        }
    }

    #[tokio::test]
    async fn test_extreme_config_still_produces_report() {
        let feed = Arc::new(FakeFeed::healthy());
        let config = AnalysisConfig {
            cache_ttl: std::time::Duration::from_secs(u64::MAX),
            lookback_days: i64::MAX,
        };
        let orchestrator = AnalysisOrchestrator::new(feed.clone()).with_config(config);

        let outcome = orchestrator.analyze_with_status(ADDRESS).await;
        assert_eq!(outcome.status, ReportStatus::Computed);

        let windows = feed.windows.lock().unwrap().clone();
        for (from, to) in windows {
            assert_eq!(to - from, crate::config::MAX_LOOKBACK_DAYS * 24 * 3600);
        }

        let second = orchestrator.analyze_with_status(ADDRESS).await;
        assert_eq!(second.status, ReportStatus::Cached);
    }

    #[tokio::test]
    async fn test_empty_series_returns_default_report() {
        let feed = Arc::new(FakeFeed::healthy().with_series(Timeframe::Hour1, Ok(Vec::new())));
        let orchestrator = AnalysisOrchestrator::new(feed.clone());

        let outcome = orchestrator.analyze_with_status(ADDRESS).await;
        assert_eq!(outcome.report, AnalysisReport::insufficient_data());
        assert_eq!(outcome.report.trend.reasoning, "Insufficient data for analysis");
        assert_eq!(
            outcome.status,
            ReportStatus::InsufficientData { timeframe: Timeframe::Hour1 }
        );
        assert!(outcome.status.is_degraded());
    }

    #[tokio::test]
    async fn test_single_point_series_is_insufficient() {
        let feed = Arc::new(
            FakeFeed::healthy().with_series(Timeframe::Minute15, Ok(vec![PricePoint::new(0, 1.0)])),
        );
        let orchestrator = AnalysisOrchestrator::new(feed);

        let outcome = orchestrator.analyze_with_status(ADDRESS).await;
        assert_eq!(
            outcome.status,
            ReportStatus::InsufficientData { timeframe: Timeframe::Minute15 }
        );
    }

    #[tokio::test]
    async fn test_feed_failure_returns_default_report() {
        let feed = Arc::new(FakeFeed::healthy().with_series(
            Timeframe::Hour4,
            Err(AnalysisError::ApiError("HTTP 503".to_string())),
        ));
        let orchestrator = AnalysisOrchestrator::new(feed.clone());

        let outcome = orchestrator.analyze_with_status(ADDRESS).await;
        assert_eq!(outcome.report, AnalysisReport::insufficient_data());
        assert_eq!(
            outcome.status,
            ReportStatus::FeedFailure {
                timeframe: Timeframe::Hour4,
                reason: "API error: HTTP 503".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_degraded_reports_are_not_cached() {
        let feed = Arc::new(FakeFeed::healthy().with_series(
            Timeframe::Minute15,
            Err(AnalysisError::ApiError("timeout".to_string())),
        ));
        let orchestrator = AnalysisOrchestrator::new(feed.clone());

        orchestrator.analyze(ADDRESS).await;
        let second = orchestrator.analyze_with_status(ADDRESS).await;

        assert!(second.status.is_degraded());
        assert_eq!(feed.calls(), 6);
    }

    #[tokio::test]
    async fn test_concurrent_requests_share_one_computation() {
        let feed = Arc::new(FakeFeed::healthy().with_delay(std::time::Duration::from_millis(50)));
        let orchestrator = AnalysisOrchestrator::new(feed.clone());

        let (first, second) = tokio::join!(
            orchestrator.analyze(ADDRESS),
            orchestrator.analyze(ADDRESS),
        );

        assert_eq!(first, second);
        assert_eq!(feed.calls(), 3);
        assert_eq!(orchestrator.pending_requests(), 0);
    }

    #[tokio::test]
    async fn test_distinct_addresses_fetch_independently() {
        let feed = Arc::new(FakeFeed::healthy().with_delay(std::time::Duration::from_millis(10)));
        let orchestrator = AnalysisOrchestrator::new(feed.clone());

        let (first, second) = tokio::join!(
            orchestrator.analyze("token-a"),
            orchestrator.analyze("token-b"),
        );

        assert_eq!(first, second);
        assert_eq!(feed.calls(), 6);
    }

    #[tokio::test]
    async fn test_injected_cache_receives_report() {
        let feed = Arc::new(FakeFeed::healthy());
        let cache = Arc::new(TtlCache::new());
        let orchestrator = AnalysisOrchestrator::new(feed).with_cache(cache.clone());

        let report = orchestrator.analyze(ADDRESS).await;
        assert_eq!(cache.get(ADDRESS), Some(report));
    }

    #[test]
    fn test_status_serialization() {
        let status = ReportStatus::FeedFailure {
            timeframe: Timeframe::Hour1,
            reason: "down".to_string(),
        };
        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["kind"], "feed_failure");
        assert_eq!(json["timeframe"], "1H");
        assert_eq!(json["reason"], "down");
    }
}
