use std::time::Duration;

const DEFAULT_CACHE_TTL_SECS: u64 = 300; // 5 minutes
const DEFAULT_LOOKBACK_DAYS: i64 = 7;

/// Upper bounds accepted from the environment
pub const MAX_CACHE_TTL_SECS: u64 = 7 * 24 * 3600;
pub const MAX_LOOKBACK_DAYS: i64 = 365;

/// Orchestrator settings, read from the environment with code defaults
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisConfig {
    /// How long a computed report is served from the cache
    pub cache_ttl: Duration,
    /// Trailing window fetched for every timeframe
    pub lookback_days: i64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            cache_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
            lookback_days: DEFAULT_LOOKBACK_DAYS,
        }
    }
}

impl AnalysisConfig {
    /// Reads `ANALYSIS_CACHE_TTL_SECS` and `ANALYSIS_LOOKBACK_DAYS`
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Trailing fetch window, clamped to `1..=MAX_LOOKBACK_DAYS` days
    pub fn lookback(&self) -> chrono::Duration {
        chrono::Duration::days(self.lookback_days.clamp(1, MAX_LOOKBACK_DAYS))
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let cache_ttl = parse_setting(&lookup, "ANALYSIS_CACHE_TTL_SECS", |v| {
            v.parse::<u64>().ok().filter(|secs| *secs <= MAX_CACHE_TTL_SECS)
        })
            .map(Duration::from_secs)
            .unwrap_or(defaults.cache_ttl);

        let lookback_days = parse_setting(&lookup, "ANALYSIS_LOOKBACK_DAYS", |v| {
            v.parse::<i64>()
                .ok()
                .filter(|days| (1..=MAX_LOOKBACK_DAYS).contains(days))
        })
        .unwrap_or(defaults.lookback_days);

        Self {
            cache_ttl,
            lookback_days,
        }
    }
}

fn parse_setting<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    parse: impl Fn(&str) -> Option<T>,
) -> Option<T> {
    let raw = lookup(key)?;
    let parsed = parse(raw.trim());
    if parsed.is_none() {
        tracing::warn!("Ignoring invalid {}={:?}, using default", key, raw);
    }
    parsed
}
