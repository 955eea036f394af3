//! 히스토리 조회 파라미터.

use serde::{Deserialize, Serialize};

use crate::error::{TickerError, TickerResult};

/// 허용되는 조회 기간.
pub const VALID_PERIODS: &[&str] = &[
    "1d", "5d", "1mo", "3mo", "6mo", "1y", "2y", "5y", "10y", "ytd", "max",
];

/// 허용되는 봉 간격.
pub const VALID_INTERVALS: &[&str] = &[
    "1m", "2m", "5m", "15m", "30m", "60m", "90m", "1h", "1d", "5d", "1wk", "1mo", "3mo",
];

/// 기본 조회 기간.
pub const DEFAULT_PERIOD: &str = "1mo";

/// 기본 봉 간격.
pub const DEFAULT_INTERVAL: &str = "1d";

/// 검증된 히스토리 조회 파라미터.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HistoryParams {
    period: String,
    interval: String,
}

impl HistoryParams {
    /// 파라미터를 검증합니다. 값이 없으면 기본값(`1mo`, `1d`)을 사용합니다.
    pub fn new(period: Option<&str>, interval: Option<&str>) -> TickerResult<Self> {
        let period = normalize(period, DEFAULT_PERIOD);
        let interval = normalize(interval, DEFAULT_INTERVAL);

        if !VALID_PERIODS.contains(&period.as_str()) {
            return Err(TickerError::InvalidRequest(format!(
                "Unsupported period '{}'. Valid periods: {}",
                period,
                VALID_PERIODS.join(", ")
            )));
        }
        if !VALID_INTERVALS.contains(&interval.as_str()) {
            return Err(TickerError::InvalidRequest(format!(
                "Unsupported interval '{}'. Valid intervals: {}",
                interval,
                VALID_INTERVALS.join(", ")
            )));
        }

        Ok(Self { period, interval })
    }

    pub fn period(&self) -> &str {
        &self.period
    }

    pub fn interval(&self) -> &str {
        &self.interval
    }
}

impl Default for HistoryParams {
    fn default() -> Self {
        Self {
            period: DEFAULT_PERIOD.to_string(),
            interval: DEFAULT_INTERVAL.to_string(),
        }
    }
}

fn normalize(raw: Option<&str>, default: &str) -> String {
    match raw.map(str::trim) {
        Some(v) if !v.is_empty() => v.to_lowercase(),
        _ => default.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let params = HistoryParams::new(None, Some("  ")).unwrap();
        assert_eq!(params.period(), "1mo");
        assert_eq!(params.interval(), "1d");
        assert_eq!(params, HistoryParams::default());
    }

    #[test]
    fn test_valid_params() {
        let params = HistoryParams::new(Some("YTD"), Some("1wk")).unwrap();
        assert_eq!(params.period(), "ytd");
        assert_eq!(params.interval(), "1wk");
    }

    #[test]
    fn test_invalid_params() {
        assert!(matches!(
            HistoryParams::new(Some("7y"), None),
            Err(TickerError::InvalidRequest(_))
        ));
        assert!(matches!(
            HistoryParams::new(None, Some("4h")),
            Err(TickerError::InvalidRequest(_))
        ));
    }
}
