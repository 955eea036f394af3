//! Prometheus 메트릭 설정 및 유틸리티.
//!
//! HTTP 요청 메트릭과 캐시 메트릭을 수집하고 `/metrics` 엔드포인트로 노출합니다.

use std::sync::Arc;

use axum::{extract::State, routing::get, Router};
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, Matcher, PrometheusBuilder, PrometheusHandle};

use tickers_core::DataKind;
use tickers_data::{NamedCacheStats, TickerService};

/// Prometheus 메트릭 레코더를 설정하고 핸들을 반환합니다.
///
/// 레코더가 이미 설치되어 있으면 에러를 반환합니다.
pub fn setup_metrics_recorder() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full("http_request_duration_seconds".to_string()),
            &[0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0],
        )?
        .install_recorder()
}

// ============================================================================
// HTTP 메트릭 헬퍼 함수
// ============================================================================

/// HTTP 요청 카운터 증가.
pub fn record_http_request(method: &str, path: &str) {
    counter!("http_requests_total", "method" => method.to_string(), "path" => path.to_string())
        .increment(1);
}

/// HTTP 응답 카운터 증가.
pub fn record_http_response(method: &str, path: &str, status: u16) {
    counter!(
        "http_responses_total",
        "method" => method.to_string(),
        "path" => path.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// HTTP 요청 지속 시간 기록.
pub fn record_http_duration(method: &str, path: &str, duration_secs: f64) {
    histogram!(
        "http_request_duration_seconds",
        "method" => method.to_string(),
        "path" => path.to_string()
    )
    .record(duration_secs);
}

// ============================================================================
// 티커 요청 메트릭
// ============================================================================

/// `/tickers/*` 요청을 데이터 종류와 조회 모드별로 집계합니다.
///
/// `mode`는 `single`, `batch`, 또는 심볼을 읽지 못한 요청의 `invalid`입니다.
pub fn record_ticker_request(kind: DataKind, mode: &'static str, status: u16, symbols: usize) {
    counter!(
        "ticker_requests_total",
        "kind" => kind.as_str(),
        "mode" => mode,
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("ticker_request_symbols", "kind" => kind.as_str()).record(symbols as f64);
}

// ============================================================================
// 캐시 메트릭
// ============================================================================

/// 캐시 통계를 메트릭에 반영합니다.
///
/// 캐시가 직접 누적한 값을 그대로 옮기므로 렌더링 직전에 호출하면 됩니다.
pub fn record_cache_stats(stats: &[NamedCacheStats]) {
    for named in stats {
        let cache = named.name.clone();
        counter!("ticker_cache_lookups_total", "cache" => cache.clone(), "result" => "hit")
            .absolute(named.stats.hits);
        counter!("ticker_cache_lookups_total", "cache" => cache.clone(), "result" => "miss")
            .absolute(named.stats.misses);
        counter!("ticker_cache_evictions_total", "cache" => cache.clone())
            .absolute(named.stats.evictions);
        gauge!("ticker_cache_entries", "cache" => cache).set(named.stats.entries as f64);
    }
}

// ============================================================================
// 경로 정규화 유틸리티
// ============================================================================

/// 라벨 카디널리티를 제한하기 위해 경로를 정규화합니다.
///
/// 알려진 경로는 그대로 두고, 그 외 경로는 `/other`로 묶습니다.
/// Swagger UI 정적 파일은 `/swagger-ui`로 묶습니다.
pub fn normalize_path(path: &str) -> String {
    const KNOWN: &[&str] = &[
        "/",
        "/health",
        "/health/ready",
        "/metrics",
        "/api-docs/openapi.json",
        "/tickers/info",
        "/tickers/quote",
        "/tickers/history",
        "/tickers/dividends",
        "/tickers/splits",
        "/tickers/recommendations",
        "/tickers/calendar",
    ];

    let trimmed = if path.len() > 1 {
        path.trim_end_matches('/')
    } else {
        path
    };

    if KNOWN.contains(&trimmed) {
        trimmed.to_string()
    } else if trimmed.starts_with("/swagger-ui") {
        "/swagger-ui".to_string()
    } else {
        "/other".to_string()
    }
}

// ============================================================================
// /metrics 엔드포인트
// ============================================================================

/// `/metrics` 핸들러 상태.
#[derive(Clone)]
pub struct MetricsState {
    pub handle: PrometheusHandle,
    pub service: Arc<TickerService>,
}

/// /metrics 엔드포인트 핸들러.
async fn metrics_handler(State(state): State<MetricsState>) -> String {
    record_cache_stats(&state.service.caches().stats().await);
    state.handle.render()
}

/// 메트릭 라우터 (별도 상태).
pub fn metrics_router(handle: PrometheusHandle, service: Arc<TickerService>) -> Router {
    Router::new()
        .route("/metrics", get(metrics_handler))
        .with_state(MetricsState { handle, service })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_known_paths() {
        assert_eq!(normalize_path("/tickers/quote"), "/tickers/quote");
        assert_eq!(normalize_path("/tickers/quote/"), "/tickers/quote");
        assert_eq!(normalize_path("/"), "/");
    }

    #[test]
    fn test_normalize_unknown_paths() {
        assert_eq!(normalize_path("/tickers/AAPL"), "/other");
        assert_eq!(normalize_path("/wp-login.php"), "/other");
        assert_eq!(
            normalize_path("/swagger-ui/swagger-ui-bundle.js"),
            "/swagger-ui"
        );
    }

    #[test]
    fn test_record_cache_stats_without_recorder() {
        // 레코더가 없으면 no-op
        record_cache_stats(&[NamedCacheStats {
            name: "quote".to_string(),
            stats: Default::default(),
        }]);
    }
}
