//! HTTP 요청 metrics middleware.
//!
//! 모든 요청에 HTTP 메트릭을 남기고, `/tickers/{kind}` 요청은 데이터 종류와
//! 조회 모드(단일/배치) 라벨로 한 번 더 집계해 캐시 카운터와 나란히 볼 수 있게 합니다.

use std::time::Instant;

use axum::{
    extract::{Query, Request},
    http::Uri,
    middleware::Next,
    response::Response,
};

use tickers_core::{DataKind, FetchMode};

use crate::metrics::{
    normalize_path, record_http_duration, record_http_request, record_http_response,
    record_ticker_request,
};
use crate::routes::tickers::SymbolQuery;

/// 티커 엔드포인트 요청 요약.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickerRequest {
    pub kind: DataKind,
    /// 심볼 파라미터가 유효하지 않으면 `None`
    pub mode: Option<FetchMode>,
    pub symbols: usize,
}

impl TickerRequest {
    /// `/tickers/{kind}` 경로이면 쿼리의 심볼 목록까지 읽어 요약합니다.
    pub fn from_uri(uri: &Uri) -> Option<Self> {
        let name = uri.path().trim_end_matches('/').strip_prefix("/tickers/")?;
        let kind = DataKind::from_name(name)?;

        let symbols = Query::<SymbolQuery>::try_from_uri(uri)
            .ok()
            .and_then(|Query(query)| query.symbol_list().ok());

        Some(match symbols {
            Some(list) => Self {
                kind,
                mode: Some(kind.fetch_mode(list.len())),
                symbols: list.len(),
            },
            None => Self {
                kind,
                mode: None,
                symbols: 0,
            },
        })
    }

    /// 메트릭 `mode` 라벨.
    pub fn mode_label(&self) -> &'static str {
        self.mode.map(|m| m.as_str()).unwrap_or("invalid")
    }
}

/// HTTP 메트릭을 수집하는 미들웨어 레이어.
///
/// 각 요청에 대해 다음 메트릭을 기록합니다:
/// - `http_requests_total`: 총 요청 수 (method, path 라벨)
/// - `http_responses_total`: 총 응답 수 (method, path, status 라벨)
/// - `http_request_duration_seconds`: 요청 처리 시간 히스토그램
/// - `ticker_requests_total`: 티커 요청 수 (kind, mode, status 라벨)
/// - `ticker_request_symbols`: 요청당 심볼 수 (kind 라벨)
pub async fn metrics_layer(request: Request, next: Next) -> Response {
    let start = Instant::now();

    let method = request.method().to_string();
    let path = normalize_path(request.uri().path());
    let ticker = TickerRequest::from_uri(request.uri());

    record_http_request(&method, &path);

    let response = next.run(request).await;
    let status = response.status().as_u16();

    record_http_response(&method, &path, status);
    record_http_duration(&method, &path, start.elapsed().as_secs_f64());
    if let Some(ticker) = ticker {
        record_ticker_request(ticker.kind, ticker.mode_label(), status, ticker.symbols);
    }

    response
}
