//! 티커 데이터 조회 endpoint.
//!
//! 모든 엔드포인트는 `symbol` 또는 `symbols`(쉼표 구분) 파라미터를 받고,
//! 심볼을 키로 하는 JSON 객체를 요청 순서대로 반환합니다.
//!
//! # 엔드포인트
//!
//! - `GET /tickers/info` - 종목 정보
//! - `GET /tickers/quote` - 현재 시세
//! - `GET /tickers/history` - OHLCV 히스토리 (`period`, `interval`)
//! - `GET /tickers/dividends` - 배당 내역
//! - `GET /tickers/splits` - 주식 분할 내역
//! - `GET /tickers/recommendations` - 애널리스트 추천 동향
//! - `GET /tickers/calendar` - 실적/배당 일정
//!
//! 심볼 하나의 실패는 해당 심볼 항목에만 표시됩니다.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{Method, StatusCode, Uri},
    routing::get,
    Json, Router,
};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use utoipa::IntoParams;

use tickers_core::{
    CalendarEvents, DataKind, DividendRecord, HistoryBar, HistoryParams, Quote, Recommendation,
    SplitRecord, SymbolList, TickerError, TickerInfo, TickerResult,
};
use tickers_data::{SymbolOutcome, SymbolResults};

use crate::error::{ApiErrorResponse, ApiResult};
use crate::state::AppState;

// ==================== 요청 파라미터 ====================

/// 심볼 쿼리 파라미터.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SymbolQuery {
    /// 단일 심볼 (예: `AAPL`)
    pub symbol: Option<String>,
    /// 쉼표로 구분된 심볼 목록 (예: `AAPL,MSFT`). `symbol`보다 우선합니다.
    pub symbols: Option<String>,
}

impl SymbolQuery {
    pub(crate) fn symbol_list(&self) -> TickerResult<SymbolList> {
        SymbolList::parse(self.symbols.as_deref(), self.symbol.as_deref())
    }
}

/// 히스토리 쿼리 파라미터.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct HistoryQuery {
    /// 단일 심볼
    pub symbol: Option<String>,
    /// 쉼표로 구분된 심볼 목록
    pub symbols: Option<String>,
    /// 조회 기간 (기본값 `1mo`)
    pub period: Option<String>,
    /// 봉 간격 (기본값 `1d`)
    pub interval: Option<String>,
}

// ==================== 응답 ====================

/// 실패한 심볼을 응답에 표시하는 방식.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureShape {
    /// `{"error": "...", "kind": "..."}`
    Marker,
    /// `[]`
    EmptyList,
    /// `{}`
    EmptyObject,
}

impl FailureShape {
    pub fn for_kind(kind: DataKind) -> Self {
        match kind {
            DataKind::Info | DataKind::Quote | DataKind::History => Self::Marker,
            DataKind::Dividends | DataKind::Splits | DataKind::Recommendations => Self::EmptyList,
            DataKind::Calendar => Self::EmptyObject,
        }
    }
}

#[derive(Serialize)]
struct FailureMarker<'a> {
    error: &'a str,
    kind: &'a str,
}

/// 심볼별 결과 응답 본문.
///
/// 요청 순서를 유지하는 JSON 객체로 직렬화됩니다.
pub struct SymbolPayload<T> {
    results: SymbolResults<T>,
    shape: FailureShape,
}

impl<T> SymbolPayload<T> {
    pub fn new(kind: DataKind, results: SymbolResults<T>) -> Self {
        Self {
            results,
            shape: FailureShape::for_kind(kind),
        }
    }
}

impl<T: Serialize> Serialize for SymbolPayload<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.results.len()))?;
        for (symbol, outcome) in self.results.iter() {
            let key = symbol.as_str();
            match outcome {
                SymbolOutcome::Ok(value) => map.serialize_entry(key, value)?,
                SymbolOutcome::Failed(failure) => match self.shape {
                    FailureShape::Marker => map.serialize_entry(
                        key,
                        &FailureMarker {
                            error: &failure.message,
                            kind: failure.kind,
                        },
                    )?,
                    FailureShape::EmptyList => map.serialize_entry(key, &[(); 0])?,
                    FailureShape::EmptyObject => {
                        map.serialize_entry(key, &serde_json::Map::new())?
                    }
                },
            }
        }
        map.end()
    }
}

/// 에러 응답에 요청 정보를 붙입니다.
fn reject(err: TickerError, method: &Method, uri: &Uri) -> (StatusCode, Json<ApiErrorResponse>) {
    let (status, Json(body)) = ApiErrorResponse::from_ticker_error(&err);
    (status, Json(body.with_request_info(method, uri)))
}

// ==================== 핸들러 ====================

/// 종목 정보 조회.
#[utoipa::path(
    get,
    path = "/tickers/info",
    tag = "tickers",
    params(SymbolQuery),
    responses(
        (status = 200, description = "심볼별 종목 정보", body = HashMap<String, TickerInfo>),
        (status = 400, description = "심볼 누락", body = ApiErrorResponse),
        (status = 404, description = "존재하지 않는 심볼 (단일 조회)", body = ApiErrorResponse),
        (status = 502, description = "업스트림 실패", body = ApiErrorResponse)
    )
)]
pub async fn get_info(
    State(state): State<Arc<AppState>>,
    method: Method,
    uri: Uri,
    Query(query): Query<SymbolQuery>,
) -> ApiResult<Json<SymbolPayload<TickerInfo>>> {
    let symbols = query.symbol_list().map_err(|e| reject(e, &method, &uri))?;
    let results = state
        .service
        .info(&symbols)
        .await
        .map_err(|e| reject(e, &method, &uri))?;
    Ok(Json(SymbolPayload::new(DataKind::Info, results)))
}

/// 현재 시세 조회.
#[utoipa::path(
    get,
    path = "/tickers/quote",
    tag = "tickers",
    params(SymbolQuery),
    responses(
        (status = 200, description = "심볼별 시세", body = HashMap<String, Quote>),
        (status = 400, description = "심볼 누락", body = ApiErrorResponse),
        (status = 404, description = "존재하지 않는 심볼 (단일 조회)", body = ApiErrorResponse),
        (status = 502, description = "업스트림 실패", body = ApiErrorResponse)
    )
)]
pub async fn get_quote(
    State(state): State<Arc<AppState>>,
    method: Method,
    uri: Uri,
    Query(query): Query<SymbolQuery>,
) -> ApiResult<Json<SymbolPayload<Quote>>> {
    let symbols = query.symbol_list().map_err(|e| reject(e, &method, &uri))?;
    let results = state
        .service
        .quote(&symbols)
        .await
        .map_err(|e| reject(e, &method, &uri))?;
    Ok(Json(SymbolPayload::new(DataKind::Quote, results)))
}

/// OHLCV 히스토리 조회.
#[utoipa::path(
    get,
    path = "/tickers/history",
    tag = "tickers",
    params(HistoryQuery),
    responses(
        (status = 200, description = "심볼별 OHLCV 봉 목록", body = HashMap<String, Vec<HistoryBar>>),
        (status = 400, description = "심볼 누락 또는 지원하지 않는 기간/간격", body = ApiErrorResponse)
    )
)]
pub async fn get_history(
    State(state): State<Arc<AppState>>,
    method: Method,
    uri: Uri,
    Query(query): Query<HistoryQuery>,
) -> ApiResult<Json<SymbolPayload<Vec<HistoryBar>>>> {
    let symbols = SymbolList::parse(query.symbols.as_deref(), query.symbol.as_deref())
        .map_err(|e| reject(e, &method, &uri))?;
    let params = HistoryParams::new(query.period.as_deref(), query.interval.as_deref())
        .map_err(|e| reject(e, &method, &uri))?;

    let results = state.service.history(&symbols, &params).await;
    Ok(Json(SymbolPayload::new(DataKind::History, results)))
}

/// 배당 내역 조회.
#[utoipa::path(
    get,
    path = "/tickers/dividends",
    tag = "tickers",
    params(SymbolQuery),
    responses(
        (status = 200, description = "심볼별 배당 내역 (없거나 실패하면 빈 배열)", body = HashMap<String, Vec<DividendRecord>>),
        (status = 400, description = "심볼 누락", body = ApiErrorResponse)
    )
)]
pub async fn get_dividends(
    State(state): State<Arc<AppState>>,
    method: Method,
    uri: Uri,
    Query(query): Query<SymbolQuery>,
) -> ApiResult<Json<SymbolPayload<Vec<DividendRecord>>>> {
    let symbols = query.symbol_list().map_err(|e| reject(e, &method, &uri))?;
    let results = state.service.dividends(&symbols).await;
    Ok(Json(SymbolPayload::new(DataKind::Dividends, results)))
}

/// 주식 분할 내역 조회.
#[utoipa::path(
    get,
    path = "/tickers/splits",
    tag = "tickers",
    params(SymbolQuery),
    responses(
        (status = 200, description = "심볼별 분할 내역 (없거나 실패하면 빈 배열)", body = HashMap<String, Vec<SplitRecord>>),
        (status = 400, description = "심볼 누락", body = ApiErrorResponse)
    )
)]
pub async fn get_splits(
    State(state): State<Arc<AppState>>,
    method: Method,
    uri: Uri,
    Query(query): Query<SymbolQuery>,
) -> ApiResult<Json<SymbolPayload<Vec<SplitRecord>>>> {
    let symbols = query.symbol_list().map_err(|e| reject(e, &method, &uri))?;
    let results = state.service.splits(&symbols).await;
    Ok(Json(SymbolPayload::new(DataKind::Splits, results)))
}

/// 애널리스트 추천 동향 조회.
#[utoipa::path(
    get,
    path = "/tickers/recommendations",
    tag = "tickers",
    params(SymbolQuery),
    responses(
        (status = 200, description = "심볼별 추천 동향 (없거나 실패하면 빈 배열)", body = HashMap<String, Vec<Recommendation>>),
        (status = 400, description = "심볼 누락", body = ApiErrorResponse)
    )
)]
pub async fn get_recommendations(
    State(state): State<Arc<AppState>>,
    method: Method,
    uri: Uri,
    Query(query): Query<SymbolQuery>,
) -> ApiResult<Json<SymbolPayload<Vec<Recommendation>>>> {
    let symbols = query.symbol_list().map_err(|e| reject(e, &method, &uri))?;
    let results = state.service.recommendations(&symbols).await;
    Ok(Json(SymbolPayload::new(DataKind::Recommendations, results)))
}

/// 실적/배당 일정 조회.
#[utoipa::path(
    get,
    path = "/tickers/calendar",
    tag = "tickers",
    params(SymbolQuery),
    responses(
        (status = 200, description = "심볼별 일정 (없거나 실패하면 빈 객체)", body = HashMap<String, CalendarEvents>),
        (status = 400, description = "심볼 누락", body = ApiErrorResponse)
    )
)]
pub async fn get_calendar(
    State(state): State<Arc<AppState>>,
    method: Method,
    uri: Uri,
    Query(query): Query<SymbolQuery>,
) -> ApiResult<Json<SymbolPayload<CalendarEvents>>> {
    let symbols = query.symbol_list().map_err(|e| reject(e, &method, &uri))?;
    let results = state.service.calendar(&symbols).await;
    Ok(Json(SymbolPayload::new(DataKind::Calendar, results)))
}

/// 티커 라우터 생성.
pub fn tickers_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/info", get(get_info))
        .route("/quote", get(get_quote))
        .route("/history", get(get_history))
        .route("/dividends", get(get_dividends))
        .route("/splits", get(get_splits))
        .route("/recommendations", get(get_recommendations))
        .route("/calendar", get(get_calendar))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tickers_core::Symbol;
    use tickers_data::FetchFailure;

    fn sym(s: &str) -> Symbol {
        Symbol::new(s).unwrap()
    }

    fn mixed() -> SymbolResults<Vec<u32>> {
        vec![
            (sym("MSFT"), SymbolOutcome::Ok(vec![1])),
            (
                sym("ZZZFAKE"),
                SymbolOutcome::Failed(FetchFailure::from(TickerError::UpstreamNotFound(
                    "ZZZFAKE".to_string(),
                ))),
            ),
            (sym("AAPL"), SymbolOutcome::Ok(vec![2])),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_failure_shape_per_kind() {
        assert_eq!(FailureShape::for_kind(DataKind::Quote), FailureShape::Marker);
        assert_eq!(FailureShape::for_kind(DataKind::History), FailureShape::Marker);
        assert_eq!(FailureShape::for_kind(DataKind::Splits), FailureShape::EmptyList);
        assert_eq!(FailureShape::for_kind(DataKind::Calendar), FailureShape::EmptyObject);
    }

    #[test]
    fn test_payload_keeps_request_order() {
        let json = serde_json::to_string(&SymbolPayload::new(DataKind::Dividends, mixed())).unwrap();
        assert_eq!(json, r#"{"MSFT":[1],"ZZZFAKE":[],"AAPL":[2]}"#);
    }

    #[test]
    fn test_payload_failure_marker() {
        let json = serde_json::to_value(SymbolPayload::new(DataKind::History, mixed())).unwrap();
        assert_eq!(json["ZZZFAKE"]["kind"], "UPSTREAM_NOT_FOUND");
        assert!(json["ZZZFAKE"]["error"].as_str().unwrap().contains("ZZZFAKE"));
    }

    #[test]
    fn test_payload_empty_object_for_calendar() {
        let json = serde_json::to_value(SymbolPayload::new(DataKind::Calendar, mixed())).unwrap();
        assert_eq!(json["ZZZFAKE"], serde_json::json!({}));
    }
}
