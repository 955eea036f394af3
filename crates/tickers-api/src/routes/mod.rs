//! API 라우트.
//!
//! 모든 REST API 엔드포인트를 정의하고 라우터를 구성합니다.
//!
//! # 라우트 구조
//!
//! - `/` - 서버 상태 및 엔드포인트 목록
//! - `/health` - 헬스 체크 (liveness)
//! - `/health/ready` - 상세 헬스 체크 (readiness)
//! - `/tickers/*` - 티커 데이터 조회

pub mod health;
pub mod tickers;

pub use health::{health_router, CacheHealth, HealthResponse};
pub use tickers::{tickers_router, FailureShape, HistoryQuery, SymbolPayload, SymbolQuery};

use axum::{routing::get, Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use crate::state::AppState;

/// 제공하는 엔드포인트 목록.
pub const ENDPOINTS: &[&str] = &[
    "/tickers/info",
    "/tickers/quote",
    "/tickers/history",
    "/tickers/dividends",
    "/tickers/splits",
    "/tickers/recommendations",
    "/tickers/calendar",
    "/health",
    "/health/ready",
    "/metrics",
    "/swagger-ui",
];

/// 루트 응답.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RootResponse {
    pub status: String,
    pub message: String,
    pub endpoints: Vec<String>,
}

/// 서버 상태와 엔드포인트 목록.
#[utoipa::path(
    get,
    path = "/",
    tag = "health",
    responses((status = 200, description = "서버 상태", body = RootResponse))
)]
pub async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        status: "online".to_string(),
        message: "Ticker market data gateway".to_string(),
        endpoints: ENDPOINTS.iter().map(|e| (*e).to_string()).collect(),
    })
}

/// 전체 API 라우터 생성.
pub fn create_api_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(root))
        .nest("/health", health_router())
        .nest("/tickers", tickers_router())
}
