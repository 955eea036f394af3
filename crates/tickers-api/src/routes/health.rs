//! 헬스 체크 endpoint.
//!
//! 서버 상태 확인을 위한 헬스 체크 엔드포인트를 제공합니다.

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use crate::state::AppState;

/// 헬스 체크 응답 구조체.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// 전체 서비스 상태
    pub status: String,

    /// API 버전
    pub version: String,

    /// 서버 업타임(초)
    pub uptime_secs: i64,

    /// 현재 시간 (ISO 8601)
    pub timestamp: String,

    /// 업스트림 게이트웨이 이름
    pub gateway: String,

    /// 캐시별 상태
    pub caches: Vec<CacheHealth>,
}

/// 캐시 하나의 상태.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CacheHealth {
    pub name: String,
    pub entries: usize,
    pub capacity: usize,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    /// 적중률 (0.0 ~ 1.0)
    pub hit_rate: f64,
}

/// 간단한 헬스 체크 (liveness probe용).
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses((status = 200, description = "서버 응답 가능", body = String))
)]
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// 상세 헬스 체크 (readiness probe용).
///
/// 버전, 업타임, 캐시별 통계를 반환합니다.
#[utoipa::path(
    get,
    path = "/health/ready",
    tag = "health",
    responses((status = 200, description = "서버 상태", body = HealthResponse))
)]
pub async fn health_ready(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let caches = state
        .service
        .caches()
        .stats()
        .await
        .into_iter()
        .map(|named| CacheHealth {
            hit_rate: named.stats.hit_rate(),
            name: named.name,
            entries: named.stats.entries,
            capacity: named.stats.capacity,
            hits: named.stats.hits,
            misses: named.stats.misses,
            evictions: named.stats.evictions,
        })
        .collect();

    let response = HealthResponse {
        status: "healthy".to_string(),
        version: state.version.clone(),
        uptime_secs: state.uptime_secs(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        gateway: state.service.gateway_name().to_string(),
        caches,
    };

    (StatusCode::OK, Json(response))
}

/// 헬스 체크 라우터 생성.
pub fn health_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(health_check))
        .route("/ready", get(health_ready))
}
