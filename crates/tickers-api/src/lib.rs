//! 티커 데이터 게이트웨이 REST API.
//!
//! 이 crate는 다음을 제공합니다:
//! - 종목 정보, 시세, 히스토리 등 7가지 데이터 종류의 조회 엔드포인트
//! - 헬스 체크 및 Prometheus 메트릭
//! - 클라이언트별 요청 수 집계 미들웨어
//! - OpenAPI 문서 및 Swagger UI

pub mod error;
pub mod metrics;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod state;

pub use error::{ApiErrorResponse, ApiResult};
pub use routes::create_api_router;
pub use state::AppState;

#[cfg(any(test, feature = "test-utils"))]
pub use state::create_test_state;
