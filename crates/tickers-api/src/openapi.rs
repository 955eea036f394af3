//! OpenAPI 문서화 설정.
//!
//! utoipa를 사용하여 REST API의 OpenAPI 3.0 스펙을 생성합니다.
//! Swagger UI는 `/swagger-ui` 경로에서 사용 가능합니다.
//!
//! 새로운 엔드포인트를 추가할 때:
//!
//! 1. 응답 타입에 `#[derive(ToSchema)]` 추가
//! 2. 핸들러에 `#[utoipa::path(...)]` 어노테이션 추가
//! 3. 이 파일의 `components(schemas(...))` 및 `paths(...)` 섹션에 추가

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tickers_core::{
    CalendarEvents, DividendRecord, HistoryBar, Quote, Recommendation, SplitRecord, TickerInfo,
};

use crate::error::ApiErrorResponse;
use crate::routes::{CacheHealth, HealthResponse, RootResponse};

/// Tickers API 문서.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Tickers Gateway API",
        version = "0.1.0",
        description = r#"
# 티커 데이터 게이트웨이 REST API

Yahoo Finance 데이터를 캐시를 거쳐 제공하는 읽기 전용 API입니다.

## 심볼 파라미터

- `symbol=AAPL` 또는 `symbols=AAPL,MSFT` (`symbols` 우선)
- 공백 제거, 대문자 변환, 중복 제거 후 요청 순서를 유지합니다

## 부분 실패

심볼 하나가 실패해도 응답은 200이며 해당 심볼 항목에만 표시됩니다:

- info, quote, history: `{"error": "...", "kind": "UPSTREAM_NOT_FOUND"}`
- dividends, splits, recommendations: `[]`
- calendar: `{}`
"#,
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    servers(
        (url = "http://localhost:5000", description = "로컬 개발 서버"),
    ),
    tags(
        (name = "health", description = "헬스 체크 - 서버 상태 확인"),
        (name = "tickers", description = "티커 - 종목 정보, 시세, 히스토리 등")
    ),
    components(
        schemas(
            // ===== Health =====
            RootResponse,
            HealthResponse,
            CacheHealth,

            // ===== Common =====
            ApiErrorResponse,

            // ===== Tickers =====
            TickerInfo,
            Quote,
            HistoryBar,
            DividendRecord,
            SplitRecord,
            Recommendation,
            CalendarEvents,
        )
    ),
    paths(
        // ===== Health =====
        crate::routes::root,
        crate::routes::health::health_check,
        crate::routes::health::health_ready,

        // ===== Tickers =====
        crate::routes::tickers::get_info,
        crate::routes::tickers::get_quote,
        crate::routes::tickers::get_history,
        crate::routes::tickers::get_dividends,
        crate::routes::tickers::get_splits,
        crate::routes::tickers::get_recommendations,
        crate::routes::tickers::get_calendar,
    )
)]
pub struct ApiDoc;

/// Swagger UI 라우터 생성.
///
/// 다음 경로에 문서 UI를 마운트합니다:
/// - `/swagger-ui` - Swagger UI 대화형 문서
/// - `/api-docs/openapi.json` - OpenAPI JSON 스펙
pub fn swagger_ui_router<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDoc::openapi())
        .into()
}
