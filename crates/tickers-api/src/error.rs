//! 통합 API 에러 응답 타입.
//!
//! 모든 API 엔드포인트에서 일관된 에러 형식을 제공합니다.

use axum::http::{Method, StatusCode, Uri};
use axum::Json;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use tickers_core::TickerError;

/// 통합 API 에러 응답.
///
/// # 예시
///
/// ```json
/// {
///   "code": "INVALID_REQUEST",
///   "message": "잘못된 요청: Please provide at least one symbol via 'symbol' or 'symbols'",
///   "timestamp": 1738300800
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiErrorResponse {
    /// 에러 코드 (예: "INVALID_REQUEST", "UPSTREAM_NOT_FOUND")
    pub code: String,
    /// 사람이 읽을 수 있는 에러 메시지
    pub message: String,
    /// 에러 발생 타임스탬프 (Unix timestamp)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
    /// HTTP 메서드 (GET, POST 등)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    /// 요청 경로
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl ApiErrorResponse {
    /// 기본 에러 생성 (타임스탬프 포함).
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            timestamp: Some(chrono::Utc::now().timestamp()),
            method: None,
            path: None,
        }
    }

    /// 요청 정보(메서드, 경로)를 추가합니다.
    #[must_use]
    pub fn with_request_info(mut self, method: &Method, uri: &Uri) -> Self {
        self.method = Some(method.to_string());
        self.path = Some(uri.path().to_string());
        self
    }

    /// 도메인 에러를 상태 코드와 응답 본문으로 변환합니다.
    ///
    /// - `InvalidRequest` → 400
    /// - `UpstreamNotFound` → 404
    /// - `UpstreamTransient`, `UpstreamMalformed` → 502
    /// - 나머지 → 500
    pub fn from_ticker_error(err: &TickerError) -> (StatusCode, Json<Self>) {
        let status = match err {
            TickerError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            TickerError::UpstreamNotFound(_) => StatusCode::NOT_FOUND,
            TickerError::UpstreamTransient(_) | TickerError::UpstreamMalformed(_) => {
                StatusCode::BAD_GATEWAY
            }
            TickerError::Config(_) | TickerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(Self::new(err.code(), err.to_string())))
    }

    /// 에러 코드 반환.
    pub fn code(&self) -> &str {
        &self.code
    }

    /// 에러 메시지 반환.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for ApiErrorResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiErrorResponse {}

/// API 핸들러 Result 타입 별칭.
pub type ApiResult<T> = Result<T, (StatusCode, Json<ApiErrorResponse>)>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_response_new() {
        let error = ApiErrorResponse::new("TEST_ERROR", "Test message");
        assert_eq!(error.code(), "TEST_ERROR");
        assert_eq!(error.message(), "Test message");
        assert!(error.timestamp.is_some());
        assert!(error.method.is_none());
    }

    #[test]
    fn test_status_mapping() {
        let cases = [
            (TickerError::InvalidRequest("x".into()), StatusCode::BAD_REQUEST),
            (TickerError::UpstreamNotFound("x".into()), StatusCode::NOT_FOUND),
            (TickerError::UpstreamTransient("x".into()), StatusCode::BAD_GATEWAY),
            (TickerError::UpstreamMalformed("x".into()), StatusCode::BAD_GATEWAY),
            (TickerError::Internal("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, expected) in cases {
            let (status, Json(body)) = ApiErrorResponse::from_ticker_error(&err);
            assert_eq!(status, expected);
            assert_eq!(body.code, err.code());
        }
    }

    #[test]
    fn test_with_request_info() {
        let uri: Uri = "/tickers/quote?symbols=AAPL".parse().unwrap();
        let error = ApiErrorResponse::new("UPSTREAM_NOT_FOUND", "not found")
            .with_request_info(&Method::GET, &uri);

        assert_eq!(error.method.as_deref(), Some("GET"));
        assert_eq!(error.path.as_deref(), Some("/tickers/quote"));

        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains(r#""path":"/tickers/quote""#));
    }
}
