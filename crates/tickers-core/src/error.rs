//! 티커 게이트웨이의 에러 타입.
//!
//! 요청 검증, 업스트림 조회, 설정 로드 과정에서 발생하는 에러를 정의합니다.

use thiserror::Error;

/// 핵심 에러.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TickerError {
    /// 잘못된 요청 (심볼 누락 등). 재시도하지 않습니다.
    #[error("잘못된 요청: {0}")]
    InvalidRequest(String),

    /// 업스트림에 존재하지 않는 심볼
    #[error("심볼을 찾을 수 없음: {0}")]
    UpstreamNotFound(String),

    /// 네트워크, 타임아웃, 요청 한도 초과 등 일시적 업스트림 장애
    #[error("업스트림 일시 장애: {0}")]
    UpstreamTransient(String),

    /// 예상하지 못한 업스트림 응답 형식
    #[error("업스트림 응답 형식 오류: {0}")]
    UpstreamMalformed(String),

    /// 설정 에러
    #[error("설정 에러: {0}")]
    Config(String),

    /// 내부 에러
    #[error("내부 에러: {0}")]
    Internal(String),
}

/// 게이트웨이 작업을 위한 Result 타입.
pub type TickerResult<T> = Result<T, TickerError>;

impl TickerError {
    /// API 응답에 사용하는 에러 코드.
    pub fn code(&self) -> &'static str {
        match self {
            TickerError::InvalidRequest(_) => "INVALID_REQUEST",
            TickerError::UpstreamNotFound(_) => "UPSTREAM_NOT_FOUND",
            TickerError::UpstreamTransient(_) => "UPSTREAM_UNAVAILABLE",
            TickerError::UpstreamMalformed(_) => "UPSTREAM_MALFORMED",
            TickerError::Config(_) => "CONFIG_ERROR",
            TickerError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// 재시도 가능한 에러인지 확인합니다.
    pub fn is_retryable(&self) -> bool {
        matches!(self, TickerError::UpstreamTransient(_))
    }
}

impl From<serde_json::Error> for TickerError {
    fn from(err: serde_json::Error) -> Self {
        TickerError::UpstreamMalformed(err.to_string())
    }
}

impl From<config::ConfigError> for TickerError {
    fn from(err: config::ConfigError) -> Self {
        TickerError::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_retryable() {
        let transient = TickerError::UpstreamTransient("timeout".to_string());
        assert!(transient.is_retryable());

        let not_found = TickerError::UpstreamNotFound("ZZZFAKE".to_string());
        assert!(!not_found.is_retryable());

        let invalid = TickerError::InvalidRequest("no symbols".to_string());
        assert!(!invalid.is_retryable());
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(TickerError::InvalidRequest(String::new()).code(), "INVALID_REQUEST");
        assert_eq!(TickerError::UpstreamNotFound(String::new()).code(), "UPSTREAM_NOT_FOUND");
        assert_eq!(TickerError::UpstreamTransient(String::new()).code(), "UPSTREAM_UNAVAILABLE");
        assert_eq!(TickerError::UpstreamMalformed(String::new()).code(), "UPSTREAM_MALFORMED");
        assert_eq!(TickerError::Internal(String::new()).code(), "INTERNAL_ERROR");
    }

    #[test]
    fn test_from_serde_json_error() {
        let err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        assert!(matches!(TickerError::from(err), TickerError::UpstreamMalformed(_)));
    }
}
