//! # Tickers Core
//!
//! 티커 데이터 게이트웨이의 핵심 도메인 타입을 제공합니다.
//!
//! - 심볼 및 심볼 목록 정규화
//! - 데이터 종류, 조회 모드, 캐시 키
//! - 데이터 종류별 응답 모델
//! - 설정 관리
//! - 로깅 인프라

pub mod config;
pub mod error;
pub mod logging;
pub mod types;

pub use config::*;
pub use error::*;
pub use logging::*;
pub use types::*;
