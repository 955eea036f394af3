//! 업스트림 데이터 Provider 모듈.
//!
//! ## 게이트웨이
//! - `MarketDataGateway`: 데이터 종류별 단일/배치 조회 trait
//! - `YahooGateway`: Yahoo Finance 구현 (quote, quoteSummary, chart API)
//! - `StubGateway`: 테스트용 메모리 구현 (`test-utils` feature)

pub mod traits;
pub mod yahoo;

#[cfg(any(test, feature = "test-utils"))]
pub mod stub;

pub use traits::{BatchReply, MarketDataGateway};
pub use yahoo::YahooGateway;

#[cfg(any(test, feature = "test-utils"))]
pub use stub::{StubCall, StubGateway};
