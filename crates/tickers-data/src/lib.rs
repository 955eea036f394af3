//! 티커 데이터 조회 및 캐싱.
//!
//! 이 crate는 다음을 제공합니다:
//! - 데이터 종류 / 조회 모드별 TTL + LRU 캐시
//! - 업스트림 게이트웨이 trait 및 Yahoo Finance 구현
//! - 단일/배치 조회를 결정하는 라우팅 서비스
//! - 심볼 단위 실패 격리를 위한 결과 타입

pub mod cache;
pub mod outcome;
pub mod provider;
pub mod service;

pub use cache::{CacheStats, FetchCache, FetchCaches, NamedCacheStats};
pub use outcome::{FetchFailure, SymbolOutcome, SymbolResults};
pub use provider::{BatchReply, MarketDataGateway, YahooGateway};
pub use service::TickerService;

#[cfg(any(test, feature = "test-utils"))]
pub use provider::{StubCall, StubGateway};
