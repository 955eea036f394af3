//! 캐싱 레이어.
//!
//! - `FetchCache`: 조회 키별 TTL + LRU 캐시
//! - `FetchCaches`: 데이터 종류 / 조회 모드별 캐시 묶음

pub mod fetch_cache;
pub mod registry;

pub use fetch_cache::{CacheStats, FetchCache};
pub use registry::{FetchCaches, NamedCacheStats};
