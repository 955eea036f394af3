//! TTL + LRU 조회 캐시.
//!
//! 조회 키마다 마지막으로 성공한 결과를 일정 시간 보관합니다.
//!
//! - 만료는 접근 시점에 검사합니다 (백그라운드 정리 없음)
//! - 용량이 가득 차면 가장 오래 사용되지 않은 항목을 제거합니다
//! - 실패한 조회 결과는 저장하지 않습니다
//! - 같은 키에 대한 동시 미스는 각각 fetch를 호출할 수 있습니다
//!
//! 시계는 `tokio::time::Instant`를 사용하므로 테스트에서
//! `tokio::time::pause`/`advance`로 만료를 검증할 수 있습니다.

use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

use tickers_core::{CachingConfig, FetchKey, TickerResult};

/// 캐시 통계.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// 캐시 적중 수
    pub hits: u64,
    /// 캐시 미스 수
    pub misses: u64,
    /// 현재 저장된 항목 수 (만료되었지만 아직 제거되지 않은 항목 포함)
    pub entries: usize,
    /// 만료 또는 용량 초과로 제거된 항목 수
    pub evictions: u64,
    /// 최대 항목 수
    pub capacity: usize,
}

impl CacheStats {
    /// 적중률 (0.0 ~ 1.0).
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

struct Entry<V> {
    value: V,
    expires_at: Instant,
    last_used: u64,
}

struct Store<V> {
    entries: HashMap<FetchKey, Entry<V>>,
    /// 사용 순서를 매기는 단조 증가 카운터
    tick: u64,
    hits: u64,
    misses: u64,
    evictions: u64,
}

impl<V> Store<V> {
    fn new() -> Self {
        Self {
            entries: HashMap::new(),
            tick: 0,
            hits: 0,
            misses: 0,
            evictions: 0,
        }
    }

    fn next_tick(&mut self) -> u64 {
        self.tick += 1;
        self.tick
    }

    /// 용량 확보. 만료된 항목을 먼저 제거하고, 그래도 가득 차 있으면 LRU 제거.
    fn make_room(&mut self, capacity: usize, now: Instant) {
        if self.entries.len() < capacity {
            return;
        }

        let before = self.entries.len();
        self.entries.retain(|_, e| e.expires_at > now);
        self.evictions += (before - self.entries.len()) as u64;

        while self.entries.len() >= capacity {
            let oldest = self
                .entries
                .iter()
                .min_by_key(|(_, e)| e.last_used)
                .map(|(k, _)| k.clone());
            match oldest {
                Some(key) => {
                    self.entries.remove(&key);
                    self.evictions += 1;
                }
                None => break,
            }
        }
    }
}

/// 조회 결과 캐시.
///
/// 데이터 종류와 조회 모드 쌍마다 독립된 인스턴스를 사용합니다.
/// 내부 잠금은 업스트림 호출 동안 유지되지 않습니다.
pub struct FetchCache<V> {
    name: String,
    enabled: bool,
    ttl: Duration,
    capacity: usize,
    store: Mutex<Store<V>>,
}

impl<V: Clone> FetchCache<V> {
    /// 새 캐시를 생성합니다.
    pub fn new(name: impl Into<String>, enabled: bool, ttl: Duration, capacity: usize) -> Self {
        Self {
            name: name.into(),
            enabled,
            ttl,
            capacity,
            store: Mutex::new(Store::new()),
        }
    }

    /// 캐시 설정에서 생성합니다.
    pub fn from_config(name: impl Into<String>, config: &CachingConfig, capacity: usize) -> Self {
        Self::new(name, config.enabled, config.ttl(), capacity)
    }

    /// 캐시 이름.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 캐시 사용 여부.
    pub fn is_enabled(&self) -> bool {
        self.enabled && self.capacity > 0
    }

    /// 캐시된 값을 반환하거나, 없으면 `fetch`를 호출해 결과를 저장합니다.
    ///
    /// `fetch`가 실패하면 에러를 그대로 전파하고 아무것도 저장하지 않습니다.
    pub async fn get_or_fetch<F, Fut>(&self, key: FetchKey, fetch: F) -> TickerResult<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = TickerResult<V>>,
    {
        self.get_or_fetch_if(key, fetch, |_| true).await
    }

    /// `get_or_fetch`와 같지만 `should_store`가 허용한 값만 저장합니다.
    pub async fn get_or_fetch_if<F, Fut, P>(
        &self,
        key: FetchKey,
        fetch: F,
        should_store: P,
    ) -> TickerResult<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = TickerResult<V>>,
        P: FnOnce(&V) -> bool,
    {
        if let Some(value) = self.lookup(&key).await {
            return Ok(value);
        }

        debug!(cache = %self.name, key = %key, "Cache miss");
        let value = fetch().await?;

        if self.is_enabled() && should_store(&value) {
            self.insert(key, value.clone()).await;
        }
        Ok(value)
    }

    /// 유효한 항목을 조회합니다. 만료된 항목은 이 시점에 제거됩니다.
    async fn lookup(&self, key: &FetchKey) -> Option<V> {
        let mut guard = self.store.lock().await;
        let store = &mut *guard;
        if !self.is_enabled() {
            store.misses += 1;
            return None;
        }

        let now = Instant::now();
        let tick = store.next_tick();

        let expired = match store.entries.get_mut(key) {
            Some(entry) if entry.expires_at > now => {
                entry.last_used = tick;
                let value = entry.value.clone();
                store.hits += 1;
                return Some(value);
            }
            Some(_) => true,
            None => false,
        };

        if expired {
            store.entries.remove(key);
            store.evictions += 1;
        }
        store.misses += 1;
        None
    }

    async fn insert(&self, key: FetchKey, value: V) {
        let mut store = self.store.lock().await;
        let now = Instant::now();

        if !store.entries.contains_key(&key) {
            store.make_room(self.capacity, now);
        }

        let tick = store.next_tick();
        store.entries.insert(
            key,
            Entry {
                value,
                expires_at: now + self.ttl,
                last_used: tick,
            },
        );
    }

    /// 모든 항목을 제거합니다. 통계는 유지됩니다.
    pub async fn clear(&self) {
        self.store.lock().await.entries.clear();
    }

    /// 현재 통계.
    pub async fn stats(&self) -> CacheStats {
        let store = self.store.lock().await;
        CacheStats {
            hits: store.hits,
            misses: store.misses,
            entries: store.entries.len(),
            evictions: store.evictions,
            capacity: self.capacity,
        }
    }
}
