//! 데이터 종류 / 조회 모드별 캐시 묶음.

use tickers_core::{
    CachingConfig, CalendarEvents, DataKind, DividendRecord, FetchMode, HistoryBar, Quote,
    Recommendation, SplitRecord, TickerInfo,
};

use super::fetch_cache::{CacheStats, FetchCache};
use crate::outcome::SymbolResults;

/// 캐시 하나의 이름과 통계.
#[derive(Debug, Clone, serde::Serialize)]
pub struct NamedCacheStats {
    pub name: String,
    #[serde(flatten)]
    pub stats: CacheStats,
}

/// 모든 조회 캐시.
///
/// (데이터 종류, 조회 모드) 쌍마다 독립된 인스턴스를 가지므로
/// 한 캐시의 만료나 제거가 다른 캐시에 영향을 주지 않습니다.
pub struct FetchCaches {
    pub info: FetchCache<TickerInfo>,
    pub info_batch: FetchCache<SymbolResults<TickerInfo>>,
    pub quote: FetchCache<Quote>,
    pub quote_batch: FetchCache<SymbolResults<Quote>>,
    pub history: FetchCache<Vec<HistoryBar>>,
    pub dividends: FetchCache<Vec<DividendRecord>>,
    pub splits: FetchCache<Vec<SplitRecord>>,
    pub recommendations: FetchCache<Vec<Recommendation>>,
    pub calendar: FetchCache<CalendarEvents>,
}

fn cache_name(kind: DataKind, mode: FetchMode) -> String {
    match mode {
        FetchMode::Single => kind.as_str().to_string(),
        FetchMode::Batch => format!("{}_batch", kind.as_str()),
    }
}

impl FetchCaches {
    /// 캐시 설정으로 모든 인스턴스를 생성합니다.
    pub fn new(config: &CachingConfig) -> Self {
        let single = |kind| cache_name(kind, FetchMode::Single);
        let batch = |kind| cache_name(kind, FetchMode::Batch);
        let size = config.max_size;
        let batch_size = config.batch_max_size;

        Self {
            info: FetchCache::from_config(single(DataKind::Info), config, size),
            info_batch: FetchCache::from_config(batch(DataKind::Info), config, batch_size),
            quote: FetchCache::from_config(single(DataKind::Quote), config, size),
            quote_batch: FetchCache::from_config(batch(DataKind::Quote), config, batch_size),
            history: FetchCache::from_config(single(DataKind::History), config, size),
            dividends: FetchCache::from_config(single(DataKind::Dividends), config, size),
            splits: FetchCache::from_config(single(DataKind::Splits), config, size),
            recommendations: FetchCache::from_config(
                single(DataKind::Recommendations),
                config,
                size,
            ),
            calendar: FetchCache::from_config(single(DataKind::Calendar), config, size),
        }
    }

    /// 모든 캐시의 통계.
    pub async fn stats(&self) -> Vec<NamedCacheStats> {
        let mut all = Vec::with_capacity(9);
        macro_rules! collect {
            ($($field:ident),*) => {
                $(
                    all.push(NamedCacheStats {
                        name: self.$field.name().to_string(),
                        stats: self.$field.stats().await,
                    });
                )*
            };
        }
        collect!(
            info,
            info_batch,
            quote,
            quote_batch,
            history,
            dividends,
            splits,
            recommendations,
            calendar
        );
        all
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tickers_core::{FetchKey, QuoteFields, Symbol, SymbolList};

    fn sym(s: &str) -> Symbol {
        Symbol::new(s).unwrap()
    }

    fn quote(s: &str) -> Quote {
        Quote::from_fields(s, QuoteFields::default(), chrono::Utc::now())
    }

    /// 조회가 캐시 적중으로 끝났는지 여부. 미스이면 `fresh`를 저장합니다.
    async fn is_hit<V: Clone>(cache: &FetchCache<V>, key: FetchKey, fresh: V) -> bool {
        let fetched = AtomicBool::new(false);
        let flag = &fetched;
        cache
            .get_or_fetch(key, move || async move {
                flag.store(true, Ordering::SeqCst);
                Ok(fresh)
            })
            .await
            .unwrap();
        !fetched.load(Ordering::SeqCst)
    }

    fn tiny_config() -> CachingConfig {
        CachingConfig {
            max_size: 1,
            batch_max_size: 1,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_eviction_stays_within_one_cache() {
        let caches = FetchCaches::new(&tiny_config());
        let aapl = sym("AAPL");
        let pair = SymbolList::from_raw(&["AAPL", "MSFT"]).unwrap();

        is_hit(&caches.info, FetchKey::single(&aapl), TickerInfo::default()).await;
        is_hit(&caches.quote_batch, FetchKey::batch(&pair), SymbolResults::new()).await;
        is_hit(&caches.history, FetchKey::single(&aapl), Vec::new()).await;

        // quote 캐시를 용량 이상으로 채워 제거 유발
        for s in ["AAPL", "MSFT", "GOOG"] {
            assert!(!is_hit(&caches.quote, FetchKey::single(&sym(s)), quote(s)).await);
        }
        let stats = caches.stats().await;
        let quote_stats = stats.iter().find(|s| s.name == "quote").unwrap();
        assert_eq!(quote_stats.stats.evictions, 2);
        assert_eq!(quote_stats.stats.entries, 1);

        assert!(is_hit(&caches.info, FetchKey::single(&aapl), TickerInfo::default()).await);
        assert!(is_hit(&caches.quote_batch, FetchKey::batch(&pair), SymbolResults::new()).await);
        assert!(is_hit(&caches.history, FetchKey::single(&aapl), Vec::new()).await);
        assert!(stats
            .iter()
            .filter(|s| s.name != "quote")
            .all(|s| s.stats.evictions == 0));
    }

    #[tokio::test]
    async fn test_single_and_batch_caches_are_separate() {
        let caches = FetchCaches::new(&CachingConfig::default());
        let aapl = sym("AAPL");
        let list = SymbolList::from_raw(&["AAPL"]).unwrap();

        is_hit(&caches.info, FetchKey::single(&aapl), TickerInfo::default()).await;
        assert!(!is_hit(&caches.info_batch, FetchKey::batch(&list), SymbolResults::new()).await);

        assert!(is_hit(&caches.info, FetchKey::single(&aapl), TickerInfo::default()).await);
        assert!(is_hit(&caches.info_batch, FetchKey::batch(&list), SymbolResults::new()).await);

        let stats = caches.stats().await;
        for name in ["info", "info_batch"] {
            let named = stats.iter().find(|s| s.name == name).unwrap();
            assert_eq!(named.stats.entries, 1, "{name}");
        }
    }

    #[tokio::test]
    async fn test_cache_names_and_sizes() {
        let caches = FetchCaches::new(&CachingConfig::default());
        let stats = caches.stats().await;
        assert_eq!(stats.len(), 9);

        let quote_batch = stats.iter().find(|s| s.name == "quote_batch").unwrap();
        assert_eq!(quote_batch.stats.capacity, 64);
        let history = stats.iter().find(|s| s.name == "history").unwrap();
        assert_eq!(history.stats.capacity, 128);
    }
}
