//! 요청 라우팅 서비스.
//!
//! 데이터 종류와 심볼 목록에 따라 단일 조회와 배치 조회 중 하나를 선택하고,
//! 캐시를 거쳐 심볼별 결과 매핑을 만듭니다.
//!
//! - info / quote: 심볼이 하나면 단일 조회 (에러 전파), 여러 개면 배치 조회
//!   (`DataKind::fetch_mode`)
//! - 나머지 종류: 심볼별 단일 조회를 동시에 실행하고 실패는 심볼 단위로 격리
//! - 모든 게이트웨이 호출은 타임아웃으로 감쌉니다

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use tracing::warn;

use tickers_core::{
    CachingConfig, CalendarEvents, DataKind, DividendRecord, FetchKey, FetchMode, HistoryBar,
    HistoryParams, Quote, Recommendation, SplitRecord, Symbol, SymbolList, TickerError,
    TickerInfo, TickerResult, UpstreamConfig,
};

use crate::cache::{FetchCache, FetchCaches};
use crate::outcome::{SymbolOutcome, SymbolResults};
use crate::provider::{BatchReply, MarketDataGateway};

/// 티커 데이터 조회 서비스.
///
/// 시작 시 한 번 생성해 핸들러 간에 공유합니다.
pub struct TickerService {
    gateway: Arc<dyn MarketDataGateway>,
    caches: FetchCaches,
    timeout: Duration,
    max_concurrency: usize,
}

impl TickerService {
    /// 새 서비스를 생성합니다.
    pub fn new(
        gateway: Arc<dyn MarketDataGateway>,
        caching: &CachingConfig,
        upstream: &UpstreamConfig,
    ) -> Self {
        Self {
            gateway,
            caches: FetchCaches::new(caching),
            timeout: upstream.timeout(),
            max_concurrency: upstream.max_concurrency.max(1),
        }
    }

    /// 캐시 묶음.
    pub fn caches(&self) -> &FetchCaches {
        &self.caches
    }

    /// 사용 중인 게이트웨이 이름.
    pub fn gateway_name(&self) -> &str {
        self.gateway.name()
    }

    /// 종목 정보.
    pub async fn info(&self, symbols: &SymbolList) -> TickerResult<SymbolResults<TickerInfo>> {
        let gateway = self.gateway.as_ref();
        self.batchable(
            DataKind::Info,
            symbols,
            &self.caches.info,
            &self.caches.info_batch,
            |s| gateway.fetch_info(s),
            |all| gateway.fetch_info_batch(all),
        )
        .await
    }

    /// 현재 시세.
    pub async fn quote(&self, symbols: &SymbolList) -> TickerResult<SymbolResults<Quote>> {
        let gateway = self.gateway.as_ref();
        self.batchable(
            DataKind::Quote,
            symbols,
            &self.caches.quote,
            &self.caches.quote_batch,
            |s| gateway.fetch_quote(s),
            |all| gateway.fetch_quote_batch(all),
        )
        .await
    }

    /// OHLCV 히스토리. 키에 기간과 간격이 포함됩니다.
    pub async fn history(
        &self,
        symbols: &SymbolList,
        params: &HistoryParams,
    ) -> SymbolResults<Vec<HistoryBar>> {
        let gateway = self.gateway.as_ref();
        let key_params = [("period", params.period()), ("interval", params.interval())];
        self.per_symbol(
            DataKind::History,
            symbols,
            &self.caches.history,
            |s| FetchKey::single_with_params(s, &key_params),
            |s| gateway.fetch_history(s, params),
        )
        .await
    }

    /// 배당 내역.
    pub async fn dividends(&self, symbols: &SymbolList) -> SymbolResults<Vec<DividendRecord>> {
        let gateway = self.gateway.as_ref();
        self.per_symbol(
            DataKind::Dividends,
            symbols,
            &self.caches.dividends,
            FetchKey::single,
            |s| gateway.fetch_dividends(s),
        )
        .await
    }

    /// 주식 분할 내역.
    pub async fn splits(&self, symbols: &SymbolList) -> SymbolResults<Vec<SplitRecord>> {
        let gateway = self.gateway.as_ref();
        self.per_symbol(
            DataKind::Splits,
            symbols,
            &self.caches.splits,
            FetchKey::single,
            |s| gateway.fetch_splits(s),
        )
        .await
    }

    /// 애널리스트 추천 동향.
    pub async fn recommendations(
        &self,
        symbols: &SymbolList,
    ) -> SymbolResults<Vec<Recommendation>> {
        let gateway = self.gateway.as_ref();
        self.per_symbol(
            DataKind::Recommendations,
            symbols,
            &self.caches.recommendations,
            FetchKey::single,
            |s| gateway.fetch_recommendations(s),
        )
        .await
    }

    /// 실적/배당 일정.
    pub async fn calendar(&self, symbols: &SymbolList) -> SymbolResults<CalendarEvents> {
        let gateway = self.gateway.as_ref();
        self.per_symbol(
            DataKind::Calendar,
            symbols,
            &self.caches.calendar,
            FetchKey::single,
            |s| gateway.fetch_calendar(s),
        )
        .await
    }

    /// 게이트웨이 호출에 타임아웃을 적용합니다.
    async fn call<T, Fut>(&self, fut: Fut) -> TickerResult<T>
    where
        Fut: Future<Output = TickerResult<T>>,
    {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(TickerError::UpstreamTransient(format!(
                "Upstream call timed out after {:?}",
                self.timeout
            ))),
        }
    }

    /// 배치를 지원하는 종류의 라우팅.
    async fn batchable<'a, T, S, SF, B, BF>(
        &'a self,
        kind: DataKind,
        symbols: &'a SymbolList,
        single_cache: &'a FetchCache<T>,
        batch_cache: &'a FetchCache<SymbolResults<T>>,
        single: S,
        batch: B,
    ) -> TickerResult<SymbolResults<T>>
    where
        T: Clone,
        S: FnOnce(&'a Symbol) -> SF,
        SF: Future<Output = TickerResult<T>>,
        B: FnOnce(&'a [Symbol]) -> BF,
        BF: Future<Output = TickerResult<BatchReply<T>>>,
    {
        let list = symbols.as_slice();

        if let (FetchMode::Single, [symbol]) = (kind.fetch_mode(list.len()), list) {
            let value = single_cache
                .get_or_fetch(FetchKey::single(symbol), || self.call(single(symbol)))
                .await?;
            let mut results = SymbolResults::new();
            results.push(symbol.clone(), SymbolOutcome::Ok(value));
            return Ok(results);
        }

        let results = batch_cache
            .get_or_fetch_if(
                FetchKey::batch(symbols),
                || async {
                    let reply = self.call(batch(list)).await.map_err(|e| {
                        warn!(kind = %kind, symbols = list.len(), error = %e, "Batch fetch failed");
                        e
                    })?;
                    Ok::<_, TickerError>(assemble_batch(kind, list, reply))
                },
                |results| !results.has_failures(),
            )
            .await?;

        // 배치 캐시 키는 정렬되어 있으므로 현재 요청 순서로 다시 맞춥니다
        Ok(reorder(results, list))
    }

    /// 심볼별 단일 조회. 실패는 해당 심볼에만 기록됩니다.
    async fn per_symbol<'a, T, K, F, Fut>(
        &'a self,
        kind: DataKind,
        symbols: &'a SymbolList,
        cache: &'a FetchCache<T>,
        key_of: K,
        fetch: F,
    ) -> SymbolResults<T>
    where
        T: Clone,
        K: Fn(&Symbol) -> FetchKey,
        F: Fn(&'a Symbol) -> Fut,
        Fut: Future<Output = TickerResult<T>>,
    {
        let futures: Vec<_> = symbols
            .iter()
            .map(|symbol| {
                let key = key_of(symbol);
                let fut = fetch(symbol);
                async move { cache.get_or_fetch(key, || self.call(fut)).await }
            })
            .collect();
        let outcomes: Vec<TickerResult<T>> = stream::iter(futures)
            .buffered(self.max_concurrency)
            .collect()
            .await;

        symbols
            .iter()
            .zip(outcomes)
            .map(|(symbol, outcome)| {
                if let Err(e) = &outcome {
                    warn!(kind = %kind, symbol = %symbol, error = %e, "Symbol fetch failed");
                }
                (symbol.clone(), SymbolOutcome::from(outcome))
            })
            .collect()
    }
}

/// 배치 응답을 요청 순서의 결과 매핑으로 바꿉니다. 응답에 없는 심볼은 NotFound.
fn assemble_batch<T>(kind: DataKind, symbols: &[Symbol], mut reply: BatchReply<T>) -> SymbolResults<T> {
    symbols
        .iter()
        .map(|symbol| {
            let outcome = reply.remove(symbol).unwrap_or_else(|| {
                Err(TickerError::UpstreamNotFound(format!(
                    "No data found for symbol {}",
                    symbol
                )))
            });
            if let Err(e) = &outcome {
                warn!(kind = %kind, symbol = %symbol, error = %e, "Symbol fetch failed");
            }
            (symbol.clone(), SymbolOutcome::from(outcome))
        })
        .collect()
}

fn reorder<T: Clone>(results: SymbolResults<T>, symbols: &[Symbol]) -> SymbolResults<T> {
    symbols
        .iter()
        .filter_map(|s| results.get(s.as_str()).map(|o| (s.clone(), o.clone())))
        .collect()
}
