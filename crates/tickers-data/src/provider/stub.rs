//! 테스트용 게이트웨이.
//!
//! 업스트림 없이 라우팅과 캐시 동작을 검증하기 위해 사용합니다.
//! 메서드별 호출 횟수를 기록합니다.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{json, Map};

use tickers_core::{
    CalendarEvents, DividendRecord, HistoryBar, HistoryParams, Quote, QuoteFields,
    Recommendation, SplitRecord, Symbol, TickerError, TickerInfo, TickerResult,
};

use super::traits::{BatchReply, MarketDataGateway};

/// 호출 횟수를 구분하는 게이트웨이 메서드.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StubCall {
    Info,
    InfoBatch,
    Quote,
    QuoteBatch,
    History,
    Dividends,
    Splits,
    Recommendations,
    Calendar,
}

const CALL_KINDS: usize = 9;

/// 메모리 기반 게이트웨이.
///
/// - 등록된 심볼만 존재하며 나머지는 `UpstreamNotFound`
/// - 배치 응답에서는 등록되지 않은 심볼이 빠집니다
/// - `with_failure`로 특정 심볼에 에러를 지정할 수 있습니다
pub struct StubGateway {
    known: HashSet<Symbol>,
    failures: HashMap<Symbol, TickerError>,
    batch_failure: Option<TickerError>,
    dividends: HashMap<Symbol, Vec<DividendRecord>>,
    delay: Option<Duration>,
    calls: [AtomicUsize; CALL_KINDS],
}

impl Default for StubGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl StubGateway {
    /// 심볼이 등록되지 않은 게이트웨이.
    pub fn new() -> Self {
        Self {
            known: HashSet::new(),
            failures: HashMap::new(),
            batch_failure: None,
            dividends: HashMap::new(),
            delay: None,
            calls: Default::default(),
        }
    }

    /// 존재하는 심볼을 등록합니다.
    pub fn with_symbols(mut self, symbols: &[&str]) -> Self {
        self.known.extend(symbols.iter().filter_map(|s| Symbol::new(s)));
        self
    }

    /// 심볼 조회 시 반환할 에러를 지정합니다.
    pub fn with_failure(mut self, symbol: &str, error: TickerError) -> Self {
        if let Some(sym) = Symbol::new(symbol) {
            self.failures.insert(sym, error);
        }
        self
    }

    /// 배치 호출 전체를 실패시킵니다.
    pub fn with_batch_failure(mut self, error: TickerError) -> Self {
        self.batch_failure = Some(error);
        self
    }

    /// 배당 내역을 지정합니다. 지정하지 않은 심볼은 빈 내역입니다.
    pub fn with_dividends(mut self, symbol: &str, records: Vec<DividendRecord>) -> Self {
        if let Some(sym) = Symbol::new(symbol) {
            self.dividends.insert(sym, records);
        }
        self
    }

    /// 모든 호출에 지연을 추가합니다.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// 메서드 호출 횟수.
    pub fn calls(&self, call: StubCall) -> usize {
        self.calls[call as usize].load(Ordering::SeqCst)
    }

    /// 전체 호출 횟수.
    pub fn total_calls(&self) -> usize {
        self.calls.iter().map(|c| c.load(Ordering::SeqCst)).sum()
    }

    async fn enter(&self, call: StubCall) {
        self.calls[call as usize].fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }

    fn check(&self, symbol: &Symbol) -> TickerResult<()> {
        if let Some(err) = self.failures.get(symbol) {
            return Err(err.clone());
        }
        if !self.known.contains(symbol) {
            return Err(TickerError::UpstreamNotFound(format!(
                "No data found for symbol {}",
                symbol
            )));
        }
        Ok(())
    }

    fn price_of(symbol: &Symbol) -> f64 {
        100.0 + symbol.as_str().len() as f64
    }

    fn make_info(symbol: &Symbol) -> TickerInfo {
        let mut map = Map::new();
        map.insert("symbol".to_string(), json!(symbol.as_str()));
        map.insert("shortName".to_string(), json!(format!("{} Inc.", symbol)));
        map.insert("regularMarketPrice".to_string(), json!(Self::price_of(symbol)));
        TickerInfo(map)
    }

    fn make_quote(symbol: &Symbol) -> Quote {
        let price = Self::price_of(symbol);
        Quote::from_fields(
            symbol.as_str(),
            QuoteFields {
                current_price: Some(price),
                previous_close: Some(price - 1.0),
                open: Some(price - 0.5),
                day_high: Some(price + 1.0),
                day_low: Some(price - 2.0),
                volume: Some(1_000),
                exchange_timezone: Some("America/New_York".to_string()),
                market_time: Some(1_714_564_800),
            },
            Utc::now(),
        )
    }
}

#[async_trait]
impl MarketDataGateway for StubGateway {
    fn name(&self) -> &str {
        "stub"
    }

    async fn fetch_info(&self, symbol: &Symbol) -> TickerResult<TickerInfo> {
        self.enter(StubCall::Info).await;
        self.check(symbol)?;
        Ok(Self::make_info(symbol))
    }

    async fn fetch_info_batch(&self, symbols: &[Symbol]) -> TickerResult<BatchReply<TickerInfo>> {
        self.enter(StubCall::InfoBatch).await;
        if let Some(err) = &self.batch_failure {
            return Err(err.clone());
        }
        Ok(symbols
            .iter()
            .filter(|s| self.known.contains(*s) || self.failures.contains_key(*s))
            .map(|s| (s.clone(), self.check(s).map(|_| Self::make_info(s))))
            .collect())
    }

    async fn fetch_quote(&self, symbol: &Symbol) -> TickerResult<Quote> {
        self.enter(StubCall::Quote).await;
        self.check(symbol)?;
        Ok(Self::make_quote(symbol))
    }

    async fn fetch_quote_batch(&self, symbols: &[Symbol]) -> TickerResult<BatchReply<Quote>> {
        self.enter(StubCall::QuoteBatch).await;
        if let Some(err) = &self.batch_failure {
            return Err(err.clone());
        }
        Ok(symbols
            .iter()
            .filter(|s| self.known.contains(*s) || self.failures.contains_key(*s))
            .map(|s| (s.clone(), self.check(s).map(|_| Self::make_quote(s))))
            .collect())
    }

    async fn fetch_history(
        &self,
        symbol: &Symbol,
        params: &HistoryParams,
    ) -> TickerResult<Vec<HistoryBar>> {
        self.enter(StubCall::History).await;
        self.check(symbol)?;
        let close = Self::price_of(symbol);
        let bar = |date: &str| HistoryBar {
            date: date.to_string(),
            open: Some(close - 1.0),
            high: Some(close + 1.0),
            low: Some(close - 2.0),
            close: Some(close),
            adj_close: Some(close),
            volume: 10_000,
        };
        let bars = if params.interval() == "1d" {
            vec![bar("2024-05-01T00:00:00Z"), bar("2024-05-02T00:00:00Z")]
        } else {
            vec![bar("2024-05-01T00:00:00Z")]
        };
        Ok(bars)
    }

    async fn fetch_dividends(&self, symbol: &Symbol) -> TickerResult<Vec<DividendRecord>> {
        self.enter(StubCall::Dividends).await;
        self.check(symbol)?;
        Ok(self.dividends.get(symbol).cloned().unwrap_or_default())
    }

    async fn fetch_splits(&self, symbol: &Symbol) -> TickerResult<Vec<SplitRecord>> {
        self.enter(StubCall::Splits).await;
        self.check(symbol)?;
        Ok(Vec::new())
    }

    async fn fetch_recommendations(&self, symbol: &Symbol) -> TickerResult<Vec<Recommendation>> {
        self.enter(StubCall::Recommendations).await;
        self.check(symbol)?;
        Ok(vec![Recommendation {
            period: "0m".to_string(),
            strong_buy: 5,
            buy: 10,
            hold: 4,
            sell: 1,
            strong_sell: 0,
        }])
    }

    async fn fetch_calendar(&self, symbol: &Symbol) -> TickerResult<CalendarEvents> {
        self.enter(StubCall::Calendar).await;
        self.check(symbol)?;
        let mut map = Map::new();
        map.insert("Earnings Date".to_string(), json!(["2024-07-25"]));
        map.insert("Ex-Dividend Date".to_string(), json!("2024-05-10"));
        Ok(CalendarEvents(map))
    }
}
