//! 업스트림 데이터 게이트웨이 trait.

use std::collections::HashMap;

use async_trait::async_trait;

use tickers_core::{
    CalendarEvents, DividendRecord, HistoryBar, HistoryParams, Quote, Recommendation,
    SplitRecord, Symbol, TickerInfo, TickerResult,
};

/// 배치 조회 결과. 응답에 없는 심볼은 호출자가 처리합니다.
pub type BatchReply<T> = HashMap<Symbol, TickerResult<T>>;

/// 외부 시장 데이터 제공자.
///
/// 모든 데이터 종류에 대한 단일 심볼 조회와, info/quote에 대한 배치 조회를
/// 제공합니다. 일시적 장애, 존재하지 않는 심볼, 형식 오류를
/// `TickerError`의 각 변형으로 구분해 반환해야 합니다.
#[async_trait]
pub trait MarketDataGateway: Send + Sync {
    /// 게이트웨이 이름.
    fn name(&self) -> &str;

    /// 종목 정보 조회.
    async fn fetch_info(&self, symbol: &Symbol) -> TickerResult<TickerInfo>;

    /// 여러 종목 정보를 한 번에 조회.
    async fn fetch_info_batch(&self, symbols: &[Symbol]) -> TickerResult<BatchReply<TickerInfo>>;

    /// 현재 시세 조회.
    async fn fetch_quote(&self, symbol: &Symbol) -> TickerResult<Quote>;

    /// 여러 시세를 한 번에 조회.
    async fn fetch_quote_batch(&self, symbols: &[Symbol]) -> TickerResult<BatchReply<Quote>>;

    /// OHLCV 히스토리 조회. 데이터가 없으면 빈 벡터.
    async fn fetch_history(
        &self,
        symbol: &Symbol,
        params: &HistoryParams,
    ) -> TickerResult<Vec<HistoryBar>>;

    /// 배당 내역 조회. 데이터가 없으면 빈 벡터.
    async fn fetch_dividends(&self, symbol: &Symbol) -> TickerResult<Vec<DividendRecord>>;

    /// 주식 분할 내역 조회. 데이터가 없으면 빈 벡터.
    async fn fetch_splits(&self, symbol: &Symbol) -> TickerResult<Vec<SplitRecord>>;

    /// 애널리스트 추천 동향 조회.
    async fn fetch_recommendations(&self, symbol: &Symbol) -> TickerResult<Vec<Recommendation>>;

    /// 실적/배당 일정 조회.
    async fn fetch_calendar(&self, symbol: &Symbol) -> TickerResult<CalendarEvents>;
}
