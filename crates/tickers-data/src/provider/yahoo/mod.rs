//! Yahoo Finance 게이트웨이.
//!
//! - quote / info / recommendations / calendar: `reqwest`로 v7 quote, v10 quoteSummary 호출
//!   (crumb/cookie 인증 필요)
//! - history / dividends / splits: `yahoo_finance_api` 커넥터의 chart API

pub mod auth;
pub mod models;

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use futures::stream::{self, StreamExt};
use reqwest::{header, Client, StatusCode};
use tracing::debug;
use yahoo_finance_api as yahoo;

use tickers_core::{
    finite, unix_to_date, unix_to_iso_z, CalendarEvents, DividendRecord, HistoryBar,
    HistoryParams, Quote, Recommendation, SplitRecord, Symbol, TickerError, TickerInfo,
    TickerResult, UpstreamConfig,
};

use self::auth::{CrumbData, CrumbStore};
use self::models::{
    flatten_summary, parse_calendar, parse_quote_response, parse_recommendations,
    parse_summary_response, CALENDAR_MODULES, INFO_MODULES, RECOMMENDATION_MODULES,
};
use super::traits::{BatchReply, MarketDataGateway};

/// reqwest 에러를 도메인 에러로 분류합니다.
pub(crate) fn classify_reqwest(err: reqwest::Error) -> TickerError {
    if err.is_decode() {
        TickerError::UpstreamMalformed(err.to_string())
    } else {
        TickerError::UpstreamTransient(err.to_string())
    }
}

/// HTTP 상태를 도메인 에러로 분류합니다. 성공이면 `None`.
pub(crate) fn classify_status(status: StatusCode, symbol: &str) -> Option<TickerError> {
    if status.is_success() {
        return None;
    }
    let err = match status {
        StatusCode::NOT_FOUND => TickerError::UpstreamNotFound(format!("{}: HTTP 404", symbol)),
        StatusCode::TOO_MANY_REQUESTS => {
            TickerError::UpstreamTransient(format!("{}: Yahoo 요청 한도 초과 (HTTP 429)", symbol))
        }
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            TickerError::UpstreamTransient(format!("{}: Yahoo 인증 거부 (HTTP {})", symbol, status.as_u16()))
        }
        s if s.is_server_error() => {
            TickerError::UpstreamTransient(format!("{}: HTTP {}", symbol, s.as_u16()))
        }
        s => TickerError::UpstreamMalformed(format!("{}: 예상하지 못한 HTTP {}", symbol, s.as_u16())),
    };
    Some(err)
}

/// `yahoo_finance_api` 에러를 도메인 에러로 분류합니다.
pub(crate) fn classify_yahoo(err: yahoo::YahooError, symbol: &str) -> TickerError {
    match err {
        yahoo::YahooError::NoResult | yahoo::YahooError::NoQuotes => {
            TickerError::UpstreamNotFound(format!("No data found for symbol {}", symbol))
        }
        other => {
            let message = other.to_string();
            if message.contains("404") || message.to_lowercase().contains("not found") {
                TickerError::UpstreamNotFound(format!("{}: {}", symbol, message))
            } else {
                TickerError::UpstreamTransient(format!("{}: {}", symbol, message))
            }
        }
    }
}

/// Yahoo Finance 게이트웨이.
pub struct YahooGateway {
    client: Client,
    connector: yahoo::YahooConnector,
    config: UpstreamConfig,
    crumbs: CrumbStore,
}

impl YahooGateway {
    /// 새 게이트웨이를 생성합니다.
    pub fn new(config: &UpstreamConfig) -> TickerResult<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(config.timeout())
            .build()
            .map_err(|e| TickerError::Internal(format!("HTTP 클라이언트 생성 실패: {}", e)))?;

        let connector = yahoo::YahooConnector::new()
            .map_err(|e| TickerError::Internal(format!("Yahoo Finance 연결 실패: {}", e)))?;

        Ok(Self {
            client,
            connector,
            config: config.clone(),
            crumbs: CrumbStore::new(),
        })
    }

    async fn auth(&self) -> TickerResult<CrumbData> {
        self.crumbs
            .get_or_fetch(&self.client, &self.config.cookie_url, &self.config.base_url)
            .await
    }

    /// 인증된 GET 요청. 인증이 거부되면 crumb을 새로 받아 한 번 재시도합니다.
    async fn get_authorized(
        &self,
        path: &str,
        query: &[(&str, &str)],
        symbol: &str,
    ) -> TickerResult<String> {
        let url = format!("{}{}", self.config.base_url, path);
        let mut retried = false;

        loop {
            let auth = self.auth().await?;
            debug!(url = %url, symbol, "Yahoo request");

            let response = self
                .client
                .get(&url)
                .query(query)
                .query(&[("crumb", auth.crumb.as_str())])
                .header(header::COOKIE, &auth.cookie)
                .send()
                .await
                .map_err(classify_reqwest)?;

            let status = response.status();
            if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
                self.crumbs.invalidate().await;
                if !retried {
                    retried = true;
                    continue;
                }
            }

            if status == StatusCode::NOT_FOUND {
                // quoteSummary는 404 본문에 에러 설명을 담습니다
                let body = response.text().await.unwrap_or_default();
                return Err(match parse_summary_response(&body, symbol) {
                    Err(err @ TickerError::UpstreamNotFound(_)) => err,
                    _ => TickerError::UpstreamNotFound(format!("{}: HTTP 404", symbol)),
                });
            }
            if let Some(err) = classify_status(status, symbol) {
                return Err(err);
            }
            return response.text().await.map_err(classify_reqwest);
        }
    }

    async fn fetch_summary(
        &self,
        symbol: &Symbol,
        modules: &str,
    ) -> TickerResult<serde_json::Map<String, serde_json::Value>> {
        let path = format!("/v10/finance/quoteSummary/{}", symbol);
        let body = self
            .get_authorized(&path, &[("modules", modules)], symbol.as_str())
            .await?;
        parse_summary_response(&body, symbol.as_str())
    }

    /// chart API 호출. 데이터가 없으면 `None`.
    async fn fetch_chart(
        &self,
        symbol: &Symbol,
        interval: &str,
        range: &str,
    ) -> TickerResult<Option<yahoo::YResponse>> {
        debug!(symbol = %symbol, interval, range, "Yahoo chart request");
        match self.connector.get_quote_range(symbol.as_str(), interval, range).await {
            Ok(response) => Ok(Some(response)),
            Err(yahoo::YahooError::NoQuotes) => Ok(None),
            Err(e) => Err(classify_yahoo(e, symbol.as_str())),
        }
    }
}

#[async_trait]
impl MarketDataGateway for YahooGateway {
    fn name(&self) -> &str {
        "yahoo"
    }

    async fn fetch_info(&self, symbol: &Symbol) -> TickerResult<TickerInfo> {
        let modules = self.fetch_summary(symbol, INFO_MODULES).await?;
        Ok(flatten_summary(symbol.as_str(), modules))
    }

    async fn fetch_info_batch(&self, symbols: &[Symbol]) -> TickerResult<BatchReply<TickerInfo>> {
        // 인증 실패는 배치 전체 실패
        self.auth().await?;

        let concurrency = self.config.max_concurrency.max(1);
        let reply: HashMap<Symbol, TickerResult<TickerInfo>> = stream::iter(symbols.iter().cloned())
            .map(|symbol| async move {
                let result = self.fetch_info(&symbol).await;
                (symbol, result)
            })
            .buffer_unordered(concurrency)
            .collect()
            .await;
        Ok(reply)
    }

    async fn fetch_quote(&self, symbol: &Symbol) -> TickerResult<Quote> {
        let mut reply = self.fetch_quote_batch(std::slice::from_ref(symbol)).await?;
        reply.remove(symbol).unwrap_or_else(|| {
            Err(TickerError::UpstreamNotFound(format!(
                "No quote found for symbol {}",
                symbol
            )))
        })
    }

    async fn fetch_quote_batch(&self, symbols: &[Symbol]) -> TickerResult<BatchReply<Quote>> {
        let joined = symbols
            .iter()
            .map(Symbol::as_str)
            .collect::<Vec<_>>()
            .join(",");
        let body = self
            .get_authorized("/v7/finance/quote", &[("symbols", joined.as_str())], &joined)
            .await?;

        let fetched_at = Utc::now();
        let reply = parse_quote_response(&body)?
            .into_iter()
            .filter_map(|item| {
                let symbol = Symbol::new(&item.symbol)?;
                Some((symbol, Ok(item.into_quote(fetched_at))))
            })
            .collect();
        Ok(reply)
    }

    async fn fetch_history(
        &self,
        symbol: &Symbol,
        params: &HistoryParams,
    ) -> TickerResult<Vec<HistoryBar>> {
        let Some(response) = self
            .fetch_chart(symbol, params.interval(), params.period())
            .await?
        else {
            return Ok(Vec::new());
        };

        let quotes = match response.quotes() {
            Ok(quotes) => quotes,
            Err(yahoo::YahooError::NoQuotes) => {
                return Ok(Vec::new())
            }
            Err(e) => {
                return Err(TickerError::UpstreamMalformed(format!(
                    "Quote 파싱 오류 ({}): {}",
                    symbol, e
                )))
            }
        };

        let mut bars: Vec<HistoryBar> = quotes
            .iter()
            .filter_map(|q| {
                let date = unix_to_iso_z(q.timestamp as i64)?;
                Some(HistoryBar {
                    date,
                    open: finite(Some(q.open)),
                    high: finite(Some(q.high)),
                    low: finite(Some(q.low)),
                    close: finite(Some(q.close)),
                    adj_close: finite(Some(q.adjclose)),
                    volume: q.volume as u64,
                })
            })
            .collect();
        bars.sort_by(|a, b| a.date.cmp(&b.date));
        Ok(bars)
    }

    async fn fetch_dividends(&self, symbol: &Symbol) -> TickerResult<Vec<DividendRecord>> {
        let Some(response) = self.fetch_chart(symbol, "1mo", "max").await? else {
            return Ok(Vec::new());
        };

        let mut dividends = response
            .dividends()
            .map_err(|e| classify_yahoo(e, symbol.as_str()))?;
        dividends.sort_by_key(|d| d.date as i64);

        Ok(dividends
            .iter()
            .filter_map(|d| {
                Some(DividendRecord {
                    date: unix_to_date(d.date as i64)?,
                    dividends: d.amount as f64,
                })
            })
            .collect())
    }

    async fn fetch_splits(&self, symbol: &Symbol) -> TickerResult<Vec<SplitRecord>> {
        let Some(response) = self.fetch_chart(symbol, "1mo", "max").await? else {
            return Ok(Vec::new());
        };

        let mut splits = response
            .splits()
            .map_err(|e| classify_yahoo(e, symbol.as_str()))?;
        splits.sort_by_key(|s| s.date as i64);

        Ok(splits
            .iter()
            .filter_map(|s| {
                let denominator = s.denominator as f64;
                if denominator == 0.0 {
                    return None;
                }
                Some(SplitRecord {
                    date: unix_to_date(s.date as i64)?,
                    ratio: s.numerator as f64 / denominator,
                })
            })
            .collect())
    }

    async fn fetch_recommendations(&self, symbol: &Symbol) -> TickerResult<Vec<Recommendation>> {
        let modules = self.fetch_summary(symbol, RECOMMENDATION_MODULES).await?;
        parse_recommendations(&modules)
    }

    async fn fetch_calendar(&self, symbol: &Symbol) -> TickerResult<CalendarEvents> {
        let modules = self.fetch_summary(symbol, CALENDAR_MODULES).await?;
        Ok(parse_calendar(&modules))
    }
}
