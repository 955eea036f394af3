//! Yahoo Finance 응답 모델과 변환 함수.
//!
//! quote(v7) / quoteSummary(v10) 응답을 파싱해 도메인 모델로 변환합니다.
//! HTTP 없이 테스트할 수 있도록 모든 변환은 순수 함수입니다.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{Map, Value};

use tickers_core::{
    unix_to_date, CalendarEvents, Quote, QuoteFields, Recommendation, TickerError, TickerInfo,
    TickerResult,
};

/// info 조회에 사용하는 quoteSummary 모듈.
pub const INFO_MODULES: &str =
    "assetProfile,summaryDetail,defaultKeyStatistics,financialData,price,quoteType";

/// 추천 동향 모듈.
pub const RECOMMENDATION_MODULES: &str = "recommendationTrend";

/// 일정 모듈.
pub const CALENDAR_MODULES: &str = "calendarEvents";

// ==================== quote (v7) ====================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteResponse {
    pub quote_response: QuoteResponseBody,
}

#[derive(Debug, Deserialize)]
pub struct QuoteResponseBody {
    #[serde(default)]
    pub result: Vec<QuoteItem>,
    #[serde(default)]
    pub error: Option<ApiError>,
}

/// v7 quote 결과 한 항목.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteItem {
    pub symbol: String,
    pub regular_market_price: Option<f64>,
    pub regular_market_previous_close: Option<f64>,
    pub regular_market_open: Option<f64>,
    pub regular_market_day_high: Option<f64>,
    pub regular_market_day_low: Option<f64>,
    pub regular_market_volume: Option<f64>,
    pub exchange_timezone_name: Option<String>,
    pub regular_market_time: Option<i64>,
}

impl QuoteItem {
    /// 도메인 시세로 변환합니다.
    pub fn into_quote(self, fetched_at: DateTime<Utc>) -> Quote {
        let volume = self
            .regular_market_volume
            .filter(|v| v.is_finite() && *v >= 0.0)
            .map(|v| v as u64);
        Quote::from_fields(
            self.symbol,
            QuoteFields {
                current_price: self.regular_market_price,
                previous_close: self.regular_market_previous_close,
                open: self.regular_market_open,
                day_high: self.regular_market_day_high,
                day_low: self.regular_market_day_low,
                volume,
                exchange_timezone: self.exchange_timezone_name,
                market_time: self.regular_market_time,
            },
            fetched_at,
        )
    }
}

/// Yahoo API 에러 본문.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiError {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub description: String,
}

impl ApiError {
    /// 도메인 에러로 변환합니다.
    pub fn into_error(self, symbol: &str) -> TickerError {
        if self.code.eq_ignore_ascii_case("not found") {
            TickerError::UpstreamNotFound(format!("{}: {}", symbol, self.description))
        } else {
            TickerError::UpstreamMalformed(format!(
                "{}: {} {}",
                symbol, self.code, self.description
            ))
        }
    }
}

/// v7 quote 응답 본문을 파싱합니다.
pub fn parse_quote_response(body: &str) -> TickerResult<Vec<QuoteItem>> {
    let response: QuoteResponse = serde_json::from_str(body)?;
    if let Some(err) = response.quote_response.error {
        if response.quote_response.result.is_empty() {
            return Err(TickerError::UpstreamMalformed(format!(
                "quote error: {} {}",
                err.code, err.description
            )));
        }
    }
    Ok(response.quote_response.result)
}

// ==================== quoteSummary (v10) ====================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryResponse {
    pub quote_summary: SummaryBody,
}

#[derive(Debug, Deserialize)]
pub struct SummaryBody {
    #[serde(default)]
    pub result: Option<Vec<Map<String, Value>>>,
    #[serde(default)]
    pub error: Option<ApiError>,
}

/// quoteSummary 응답에서 첫 번째 결과(모듈 이름 → 모듈 객체)를 꺼냅니다.
pub fn parse_summary_response(body: &str, symbol: &str) -> TickerResult<Map<String, Value>> {
    let response: SummaryResponse = serde_json::from_str(body)?;
    if let Some(err) = response.quote_summary.error {
        return Err(err.into_error(symbol));
    }
    response
        .quote_summary
        .result
        .and_then(|r| r.into_iter().next())
        .ok_or_else(|| TickerError::UpstreamNotFound(format!("No summary data for {}", symbol)))
}

/// `{raw, fmt}` 래퍼를 raw 값으로 축약합니다. 빈 객체는 `None`.
fn collapse(value: Value) -> Option<Value> {
    match value {
        Value::Object(mut obj) => {
            if obj.is_empty() {
                None
            } else if let Some(raw) = obj.remove("raw") {
                Some(raw)
            } else {
                Some(Value::Object(obj))
            }
        }
        Value::Null => None,
        other => Some(other),
    }
}

/// quoteSummary 모듈들을 평탄화해 종목 정보를 만듭니다.
///
/// 같은 필드가 여러 모듈에 있으면 먼저 나온 모듈의 값을 유지합니다.
pub fn flatten_summary(symbol: &str, modules: Map<String, Value>) -> TickerInfo {
    let mut info = Map::new();
    info.insert("symbol".to_string(), Value::String(symbol.to_string()));

    for (_, module) in modules {
        let Value::Object(fields) = module else {
            continue;
        };
        for (field, value) in fields {
            if field == "maxAge" || info.contains_key(&field) {
                continue;
            }
            if let Some(v) = collapse(value) {
                info.insert(field, v);
            }
        }
    }
    TickerInfo(info)
}

/// recommendationTrend 모듈에서 추천 동향을 꺼냅니다. 모듈이 없으면 빈 벡터.
pub fn parse_recommendations(modules: &Map<String, Value>) -> TickerResult<Vec<Recommendation>> {
    match modules.get("recommendationTrend").and_then(|m| m.get("trend")) {
        Some(trend) => Ok(serde_json::from_value(trend.clone())?),
        None => Ok(Vec::new()),
    }
}

fn raw_date(value: &Value) -> Option<Value> {
    let secs = match value {
        Value::Object(obj) => obj.get("raw").and_then(Value::as_i64),
        other => other.as_i64(),
    }?;
    unix_to_date(secs).map(Value::String)
}

fn raw_number(value: &Value) -> Option<Value> {
    match value {
        Value::Object(obj) => obj.get("raw").filter(|v| v.is_number()).cloned(),
        Value::Number(_) => Some(value.clone()),
        _ => None,
    }
}

/// calendarEvents 모듈을 일정 맵으로 변환합니다. 모듈이 없으면 빈 맵.
pub fn parse_calendar(modules: &Map<String, Value>) -> CalendarEvents {
    let mut calendar = Map::new();
    let Some(events) = modules.get("calendarEvents") else {
        return CalendarEvents(calendar);
    };

    if let Some(earnings) = events.get("earnings") {
        if let Some(Value::Array(dates)) = earnings.get("earningsDate") {
            let dates: Vec<Value> = dates.iter().filter_map(raw_date).collect();
            if !dates.is_empty() {
                calendar.insert("Earnings Date".to_string(), Value::Array(dates));
            }
        }

        let numbers = [
            ("earningsHigh", "Earnings High"),
            ("earningsLow", "Earnings Low"),
            ("earningsAverage", "Earnings Average"),
            ("revenueHigh", "Revenue High"),
            ("revenueLow", "Revenue Low"),
            ("revenueAverage", "Revenue Average"),
        ];
        for (field, name) in numbers {
            if let Some(v) = earnings.get(field).and_then(raw_number) {
                calendar.insert(name.to_string(), v);
            }
        }
    }

    for (field, name) in [
        ("exDividendDate", "Ex-Dividend Date"),
        ("dividendDate", "Dividend Date"),
    ] {
        if let Some(v) = events.get(field).and_then(raw_date) {
            calendar.insert(name.to_string(), v);
        }
    }

    CalendarEvents(calendar)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_parse_quote_response() {
        let body = json!({
            "quoteResponse": {
                "result": [{
                    "symbol": "AAPL",
                    "regularMarketPrice": 189.5,
                    "regularMarketPreviousClose": 187.0,
                    "regularMarketOpen": 188.0,
                    "regularMarketDayHigh": 190.0,
                    "regularMarketDayLow": 186.5,
                    "regularMarketVolume": 51234567,
                    "exchangeTimezoneName": "America/New_York",
                    "regularMarketTime": 1714564800
                }],
                "error": null
            }
        })
        .to_string();

        let items = parse_quote_response(&body).unwrap();
        assert_eq!(items.len(), 1);

        let fetched_at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let quote = items[0].clone().into_quote(fetched_at);
        assert_eq!(quote.symbol, "AAPL");
        assert_eq!(quote.current_price, Some(189.5));
        assert!((quote.change - 2.5).abs() < 1e-9);
        assert_eq!(quote.volume, Some(51_234_567));
        assert_eq!(quote.timestamp.as_deref(), Some("2024-05-01T12:00:00Z"));
    }

    #[test]
    fn test_parse_quote_response_malformed() {
        assert!(matches!(
            parse_quote_response("<html>"),
            Err(TickerError::UpstreamMalformed(_))
        ));
    }

    #[test]
    fn test_flatten_summary() {
        let modules = json!({
            "summaryDetail": {
                "maxAge": 1,
                "marketCap": {"raw": 2900000000000u64, "fmt": "2.9T"},
                "dividendYield": {},
                "currency": "USD"
            },
            "price": {
                "currency": "EUR",
                "shortName": "Apple Inc."
            },
            "assetProfile": {
                "sector": "Technology",
                "companyOfficers": [{"name": "Tim Cook"}]
            }
        });
        let Value::Object(modules) = modules else { unreachable!() };

        let info = flatten_summary("AAPL", modules);
        assert_eq!(info.get("symbol"), Some(&json!("AAPL")));
        assert_eq!(info.get("marketCap"), Some(&json!(2900000000000u64)));
        assert!(info.get("dividendYield").is_none());
        assert!(info.get("maxAge").is_none());
        assert_eq!(info.get("shortName"), Some(&json!("Apple Inc.")));
        assert_eq!(info.get("sector"), Some(&json!("Technology")));
        assert!(info.get("companyOfficers").unwrap().is_array());
    }

    #[test]
    fn test_summary_not_found() {
        let body = json!({
            "quoteSummary": {
                "result": null,
                "error": {"code": "Not Found", "description": "Quote not found for symbol: ZZZFAKE"}
            }
        })
        .to_string();
        assert!(matches!(
            parse_summary_response(&body, "ZZZFAKE"),
            Err(TickerError::UpstreamNotFound(_))
        ));
    }

    #[test]
    fn test_parse_recommendations() {
        let modules = json!({
            "recommendationTrend": {
                "trend": [
                    {"period": "0m", "strongBuy": 11, "buy": 21, "hold": 6, "sell": 0, "strongSell": 0},
                    {"period": "-1m", "strongBuy": 10, "buy": 20, "hold": 7, "sell": 1, "strongSell": 0}
                ],
                "maxAge": 86400
            }
        });
        let Value::Object(modules) = modules else { unreachable!() };

        let recs = parse_recommendations(&modules).unwrap();
        assert_eq!(recs.len(), 2);
        assert_eq!(recs[0].strong_buy, 11);
        assert_eq!(recs[1].period, "-1m");

        assert!(parse_recommendations(&Map::new()).unwrap().is_empty());
    }

    #[test]
    fn test_parse_calendar() {
        let modules = json!({
            "calendarEvents": {
                "earnings": {
                    "earningsDate": [{"raw": 1721908800, "fmt": "2024-07-25"}],
                    "earningsAverage": {"raw": 1.34, "fmt": "1.34"},
                    "revenueHigh": {"raw": 86000000000u64, "fmt": "86B"},
                    "earningsLow": {}
                },
                "exDividendDate": {"raw": 1715299200, "fmt": "2024-05-10"},
                "dividendDate": {"raw": 1715817600, "fmt": "2024-05-16"}
            }
        });
        let Value::Object(modules) = modules else { unreachable!() };

        let calendar = parse_calendar(&modules);
        assert_eq!(calendar.get("Earnings Date"), Some(&json!(["2024-07-25"])));
        assert_eq!(calendar.get("Earnings Average"), Some(&json!(1.34)));
        assert_eq!(calendar.get("Revenue High"), Some(&json!(86000000000u64)));
        assert!(calendar.get("Earnings Low").is_none());
        assert_eq!(calendar.get("Ex-Dividend Date"), Some(&json!("2024-05-10")));
        assert_eq!(calendar.get("Dividend Date"), Some(&json!("2024-05-16")));

        assert!(parse_calendar(&Map::new()).is_empty());
    }
}
