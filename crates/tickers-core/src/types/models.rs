//! 데이터 종류별 응답 모델.
//!
//! 직렬화 필드명은 기존 클라이언트가 사용하는 형식(`currentPrice`, `Adj Close` 등)을
//! 그대로 따릅니다.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// 종목 정보. 업스트림 모듈을 평탄화한 필드 → 값 맵.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa-support", derive(utoipa::ToSchema))]
#[cfg_attr(feature = "utoipa-support", schema(value_type = Object))]
#[serde(transparent)]
pub struct TickerInfo(pub Map<String, Value>);

impl TickerInfo {
    /// 필드 값을 조회합니다.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// 필드 수.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// 비어있는지 확인합니다.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// 현재 시세.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa-support", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub symbol: String,
    pub current_price: Option<f64>,
    pub previous_close: Option<f64>,
    pub open: Option<f64>,
    pub day_high: Option<f64>,
    pub day_low: Option<f64>,
    /// 전일 종가 대비 변동 (데이터가 없으면 0)
    pub change: f64,
    /// 전일 종가 대비 변동률 % (데이터가 없으면 0)
    pub percent_change: f64,
    pub volume: Option<u64>,
    pub exchange_timezone: Option<String>,
    /// 정규장 시세 시각 (ISO-8601, `Z` 접미사)
    pub timestamp: Option<String>,
    /// 게이트웨이가 조회한 시각
    pub fetch_time: String,
}

/// 시세 계산에 필요한 원시 값.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuoteFields {
    pub current_price: Option<f64>,
    pub previous_close: Option<f64>,
    pub open: Option<f64>,
    pub day_high: Option<f64>,
    pub day_low: Option<f64>,
    pub volume: Option<u64>,
    pub exchange_timezone: Option<String>,
    /// 정규장 시세 시각 (unix 초)
    pub market_time: Option<i64>,
}

impl Quote {
    /// 원시 값에서 시세를 만듭니다.
    ///
    /// 유한하지 않은 숫자는 `None`이 되고, 변동/변동률은 현재가와 전일 종가가
    /// 모두 있고 전일 종가가 0이 아닐 때만 계산합니다.
    pub fn from_fields(symbol: impl Into<String>, fields: QuoteFields, fetched_at: DateTime<Utc>) -> Self {
        let current_price = finite(fields.current_price);
        let previous_close = finite(fields.previous_close);
        let (change, percent_change) = price_change(current_price, previous_close);

        Self {
            symbol: symbol.into(),
            current_price,
            previous_close,
            open: finite(fields.open),
            day_high: finite(fields.day_high),
            day_low: finite(fields.day_low),
            change,
            percent_change,
            volume: fields.volume,
            exchange_timezone: fields.exchange_timezone,
            timestamp: fields.market_time.and_then(unix_to_iso_z),
            fetch_time: fetched_at.to_rfc3339(),
        }
    }
}

/// 현재가와 전일 종가로 (변동, 변동률 %)을 계산합니다.
pub fn price_change(current: Option<f64>, previous: Option<f64>) -> (f64, f64) {
    match (current, previous) {
        (Some(cur), Some(prev)) if prev != 0.0 => {
            let change = cur - prev;
            let pct = change / prev * 100.0;
            if change.is_finite() && pct.is_finite() {
                (change, pct)
            } else {
                (0.0, 0.0)
            }
        }
        _ => (0.0, 0.0),
    }
}

/// 유한한 값만 통과시킵니다.
pub fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

/// unix 초를 `2024-01-02T14:30:00Z` 형식으로 변환합니다.
pub fn unix_to_iso_z(secs: i64) -> Option<String> {
    DateTime::<Utc>::from_timestamp(secs, 0).map(|dt| dt.to_rfc3339_opts(SecondsFormat::Secs, true))
}

/// unix 초를 `YYYY-MM-DD` 형식으로 변환합니다.
pub fn unix_to_date(secs: i64) -> Option<String> {
    DateTime::<Utc>::from_timestamp(secs, 0).map(|dt| dt.format("%Y-%m-%d").to_string())
}

/// OHLCV 히스토리 한 행.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa-support", derive(utoipa::ToSchema))]
pub struct HistoryBar {
    #[serde(rename = "Date")]
    pub date: String,
    #[serde(rename = "Open")]
    pub open: Option<f64>,
    #[serde(rename = "High")]
    pub high: Option<f64>,
    #[serde(rename = "Low")]
    pub low: Option<f64>,
    #[serde(rename = "Close")]
    pub close: Option<f64>,
    #[serde(rename = "Adj Close")]
    pub adj_close: Option<f64>,
    #[serde(rename = "Volume")]
    pub volume: u64,
}

/// 배당 내역 한 행.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa-support", derive(utoipa::ToSchema))]
pub struct DividendRecord {
    #[serde(rename = "Date")]
    pub date: String,
    #[serde(rename = "Dividends")]
    pub dividends: f64,
}

/// 주식 분할 내역 한 행. 비율은 분자 / 분모.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa-support", derive(utoipa::ToSchema))]
pub struct SplitRecord {
    #[serde(rename = "Date")]
    pub date: String,
    #[serde(rename = "Stock Splits")]
    pub ratio: f64,
}

/// 기간별 애널리스트 추천 집계.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa-support", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    /// 기준 기간 (`0m`, `-1m`, ...)
    pub period: String,
    pub strong_buy: i64,
    pub buy: i64,
    pub hold: i64,
    pub sell: i64,
    pub strong_sell: i64,
}

/// 실적/배당 일정. 필드 → 값 맵 (날짜는 `YYYY-MM-DD`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa-support", derive(utoipa::ToSchema))]
#[cfg_attr(feature = "utoipa-support", schema(value_type = Object))]
#[serde(transparent)]
pub struct CalendarEvents(pub Map<String, Value>);

impl CalendarEvents {
    /// 필드 값을 조회합니다.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// 비어있는지 확인합니다.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
