//! 데이터 종류와 조회 모드.

use serde::{Deserialize, Serialize};
use std::fmt;

/// 조회할 시장 데이터 종류.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataKind {
    /// 종목 정보
    Info,
    /// 현재 시세
    Quote,
    /// OHLCV 히스토리
    History,
    /// 배당 내역
    Dividends,
    /// 주식 분할 내역
    Splits,
    /// 애널리스트 추천 동향
    Recommendations,
    /// 실적/배당 일정
    Calendar,
}

impl DataKind {
    /// 모든 데이터 종류.
    pub const ALL: [DataKind; 7] = [
        DataKind::Info,
        DataKind::Quote,
        DataKind::History,
        DataKind::Dividends,
        DataKind::Splits,
        DataKind::Recommendations,
        DataKind::Calendar,
    ];

    /// 업스트림 배치 조회를 지원하는지 여부.
    pub fn supports_batch(&self) -> bool {
        matches!(self, DataKind::Info | DataKind::Quote)
    }

    /// 심볼 수에 따른 업스트림 조회 모드.
    ///
    /// 배치를 지원하는 종류에서 심볼이 둘 이상일 때만 `Batch`입니다.
    pub fn fetch_mode(&self, symbol_count: usize) -> FetchMode {
        if self.supports_batch() && symbol_count > 1 {
            FetchMode::Batch
        } else {
            FetchMode::Single
        }
    }

    /// 소문자 이름으로 찾습니다.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == name)
    }

    /// 소문자 이름.
    pub fn as_str(&self) -> &'static str {
        match self {
            DataKind::Info => "info",
            DataKind::Quote => "quote",
            DataKind::History => "history",
            DataKind::Dividends => "dividends",
            DataKind::Splits => "splits",
            DataKind::Recommendations => "recommendations",
            DataKind::Calendar => "calendar",
        }
    }
}

impl fmt::Display for DataKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 업스트림 조회 모드.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchMode {
    /// 심볼 하나씩 조회
    Single,
    /// 여러 심볼을 한 번에 조회
    Batch,
}

impl FetchMode {
    /// 소문자 이름.
    pub fn as_str(&self) -> &'static str {
        match self {
            FetchMode::Single => "single",
            FetchMode::Batch => "batch",
        }
    }
}

impl fmt::Display for FetchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
