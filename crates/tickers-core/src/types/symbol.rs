//! 티커 심볼 및 심볼 목록 정규화.
//!
//! 이 모듈은 클라이언트가 보낸 심볼 문자열을 다루는 타입을 정의합니다:
//! - `Symbol` - 대문자로 정규화된 티커
//! - `SymbolList` - 순서가 보존되고 중복이 없는 비어있지 않은 심볼 목록

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use crate::error::{TickerError, TickerResult};

/// 대문자로 정규화된 티커 심볼.
///
/// 공백을 제거하고 대문자로 변환한 비어있지 않은 문자열만 담습니다.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Symbol(String);

impl Symbol {
    /// 원시 토큰에서 심볼을 생성합니다. 공백뿐이면 `None`.
    pub fn new(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_uppercase()))
        }
    }

    /// 심볼 문자열.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Symbol {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// 순서가 보존되고 중복이 없는 심볼 목록.
///
/// 항상 한 개 이상의 심볼을 가집니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SymbolList(Vec<Symbol>);

impl SymbolList {
    /// `symbols`(복수) 파라미터와 `symbol`(단수) 파라미터를 순서대로 정규화합니다.
    ///
    /// 각 값은 쉼표로 구분되며, 빈 토큰은 버리고 처음 나온 순서만 유지합니다.
    ///
    /// # 예제
    ///
    /// ```
    /// use tickers_core::types::SymbolList;
    ///
    /// let list = SymbolList::parse(Some("AAPL,aapl"), Some("MSFT")).unwrap();
    /// assert_eq!(list.to_strings(), vec!["AAPL", "MSFT"]);
    /// ```
    pub fn parse(symbols: Option<&str>, symbol: Option<&str>) -> TickerResult<Self> {
        let raw: Vec<&str> = [symbols, symbol].into_iter().flatten().collect();
        Self::from_raw(&raw)
    }

    /// 임의 개수의 원시 파라미터 값을 주어진 순서대로 정규화합니다.
    pub fn from_raw<S: AsRef<str>>(params: &[S]) -> TickerResult<Self> {
        let mut list: Vec<Symbol> = Vec::new();
        let mut seen: HashSet<Symbol> = HashSet::new();
        for token in params.iter().flat_map(|p| p.as_ref().split(',')) {
            if let Some(sym) = Symbol::new(token) {
                if seen.insert(sym.clone()) {
                    list.push(sym);
                }
            }
        }

        if list.is_empty() {
            return Err(TickerError::InvalidRequest(
                "Please provide at least one symbol via 'symbol' or 'symbols'".to_string(),
            ));
        }
        Ok(Self(list))
    }

    /// 심볼 수.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// 정규화된 목록은 비어있을 수 없으므로 항상 `false`.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// 심볼 슬라이스.
    pub fn as_slice(&self) -> &[Symbol] {
        &self.0
    }

    /// 심볼 반복자.
    pub fn iter(&self) -> std::slice::Iter<'_, Symbol> {
        self.0.iter()
    }

    /// 심볼 문자열 목록.
    pub fn to_strings(&self) -> Vec<String> {
        self.0.iter().map(|s| s.to_string()).collect()
    }
}

impl<'a> IntoIterator for &'a SymbolList {
    type Item = &'a Symbol;
    type IntoIter = std::slice::Iter<'a, Symbol>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
