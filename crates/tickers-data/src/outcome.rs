//! 심볼별 조회 결과.
//!
//! 한 심볼의 실패가 나머지 심볼의 결과를 막지 않도록 결과와 실패를
//! 명시적인 변형으로 구분합니다. 빈 배열/객체로의 변환은 응답 경계에서만
//! 이루어집니다.

use serde::Serialize;

use tickers_core::{Symbol, TickerError};

/// 심볼 하나의 조회 실패.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FetchFailure {
    /// 에러 코드 (`UPSTREAM_NOT_FOUND` 등)
    pub kind: &'static str,
    /// 사람이 읽을 수 있는 메시지
    pub message: String,
}

impl From<&TickerError> for FetchFailure {
    fn from(err: &TickerError) -> Self {
        Self {
            kind: err.code(),
            message: err.to_string(),
        }
    }
}

impl From<TickerError> for FetchFailure {
    fn from(err: TickerError) -> Self {
        Self::from(&err)
    }
}

/// 심볼 하나의 결과 또는 실패.
#[derive(Debug, Clone, PartialEq)]
pub enum SymbolOutcome<T> {
    Ok(T),
    Failed(FetchFailure),
}

impl<T> SymbolOutcome<T> {
    /// 성공 여부.
    pub fn is_ok(&self) -> bool {
        matches!(self, SymbolOutcome::Ok(_))
    }

    /// 실패 여부.
    pub fn is_failed(&self) -> bool {
        !self.is_ok()
    }

    /// 성공 값 참조.
    pub fn ok(&self) -> Option<&T> {
        match self {
            SymbolOutcome::Ok(v) => Some(v),
            SymbolOutcome::Failed(_) => None,
        }
    }

    /// 실패 정보 참조.
    pub fn failure(&self) -> Option<&FetchFailure> {
        match self {
            SymbolOutcome::Ok(_) => None,
            SymbolOutcome::Failed(f) => Some(f),
        }
    }
}

impl<T> From<Result<T, TickerError>> for SymbolOutcome<T> {
    fn from(result: Result<T, TickerError>) -> Self {
        match result {
            Ok(v) => SymbolOutcome::Ok(v),
            Err(e) => SymbolOutcome::Failed(FetchFailure::from(e)),
        }
    }
}

/// 요청 순서를 보존하는 심볼 → 결과 매핑.
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolResults<T> {
    entries: Vec<(Symbol, SymbolOutcome<T>)>,
}

impl<T> Default for SymbolResults<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<T> SymbolResults<T> {
    /// 빈 매핑.
    pub fn new() -> Self {
        Self::default()
    }

    /// 결과 하나를 추가합니다. 이미 있는 심볼이면 값을 교체합니다.
    pub fn push(&mut self, symbol: Symbol, outcome: SymbolOutcome<T>) {
        match self.entries.iter_mut().find(|(s, _)| *s == symbol) {
            Some((_, existing)) => *existing = outcome,
            None => self.entries.push((symbol, outcome)),
        }
    }

    /// 심볼 결과 조회.
    pub fn get(&self, symbol: &str) -> Option<&SymbolOutcome<T>> {
        self.entries
            .iter()
            .find(|(s, _)| s.as_str() == symbol)
            .map(|(_, o)| o)
    }

    /// 항목 수.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// 비어있는지 확인합니다.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 실패한 심볼이 하나라도 있는지 확인합니다.
    pub fn has_failures(&self) -> bool {
        self.entries.iter().any(|(_, o)| o.is_failed())
    }

    /// 요청 순서대로 순회합니다.
    pub fn iter(&self) -> impl Iterator<Item = (&Symbol, &SymbolOutcome<T>)> {
        self.entries.iter().map(|(s, o)| (s, o))
    }
}

impl<T> FromIterator<(Symbol, SymbolOutcome<T>)> for SymbolResults<T> {
    fn from_iter<I: IntoIterator<Item = (Symbol, SymbolOutcome<T>)>>(iter: I) -> Self {
        let mut results = Self::new();
        for (symbol, outcome) in iter {
            results.push(symbol, outcome);
        }
        results
    }
}

impl<T> IntoIterator for SymbolResults<T> {
    type Item = (Symbol, SymbolOutcome<T>);
    type IntoIter = std::vec::IntoIter<(Symbol, SymbolOutcome<T>)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}
