//! 캐시 키로 사용하는 정규화된 조회 키.

use std::fmt;

use super::symbol::{Symbol, SymbolList};

/// 정규화된 조회 키.
///
/// - 단일 조회: 심볼 자체 (`AAPL`), 파라미터가 있으면 `AAPL|period=1mo|interval=1d`
/// - 배치 조회: 정렬 후 공백으로 연결한 심볼 (`AAPL MSFT`)
///
/// 배치 키는 정렬되므로 같은 심볼 집합의 순열은 같은 키가 됩니다.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FetchKey(String);

impl FetchKey {
    /// 단일 심볼 키.
    pub fn single(symbol: &Symbol) -> Self {
        Self(symbol.to_string())
    }

    /// 파라미터가 있는 단일 심볼 키. 파라미터는 주어진 순서대로 붙습니다.
    pub fn single_with_params(symbol: &Symbol, params: &[(&str, &str)]) -> Self {
        let mut key = symbol.to_string();
        for (name, value) in params {
            key.push('|');
            key.push_str(name);
            key.push('=');
            key.push_str(value);
        }
        Self(key)
    }

    /// 배치 키.
    pub fn batch(symbols: &SymbolList) -> Self {
        let mut sorted: Vec<&str> = symbols.iter().map(Symbol::as_str).collect();
        sorted.sort_unstable();
        sorted.dedup();
        Self(sorted.join(" "))
    }

    /// 키 문자열.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FetchKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(raw: &str) -> SymbolList {
        SymbolList::parse(Some(raw), None).unwrap()
    }

    #[test]
    fn test_single_key() {
        let sym = Symbol::new("aapl").unwrap();
        assert_eq!(FetchKey::single(&sym).as_str(), "AAPL");
        assert_eq!(
            FetchKey::single_with_params(&sym, &[("period", "1mo"), ("interval", "1d")]).as_str(),
            "AAPL|period=1mo|interval=1d"
        );
    }

    #[test]
    fn test_batch_key_symmetry() {
        assert_eq!(FetchKey::batch(&list("AAPL,MSFT")), FetchKey::batch(&list("MSFT,AAPL")));
        assert_eq!(FetchKey::batch(&list("msft,aapl,goog")).as_str(), "AAPL GOOG MSFT");
    }

    #[test]
    fn test_history_params_distinguish_keys() {
        let sym = Symbol::new("AAPL").unwrap();
        let a = FetchKey::single_with_params(&sym, &[("period", "1mo"), ("interval", "1d")]);
        let b = FetchKey::single_with_params(&sym, &[("period", "1y"), ("interval", "1d")]);
        assert_ne!(a, b);
        assert_ne!(a, FetchKey::single(&sym));
    }
}
