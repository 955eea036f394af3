//! 심볼 정규화 속성 테스트.

use proptest::prelude::*;
use std::collections::HashSet;
use tickers_core::{FetchKey, SymbolList, TickerError};

fn token() -> impl Strategy<Value = String> {
    "[a-zA-Z]{1,5}"
}

proptest! {
    #[test]
    fn normalized_list_has_no_duplicates(tokens in prop::collection::vec(token(), 1..12)) {
        let raw = tokens.join(",");
        let list = SymbolList::parse(Some(&raw), None).unwrap();

        let strings = list.to_strings();
        let unique: HashSet<_> = strings.iter().collect();
        prop_assert_eq!(unique.len(), strings.len());
    }

    #[test]
    fn normalized_list_keeps_first_seen_order(tokens in prop::collection::vec(token(), 1..12)) {
        let raw = tokens.join(" , ");
        let list = SymbolList::parse(Some(&raw), None).unwrap();

        let mut expected: Vec<String> = Vec::new();
        for t in &tokens {
            let upper = t.to_uppercase();
            if !expected.contains(&upper) {
                expected.push(upper);
            }
        }
        prop_assert_eq!(list.to_strings(), expected);
    }

    #[test]
    fn whitespace_only_input_is_rejected(blanks in "[ ,\t]{0,10}") {
        let result = SymbolList::parse(Some(&blanks), Some(&blanks));
        prop_assert!(matches!(result, Err(TickerError::InvalidRequest(_))));
    }

    #[test]
    fn batch_key_ignores_order(mut tokens in prop::collection::vec(token(), 1..8)) {
        let forward = SymbolList::parse(Some(&tokens.join(",")), None).unwrap();
        tokens.reverse();
        let backward = SymbolList::parse(Some(&tokens.join(",")), None).unwrap();
        prop_assert_eq!(FetchKey::batch(&forward), FetchKey::batch(&backward));
    }
}

#[test]
fn literal_example() {
    let list = SymbolList::from_raw(&["AAPL,aapl", "MSFT"]).unwrap();
    assert_eq!(list.to_strings(), vec!["AAPL", "MSFT"]);
}
