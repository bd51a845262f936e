use std::collections::{BTreeSet, HashMap};
use tradelink_core::*;

/// A market registry backed by a fixed table, built once and never mutated.
#[derive(Debug, Clone)]
pub struct StaticMarketRegistry {
    by_symbol: HashMap<String, Market>,
    by_id: HashMap<String, Market>,
    /// Insertion order of the table.
    ordered: Vec<Market>,
    currencies: Vec<String>,
}

impl StaticMarketRegistry {
    pub fn new(markets: impl IntoIterator<Item = Market>) -> Self {
        let ordered: Vec<Market> = markets.into_iter().collect();
        let mut by_symbol = HashMap::with_capacity(ordered.len());
        let mut by_id = HashMap::with_capacity(ordered.len());
        let mut currencies = BTreeSet::new();

        for market in &ordered {
            by_symbol.insert(market.symbol.clone(), market.clone());
            by_id.insert(market.id.clone(), market.clone());
            currencies.insert(market.base.clone());
            currencies.insert(market.quote.clone());
        }

        Self {
            by_symbol,
            by_id,
            ordered,
            currencies: currencies.into_iter().collect(),
        }
    }
}

impl MarketRegistry for StaticMarketRegistry {
    fn resolve(&self, symbol: &str) -> AdapterResult<String> {
        self.market(symbol).map(|m| m.id)
    }

    fn resolve_reverse(&self, native_id: &str) -> AdapterResult<Market> {
        self.by_id
            .get(native_id)
            .cloned()
            .ok_or_else(|| AdapterError::MarketNotFound(native_id.to_string()))
    }

    fn market(&self, symbol: &str) -> AdapterResult<Market> {
        self.by_symbol
            .get(symbol)
            .cloned()
            .ok_or_else(|| AdapterError::MarketNotFound(symbol.to_string()))
    }

    fn markets(&self) -> Vec<Market> {
        self.ordered.clone()
    }

    fn currencies(&self) -> Vec<String> {
        self.currencies.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> StaticMarketRegistry {
        StaticMarketRegistry::new(vec![
            Market::new("BTC_EUR", "BTC/EUR", "BTC", "EUR"),
            Market::new("BTC_CZK", "BTC/CZK", "BTC", "CZK"),
        ])
    }

    #[test]
    fn test_resolve_round_trip() {
        let registry = registry();
        let id = registry.resolve("BTC/CZK").unwrap();
        assert_eq!(id, "BTC_CZK");
        assert_eq!(registry.resolve_reverse(&id).unwrap().symbol, "BTC/CZK");
    }

    #[test]
    fn test_unknown_market() {
        let registry = registry();
        assert!(matches!(
            registry.resolve("ETH/EUR"),
            Err(AdapterError::MarketNotFound(s)) if s == "ETH/EUR"
        ));
        assert!(matches!(
            registry.resolve_reverse("LTC_BTC"),
            Err(AdapterError::MarketNotFound(_))
        ));
    }

    #[test]
    fn test_currencies_are_sorted_and_unique() {
        assert_eq!(registry().currencies(), vec!["BTC", "CZK", "EUR"]);
    }

    #[test]
    fn test_markets_keep_table_order() {
        let symbols: Vec<String> = registry().markets().into_iter().map(|m| m.symbol).collect();
        assert_eq!(symbols, vec!["BTC/EUR", "BTC/CZK"]);
    }
}
