use tradelink_brokers_common::StaticMarketRegistry;
use tradelink_core::Market;

/// CoinMate markets as `(native id, symbol, base, quote)`.
const MARKETS: &[(&str, &str, &str, &str)] = &[
    ("BTC_EUR", "BTC/EUR", "BTC", "EUR"),
    ("BTC_CZK", "BTC/CZK", "BTC", "CZK"),
];

pub fn coinmate_markets() -> Vec<Market> {
    MARKETS
        .iter()
        .map(|(id, symbol, base, quote)| Market::new(id, symbol, base, quote))
        .collect()
}

pub fn default_registry() -> StaticMarketRegistry {
    StaticMarketRegistry::new(coinmate_markets())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tradelink_core::MarketRegistry;

    #[test]
    fn test_default_registry_currencies() {
        let registry = default_registry();
        assert_eq!(registry.currencies(), vec!["BTC", "CZK", "EUR"]);
        assert_eq!(registry.resolve("BTC/EUR").unwrap(), "BTC_EUR");
    }
}
