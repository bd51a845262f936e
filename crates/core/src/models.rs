use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ---------------------------------------------------------------------------
// Markets
// ---------------------------------------------------------------------------

/// A tradeable currency pair as known to one exchange.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Market {
    /// Exchange-native identifier (e.g. "BTC_EUR").
    pub id: String,
    /// Canonical symbol (e.g. "BTC/EUR").
    pub symbol: String,
    pub base: String,
    pub quote: String,
}

impl Market {
    pub fn new(id: &str, symbol: &str, base: &str, quote: &str) -> Self {
        Self {
            id: id.to_string(),
            symbol: symbol.to_string(),
            base: base.to_string(),
            quote: quote.to_string(),
        }
    }
}

/// Convert a millisecond timestamp into a UTC datetime, if representable.
pub fn datetime_from_millis(timestamp: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp_millis(timestamp)
}

// ---------------------------------------------------------------------------
// Market Data
// ---------------------------------------------------------------------------

/// One order book level: `[price, amount]`.
pub type BookLevel = [Decimal; 2];

/// Snapshot of an order book. Levels keep the exchange's ordering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderBook {
    pub symbol: String,
    /// Milliseconds since the epoch.
    pub timestamp: i64,
    pub datetime: Option<DateTime<Utc>>,
    pub bids: Vec<BookLevel>,
    pub asks: Vec<BookLevel>,
}

impl OrderBook {
    pub fn best_bid(&self) -> Option<&BookLevel> {
        self.bids.first()
    }

    pub fn best_ask(&self) -> Option<&BookLevel> {
        self.asks.first()
    }
}

/// Fixed-shape ticker. Fields the exchange does not provide are `None`
/// and still serialized, so every key is always present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticker {
    pub symbol: String,
    pub timestamp: i64,
    pub datetime: Option<DateTime<Utc>>,
    pub high: Option<Decimal>,
    pub low: Option<Decimal>,
    pub bid: Option<Decimal>,
    pub ask: Option<Decimal>,
    pub vwap: Option<Decimal>,
    pub open: Option<Decimal>,
    pub close: Option<Decimal>,
    pub first: Option<Decimal>,
    pub last: Option<Decimal>,
    pub change: Option<Decimal>,
    pub percentage: Option<Decimal>,
    pub average: Option<Decimal>,
    pub base_volume: Option<Decimal>,
    pub quote_volume: Option<Decimal>,
    /// Raw exchange payload.
    pub info: serde_json::Value,
}

/// A public trade print.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub id: String,
    pub info: serde_json::Value,
    /// Milliseconds since the epoch.
    pub timestamp: i64,
    pub datetime: Option<DateTime<Utc>>,
    pub symbol: String,
    /// Not reported by every exchange; `None` means unknown, never a guess.
    #[serde(rename = "type")]
    pub order_type: Option<OrderType>,
    pub side: Option<Side>,
    pub price: Decimal,
    pub amount: Decimal,
}

// ---------------------------------------------------------------------------
// Account
// ---------------------------------------------------------------------------

/// Funds held in a single currency.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub free: Decimal,
    pub used: Decimal,
    pub total: Decimal,
}

/// Balances for every currency the adapter knows about.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Balances {
    /// Raw exchange payload, kept verbatim.
    pub info: serde_json::Value,
    pub accounts: BTreeMap<String, Account>,
}

impl Balances {
    pub fn get(&self, currency: &str) -> Option<&Account> {
        self.accounts.get(currency)
    }

    pub fn free(&self) -> BTreeMap<String, Decimal> {
        self.project(|a| a.free)
    }

    pub fn used(&self) -> BTreeMap<String, Decimal> {
        self.project(|a| a.used)
    }

    pub fn total(&self) -> BTreeMap<String, Decimal> {
        self.project(|a| a.total)
    }

    fn project(&self, field: impl Fn(&Account) -> Decimal) -> BTreeMap<String, Decimal> {
        self.accounts
            .iter()
            .map(|(currency, account)| (currency.clone(), field(account)))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Orders
// ---------------------------------------------------------------------------

/// Order side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn opposite(&self) -> Self {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

impl std::str::FromStr for Side {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "buy" => Ok(Side::Buy),
            "sell" => Ok(Side::Sell),
            other => Err(format!("unknown side: {}", other)),
        }
    }
}

/// The order types this layer supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderType {
    Market,
    Limit,
}

impl std::str::FromStr for OrderType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "market" => Ok(OrderType::Market),
            "limit" => Ok(OrderType::Limit),
            other => Err(format!("unsupported order type: {}", other)),
        }
    }
}

/// Unified order parameters handed to an exchange adapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub symbol: String,
    pub order_type: OrderType,
    pub side: Side,
    /// Base quantity, except for market buys where it is the quote amount to spend.
    pub amount: Decimal,
    /// Required for limit orders.
    pub price: Option<Decimal>,
}

impl OrderRequest {
    /// Create a new market order.
    pub fn market(symbol: &str, side: Side, amount: Decimal) -> Self {
        Self {
            symbol: symbol.to_string(),
            order_type: OrderType::Market,
            side,
            amount,
            price: None,
        }
    }

    /// Create a new limit order.
    pub fn limit(symbol: &str, side: Side, amount: Decimal, price: Decimal) -> Self {
        Self {
            symbol: symbol.to_string(),
            order_type: OrderType::Limit,
            side,
            amount,
            price: Some(price),
        }
    }
}

/// Acknowledgement of a placed order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderAck {
    /// Exchange-assigned id, always a string.
    pub id: String,
    pub info: serde_json::Value,
}

/// Acknowledgement of a cancel request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CancelAck {
    pub id: String,
    /// Whether the exchange reported the order as cancelled, when it says so.
    pub cancelled: Option<bool>,
    pub info: serde_json::Value,
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// Which side of an exchange API a call belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiScope {
    Public,
    Private,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HttpMethod {
    #[serde(rename = "GET")]
    Get,
    #[serde(rename = "POST")]
    Post,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
        }
    }
}

/// Request parameters, kept sorted so encodings are deterministic.
pub type Params = BTreeMap<String, String>;

/// A fully prepared request, ready for the transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignedRequest {
    pub url: String,
    pub method: HttpMethod,
    /// Only set for authenticated requests.
    pub body: Option<String>,
    pub headers: BTreeMap<String, String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_ticker_serializes_unknown_fields_as_null() {
        let ticker = Ticker {
            symbol: "BTC/EUR".to_string(),
            timestamp: 1_600_000_000_000,
            datetime: datetime_from_millis(1_600_000_000_000),
            high: Some(dec!(10000)),
            low: None,
            bid: None,
            ask: None,
            vwap: None,
            open: None,
            close: None,
            first: None,
            last: None,
            change: None,
            percentage: None,
            average: None,
            base_volume: Some(dec!(12.5)),
            quote_volume: None,
            info: serde_json::Value::Null,
        };

        let json = serde_json::to_value(&ticker).unwrap();
        let obj = json.as_object().unwrap();
        assert!(obj.get("vwap").unwrap().is_null());
        assert!(obj.get("quoteVolume").unwrap().is_null());
        assert!(obj.contains_key("baseVolume"));
    }

    #[test]
    fn test_balance_projections() {
        let mut accounts = BTreeMap::new();
        accounts.insert(
            "BTC".to_string(),
            Account {
                free: dec!(1),
                used: dec!(0.5),
                total: dec!(1.5),
            },
        );
        accounts.insert("EUR".to_string(), Account::default());
        let balances = Balances {
            info: serde_json::json!({}),
            accounts,
        };

        assert_eq!(balances.free()["BTC"], dec!(1));
        assert_eq!(balances.used()["BTC"], dec!(0.5));
        assert_eq!(balances.total()["EUR"], Decimal::ZERO);
    }

    #[test]
    fn test_side_and_type_parsing() {
        assert_eq!("BUY".parse::<Side>().unwrap(), Side::Buy);
        assert_eq!("sell".parse::<Side>().unwrap().opposite(), Side::Buy);
        assert_eq!("limit".parse::<OrderType>().unwrap(), OrderType::Limit);
        assert!("stop".parse::<OrderType>().is_err());
    }
}
