//! CoinMate payloads to the canonical model.
//!
//! Pure functions over the `data` field of an already validated envelope.
//! Every numeric value passes through [`to_decimal`], which accepts JSON
//! numbers and numeric strings and rejects anything non-finite or negative.

use rust_decimal::Decimal;
use serde_json::Value;
use std::collections::BTreeMap;
use std::str::FromStr;
use tradelink_core::*;

// ---------------------------------------------------------------------------
// Field parsing
// ---------------------------------------------------------------------------

/// Parse a non-negative decimal from a JSON number or numeric string.
pub fn to_decimal(value: &Value, field: &str) -> AdapterResult<Decimal> {
    let parsed = match value {
        Value::Number(n) => parse_decimal_text(&n.to_string()),
        Value::String(s) => parse_decimal_text(s.trim()),
        _ => None,
    };
    let decimal = parsed
        .ok_or_else(|| AdapterError::BadResponse(format!("{} is not a number: {}", field, value)))?;
    if decimal.is_sign_negative() && !decimal.is_zero() {
        return Err(AdapterError::BadResponse(format!(
            "{} must not be negative: {}",
            field, decimal
        )));
    }
    Ok(decimal)
}

fn parse_decimal_text(text: &str) -> Option<Decimal> {
    Decimal::from_str(text)
        .or_else(|_| Decimal::from_scientific(text))
        .ok()
}

/// A required numeric field of `obj`.
pub fn required_decimal(obj: &Value, field: &str) -> AdapterResult<Decimal> {
    match obj.get(field) {
        None | Some(Value::Null) => Err(AdapterError::BadResponse(format!(
            "missing field {}",
            field
        ))),
        Some(value) => to_decimal(value, field),
    }
}

/// An optional numeric field of `obj`; absent or null means unknown.
pub fn optional_decimal(obj: &Value, field: &str) -> AdapterResult<Option<Decimal>> {
    match obj.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => to_decimal(value, field).map(Some),
    }
}

/// A non-negative integer timestamp field, returned as-is.
pub fn timestamp_field(obj: &Value, field: &str) -> AdapterResult<i64> {
    let bad = || AdapterError::BadResponse(format!("{} is not a valid timestamp", field));
    let value = obj
        .get(field)
        .ok_or_else(|| AdapterError::BadResponse(format!("missing field {}", field)))?;

    let timestamp = match value {
        Value::Number(n) => match n.as_i64() {
            Some(i) => i,
            None => {
                let f = n.as_f64().ok_or_else(bad)?;
                if f.fract() != 0.0 || f > i64::MAX as f64 {
                    return Err(bad());
                }
                f as i64
            }
        },
        Value::String(s) => s.trim().parse::<i64>().map_err(|_| bad())?,
        _ => return Err(bad()),
    };

    if timestamp < 0 {
        return Err(bad());
    }
    Ok(timestamp)
}

fn seconds_to_millis(seconds: i64) -> AdapterResult<i64> {
    seconds
        .checked_mul(1000)
        .ok_or_else(|| AdapterError::BadResponse(format!("timestamp out of range: {}", seconds)))
}

/// Exchange ids arrive as numbers or strings; always hand back a string.
pub fn normalize_id(value: &Value, field: &str) -> AdapterResult<String> {
    match value {
        Value::String(s) if !s.is_empty() => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(AdapterError::BadResponse(format!(
            "{} is not an id: {}",
            field, other
        ))),
    }
}

// ---------------------------------------------------------------------------
// Order book
// ---------------------------------------------------------------------------

/// Map `{timestamp (s), bids, asks}`. Levels keep the exchange's ordering.
pub fn map_order_book(data: &Value, symbol: &str) -> AdapterResult<OrderBook> {
    let timestamp = seconds_to_millis(timestamp_field(data, "timestamp")?)?;
    Ok(OrderBook {
        symbol: symbol.to_string(),
        timestamp,
        datetime: datetime_from_millis(timestamp),
        bids: map_book_side(data.get("bids"), "bids")?,
        asks: map_book_side(data.get("asks"), "asks")?,
    })
}

fn map_book_side(levels: Option<&Value>, side: &str) -> AdapterResult<Vec<BookLevel>> {
    match levels {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(entries)) => entries
            .iter()
            .map(|entry| map_book_level(entry, side))
            .collect(),
        Some(other) => Err(AdapterError::BadResponse(format!(
            "{} is not a list: {}",
            side, other
        ))),
    }
}

/// CoinMate sends `{price, amount}` objects; `[price, amount]` pairs are accepted too.
fn map_book_level(entry: &Value, side: &str) -> AdapterResult<BookLevel> {
    match entry {
        Value::Object(_) => Ok([
            required_decimal(entry, "price")?,
            required_decimal(entry, "amount")?,
        ]),
        Value::Array(pair) if pair.len() >= 2 => Ok([
            to_decimal(&pair[0], "price")?,
            to_decimal(&pair[1], "amount")?,
        ]),
        other => Err(AdapterError::BadResponse(format!(
            "malformed {} level: {}",
            side, other
        ))),
    }
}

// ---------------------------------------------------------------------------
// Ticker
// ---------------------------------------------------------------------------

pub fn map_ticker(data: &Value, symbol: &str) -> AdapterResult<Ticker> {
    let timestamp = seconds_to_millis(timestamp_field(data, "timestamp")?)?;
    Ok(Ticker {
        symbol: symbol.to_string(),
        timestamp,
        datetime: datetime_from_millis(timestamp),
        high: optional_decimal(data, "high")?,
        low: optional_decimal(data, "low")?,
        bid: optional_decimal(data, "bid")?,
        ask: optional_decimal(data, "ask")?,
        vwap: None,
        open: None,
        close: None,
        first: None,
        last: optional_decimal(data, "last")?,
        change: None,
        percentage: None,
        average: None,
        base_volume: optional_decimal(data, "amount")?,
        quote_volume: None,
        info: data.clone(),
    })
}

// ---------------------------------------------------------------------------
// Trades
// ---------------------------------------------------------------------------

/// Map one trade. Without a `market`, the trade's `currencyPair` is looked up
/// in the registry.
///
/// The trade timestamp is already in milliseconds and is passed through,
/// unlike ticker and order book timestamps which arrive in seconds.
pub fn map_trade(
    raw: &Value,
    market: Option<&Market>,
    registry: &dyn MarketRegistry,
) -> AdapterResult<Trade> {
    let symbol = match market {
        Some(market) => market.symbol.clone(),
        None => {
            let native_id = raw
                .get("currencyPair")
                .and_then(Value::as_str)
                .ok_or_else(|| AdapterError::BadResponse("trade without currencyPair".to_string()))?;
            registry.resolve_reverse(native_id)?.symbol
        }
    };

    let id = raw
        .get("transactionId")
        .ok_or_else(|| AdapterError::BadResponse("missing field transactionId".to_string()))
        .and_then(|v| normalize_id(v, "transactionId"))?;
    let timestamp = timestamp_field(raw, "timestamp")?;

    Ok(Trade {
        id,
        info: raw.clone(),
        timestamp,
        datetime: datetime_from_millis(timestamp),
        symbol,
        order_type: None,
        side: None,
        price: required_decimal(raw, "price")?,
        amount: required_decimal(raw, "amount")?,
    })
}

pub fn map_trades(
    data: &Value,
    market: Option<&Market>,
    registry: &dyn MarketRegistry,
) -> AdapterResult<Vec<Trade>> {
    match data {
        Value::Null => Ok(Vec::new()),
        Value::Array(raw) => raw
            .iter()
            .map(|trade| map_trade(trade, market, registry))
            .collect(),
        other => Err(AdapterError::BadResponse(format!(
            "trades payload is not a list: {}",
            other
        ))),
    }
}

// ---------------------------------------------------------------------------
// Balances
// ---------------------------------------------------------------------------

/// One account per currency in `currencies`; zero for any the exchange omits.
pub fn map_balance(data: &Value, currencies: &[String]) -> AdapterResult<Balances> {
    let entries = data.as_object().ok_or_else(|| {
        AdapterError::BadResponse(format!("balances payload is not an object: {}", data))
    })?;

    let mut accounts = BTreeMap::new();
    for currency in currencies {
        let account = match entries.get(currency) {
            Some(entry) if !entry.is_null() => Account {
                free: required_decimal(entry, "available")?,
                used: required_decimal(entry, "reserved")?,
                total: required_decimal(entry, "balance")?,
            },
            _ => Account::default(),
        };
        accounts.insert(currency.clone(), account);
    }

    Ok(Balances {
        info: data.clone(),
        accounts,
    })
}
