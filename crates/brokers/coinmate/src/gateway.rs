use rust_decimal::Decimal;
use serde_json::Value;
use tradelink_core::*;

use crate::endpoints::PrivateEndpoint;
use crate::mapper::normalize_id;

/// The four order placement endpoints CoinMate exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderEndpoint {
    BuyInstant,
    SellInstant,
    BuyLimit,
    SellLimit,
}

impl OrderEndpoint {
    /// Endpoint for a `(side, type)` pair.
    pub fn for_order(side: Side, order_type: OrderType) -> Self {
        match (side, order_type) {
            (Side::Buy, OrderType::Market) => OrderEndpoint::BuyInstant,
            (Side::Sell, OrderType::Market) => OrderEndpoint::SellInstant,
            (Side::Buy, OrderType::Limit) => OrderEndpoint::BuyLimit,
            (Side::Sell, OrderType::Limit) => OrderEndpoint::SellLimit,
        }
    }

    pub fn endpoint(&self) -> PrivateEndpoint {
        match self {
            OrderEndpoint::BuyInstant => PrivateEndpoint::BuyInstant,
            OrderEndpoint::SellInstant => PrivateEndpoint::SellInstant,
            OrderEndpoint::BuyLimit => PrivateEndpoint::BuyLimit,
            OrderEndpoint::SellLimit => PrivateEndpoint::SellLimit,
        }
    }

    /// Form key carrying the order size.
    ///
    /// An instant buy is sized in quote currency (`total`), everything else in
    /// base currency (`amount`).
    pub fn quantity_key(&self) -> &'static str {
        match self {
            OrderEndpoint::BuyInstant => "total",
            _ => "amount",
        }
    }

    pub fn requires_price(&self) -> bool {
        matches!(self, OrderEndpoint::BuyLimit | OrderEndpoint::SellLimit)
    }
}

/// Endpoint and form parameters for one order placement.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderPlan {
    pub endpoint: OrderEndpoint,
    pub params: Params,
}

/// Validate `order` and build its request. Nothing is sent.
///
/// `extra` parameters are passed along, but the order's own fields always win.
pub fn plan_order(
    order: &OrderRequest,
    registry: &dyn MarketRegistry,
    extra: &Params,
) -> AdapterResult<OrderPlan> {
    let endpoint = OrderEndpoint::for_order(order.side, order.order_type);

    if order.amount <= Decimal::ZERO {
        return Err(AdapterError::InvalidOrder(format!(
            "amount must be positive, got {}",
            order.amount
        )));
    }

    let price = match (endpoint.requires_price(), order.price) {
        (true, None) => {
            return Err(AdapterError::InvalidOrder(
                "limit orders require a price".to_string(),
            ))
        }
        (true, Some(price)) if price <= Decimal::ZERO => {
            return Err(AdapterError::InvalidOrder(format!(
                "price must be positive, got {}",
                price
            )))
        }
        (true, Some(price)) => Some(price),
        // A price on a market order has no meaning for CoinMate.
        (false, _) => None,
    };

    let native_id = registry.resolve(&order.symbol)?;

    let mut params = extra.clone();
    params.insert("currencyPair".to_string(), native_id);
    params.insert(
        endpoint.quantity_key().to_string(),
        order.amount.normalize().to_string(),
    );
    if let Some(price) = price {
        params.insert("price".to_string(), price.normalize().to_string());
    }

    Ok(OrderPlan { endpoint, params })
}

/// Parameters for `cancelOrder`. Only the order id is needed; no market.
pub fn plan_cancel(order_id: &str) -> AdapterResult<Params> {
    let order_id = order_id.trim();
    if order_id.is_empty() {
        return Err(AdapterError::InvalidOrder("order id must not be empty".to_string()));
    }
    let mut params = Params::new();
    params.insert("orderId".to_string(), order_id.to_string());
    Ok(params)
}

/// Order id from a placement response; `info` keeps the full envelope.
pub fn map_order_ack(envelope: Value) -> AdapterResult<OrderAck> {
    let data = envelope.get("data").unwrap_or(&Value::Null);
    let id = normalize_id(data, "order id")?;
    Ok(OrderAck { id, info: envelope })
}

pub fn map_cancel_ack(order_id: &str, envelope: Value) -> CancelAck {
    let cancelled = envelope.get("data").and_then(Value::as_bool);
    CancelAck {
        id: order_id.trim().to_string(),
        cancelled,
        info: envelope,
    }
}
