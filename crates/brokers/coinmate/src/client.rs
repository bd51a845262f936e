use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, warn};
use tradelink_brokers_common::{urlencode, HttpTransport};
use tradelink_core::*;

use crate::config::CoinmateConfig;
use crate::endpoints::{PrivateEndpoint, PublicEndpoint};
use crate::gateway::{map_cancel_ack, map_order_ack, plan_cancel, plan_order};
use crate::mapper;
use crate::markets::default_registry;
use crate::signer::RequestSigner;
use crate::EXCHANGE_ID;

/// CoinMate adapter.
///
/// Each call runs `build params -> sign (private only) -> transport ->
/// envelope check -> map`. The adapter holds no mutable state apart from the
/// signer's nonce counter, so it can be shared between concurrent tasks.
pub struct CoinmateExchange<T: Transport> {
    config: CoinmateConfig,
    registry: Arc<dyn MarketRegistry>,
    signer: RequestSigner,
    transport: T,
}

impl CoinmateExchange<HttpTransport> {
    /// Adapter over HTTP with the built-in market table.
    pub fn from_config(config: CoinmateConfig) -> AdapterResult<Self> {
        let transport = HttpTransport::new(&config.transport_config())?;
        Ok(Self::new(config, transport))
    }
}

impl<T: Transport> CoinmateExchange<T> {
    pub fn new(config: CoinmateConfig, transport: T) -> Self {
        Self::with_registry(config, Arc::new(default_registry()), transport)
    }

    pub fn with_registry(
        config: CoinmateConfig,
        registry: Arc<dyn MarketRegistry>,
        transport: T,
    ) -> Self {
        let signer = RequestSigner::new(config.credentials.clone());
        Self {
            config,
            registry,
            signer,
            transport,
        }
    }

    pub fn config(&self) -> &CoinmateConfig {
        &self.config
    }

    pub fn registry(&self) -> &dyn MarketRegistry {
        self.registry.as_ref()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Prepare a request for the transport.
    ///
    /// Public calls get `params` as a query string (only when there are any).
    /// Private calls get a signed form body; missing credentials fail here,
    /// before anything is sent.
    pub fn sign(
        &self,
        path: &str,
        scope: ApiScope,
        method: HttpMethod,
        params: &Params,
    ) -> AdapterResult<SignedRequest> {
        let mut url = format!("{}/{}", self.config.base_url.trim_end_matches('/'), path);

        match scope {
            ApiScope::Public => {
                if !params.is_empty() {
                    url.push('?');
                    url.push_str(&urlencode(params));
                }
                Ok(SignedRequest {
                    url,
                    method,
                    body: None,
                    headers: BTreeMap::new(),
                })
            }
            ApiScope::Private => {
                let payload = self.signer.sign(params)?;
                Ok(SignedRequest {
                    url,
                    method,
                    body: Some(payload.body),
                    headers: payload.headers,
                })
            }
        }
    }

    /// Sign, dispatch, and validate the envelope. Returns the whole envelope.
    pub async fn request(
        &self,
        path: &str,
        scope: ApiScope,
        method: HttpMethod,
        params: &Params,
    ) -> AdapterResult<Value> {
        let request = self.sign(path, scope, method, params)?;
        debug!(path, ?scope, method = method.as_str(), "Dispatching request");

        let response = self.transport.execute(request).await?;
        let checked = check_envelope(response);
        if let Err(AdapterError::Exchange { message, .. }) = &checked {
            warn!(path, %message, "CoinMate rejected request");
        }
        checked
    }

    /// Call any public endpoint and return its unmapped `data`.
    pub async fn call_public(&self, endpoint: PublicEndpoint, params: &Params) -> AdapterResult<Value> {
        let envelope = self
            .request(endpoint.path(), endpoint.scope(), endpoint.method(), params)
            .await?;
        Ok(take_data(envelope))
    }

    /// Call any private endpoint (withdrawals, vouchers, history, ...) and
    /// return its unmapped `data`.
    pub async fn call_private(&self, endpoint: PrivateEndpoint, params: &Params) -> AdapterResult<Value> {
        let envelope = self
            .request(endpoint.path(), endpoint.scope(), endpoint.method(), params)
            .await?;
        Ok(take_data(envelope))
    }

    /// Trades from the last `minutes` minutes.
    pub async fn fetch_trades_since(&self, symbol: &str, minutes: u32) -> AdapterResult<Vec<Trade>> {
        let market = self.registry.market(symbol)?;
        let mut params = Params::new();
        params.insert("currencyPair".to_string(), market.id.clone());
        params.insert("minutesIntoHistory".to_string(), minutes.to_string());

        let data = self.call_public(PublicEndpoint::Transactions, &params).await?;
        mapper::map_trades(&data, Some(&market), self.registry.as_ref())
    }

    /// Place an order, passing `extra` form parameters along.
    pub async fn create_order_with_params(
        &self,
        order: &OrderRequest,
        extra: &Params,
    ) -> AdapterResult<OrderAck> {
        let plan = plan_order(order, self.registry.as_ref(), extra)?;
        let endpoint = plan.endpoint.endpoint();

        let envelope = self
            .request(endpoint.path(), endpoint.scope(), endpoint.method(), &plan.params)
            .await?;
        let ack = map_order_ack(envelope)?;
        info!(
            order_id = %ack.id,
            symbol = %order.symbol,
            endpoint = endpoint.path(),
            "Order placed"
        );
        Ok(ack)
    }

    fn market_params(&self, symbol: &str) -> AdapterResult<(Market, Params)> {
        let market = self.registry.market(symbol)?;
        let mut params = Params::new();
        params.insert("currencyPair".to_string(), market.id.clone());
        Ok((market, params))
    }
}

#[async_trait]
impl<T: Transport> Exchange for CoinmateExchange<T> {
    fn id(&self) -> &str {
        EXCHANGE_ID
    }

    async fn fetch_balance(&self) -> AdapterResult<Balances> {
        let data = self
            .call_private(PrivateEndpoint::Balances, &Params::new())
            .await?;
        mapper::map_balance(&data, &self.registry.currencies())
    }

    async fn fetch_order_book(&self, symbol: &str) -> AdapterResult<OrderBook> {
        let (market, mut params) = self.market_params(symbol)?;
        params.insert("groupByPriceLimit".to_string(), "False".to_string());

        let data = self.call_public(PublicEndpoint::OrderBook, &params).await?;
        mapper::map_order_book(&data, &market.symbol)
    }

    async fn fetch_ticker(&self, symbol: &str) -> AdapterResult<Ticker> {
        let (market, params) = self.market_params(symbol)?;
        let data = self.call_public(PublicEndpoint::Ticker, &params).await?;
        mapper::map_ticker(&data, &market.symbol)
    }

    async fn fetch_trades(&self, symbol: &str) -> AdapterResult<Vec<Trade>> {
        self.fetch_trades_since(symbol, self.config.trade_history_minutes)
            .await
    }

    async fn create_order(&self, order: &OrderRequest) -> AdapterResult<OrderAck> {
        self.create_order_with_params(order, &Params::new()).await
    }

    async fn cancel_order(&self, order_id: &str, _symbol: Option<&str>) -> AdapterResult<CancelAck> {
        let params = plan_cancel(order_id)?;
        let envelope = self
            .request(
                PrivateEndpoint::CancelOrder.path(),
                ApiScope::Private,
                HttpMethod::Post,
                &params,
            )
            .await?;
        info!(order_id, "Order cancel sent");
        Ok(map_cancel_ack(order_id, envelope))
    }
}

// ---------------------------------------------------------------------------
// Envelope
// ---------------------------------------------------------------------------

/// Every CoinMate response is `{error, errorMessage, data}`. A truthy `error`
/// turns the whole call into `AdapterError::Exchange` with the raw envelope.
pub fn check_envelope(response: Value) -> AdapterResult<Value> {
    let object = response.as_object().ok_or_else(|| {
        AdapterError::BadResponse(format!("response is not a JSON object: {}", response))
    })?;

    if object.get("error").is_some_and(is_truthy) {
        let message = match object.get("errorMessage") {
            Some(Value::String(text)) => text.clone(),
            Some(other) if !other.is_null() => other.to_string(),
            _ => response.to_string(),
        };
        return Err(AdapterError::Exchange {
            message,
            envelope: response,
        });
    }

    Ok(response)
}

fn take_data(mut envelope: Value) -> Value {
    envelope
        .get_mut("data")
        .map(Value::take)
        .unwrap_or(Value::Null)
}

/// JavaScript truthiness, which is how CoinMate clients read the `error` flag.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
