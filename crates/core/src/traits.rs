use crate::models::*;
use async_trait::async_trait;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Failures raised by the transport while dispatching a request.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TransportError {
    #[error("Network error: {0}")]
    Network(String),
    #[error("Request timed out: {0}")]
    Timeout(String),
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Invalid JSON response: {0}")]
    Decode(String),
}

/// Errors surfaced by an exchange adapter.
#[derive(Debug, thiserror::Error)]
pub enum AdapterError {
    /// Credentials are missing or incomplete. Never retried.
    #[error("Authentication error: {0}")]
    Authentication(String),
    #[error("Configuration error: {0}")]
    Configuration(String),
    /// The exchange answered with its error flag set.
    #[error("Exchange error: {message}")]
    Exchange {
        message: String,
        /// The whole response envelope, unaltered.
        envelope: serde_json::Value,
    },
    #[error("Invalid order: {0}")]
    InvalidOrder(String),
    #[error("Market not found: {0}")]
    MarketNotFound(String),
    /// The exchange payload did not have the expected shape or values.
    #[error("Bad response: {0}")]
    BadResponse(String),
    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl AdapterError {
    /// True for errors detected locally, before anything was sent.
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            AdapterError::Authentication(_)
                | AdapterError::Configuration(_)
                | AdapterError::InvalidOrder(_)
                | AdapterError::MarketNotFound(_)
        )
    }

    /// Whether a caller could reasonably retry. This layer itself never does.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AdapterError::Transport(TransportError::Network(_))
                | AdapterError::Transport(TransportError::Timeout(_))
        )
    }
}

pub type AdapterResult<T> = Result<T, AdapterError>;

// ---------------------------------------------------------------------------
// Market Registry
// ---------------------------------------------------------------------------

/// Maps canonical symbols to exchange-native market ids and back.
pub trait MarketRegistry: Send + Sync {
    /// Native id for a canonical symbol (e.g. "BTC/EUR" -> "BTC_EUR").
    fn resolve(&self, symbol: &str) -> AdapterResult<String>;

    /// Market for a native id.
    fn resolve_reverse(&self, native_id: &str) -> AdapterResult<Market>;

    /// Market for a canonical symbol.
    fn market(&self, symbol: &str) -> AdapterResult<Market>;

    /// All known markets.
    fn markets(&self) -> Vec<Market>;

    /// Every currency appearing in any market, sorted.
    fn currencies(&self) -> Vec<String>;
}

// ---------------------------------------------------------------------------
// Transport
// ---------------------------------------------------------------------------

/// Dispatches prepared requests and returns the parsed JSON body.
///
/// Retries, backoff and rate limiting belong to implementations of this trait.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: SignedRequest) -> Result<serde_json::Value, TransportError>;
}

// ---------------------------------------------------------------------------
// Exchange Trait
// ---------------------------------------------------------------------------

/// The uniform market interface every exchange adapter exposes.
#[async_trait]
pub trait Exchange: Send + Sync {
    /// Short exchange id (e.g. "coinmate").
    fn id(&self) -> &str;

    /// Balances for every registered currency.
    async fn fetch_balance(&self) -> AdapterResult<Balances>;

    async fn fetch_order_book(&self, symbol: &str) -> AdapterResult<OrderBook>;

    async fn fetch_ticker(&self, symbol: &str) -> AdapterResult<Ticker>;

    /// Recent public trades.
    async fn fetch_trades(&self, symbol: &str) -> AdapterResult<Vec<Trade>>;

    /// Place an order.
    async fn create_order(&self, order: &OrderRequest) -> AdapterResult<OrderAck>;

    /// Cancel an order. `symbol` is only needed by exchanges that key cancels by market.
    async fn cancel_order(&self, order_id: &str, symbol: Option<&str>) -> AdapterResult<CancelAck>;
}
