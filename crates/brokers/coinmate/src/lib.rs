//! CoinMate exchange adapter.
//!
//! Plugs the CoinMate REST API into the uniform `Exchange` interface:
//! private calls are signed with an HMAC over `nonce + clientId + publicKey`,
//! responses are unwrapped from CoinMate's `{error, errorMessage, data}`
//! envelope and mapped onto the canonical model.

pub mod client;
pub mod config;
pub mod endpoints;
pub mod gateway;
pub mod mapper;
pub mod markets;
pub mod signer;

pub use client::CoinmateExchange;
pub use config::{CoinmateConfig, Credentials};
pub use endpoints::{PrivateEndpoint, PublicEndpoint};
pub use gateway::OrderEndpoint;
pub use signer::RequestSigner;

/// Exchange id reported through `Exchange::id`.
pub const EXCHANGE_ID: &str = "coinmate";
