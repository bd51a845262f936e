//! Exchange-neutral plumbing shared by broker adapters.

pub mod encoding;
pub mod http;
pub mod nonce;
pub mod registry;
pub mod simulated;

pub use encoding::urlencode;
pub use http::{HttpTransport, HttpTransportConfig};
pub use nonce::NonceGenerator;
pub use registry::StaticMarketRegistry;
pub use simulated::ScriptedTransport;
