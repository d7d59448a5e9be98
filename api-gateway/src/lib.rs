// api-gateway/src/lib.rs
pub mod client;
pub mod endpoints;
pub mod error;
pub mod gateway;
pub mod interceptors;

pub use client::ApiClient;
pub use endpoints::blockchain::DEFAULT_NETWORK;
pub use error::{handle_api_error, GatewayError};
pub use gateway::SessionGateway;
pub use interceptors::Navigator;
