// api-gateway/src/endpoints/mod.rs
pub mod auth;
pub mod blockchain;
pub mod portfolios;
pub mod risk;
pub mod transactions;

use crate::client::ApiClient;

pub use auth::AuthApi;
pub use blockchain::BlockchainApi;
pub use portfolios::PortfoliosApi;
pub use risk::RiskApi;
pub use transactions::TransactionsApi;

impl ApiClient {
    pub fn auth(&self) -> AuthApi<'_> {
        AuthApi::new(self)
    }

    pub fn blockchain(&self) -> BlockchainApi<'_> {
        BlockchainApi::new(self)
    }

    pub fn portfolios(&self) -> PortfoliosApi<'_> {
        PortfoliosApi::new(self)
    }

    pub fn transactions(&self) -> TransactionsApi<'_> {
        TransactionsApi::new(self)
    }

    pub fn risk(&self) -> RiskApi<'_> {
        RiskApi::new(self)
    }
}
