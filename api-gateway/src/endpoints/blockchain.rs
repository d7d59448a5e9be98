// api-gateway/src/endpoints/blockchain.rs
use common::{EthBalance, Portfolio, TokenBalance, Transaction};

use crate::client::ApiClient;
use crate::error::GatewayError;

pub const DEFAULT_NETWORK: &str = "ethereum";

/// `/blockchain/*`: on-chain data keyed by wallet or token address
pub struct BlockchainApi<'a> {
    client: &'a ApiClient,
}

impl<'a> BlockchainApi<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    pub async fn portfolio(&self, wallet_address: &str) -> Result<Portfolio, GatewayError> {
        let url = self.client.url(&["blockchain", "portfolio", wallet_address])?;
        self.client.get(url).await
    }

    pub async fn transactions(&self, wallet_address: &str) -> Result<Vec<Transaction>, GatewayError> {
        let url = self.client.url(&["blockchain", "transactions", wallet_address])?;
        self.client.get(url).await
    }

    /// `network` defaults to [`DEFAULT_NETWORK`] when `None`
    pub async fn token_balance(
        &self,
        token_address: &str,
        network: Option<&str>,
    ) -> Result<TokenBalance, GatewayError> {
        let url = self.client.url(&["blockchain", "balance", token_address])?;
        let network = network.unwrap_or(DEFAULT_NETWORK);
        self.client.get_with_query(url, &[("network", network)]).await
    }

    pub async fn eth_balance(&self) -> Result<EthBalance, GatewayError> {
        let url = self.client.url(&["blockchain", "eth-balance"])?;
        self.client.get(url).await
    }
}
