// api-gateway/src/endpoints/transactions.rs
use common::{Transaction, TransactionQuery};

use crate::client::ApiClient;
use crate::error::GatewayError;

/// `/transactions`
pub struct TransactionsApi<'a> {
    client: &'a ApiClient,
}

impl<'a> TransactionsApi<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    pub async fn list(&self, query: &TransactionQuery) -> Result<Vec<Transaction>, GatewayError> {
        let url = self.client.url(&["transactions"])?;
        self.client.get_with_query(url, query).await
    }

    pub async fn get(&self, id: &str) -> Result<Transaction, GatewayError> {
        let url = self.client.url(&["transactions", id])?;
        self.client.get(url).await
    }
}
