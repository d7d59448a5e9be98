// api-gateway/src/endpoints/portfolios.rs
use common::PortfolioRecord;

use crate::client::ApiClient;
use crate::error::GatewayError;

/// `/portfolios`: CRUD over the user's saved portfolios
pub struct PortfoliosApi<'a> {
    client: &'a ApiClient,
}

impl<'a> PortfoliosApi<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    pub async fn list(&self) -> Result<Vec<PortfolioRecord>, GatewayError> {
        let url = self.client.url(&["portfolios"])?;
        self.client.get(url).await
    }

    pub async fn get(&self, id: &str) -> Result<PortfolioRecord, GatewayError> {
        let url = self.client.url(&["portfolios", id])?;
        self.client.get(url).await
    }

    pub async fn create(&self, portfolio: &PortfolioRecord) -> Result<PortfolioRecord, GatewayError> {
        let url = self.client.url(&["portfolios"])?;
        self.client.post(url, portfolio).await
    }

    pub async fn update(&self, id: &str, portfolio: &PortfolioRecord) -> Result<PortfolioRecord, GatewayError> {
        let url = self.client.url(&["portfolios", id])?;
        self.client.put(url, portfolio).await
    }

    pub async fn delete(&self, id: &str) -> Result<(), GatewayError> {
        let url = self.client.url(&["portfolios", id])?;
        self.client.delete(url).await
    }
}
