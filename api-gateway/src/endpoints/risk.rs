// api-gateway/src/endpoints/risk.rs
use common::{RiskAssessmentRequest, RiskMetrics};

use crate::client::ApiClient;
use crate::error::GatewayError;

/// `/risk/*`
pub struct RiskApi<'a> {
    client: &'a ApiClient,
}

impl<'a> RiskApi<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    pub async fn assess(&self, request: &RiskAssessmentRequest) -> Result<RiskMetrics, GatewayError> {
        let url = self.client.url(&["risk", "assess"])?;
        self.client.post(url, request).await
    }

    pub async fn metrics(&self, portfolio_id: &str) -> Result<RiskMetrics, GatewayError> {
        let url = self.client.url(&["risk", "metrics", portfolio_id])?;
        self.client.get(url).await
    }
}
