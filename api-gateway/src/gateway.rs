// api-gateway/src/gateway.rs
use async_trait::async_trait;
use common::{Credentials, RegisterRequest, TokenResponse, User};

use crate::client::ApiClient;
use crate::error::GatewayError;

/// The part of the gateway the Session Store depends on
#[async_trait]
pub trait SessionGateway: Send + Sync {
    async fn register(&self, request: &RegisterRequest) -> Result<User, GatewayError>;

    async fn login(&self, credentials: &Credentials) -> Result<TokenResponse, GatewayError>;

    async fn current_user(&self) -> Result<User, GatewayError>;
}

#[async_trait]
impl SessionGateway for ApiClient {
    async fn register(&self, request: &RegisterRequest) -> Result<User, GatewayError> {
        self.auth().register(request).await
    }

    async fn login(&self, credentials: &Credentials) -> Result<TokenResponse, GatewayError> {
        self.auth().login(credentials).await
    }

    async fn current_user(&self) -> Result<User, GatewayError> {
        self.auth().current_user().await
    }
}
