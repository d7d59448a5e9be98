// api-gateway/src/endpoints/auth.rs
use common::{Credentials, RegisterRequest, TokenResponse, User};

use crate::client::ApiClient;
use crate::error::GatewayError;

/// `/auth/*`
pub struct AuthApi<'a> {
    client: &'a ApiClient,
}

impl<'a> AuthApi<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    pub async fn register(&self, request: &RegisterRequest) -> Result<User, GatewayError> {
        let url = self.client.url(&["auth", "register"])?;
        self.client.post(url, request).await
    }

    /// Exchange credentials for an access token
    pub async fn login(&self, credentials: &Credentials) -> Result<TokenResponse, GatewayError> {
        let url = self.client.url(&["auth", "token"])?;
        self.client.post(url, credentials).await
    }

    /// Identity behind the stored bearer token
    pub async fn current_user(&self) -> Result<User, GatewayError> {
        let url = self.client.url(&["auth", "me"])?;
        self.client.get(url).await
    }
}
