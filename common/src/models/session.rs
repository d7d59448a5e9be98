// common/src/models/session.rs
use serde::{Deserialize, Deserializer, Serialize};
use super::api::ApiError;

/// Account record returned by `/auth/me` and `/auth/register`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Backends disagree on numeric vs string ids, so both are accepted
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(alias = "name")]
    pub username: String,
    pub email: String,
    #[serde(default, alias = "walletAddress", skip_serializing_if = "Option::is_none")]
    pub wallet_address: Option<String>,
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match Id::deserialize(deserializer)? {
        Id::Text(text) => text,
        Id::Number(number) => number.to_string(),
    })
}

/// Browser-wallet connection state, independent from the account session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletState {
    is_connected: bool,
    address: Option<String>,
    pub balance: Option<String>,
    pub network: Option<String>,
}

impl WalletState {
    /// A connected wallet always carries its address
    pub fn connected(address: String, balance: String, network: String) -> Self {
        Self {
            is_connected: true,
            address: Some(address),
            balance: Some(balance),
            network: Some(network),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.is_connected
    }

    pub fn address(&self) -> Option<&str> {
        self.address.as_deref()
    }
}

/// Snapshot of everything the Session Store owns
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    pub user: Option<User>,
    pub is_authenticated: bool,
    pub loading: bool,
    pub error: Option<ApiError>,
    pub dark_mode: bool,
    pub wallet: WalletState,
}

/// Authentication state machine as seen by views
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthStatus {
    Anonymous,
    Authenticating,
    Authenticated,
    Error(ApiError),
}

impl SessionState {
    pub fn auth_status(&self) -> AuthStatus {
        if self.loading {
            AuthStatus::Authenticating
        } else if let Some(error) = &self.error {
            AuthStatus::Error(error.clone())
        } else if self.is_authenticated {
            AuthStatus::Authenticated
        } else {
            AuthStatus::Anonymous
        }
    }

    /// Drop the account identity, leaving theme and wallet untouched
    pub fn sign_out(&mut self) {
        self.user = None;
        self.is_authenticated = false;
    }

    pub fn sign_in(&mut self, user: User) {
        self.user = Some(user);
        self.is_authenticated = true;
        self.loading = false;
    }
}
