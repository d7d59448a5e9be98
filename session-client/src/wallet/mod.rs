// session-client/src/wallet/mod.rs
pub mod json_rpc;

use std::sync::Arc;

use async_trait::async_trait;
use common::ApiError;
use dashmap::DashMap;
use uuid::Uuid;

pub use json_rpc::JsonRpcProvider;

const NOT_DETECTED_MESSAGE: &str = "Wallet not detected. Please install MetaMask.";
const CONNECT_FAILED_MESSAGE: &str = "Failed to connect wallet. Please try again.";

/// Provider notifications the session reacts to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderEvent {
    AccountsChanged(Vec<String>),
    ChainChanged(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    AccountsChanged,
    ChainChanged,
}

impl ProviderEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::AccountsChanged(_) => EventKind::AccountsChanged,
            Self::ChainChanged(_) => EventKind::ChainChanged,
        }
    }
}

/// Handle returned by [`WalletProvider::on`], needed to unregister
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(Uuid);

impl ListenerId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

pub type Listener = Arc<dyn Fn(ProviderEvent) + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Network {
    pub chain_id: u64,
    /// Provider-style short name (`homestead`, `sepolia`, ...)
    pub name: String,
}

impl Network {
    pub fn from_chain_id(chain_id: u64) -> Self {
        let name = match chain_id {
            1 => "homestead",
            5 => "goerli",
            10 => "optimism",
            56 => "bnb",
            137 => "matic",
            8453 => "base",
            42161 => "arbitrum",
            11155111 => "sepolia",
            _ => "unknown",
        };
        Self {
            chain_id,
            name: name.to_string(),
        }
    }

    /// Name shown in the session: mainnet gets its friendly label
    pub fn display_name(&self) -> String {
        match self.name.as_str() {
            "homestead" => "Ethereum Mainnet".to_string(),
            "unknown" => format!("Chain {}", self.chain_id),
            other => other.to_string(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum WalletError {
    #[error("no wallet provider configured")]
    NotDetected,
    #[error("wallet returned no accounts")]
    NoAccounts,
    #[error("wallet rpc error {code}: {message}")]
    Rpc { code: i64, message: String },
    #[error("wallet transport error: {0}")]
    Transport(String),
    #[error("invalid wallet response: {0}")]
    InvalidResponse(String),
}

impl WalletError {
    /// Session-facing shape: missing provider is a 404, everything else a 500
    pub fn to_api_error(&self) -> ApiError {
        match self {
            Self::NotDetected => ApiError::new(404, NOT_DETECTED_MESSAGE),
            _ => ApiError::new(500, CONNECT_FAILED_MESSAGE),
        }
    }
}

/// Injected browser-wallet capability
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Ask the wallet for account access. May prompt the user.
    async fn request_accounts(&self) -> Result<Vec<String>, WalletError>;

    /// Native balance in wei
    async fn balance_of(&self, address: &str) -> Result<u128, WalletError>;

    async fn network(&self) -> Result<Network, WalletError>;

    fn on(&self, kind: EventKind, listener: Listener) -> ListenerId;

    fn remove_listener(&self, id: ListenerId);
}

/// Listener bookkeeping shared by provider implementations
#[derive(Default)]
pub struct ListenerRegistry {
    listeners: DashMap<ListenerId, (EventKind, Listener)>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, kind: EventKind, listener: Listener) -> ListenerId {
        let id = ListenerId::new();
        self.listeners.insert(id, (kind, listener));
        id
    }

    pub fn remove(&self, id: ListenerId) -> bool {
        self.listeners.remove(&id).is_some()
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Deliver an event to every listener registered for its kind
    pub fn emit(&self, event: &ProviderEvent) {
        // Collect first so listeners may (un)register without deadlocking the map
        let targets: Vec<Listener> = self
            .listeners
            .iter()
            .filter(|entry| entry.value().0 == event.kind())
            .map(|entry| entry.value().1.clone())
            .collect();

        tracing::debug!("Dispatching {:?} to {} listener(s)", event.kind(), targets.len());
        for listener in targets {
            listener(event.clone());
        }
    }
}

/// Parse a JSON-RPC hex quantity (`0x1bc16d674ec80000`)
pub fn parse_quantity(value: &str) -> Result<u128, WalletError> {
    let digits = value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .ok_or_else(|| WalletError::InvalidResponse(format!("not a hex quantity: {}", value)))?;

    if digits.is_empty() {
        return Ok(0);
    }

    u128::from_str_radix(digits, 16)
        .map_err(|e| WalletError::InvalidResponse(format!("{}: {}", value, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_parse_quantity() {
        assert_eq!(parse_quantity("0x0").unwrap(), 0);
        assert_eq!(parse_quantity("0x").unwrap(), 0);
        assert_eq!(parse_quantity("0x1bc16d674ec80000").unwrap(), 2_000_000_000_000_000_000);
        assert!(parse_quantity("1234").is_err());
        assert!(parse_quantity("0xzz").is_err());
    }

    #[test]
    fn test_network_names() {
        assert_eq!(Network::from_chain_id(1).display_name(), "Ethereum Mainnet");
        assert_eq!(Network::from_chain_id(11155111).display_name(), "sepolia");
        assert_eq!(Network::from_chain_id(31337).display_name(), "Chain 31337");
    }

    #[test]
    fn test_wallet_error_statuses() {
        assert_eq!(WalletError::NotDetected.to_api_error().status, 404);
        assert_eq!(WalletError::NoAccounts.to_api_error().status, 500);
        assert_eq!(
            WalletError::Transport("refused".into()).to_api_error().message,
            "Failed to connect wallet. Please try again."
        );
    }

    #[test]
    fn test_registry_dispatches_by_kind() {
        let registry = ListenerRegistry::new();
        let hits = Arc::new(AtomicUsize::new(0));

        let counter = hits.clone();
        let id = registry.add(
            EventKind::AccountsChanged,
            Arc::new(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        );

        registry.emit(&ProviderEvent::ChainChanged("0x1".into()));
        assert_eq!(hits.load(Ordering::SeqCst), 0);

        registry.emit(&ProviderEvent::AccountsChanged(vec![]));
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        assert!(registry.remove(id));
        assert!(registry.is_empty());
        registry.emit(&ProviderEvent::AccountsChanged(vec![]));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }
}
