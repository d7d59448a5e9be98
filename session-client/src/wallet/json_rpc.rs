// session-client/src/wallet/json_rpc.rs
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use common::WalletConfig;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::task::JoinHandle;
use url::Url;

use super::{
    parse_quantity, EventKind, Listener, ListenerId, ListenerRegistry, Network, ProviderEvent,
    WalletError, WalletProvider,
};

/// Wallet backed by an Ethereum JSON-RPC node. Account and chain changes are
/// detected by polling while at least one listener is registered.
pub struct JsonRpcProvider {
    rpc: Arc<RpcTransport>,
    listeners: Arc<ListenerRegistry>,
    poll_interval: Duration,
    watcher: Mutex<Option<JoinHandle<()>>>,
}

struct RpcTransport {
    http: reqwest::Client,
    url: Url,
    next_id: AtomicU64,
}

#[derive(Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcErrorBody>,
}

#[derive(Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
}

impl RpcTransport {
    async fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T, WalletError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });

        tracing::trace!("JSON-RPC {} (id {})", method, id);

        let response = self
            .http
            .post(self.url.clone())
            .json(&body)
            .send()
            .await
            .map_err(|e| WalletError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(WalletError::Transport(format!(
                "{} returned HTTP {}",
                method,
                response.status()
            )));
        }

        let payload: RpcResponse<T> = response
            .json()
            .await
            .map_err(|e| WalletError::InvalidResponse(e.to_string()))?;

        if let Some(error) = payload.error {
            return Err(WalletError::Rpc {
                code: error.code,
                message: error.message,
            });
        }

        payload
            .result
            .ok_or_else(|| WalletError::InvalidResponse(format!("{} returned no result", method)))
    }
}

impl JsonRpcProvider {
    pub fn new(rpc_url: &str, poll_interval: Duration) -> Result<Self, WalletError> {
        let url = Url::parse(rpc_url)
            .map_err(|e| WalletError::InvalidResponse(format!("invalid rpc url {}: {}", rpc_url, e)))?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .map_err(|e| WalletError::Transport(e.to_string()))?;

        Ok(Self {
            rpc: Arc::new(RpcTransport {
                http,
                url,
                next_id: AtomicU64::new(1),
            }),
            listeners: Arc::new(ListenerRegistry::new()),
            poll_interval,
            watcher: Mutex::new(None),
        })
    }

    /// `Ok(None)` when no RPC endpoint is configured, i.e. no wallet is present
    pub fn from_config(config: &WalletConfig) -> Result<Option<Self>, WalletError> {
        match &config.rpc_url {
            Some(url) => {
                let interval = Duration::from_secs(config.poll_interval_secs.max(1));
                Self::new(url, interval).map(Some)
            },
            None => Ok(None),
        }
    }

    fn watcher(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        match self.watcher.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn ensure_watching(&self) {
        let mut watcher = self.watcher();
        if watcher.is_some() {
            return;
        }

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::warn!("No async runtime available, wallet events will not be delivered");
            return;
        };

        tracing::debug!("Starting wallet watcher every {:?}", self.poll_interval);
        *watcher = Some(runtime.spawn(watch(
            self.rpc.clone(),
            self.listeners.clone(),
            self.poll_interval,
        )));
    }
}

impl Drop for JsonRpcProvider {
    fn drop(&mut self) {
        if let Some(handle) = self.watcher().take() {
            handle.abort();
        }
    }
}

#[async_trait]
impl WalletProvider for JsonRpcProvider {
    async fn request_accounts(&self) -> Result<Vec<String>, WalletError> {
        // Plain nodes reject eth_requestAccounts; they expose their unlocked accounts instead
        match self.rpc.call("eth_requestAccounts", json!([])).await {
            Ok(accounts) => Ok(accounts),
            Err(WalletError::Rpc { code, message }) => {
                tracing::debug!("eth_requestAccounts refused ({}: {}), using eth_accounts", code, message);
                self.rpc.call("eth_accounts", json!([])).await
            },
            Err(e) => Err(e),
        }
    }

    async fn balance_of(&self, address: &str) -> Result<u128, WalletError> {
        let quantity: String = self.rpc.call("eth_getBalance", json!([address, "latest"])).await?;
        parse_quantity(&quantity)
    }

    async fn network(&self) -> Result<Network, WalletError> {
        let chain_id: String = self.rpc.call("eth_chainId", json!([])).await?;
        let chain_id = u64::try_from(parse_quantity(&chain_id)?)
            .map_err(|_| WalletError::InvalidResponse(format!("chain id out of range: {}", chain_id)))?;
        Ok(Network::from_chain_id(chain_id))
    }

    fn on(&self, kind: EventKind, listener: Listener) -> ListenerId {
        let id = self.listeners.add(kind, listener);
        self.ensure_watching();
        id
    }

    fn remove_listener(&self, id: ListenerId) {
        if !self.listeners.remove(id) {
            tracing::debug!("Wallet listener {:?} was already removed", id);
        }

        if self.listeners.is_empty() {
            if let Some(handle) = self.watcher().take() {
                tracing::debug!("No wallet listeners left, stopping watcher");
                handle.abort();
            }
        }
    }
}

/// Poll accounts and chain id, emitting an event whenever either changes.
/// The first round only records the baseline.
async fn watch(rpc: Arc<RpcTransport>, listeners: Arc<ListenerRegistry>, period: Duration) {
    let mut ticker = tokio::time::interval(period);
    let mut accounts: Option<Vec<String>> = None;
    let mut chain: Option<String> = None;

    loop {
        ticker.tick().await;

        match rpc.call::<Vec<String>>("eth_accounts", json!([])).await {
            Ok(current) => {
                if let Some(previous) = accounts.replace(current.clone()) {
                    if previous != current {
                        tracing::info!("Wallet accounts changed");
                        listeners.emit(&ProviderEvent::AccountsChanged(current));
                    }
                }
            },
            Err(e) => tracing::warn!("Failed to poll wallet accounts: {}", e),
        }

        match rpc.call::<String>("eth_chainId", json!([])).await {
            Ok(current) => {
                if let Some(previous) = chain.replace(current.clone()) {
                    if previous != current {
                        tracing::info!("Wallet chain changed to {}", current);
                        listeners.emit(&ProviderEvent::ChainChanged(current));
                    }
                }
            },
            Err(e) => tracing::warn!("Failed to poll wallet chain id: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_reply_has_no_result() {
        let reply: RpcResponse<Vec<String>> = serde_json::from_str(
            r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32601,"message":"Method not found"}}"#,
        )
        .unwrap();

        assert!(reply.result.is_none());
        assert_eq!(reply.error.map(|e| e.code), Some(-32601));
    }

    #[test]
    fn test_result_reply_has_no_error() {
        let reply: RpcResponse<String> =
            serde_json::from_str(r#"{"jsonrpc":"2.0","id":2,"result":"0x1"}"#).unwrap();

        assert_eq!(reply.result.as_deref(), Some("0x1"));
        assert!(reply.error.is_none());
    }
}
