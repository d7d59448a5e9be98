// session-client/src/actors/session_store.rs
use std::sync::Arc;

use actix::prelude::*;
use actix::WeakAddr;
use api_gateway::{handle_api_error, GatewayError, Navigator, SessionGateway};
use common::storage::{DARK_MODE_KEY, TOKEN_KEY, USER_KEY};
use common::{
    format_balance, ApiError, Credentials, LocalStorage, RegisterRequest, SessionState, User,
    WalletState,
};

use crate::wallet::{EventKind, ListenerId, ProviderEvent, WalletError, WalletProvider};

/// Sign in, then load the current user. Resolves to `true` on success.
#[derive(Message)]
#[rtype(result = "bool")]
pub struct Login(pub Credentials);

/// Create an account. Does not sign in.
#[derive(Message)]
#[rtype(result = "Result<User, ApiError>")]
pub struct Register(pub RegisterRequest);

#[derive(Message)]
#[rtype(result = "()")]
pub struct Logout;

#[derive(Message)]
#[rtype(result = "()")]
pub struct ClearError;

/// Flip the theme. Resolves to the new `dark_mode` value.
#[derive(Message)]
#[rtype(result = "bool")]
pub struct ToggleTheme;

#[derive(Message)]
#[rtype(result = "()")]
pub struct ConnectWallet;

#[derive(Message)]
#[rtype(result = "()")]
pub struct DisconnectWallet;

#[derive(Message)]
#[rtype(result = "SessionState")]
pub struct GetSession;

/// Receive a snapshot of the session after every change
#[derive(Message)]
#[rtype(result = "()")]
pub struct Subscribe(pub Recipient<SessionChanged>);

#[derive(Message, Clone, Debug)]
#[rtype(result = "()")]
pub struct SessionChanged(pub SessionState);

/// Throw away derived state and start over from durable storage
#[derive(Message)]
#[rtype(result = "()")]
pub struct Reload;

/// The gateway saw a 401 and already wiped the stored credentials
#[derive(Message)]
#[rtype(result = "()")]
pub struct AuthExpired;

#[derive(Message)]
#[rtype(result = "()")]
pub struct WalletEvent(pub ProviderEvent);

/// Owner of authentication, theme and wallet state
pub struct SessionStore {
    state: SessionState,
    storage: Arc<dyn LocalStorage>,
    gateway: Arc<dyn SessionGateway>,
    wallet: Option<Arc<dyn WalletProvider>>,
    currency_symbol: String,
    wallet_listeners: Vec<ListenerId>,
    subscribers: Vec<Recipient<SessionChanged>>,
}

impl SessionStore {
    /// Build the store, rehydrated from `storage`
    pub fn new(
        storage: Arc<dyn LocalStorage>,
        gateway: Arc<dyn SessionGateway>,
        wallet: Option<Arc<dyn WalletProvider>>,
        currency_symbol: impl Into<String>,
    ) -> Self {
        let state = rehydrate(storage.as_ref());
        Self {
            state,
            storage,
            gateway,
            wallet,
            currency_symbol: currency_symbol.into(),
            wallet_listeners: Vec::new(),
            subscribers: Vec::new(),
        }
    }

    fn notify_subscribers(&mut self) {
        let snapshot = self.state.clone();
        self.subscribers.retain(|subscriber| {
            match subscriber.try_send(SessionChanged(snapshot.clone())) {
                Err(SendError::Closed(_)) => false,
                Err(SendError::Full(_)) => {
                    tracing::warn!("Session subscriber mailbox full, dropping update");
                    true
                },
                Ok(()) => true,
            }
        });
    }

    /// End an auth call (login, register, identity fetch) with an error
    fn fail(&mut self, error: ApiError) {
        tracing::warn!("Session action failed: {}", error);
        self.state.loading = false;
        self.state.error = Some(error);
        self.notify_subscribers();
    }

    /// Wallet failures leave any in-flight auth call alone
    fn wallet_failed(&mut self, error: ApiError) {
        tracing::warn!("Wallet action failed: {}", error);
        self.state.error = Some(error);
        self.notify_subscribers();
    }

    /// Re-check a restored session against `/auth/me`. Holds the mailbox
    /// until the answer arrives, so no action sees the unverified user.
    fn verify_identity(&mut self, ctx: &mut Context<Self>) {
        if !self.state.is_authenticated {
            return;
        }

        tracing::debug!("Verifying restored session");
        self.state.loading = true;
        self.notify_subscribers();

        let gateway = self.gateway.clone();
        let storage = self.storage.clone();

        ctx.wait(
            async move {
                let user = gateway.current_user().await?;
                storage.set_item(USER_KEY, &serde_json::to_string(&user)?)?;
                Ok::<_, GatewayError>(user)
            }
            .into_actor(self)
            .map(|result, act, _ctx| match result {
                Ok(user) => {
                    tracing::info!("Session verified for {}", user.username);
                    act.state.sign_in(user);
                    act.notify_subscribers();
                },
                Err(e) => {
                    clear_credentials(act.storage.as_ref());
                    act.state.sign_out();
                    act.fail(handle_api_error(&e));
                },
            }),
        );
    }

    fn watch_wallet(&mut self, ctx: &mut Context<Self>) {
        let Some(provider) = self.wallet.clone() else {
            return;
        };

        // Reconnects replace the previous registrations
        self.unwatch_wallet();

        for kind in [EventKind::AccountsChanged, EventKind::ChainChanged] {
            let store = ctx.address().downgrade();
            let id = provider.on(
                kind,
                Arc::new(move |event| {
                    if let Some(store) = store.upgrade() {
                        store.do_send(WalletEvent(event));
                    }
                }),
            );
            self.wallet_listeners.push(id);
        }
    }

    fn unwatch_wallet(&mut self) {
        let listeners = std::mem::take(&mut self.wallet_listeners);
        if let Some(provider) = &self.wallet {
            for id in listeners {
                provider.remove_listener(id);
            }
        }
    }
}

/// Read the persisted session. Token and user only count together; a lone
/// or unreadable half is removed.
fn rehydrate(storage: &dyn LocalStorage) -> SessionState {
    let mut state = SessionState {
        dark_mode: storage.get_item(DARK_MODE_KEY).as_deref() == Some("true"),
        ..SessionState::default()
    };

    // An empty token cannot be sent as a credential
    let token = storage.get_item(TOKEN_KEY).filter(|token| !token.is_empty());

    match (token, storage.get_item(USER_KEY)) {
        (Some(_), Some(user)) => match serde_json::from_str::<User>(&user) {
            Ok(user) => {
                tracing::info!("Restored session for {}", user.username);
                state.sign_in(user);
            },
            Err(e) => {
                tracing::warn!("Stored user is unreadable, clearing session: {}", e);
                clear_credentials(storage);
            },
        },
        (None, None) => {},
        _ => {
            tracing::warn!("Incomplete stored session, clearing it");
            clear_credentials(storage);
        },
    }

    state
}

fn clear_credentials(storage: &dyn LocalStorage) {
    for key in [TOKEN_KEY, USER_KEY] {
        if let Err(e) = storage.remove_item(key) {
            tracing::error!("Failed to remove {} from storage: {}", key, e);
        }
    }
}

impl Actor for SessionStore {
    type Context = Context<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        tracing::info!(
            "Session store started (restored: {}, dark mode: {})",
            self.state.is_authenticated,
            self.state.dark_mode
        );
        self.verify_identity(ctx);
    }

    fn stopped(&mut self, _ctx: &mut Self::Context) {
        self.unwatch_wallet();
    }
}

impl Handler<Login> for SessionStore {
    type Result = ResponseActFuture<Self, bool>;

    fn handle(&mut self, msg: Login, _ctx: &mut Self::Context) -> Self::Result {
        tracing::info!("Logging in {}", msg.0.email);
        self.state.loading = true;
        self.state.error = None;
        self.notify_subscribers();

        let gateway = self.gateway.clone();
        let storage = self.storage.clone();

        Box::pin(
            async move {
                let token = gateway.login(&msg.0).await?;
                storage.set_item(TOKEN_KEY, &token.access_token)?;

                let user = gateway.current_user().await?;
                storage.set_item(USER_KEY, &serde_json::to_string(&user)?)?;
                Ok::<_, GatewayError>(user)
            }
            .into_actor(self)
            .map(|result, act, _ctx| match result {
                Ok(user) => {
                    tracing::info!("Logged in as {}", user.username);
                    act.state.sign_in(user);
                    act.notify_subscribers();
                    true
                },
                Err(e) => {
                    act.fail(handle_api_error(&e));
                    false
                },
            }),
        )
    }
}

impl Handler<Register> for SessionStore {
    type Result = ResponseActFuture<Self, Result<User, ApiError>>;

    fn handle(&mut self, msg: Register, _ctx: &mut Self::Context) -> Self::Result {
        tracing::info!("Registering {}", msg.0.email);
        self.state.loading = true;
        self.state.error = None;
        self.notify_subscribers();

        let gateway = self.gateway.clone();

        Box::pin(
            async move { gateway.register(&msg.0).await }
                .into_actor(self)
                .map(|result, act, _ctx| match result {
                    Ok(user) => {
                        tracing::info!("Registered {}", user.username);
                        act.state.loading = false;
                        act.notify_subscribers();
                        Ok(user)
                    },
                    Err(e) => {
                        let error = handle_api_error(&e);
                        act.fail(error.clone());
                        Err(error)
                    },
                }),
        )
    }
}

impl Handler<Logout> for SessionStore {
    type Result = ();

    fn handle(&mut self, _msg: Logout, _ctx: &mut Self::Context) -> Self::Result {
        clear_credentials(self.storage.as_ref());
        self.state.sign_out();
        tracing::info!("Logged out");
        self.notify_subscribers();
    }
}

impl Handler<ClearError> for SessionStore {
    type Result = ();

    fn handle(&mut self, _msg: ClearError, _ctx: &mut Self::Context) -> Self::Result {
        if self.state.error.take().is_some() {
            self.notify_subscribers();
        }
    }
}

impl Handler<ToggleTheme> for SessionStore {
    type Result = bool;

    fn handle(&mut self, _msg: ToggleTheme, _ctx: &mut Self::Context) -> Self::Result {
        self.state.dark_mode = !self.state.dark_mode;
        let value = if self.state.dark_mode { "true" } else { "false" };
        if let Err(e) = self.storage.set_item(DARK_MODE_KEY, value) {
            tracing::error!("Failed to persist theme: {}", e);
        }

        tracing::debug!("Dark mode set to {}", value);
        self.notify_subscribers();
        self.state.dark_mode
    }
}

impl Handler<ConnectWallet> for SessionStore {
    type Result = ResponseActFuture<Self, ()>;

    fn handle(&mut self, _msg: ConnectWallet, _ctx: &mut Self::Context) -> Self::Result {
        let Some(provider) = self.wallet.clone() else {
            self.wallet_failed(WalletError::NotDetected.to_api_error());
            return Box::pin(actix::fut::ready(()));
        };
        let symbol = self.currency_symbol.clone();

        Box::pin(
            async move {
                let accounts = provider.request_accounts().await?;
                let address = accounts.into_iter().next().ok_or(WalletError::NoAccounts)?;

                let (wei, network) =
                    futures::try_join!(provider.balance_of(&address), provider.network())?;

                Ok::<_, WalletError>(WalletState::connected(
                    address,
                    format_balance(wei, &symbol),
                    network.display_name(),
                ))
            }
            .into_actor(self)
            .map(|result, act, ctx| match result {
                Ok(wallet) => {
                    tracing::info!(
                        "Wallet connected: {} on {}",
                        wallet.address().unwrap_or_default(),
                        wallet.network.as_deref().unwrap_or_default()
                    );
                    act.state.wallet = wallet;
                    act.watch_wallet(ctx);
                    act.notify_subscribers();
                },
                Err(e) => {
                    tracing::error!("Failed to connect wallet: {}", e);
                    act.wallet_failed(e.to_api_error());
                },
            }),
        )
    }
}

impl Handler<DisconnectWallet> for SessionStore {
    type Result = ();

    fn handle(&mut self, _msg: DisconnectWallet, _ctx: &mut Self::Context) -> Self::Result {
        self.unwatch_wallet();
        self.state.wallet = WalletState::default();
        tracing::info!("Wallet disconnected");
        self.notify_subscribers();
    }
}

impl Handler<GetSession> for SessionStore {
    type Result = MessageResult<GetSession>;

    fn handle(&mut self, _msg: GetSession, _ctx: &mut Self::Context) -> Self::Result {
        MessageResult(self.state.clone())
    }
}

impl Handler<Subscribe> for SessionStore {
    type Result = ();

    fn handle(&mut self, msg: Subscribe, _ctx: &mut Self::Context) -> Self::Result {
        // New subscribers start from the current snapshot
        msg.0.do_send(SessionChanged(self.state.clone()));
        self.subscribers.push(msg.0);
    }
}

impl Handler<Reload> for SessionStore {
    type Result = ();

    fn handle(&mut self, _msg: Reload, ctx: &mut Self::Context) -> Self::Result {
        tracing::info!("Reloading session from storage");
        self.unwatch_wallet();
        self.state = rehydrate(self.storage.as_ref());
        self.notify_subscribers();
        self.verify_identity(ctx);
    }
}

impl Handler<AuthExpired> for SessionStore {
    type Result = ();

    fn handle(&mut self, _msg: AuthExpired, ctx: &mut Self::Context) -> Self::Result {
        // A 401 while signed out belongs to the call that triggered it
        if self.state.is_authenticated {
            tracing::info!("Authentication expired");
            ctx.notify(Reload);
        }
    }
}

impl Handler<WalletEvent> for SessionStore {
    type Result = ();

    fn handle(&mut self, msg: WalletEvent, ctx: &mut Self::Context) -> Self::Result {
        match msg.0 {
            ProviderEvent::AccountsChanged(accounts) if accounts.is_empty() => {
                ctx.notify(DisconnectWallet);
            },
            ProviderEvent::AccountsChanged(_) => ctx.notify(ConnectWallet),
            ProviderEvent::ChainChanged(chain_id) => {
                tracing::info!("Chain changed to {}", chain_id);
                ctx.notify(Reload);
            },
        }
    }
}

/// Gateway hook that turns a 401 into [`AuthExpired`]
pub struct StoreNavigator {
    store: WeakAddr<SessionStore>,
}

impl StoreNavigator {
    pub fn new(store: &Addr<SessionStore>) -> Self {
        Self {
            store: store.downgrade(),
        }
    }
}

impl Navigator for StoreNavigator {
    fn redirect_to_login(&self) {
        match self.store.upgrade() {
            Some(store) => store.do_send(AuthExpired),
            None => tracing::debug!("Session store gone, ignoring expired session"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::MemoryStorage;

    #[test]
    fn test_rehydrate_full_session() {
        let storage = MemoryStorage::with_items([
            (TOKEN_KEY, "tok"),
            (USER_KEY, r#"{"id":"1","username":"testuser","email":"test@example.com"}"#),
            (DARK_MODE_KEY, "true"),
        ]);

        let state = rehydrate(&storage);

        assert!(state.is_authenticated);
        assert_eq!(state.user.map(|u| u.username).as_deref(), Some("testuser"));
        assert!(state.dark_mode);
        assert!(!state.loading);
    }

    #[test]
    fn test_rehydrate_clears_lone_token() {
        let storage = MemoryStorage::with_items([(TOKEN_KEY, "tok")]);

        let state = rehydrate(&storage);

        assert!(!state.is_authenticated);
        assert!(storage.get_item(TOKEN_KEY).is_none());
    }

    #[test]
    fn test_rehydrate_clears_unreadable_user() {
        let storage = MemoryStorage::with_items([(TOKEN_KEY, "tok"), (USER_KEY, "{not json")]);

        let state = rehydrate(&storage);

        assert!(state.user.is_none());
        assert!(storage.get_item(TOKEN_KEY).is_none());
        assert!(storage.get_item(USER_KEY).is_none());
    }

    #[test]
    fn test_rehydrate_treats_empty_token_as_missing() {
        let storage = MemoryStorage::with_items([
            (TOKEN_KEY, ""),
            (USER_KEY, r#"{"id":"1","username":"testuser","email":"test@example.com"}"#),
        ]);

        let state = rehydrate(&storage);

        assert!(!state.is_authenticated);
        assert!(state.user.is_none());
        assert!(storage.get_item(TOKEN_KEY).is_none());
        assert!(storage.get_item(USER_KEY).is_none());
    }

    #[test]
    fn test_rehydrate_theme_only_true_string() {
        let storage = MemoryStorage::with_items([(DARK_MODE_KEY, "yes")]);
        assert!(!rehydrate(&storage).dark_mode);
    }
}
