// session-client/src/lib.rs
pub mod actors;
pub mod commands;
pub mod wallet;

use std::sync::Arc;

use actix::{Addr, AsyncContext, Context};
use api_gateway::ApiClient;
use common::LocalStorage;

use actors::session_store::{SessionStore, StoreNavigator};
use wallet::WalletProvider;

/// Everything a front end needs: the store and a gateway wired to it
#[derive(Clone)]
pub struct Session {
    pub store: Addr<SessionStore>,
    pub api: ApiClient,
}

/// Start the Session Store. The returned client reports 401s back to the
/// store, so it must run inside an actix system.
pub fn start_session(
    api: ApiClient,
    storage: Arc<dyn LocalStorage>,
    wallet: Option<Arc<dyn WalletProvider>>,
    currency_symbol: &str,
) -> Session {
    // The gateway needs the store address before the store exists
    let ctx = Context::<SessionStore>::new();
    let api = api.with_navigator(Arc::new(StoreNavigator::new(&ctx.address())));

    let store = ctx.run(SessionStore::new(
        storage,
        Arc::new(api.clone()),
        wallet,
        currency_symbol,
    ));

    Session { store, api }
}
