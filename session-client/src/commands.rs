// session-client/src/commands.rs
use actix::prelude::*;
use api_gateway::{handle_api_error, GatewayError};
use common::{
    format_address, format_large_number, format_timestamp, ApiError, LoginForm, PortfolioRecord,
    RegisterForm, RiskAssessmentRequest, SessionState, Transaction, TransactionQuery,
    ValidationError,
};
use serde_json::Value;

use crate::actors::session_store::{
    ClearError, ConnectWallet, GetSession, Login, Logout, Register, SessionChanged, Subscribe,
    ToggleTheme,
};
use crate::Session;

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("{}", .0.message)]
    Api(ApiError),
    #[error("session store unavailable: {0}")]
    Mailbox(#[from] MailboxError),
    #[error("{0}")]
    InvalidInput(String),
}

impl From<GatewayError> for CommandError {
    fn from(err: GatewayError) -> Self {
        Self::Api(handle_api_error(&err))
    }
}

impl From<ApiError> for CommandError {
    fn from(err: ApiError) -> Self {
        Self::Api(err)
    }
}

/// Fetch the error left by a failed action and acknowledge it
async fn take_error(session: &Session) -> Result<CommandError, CommandError> {
    let state = session.store.send(GetSession).await?;
    session.store.send(ClearError).await?;
    Ok(match state.error {
        Some(error) => CommandError::Api(error),
        None => CommandError::InvalidInput("action failed without an error".to_string()),
    })
}

pub async fn login(session: &Session, form: LoginForm) -> Result<(), CommandError> {
    let credentials = form.validate()?;

    if session.store.send(Login(credentials)).await? {
        let state = session.store.send(GetSession).await?;
        if let Some(user) = state.user {
            println!("Logged in as {} <{}>", user.username, user.email);
        }
        Ok(())
    } else {
        Err(take_error(session).await?)
    }
}

pub async fn register(session: &Session, form: RegisterForm) -> Result<(), CommandError> {
    let request = form.validate()?;

    let user = session.store.send(Register(request)).await??;
    println!("Registered {} <{}>. You can now log in.", user.username, user.email);
    Ok(())
}

pub async fn logout(session: &Session) -> Result<(), CommandError> {
    session.store.send(Logout).await?;
    println!("Logged out");
    Ok(())
}

pub async fn status(session: &Session) -> Result<(), CommandError> {
    let state = session.store.send(GetSession).await?;
    print_session(&state);
    Ok(())
}

pub async fn toggle_theme(session: &Session) -> Result<(), CommandError> {
    let dark_mode = session.store.send(ToggleTheme).await?;
    println!("Theme: {}", if dark_mode { "dark" } else { "light" });
    Ok(())
}

pub async fn connect_wallet(session: &Session) -> Result<SessionState, CommandError> {
    session.store.send(ConnectWallet).await?;

    let state = session.store.send(GetSession).await?;
    if !state.wallet.is_connected() {
        return Err(take_error(session).await?);
    }

    print_wallet(&state);
    Ok(state)
}

/// Connect, then keep printing wallet changes until interrupted
pub async fn watch_wallet(session: &Session) -> Result<(), CommandError> {
    let state = connect_wallet(session).await?;

    let printer = WalletPrinter {
        last: Some(state),
    }
    .start();
    session.store.send(Subscribe(printer.recipient())).await?;

    println!("Watching wallet, press Ctrl-C to stop");
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| CommandError::InvalidInput(format!("failed to wait for Ctrl-C: {}", e)))?;
    Ok(())
}

/// Prints the wallet section whenever it changes
struct WalletPrinter {
    last: Option<SessionState>,
}

impl Actor for WalletPrinter {
    type Context = Context<Self>;
}

impl Handler<SessionChanged> for WalletPrinter {
    type Result = ();

    fn handle(&mut self, msg: SessionChanged, _ctx: &mut Self::Context) -> Self::Result {
        let state = msg.0;
        let changed = self
            .last
            .as_ref()
            .map_or(true, |last| last.wallet != state.wallet || last.error != state.error);

        if changed {
            if let Some(error) = &state.error {
                println!("Wallet error: {}", error.message);
            }
            print_wallet(&state);
        }
        self.last = Some(state);
    }
}

/// Resolve the wallet to query: explicit argument, then the account's
/// linked wallet, then the connected one
async fn resolve_address(session: &Session, address: Option<String>) -> Result<String, CommandError> {
    if let Some(address) = address {
        return Ok(address);
    }

    let state = session.store.send(GetSession).await?;
    state
        .user
        .and_then(|user| user.wallet_address)
        .or_else(|| state.wallet.address().map(str::to_string))
        .ok_or_else(|| CommandError::InvalidInput("no wallet address given or linked".to_string()))
}

pub async fn portfolio(session: &Session, address: Option<String>) -> Result<(), CommandError> {
    let address = resolve_address(session, address).await?;
    let portfolio = session.api.blockchain().portfolio(&address).await?;

    println!("Portfolio {}", format_address(&address));
    println!("Total value: ${}", format_large_number(portfolio.total_value));
    for asset in &portfolio.assets {
        println!(
            "  {:<8} {:<20} {:>16}  ${}",
            asset.symbol,
            asset.name,
            display_value(&asset.balance),
            format_large_number(asset.value_usd)
        );
    }
    Ok(())
}

pub async fn transactions(
    session: &Session,
    address: Option<String>,
    query: TransactionQuery,
) -> Result<(), CommandError> {
    let transactions = match address {
        Some(address) => session.api.blockchain().transactions(&address).await?,
        None => session.api.transactions().list(&query).await?,
    };

    if transactions.is_empty() {
        println!("No transactions");
    }
    for transaction in &transactions {
        print_transaction(transaction);
    }
    Ok(())
}

pub async fn transaction(session: &Session, id: &str) -> Result<(), CommandError> {
    let transaction = session.api.transactions().get(id).await?;
    print_transaction(&transaction);
    Ok(())
}

pub async fn token_balance(
    session: &Session,
    token_address: &str,
    network: Option<&str>,
) -> Result<(), CommandError> {
    let balance = session.api.blockchain().token_balance(token_address, network).await?;
    println!(
        "{} on {}: {}",
        format_address(token_address),
        balance.network.as_deref().unwrap_or(network.unwrap_or(api_gateway::DEFAULT_NETWORK)),
        display_value(&balance.balance)
    );
    Ok(())
}

pub async fn eth_balance(session: &Session) -> Result<(), CommandError> {
    let balance = session.api.blockchain().eth_balance().await?;
    println!("ETH balance: {}", display_value(&balance.balance));
    Ok(())
}

pub async fn list_portfolios(session: &Session) -> Result<(), CommandError> {
    let records = session.api.portfolios().list().await?;
    if records.is_empty() {
        println!("No portfolios");
    }
    for record in &records {
        print_record(record);
    }
    Ok(())
}

pub async fn show_portfolio(session: &Session, id: &str) -> Result<(), CommandError> {
    let record = session.api.portfolios().get(id).await?;
    print_record(&record);
    Ok(())
}

pub async fn create_portfolio(
    session: &Session,
    name: String,
    description: Option<String>,
) -> Result<(), CommandError> {
    if name.trim().is_empty() {
        return Err(CommandError::InvalidInput("Portfolio name is required".to_string()));
    }

    let record = PortfolioRecord {
        id: None,
        name,
        description,
        extra: Default::default(),
    };
    let created = session.api.portfolios().create(&record).await?;
    print!("Created ");
    print_record(&created);
    Ok(())
}

pub async fn delete_portfolio(session: &Session, id: &str) -> Result<(), CommandError> {
    session.api.portfolios().delete(id).await?;
    println!("Deleted portfolio {}", id);
    Ok(())
}

pub async fn assess_risk(
    session: &Session,
    portfolio_id: String,
    parameters: Option<String>,
) -> Result<(), CommandError> {
    let parameters = match parameters {
        Some(raw) => match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Object(map)) => map,
            Ok(_) => {
                return Err(CommandError::InvalidInput("risk parameters must be a JSON object".to_string()))
            },
            Err(e) => return Err(CommandError::InvalidInput(format!("invalid risk parameters: {}", e))),
        },
        None => Default::default(),
    };

    let request = RiskAssessmentRequest {
        portfolio_id,
        parameters,
    };
    let assessment = session.api.risk().assess(&request).await?;
    print_metrics(&assessment);
    Ok(())
}

pub async fn risk_metrics(session: &Session, portfolio_id: &str) -> Result<(), CommandError> {
    let metrics = session.api.risk().metrics(portfolio_id).await?;
    print_metrics(&metrics);
    Ok(())
}

fn print_session(state: &SessionState) {
    match &state.user {
        Some(user) if state.is_authenticated => {
            println!("Signed in as {} <{}> (id {})", user.username, user.email, user.id);
            if let Some(address) = &user.wallet_address {
                println!("Linked wallet: {}", format_address(address));
            }
        },
        _ => println!("Not signed in"),
    }
    println!("Theme: {}", if state.dark_mode { "dark" } else { "light" });
    print_wallet(state);
}

fn print_wallet(state: &SessionState) {
    let wallet = &state.wallet;
    match wallet.address() {
        Some(address) if wallet.is_connected() => println!(
            "Wallet: {} | {} | {}",
            format_address(address),
            wallet.balance.as_deref().unwrap_or("-"),
            wallet.network.as_deref().unwrap_or("-")
        ),
        _ => println!("Wallet: not connected"),
    }
}

fn print_transaction(transaction: &Transaction) {
    let when = transaction
        .timestamp
        .and_then(format_timestamp)
        .unwrap_or_else(|| "-".to_string());
    println!(
        "{:<14} {:>14} -> {:<14} {:>12}  {}",
        transaction.id.as_deref().map(format_address).unwrap_or_else(|| "-".to_string()),
        transaction.from.as_deref().map(format_address).unwrap_or_else(|| "-".to_string()),
        transaction.to.as_deref().map(format_address).unwrap_or_else(|| "-".to_string()),
        transaction.value.as_ref().map(display_value).unwrap_or_else(|| "-".to_string()),
        when
    );
}

fn print_record(record: &PortfolioRecord) {
    let id = record.id.as_ref().map(display_value).unwrap_or_else(|| "-".to_string());
    match &record.description {
        Some(description) => println!("[{}] {}: {}", id, record.name, description),
        None => println!("[{}] {}", id, record.name),
    }
}

fn print_metrics(metrics: &serde_json::Map<String, Value>) {
    for (name, value) in metrics {
        println!("{}: {}", name, display_value(value));
    }
}

/// Strings print bare, everything else as JSON
fn display_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
