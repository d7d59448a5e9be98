// session-client/src/main.rs
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use api_gateway::ApiClient;
use clap::{Parser, Subcommand};
use common::{setup_tracing, Config, FileStorage, LocalStorage, LoginForm, RegisterForm, TransactionQuery};
use session_client::commands::{self, CommandError};
use session_client::wallet::{JsonRpcProvider, WalletProvider};
use session_client::{start_session, Session};

/// Portfolio Tracker command-line client
#[derive(Parser, Debug)]
#[command(name = "portfolio", version, about)]
struct Args {
    /// Backend base URL
    #[arg(long, env = "API_URL")]
    api_url: Option<String>,

    /// Path prefix of every endpoint
    #[arg(long, env = "API_PREFIX")]
    api_prefix: Option<String>,

    /// Session file
    #[arg(long, env = "STORAGE_PATH")]
    storage: Option<PathBuf>,

    /// Ethereum JSON-RPC endpoint used as the wallet
    #[arg(long, env = "WALLET_RPC_URL")]
    rpc_url: Option<String>,

    #[arg(long, env = "LOG_LEVEL")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sign in and remember the session
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "PORTFOLIO_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Create an account
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long, env = "PORTFOLIO_PASSWORD", hide_env_values = true)]
        password: String,
        #[arg(long)]
        confirm_password: String,
        #[arg(long)]
        wallet_address: Option<String>,
    },
    Logout,
    /// Show the current session
    Status,
    /// Switch between light and dark theme
    Theme,
    #[command(subcommand)]
    Wallet(WalletCommand),
    /// Assets held by a wallet
    Portfolio {
        address: Option<String>,
    },
    /// Transactions of a wallet, or of the account when no address is given
    Transactions {
        address: Option<String>,
        #[arg(long)]
        portfolio_id: Option<String>,
        #[arg(long)]
        skip: Option<u32>,
        #[arg(long)]
        limit: Option<u32>,
    },
    /// A single stored transaction
    Transaction {
        id: String,
    },
    TokenBalance {
        token_address: String,
        #[arg(long)]
        network: Option<String>,
    },
    EthBalance,
    #[command(subcommand)]
    Portfolios(PortfoliosCommand),
    #[command(subcommand)]
    Risk(RiskCommand),
}

#[derive(Subcommand, Debug)]
enum WalletCommand {
    Connect,
    /// Connect and follow account and chain changes
    Watch,
}

#[derive(Subcommand, Debug)]
enum PortfoliosCommand {
    List,
    Show {
        id: String,
    },
    Create {
        name: String,
        #[arg(long)]
        description: Option<String>,
    },
    Delete {
        id: String,
    },
}

#[derive(Subcommand, Debug)]
enum RiskCommand {
    /// Run an assessment. Extra parameters are passed as a JSON object.
    Assess {
        portfolio_id: String,
        #[arg(long)]
        parameters: Option<String>,
    },
    Metrics {
        portfolio_id: String,
    },
}

impl Args {
    fn apply(&self, config: &mut Config) {
        if let Some(url) = &self.api_url {
            config.api.base_url = url.clone();
        }
        if let Some(prefix) = &self.api_prefix {
            config.api.prefix = prefix.clone();
        }
        if let Some(path) = &self.storage {
            config.storage.path = Some(path.clone());
        }
        if let Some(url) = &self.rpc_url {
            config.wallet.rpc_url = Some(url.clone());
        }
        if let Some(level) = &self.log_level {
            config.log_level.0 = level.clone();
        }
    }
}

#[actix::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let mut config = Config::from_env();
    args.apply(&mut config);

    setup_tracing(&config.log_level.0);

    let session = match bootstrap(&config) {
        Ok(session) => session,
        Err(e) => {
            tracing::error!("Failed to start client: {}", e);
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        },
    };

    match run(&session, args.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        },
    }
}

fn bootstrap(config: &Config) -> Result<Session, String> {
    let path = config.storage.resolve_path();
    tracing::debug!("Using session storage at {}", path.display());
    let storage: Arc<dyn LocalStorage> =
        Arc::new(FileStorage::open(&path).map_err(|e| e.to_string())?);

    let api = ApiClient::new(&config.api, storage.clone()).map_err(|e| e.to_string())?;

    let wallet = JsonRpcProvider::from_config(&config.wallet)
        .map_err(|e| e.to_string())?
        .map(|provider| Arc::new(provider) as Arc<dyn WalletProvider>);
    if wallet.is_none() {
        tracing::debug!("No wallet RPC endpoint configured");
    }

    Ok(start_session(api, storage, wallet, &config.wallet.currency_symbol))
}

async fn run(session: &Session, command: Command) -> Result<(), CommandError> {
    match command {
        Command::Login { email, password } => {
            commands::login(session, LoginForm { email, password }).await
        },
        Command::Register {
            name,
            email,
            password,
            confirm_password,
            wallet_address,
        } => {
            let form = RegisterForm {
                name,
                email,
                password,
                confirm_password,
                wallet_address,
            };
            commands::register(session, form).await
        },
        Command::Logout => commands::logout(session).await,
        Command::Status => commands::status(session).await,
        Command::Theme => commands::toggle_theme(session).await,
        Command::Wallet(WalletCommand::Connect) => commands::connect_wallet(session).await.map(|_| ()),
        Command::Wallet(WalletCommand::Watch) => commands::watch_wallet(session).await,
        Command::Portfolio { address } => commands::portfolio(session, address).await,
        Command::Transactions {
            address,
            portfolio_id,
            skip,
            limit,
        } => {
            let query = TransactionQuery {
                portfolio_id,
                skip,
                limit,
            };
            commands::transactions(session, address, query).await
        },
        Command::Transaction { id } => commands::transaction(session, &id).await,
        Command::TokenBalance {
            token_address,
            network,
        } => commands::token_balance(session, &token_address, network.as_deref()).await,
        Command::EthBalance => commands::eth_balance(session).await,
        Command::Portfolios(PortfoliosCommand::List) => commands::list_portfolios(session).await,
        Command::Portfolios(PortfoliosCommand::Show { id }) => {
            commands::show_portfolio(session, &id).await
        },
        Command::Portfolios(PortfoliosCommand::Create { name, description }) => {
            commands::create_portfolio(session, name, description).await
        },
        Command::Portfolios(PortfoliosCommand::Delete { id }) => {
            commands::delete_portfolio(session, &id).await
        },
        Command::Risk(RiskCommand::Assess {
            portfolio_id,
            parameters,
        }) => commands::assess_risk(session, portfolio_id, parameters).await,
        Command::Risk(RiskCommand::Metrics { portfolio_id }) => {
            commands::risk_metrics(session, &portfolio_id).await
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_override_config() {
        let args = Args::parse_from([
            "portfolio",
            "--api-url",
            "https://api.example.com",
            "--api-prefix",
            "/api",
            "status",
        ]);
        let mut config = Config::default();
        args.apply(&mut config);

        assert_eq!(config.api.base_url, "https://api.example.com");
        assert_eq!(config.api.prefix, "/api");
        assert!(matches!(args.command, Command::Status));
    }

    #[test]
    fn test_wallet_subcommands_parse() {
        let args = Args::parse_from(["portfolio", "wallet", "watch"]);
        assert!(matches!(args.command, Command::Wallet(WalletCommand::Watch)));
    }
}
