use anyhow::Result;
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use serde::Serialize;
use std::path::PathBuf;
use tracing_subscriber::{fmt, EnvFilter};
use tradelink_brokers_coinmate::{
    CoinmateConfig, CoinmateExchange, Credentials, PrivateEndpoint, PublicEndpoint,
};
use tradelink_core::*;

#[derive(Parser)]
#[command(name = "tradelink")]
#[command(about = "Query and trade on CoinMate through the uniform exchange adapter")]
#[command(version)]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// TOML config file
    #[arg(short, long, env = "TRADELINK_CONFIG")]
    config: Option<PathBuf>,

    /// Override the API base URL
    #[arg(long)]
    base_url: Option<String>,

    /// Numeric CoinMate client id
    #[arg(long, env = "COINMATE_CLIENT_ID", hide_env_values = true)]
    client_id: Option<String>,

    /// Public API key
    #[arg(long, env = "COINMATE_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// API secret
    #[arg(long, env = "COINMATE_SECRET", hide_env_values = true)]
    secret: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List supported markets and currencies
    Markets,

    /// Latest ticker for a symbol (e.g. "BTC/EUR")
    Ticker { symbol: String },

    /// Order book snapshot
    #[command(name = "order-book")]
    OrderBook {
        symbol: String,

        /// Only print the best N levels per side
        #[arg(long)]
        depth: Option<usize>,
    },

    /// Recent public trades
    Trades {
        symbol: String,

        /// Lookback window in minutes (defaults to the configured window)
        #[arg(long)]
        minutes: Option<u32>,
    },

    /// Account balances for every supported currency
    Balance,

    /// Buy: market order without --price (amount is quote to spend), limit order with it
    Buy {
        symbol: String,
        amount: Decimal,
        #[arg(long)]
        price: Option<Decimal>,
    },

    /// Sell: market order without --price, limit order with it
    Sell {
        symbol: String,
        amount: Decimal,
        #[arg(long)]
        price: Option<Decimal>,
    },

    /// Cancel an open order
    Cancel { order_id: String },

    /// Call any endpoint by name with key=value parameters and print its raw data
    Call {
        endpoint: String,
        params: Vec<String>,
    },

    /// Print the signed request for a private endpoint without sending it
    Sign {
        endpoint: String,
        params: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = load_config(&cli)?;
    tracing::debug!(base_url = %config.base_url, credentials = ?config.credentials, "Loaded configuration");
    let exchange = CoinmateExchange::from_config(config)?;

    match cli.command {
        Commands::Markets => {
            let registry = exchange.registry();
            print_json(&serde_json::json!({
                "markets": registry.markets(),
                "currencies": registry.currencies(),
            }))?;
        }
        Commands::Ticker { symbol } => {
            print_json(&exchange.fetch_ticker(&symbol).await?)?;
        }
        Commands::OrderBook { symbol, depth } => {
            let mut book = exchange.fetch_order_book(&symbol).await?;
            if let Some(depth) = depth {
                book.bids.truncate(depth);
                book.asks.truncate(depth);
            }
            print_json(&book)?;
        }
        Commands::Trades { symbol, minutes } => {
            let trades = match minutes {
                Some(minutes) => exchange.fetch_trades_since(&symbol, minutes).await?,
                None => exchange.fetch_trades(&symbol).await?,
            };
            tracing::info!(count = trades.len(), symbol = %symbol, "Fetched trades");
            print_json(&trades)?;
        }
        Commands::Balance => {
            print_json(&exchange.fetch_balance().await?)?;
        }
        Commands::Buy {
            symbol,
            amount,
            price,
        } => {
            let ack = exchange
                .create_order(&order_request(&symbol, Side::Buy, amount, price))
                .await?;
            print_json(&ack)?;
        }
        Commands::Sell {
            symbol,
            amount,
            price,
        } => {
            let ack = exchange
                .create_order(&order_request(&symbol, Side::Sell, amount, price))
                .await?;
            print_json(&ack)?;
        }
        Commands::Cancel { order_id } => {
            print_json(&exchange.cancel_order(&order_id, None).await?)?;
        }
        Commands::Call { endpoint, params } => {
            let params = parse_params(&params)?;
            let data = if let Ok(private) = endpoint.parse::<PrivateEndpoint>() {
                exchange.call_private(private, &params).await?
            } else if let Ok(public) = endpoint.parse::<PublicEndpoint>() {
                exchange.call_public(public, &params).await?
            } else {
                anyhow::bail!("Unknown endpoint: {}", endpoint);
            };
            print_json(&data)?;
        }
        Commands::Sign { endpoint, params } => {
            let endpoint: PrivateEndpoint = endpoint.parse().map_err(anyhow::Error::msg)?;
            let params = parse_params(&params)?;
            let request = exchange.sign(
                endpoint.path(),
                endpoint.scope(),
                endpoint.method(),
                &params,
            )?;
            print_json(&request)?;
        }
    }

    Ok(())
}

/// Config file (if any), then command-line / environment overrides.
fn load_config(cli: &Cli) -> Result<CoinmateConfig> {
    let mut config = match &cli.config {
        Some(path) => CoinmateConfig::from_file(path)?,
        None => CoinmateConfig::default(),
    };

    if let Some(base_url) = &cli.base_url {
        config.base_url = base_url.clone();
    }

    let overrides = Credentials {
        client_id: cli.client_id.clone(),
        api_key: cli.api_key.clone(),
        secret: cli.secret.clone(),
    };
    config.credentials = config.credentials.merge(overrides);

    Ok(config)
}

fn order_request(symbol: &str, side: Side, amount: Decimal, price: Option<Decimal>) -> OrderRequest {
    match price {
        Some(price) => OrderRequest::limit(symbol, side, amount, price),
        None => OrderRequest::market(symbol, side, amount),
    }
}

fn parse_params(raw: &[String]) -> Result<Params> {
    raw.iter()
        .map(|pair| match pair.split_once('=') {
            Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
            _ => anyhow::bail!("Expected key=value, got {:?}", pair),
        })
        .collect()
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
