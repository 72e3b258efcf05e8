//! Rates CLI
//!
//! Command-line interface for the Transfer Rates API.

use anyhow::Result;
use clap::{Parser, Subcommand};
use serde::Serialize;

use rates_client::RatesClient;

#[derive(Parser)]
#[command(name = "rates")]
#[command(author, version, about = "Transfer Rates API CLI client", long_about = None)]
struct Cli {
    /// Base URL of the Transfer Rates API
    #[arg(long, env = "RATES_API_URL", default_value = "http://localhost:3000")]
    api_url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Transfer providers
    Provider {
        #[command(subcommand)]
        action: LookupCommands,
    },
    /// Transfer rules
    Rule {
        #[command(subcommand)]
        action: LookupCommands,
    },
    /// Provider exchange rates
    Rate {
        #[command(subcommand)]
        action: LookupCommands,
    },
    /// Currencies
    Currency {
        #[command(subcommand)]
        action: CurrencyCommands,
    },
    /// Countries
    Country {
        #[command(subcommand)]
        action: LookupCommands,
    },
    /// Documents a transfer may require
    Document {
        #[command(subcommand)]
        action: DocumentCommands,
    },
    /// Check API health
    Health,
}

#[derive(Subcommand)]
enum LookupCommands {
    /// List all active records
    List,
    /// Get one active record
    Get {
        /// Record ID (UUID)
        id: String,
    },
}

#[derive(Subcommand)]
enum CurrencyCommands {
    /// List active currencies
    List {
        /// Only show the currency with this code
        #[arg(long)]
        abbreviation: Option<String>,
    },
    /// Get a currency
    Get {
        /// Currency ID (UUID)
        id: String,
    },
}

#[derive(Subcommand)]
enum DocumentCommands {
    /// List active documents
    List,
}

fn parse_id<T: std::str::FromStr>(s: &str, label: &str) -> Result<T> {
    s.parse()
        .map_err(|_| anyhow::anyhow!("Invalid {} ID: {}", label, s))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let client = RatesClient::new(&cli.api_url);

    match cli.command {
        Commands::Health => {
            let healthy = client.health().await?;
            if healthy {
                println!("✓ API is healthy");
            } else {
                println!("✗ API is not healthy");
                std::process::exit(1);
            }
        }
        Commands::Provider { action } => match action {
            LookupCommands::List => print_json(&client.list_providers().await?)?,
            LookupCommands::Get { id } => {
                let id = parse_id(&id, "provider")?;
                print_json(&client.get_provider(id).await?)?
            }
        },
        Commands::Rule { action } => match action {
            LookupCommands::List => print_json(&client.list_transfer_rules().await?)?,
            LookupCommands::Get { id } => {
                let id = parse_id(&id, "transfer rule")?;
                print_json(&client.get_transfer_rule(id).await?)?
            }
        },
        Commands::Rate { action } => match action {
            LookupCommands::List => print_json(&client.list_exchange_rates().await?)?,
            LookupCommands::Get { id } => {
                let id = parse_id(&id, "exchange rate")?;
                print_json(&client.get_exchange_rate(id).await?)?
            }
        },
        Commands::Currency { action } => match action {
            CurrencyCommands::List { abbreviation } => {
                print_json(&client.list_currencies(abbreviation.as_deref()).await?)?
            }
            CurrencyCommands::Get { id } => {
                let id = parse_id(&id, "currency")?;
                print_json(&client.get_currency(id).await?)?
            }
        },
        Commands::Country { action } => match action {
            LookupCommands::List => print_json(&client.list_countries().await?)?,
            LookupCommands::Get { id } => {
                let id = parse_id(&id, "country")?;
                print_json(&client.get_country(id).await?)?
            }
        },
        Commands::Document { action } => match action {
            DocumentCommands::List => print_json(&client.list_documents().await?)?,
        },
    }

    Ok(())
}
