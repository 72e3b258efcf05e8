//! Client example: seeds reference data and reads it back over HTTP.
//!
//! Run with: cargo run -p rates-app --example client_example

use rates_client::RatesClient;
use rates_hex::{ReferenceService, inbound::HttpServer};
use rates_repo::{MemoryCache, build_repo};
use rates_types::{
    Country, Currency, Document, ProviderExchangeRate, ReferenceRepository, TransferProvider,
    TransferRule,
};
use std::net::SocketAddr;
use tempfile::tempdir;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt().with_env_filter("info").init();

    // Find an available port
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr: SocketAddr = listener.local_addr()?;
    let port = addr.port();
    drop(listener);

    // Use a temp file-backed SQLite DB
    let tmp = tempdir()?;
    let db_path = tmp.path().join("rates.db");
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());

    println!("🚀 Starting server on port {port}...");
    println!("   Database: {db_url}");

    // Build repository (handles connection and migration)
    let repo = build_repo(&db_url, 5).await?;

    // ─────────────────────────────────────────────────────────────────────────
    // Seed reference data
    // ─────────────────────────────────────────────────────────────────────────

    let usd = repo
        .insert(Currency::new("USD").with_name("US Dollar").with_symbol("$"))
        .await?;
    let eur = repo
        .insert(Currency::new("EUR").with_name("Euro").with_symbol("€"))
        .await?;
    let us = repo
        .insert(Country::new("United States").with_abbreviation("US").with_local_currency(usd.id))
        .await?;
    let de = repo
        .insert(Country::new("Germany").with_abbreviation("DE").with_local_currency(eur.id))
        .await?;
    let acme = repo
        .insert(TransferProvider::new("Acme Transfers", "https://acme.example"))
        .await?;
    let rule = repo
        .insert(
            TransferRule::new(acme.id, us.id, de.id, usd.id, "bank_transfer")
                .with_fees(Some(1.5), Some(2.99))
                .with_amounts(10.0, Some(5000.0))
                .with_times(Some("1 hour"), Some("2 days")),
        )
        .await?;
    let passport = repo.insert(Document::new("Passport")).await?;
    repo.link(
        TransferRule::REQUIRED_DOCUMENTS,
        rule.id.into_uuid(),
        passport.id.into_uuid(),
    )
    .await?;
    let rate = repo
        .insert(ProviderExchangeRate::new(acme.id, usd.id, eur.id, 0.91))
        .await?;

    // Start server in background
    let service = ReferenceService::new(repo, MemoryCache::new());
    let server = HttpServer::new(service);
    let router = server.router();

    let server_addr = format!("127.0.0.1:{port}");
    let listener = TcpListener::bind(&server_addr).await?;
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, router.into_make_service()).await {
            eprintln!("server error: {e}");
        }
    });

    // Create client
    let base_url = format!("http://127.0.0.1:{port}");
    let client = RatesClient::new(&base_url);

    // ─────────────────────────────────────────────────────────────────────────
    // Demo: read everything back
    // ─────────────────────────────────────────────────────────────────────────

    println!("\n🩺 Health: {}", client.health().await?);

    let providers = client.list_providers().await?;
    println!("\n🏦 Providers:");
    for provider in &providers {
        println!("   {} ({} rules)", provider.name, provider.transfer_rules.len());
    }

    let detailed = client.get_transfer_rule(rule.id).await?;
    println!(
        "\n📜 Rule {} → {} via {}: {:?}% + {:?} fee, documents: {:?}",
        detailed.send_country.name,
        detailed.receive_country.name,
        detailed.transfer_method,
        detailed.fee_percentage,
        detailed.fee_fixed,
        detailed
            .required_documents
            .iter()
            .map(|d| d.name.as_str())
            .collect::<Vec<_>>()
    );

    let quote = client.get_exchange_rate(rate.id).await?;
    println!(
        "\n💱 {} quotes 1 {} = {} {}",
        quote.provider.name, quote.from_currency.abbreviation, quote.rate, quote.to_currency.abbreviation
    );

    let listing = client.list_exchange_rates().await?;
    println!("   {} rate(s), status {}", listing.data.len(), listing.status);

    let currencies = client.list_currencies(Some("eur")).await?;
    println!("\n💶 Currencies matching EUR: {}", currencies.len());

    let country = client.get_country(de.id).await?;
    println!("🌍 {} uses currency {:?}", country.name, country.local_currency_id);

    println!("\n✅ Done");
    Ok(())
}
