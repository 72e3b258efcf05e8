//! HTTP-level tests for the reference data API.
//!
//! Requests go through the full router (tracing layer included) against an
//! in-memory SQLite repository.

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use rates_hex::{ReferenceService, inbound::HttpServer};
use rates_repo::{MemoryCache, SqliteRepo};
use rates_types::{
    Country, Currency, Document, ProviderExchangeRate, ReferenceRepository, TransferProvider,
    TransferRule,
};
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

struct Seeded {
    app: Router,
    usd: Currency,
    de: Country,
    acme: TransferProvider,
    rule: TransferRule,
    rate: ProviderExchangeRate,
}

async fn seeded_app() -> Seeded {
    let repo = SqliteRepo::new("sqlite::memory:", 1).await.unwrap();

    let usd = repo
        .insert(Currency::new("USD").with_name("US Dollar").with_symbol("$"))
        .await
        .unwrap();
    let eur = repo.insert(Currency::new("EUR")).await.unwrap();
    let us = repo
        .insert(Country::new("United States").with_abbreviation("US").with_local_currency(usd.id))
        .await
        .unwrap();
    let de = repo
        .insert(Country::new("Germany").with_abbreviation("DE").with_local_currency(eur.id))
        .await
        .unwrap();
    let acme = repo
        .insert(TransferProvider::new("Acme", "https://acme.example"))
        .await
        .unwrap();
    let rule = repo
        .insert(
            TransferRule::new(acme.id, us.id, de.id, usd.id, "bank_transfer")
                .with_fees(Some(1.5), None)
                .with_times(Some("1 hour"), Some("2 days")),
        )
        .await
        .unwrap();
    let passport = repo.insert(Document::new("Passport")).await.unwrap();
    repo.link(
        TransferRule::REQUIRED_DOCUMENTS,
        rule.id.into_uuid(),
        passport.id.into_uuid(),
    )
    .await
    .unwrap();
    let rate = repo
        .insert(ProviderExchangeRate::new(acme.id, usd.id, eur.id, 0.91))
        .await
        .unwrap();

    let server = HttpServer::new(ReferenceService::new(repo, MemoryCache::new()));
    Seeded {
        app: server.router(),
        usd,
        de,
        acme,
        rule,
        rate,
    }
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

#[tokio::test]
async fn test_health() {
    let s = seeded_app().await;
    let (status, body) = get(&s.app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_exchange_rate_by_id() {
    let s = seeded_app().await;
    let (status, body) = get(&s.app, &format!("/api/exchange-rate/{}", s.rate.id)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["provider"]["name"], "Acme");
    assert_eq!(body["from_currency"]["abbreviation"], "USD");
    assert_eq!(body["to_currency"]["abbreviation"], "EUR");
    assert_eq!(body["rate"], 0.91);
    assert!(body["last_updated"].is_string());
}

#[tokio::test]
async fn test_exchange_rate_listing_envelope() {
    let s = seeded_app().await;
    let (status, body) = get(&s.app, "/api/all-exchange-rates").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    let data = body["data"].as_array().unwrap();
    assert_eq!(data.len(), 1);
    assert_eq!(data[0]["id"], s.rate.id.to_string());
}

#[tokio::test]
async fn test_provider_listing_nests_rules() {
    let s = seeded_app().await;
    let (status, body) = get(&s.app, "/api/all-providers").await;

    assert_eq!(status, StatusCode::OK);
    let providers = body.as_array().unwrap();
    assert_eq!(providers.len(), 1);
    assert_eq!(providers[0]["id"], s.acme.id.to_string());

    let rules = providers[0]["transfer_rules"].as_array().unwrap();
    assert_eq!(rules.len(), 1);
    assert_eq!(rules[0]["receive_country"]["name"], "Germany");
    assert_eq!(rules[0]["transfer_currency"]["abbreviation"], "USD");
}

#[tokio::test]
async fn test_transfer_rule_detail() {
    let s = seeded_app().await;
    let (status, body) = get(&s.app, &format!("/api/transfer-rule/{}", s.rule.id)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["fee_percentage"], 1.5);
    assert!(body["fee_fixed"].is_null());
    assert_eq!(body["min_transfer_time"], "1 hour");
    assert_eq!(body["send_country"]["local_currency"]["abbreviation"], "USD");
    assert_eq!(body["required_documents"][0]["name"], "Passport");

    let (status, rules) = get(&s.app, "/api/all-transfer-rules").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(rules.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_currency_endpoints() {
    let s = seeded_app().await;

    let (status, body) = get(&s.app, "/api/currencies").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);

    let (_, filtered) = get(&s.app, "/api/currencies?abbreviation=usd").await;
    let filtered = filtered.as_array().unwrap();
    assert_eq!(filtered.len(), 1);
    assert_eq!(filtered[0]["symbol"], "$");

    let (status, body) = get(&s.app, &format!("/api/currency/{}", s.usd.id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "US Dollar");
}

#[tokio::test]
async fn test_country_and_document_endpoints() {
    let s = seeded_app().await;

    let (status, body) = get(&s.app, "/api/countries").await;
    assert_eq!(status, StatusCode::OK);
    let countries = body.as_array().unwrap();
    assert_eq!(countries.len(), 2);
    assert!(countries.iter().all(|c| c["local_currency"].is_object()));

    let (status, body) = get(&s.app, &format!("/api/country/{}", s.de.id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["abbreviation"], "DE");

    let (status, body) = get(&s.app, "/api/documents").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["name"], "Passport");
}

#[tokio::test]
async fn test_provider_by_id() {
    let s = seeded_app().await;
    let (status, body) = get(&s.app, &format!("/api/provider/{}", s.acme.id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["url"], "https://acme.example");
}

#[tokio::test]
async fn test_unknown_id_is_404_with_error_body() {
    let s = seeded_app().await;
    let id = Uuid::new_v4();
    let (status, body) = get(&s.app, &format!("/api/currency/{id}")).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], 404);
    assert_eq!(body["error"], format!("Currency not found with id: {id}"));
}

#[tokio::test]
async fn test_malformed_id_is_400() {
    let s = seeded_app().await;
    for uri in [
        "/api/provider/not-a-uuid",
        "/api/transfer-rule/123",
        "/api/exchange-rate/xyz",
        "/api/currency/usd",
        "/api/country/de",
    ] {
        let (status, body) = get(&s.app, uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(body["code"], 400);
    }
}

#[tokio::test]
async fn test_openapi_document_is_served() {
    let s = seeded_app().await;
    let (status, body) = get(&s.app, "/api-docs/openapi.json").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"]["/api/all-exchange-rates"].is_object());
}
