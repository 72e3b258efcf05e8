//! OpenAPI specification and documentation.

#![allow(dead_code)] // Path functions are only used by utoipa for documentation generation

use rates_types::domain::{
    CountryId, CurrencyId, DocumentId, ExchangeRateId, ProviderId, TransferRuleId,
};
use rates_types::dto::{
    CountryResponse, CurrencyResponse, DetailedTransferRuleResponse, DocumentResponse,
    ExchangeRateResponse, ProviderListItem, ProviderResponse, TransferRuleSummary,
};
use utoipa::OpenApi;

use crate::inbound::handlers::CurrencyQuery;

// Dummy functions to generate path documentation
// These are not the actual handlers, just for OpenAPI path generation

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Service is healthy", body = inline(serde_json::Value), example = json!({"status": "healthy"}))
    )
)]
async fn health() {}

/// List active providers with their active transfer rules
#[utoipa::path(
    get,
    path = "/api/all-providers",
    tag = "providers",
    responses(
        (status = 200, description = "Active providers", body = Vec<ProviderListItem>),
        (status = 500, description = "Storage or assembly failure")
    )
)]
async fn list_providers() {}

/// Get an active provider by ID
#[utoipa::path(
    get,
    path = "/api/provider/{id}",
    tag = "providers",
    params(
        ("id" = String, Path, description = "Provider ID (UUID)")
    ),
    responses(
        (status = 200, description = "Provider found", body = ProviderResponse),
        (status = 400, description = "Invalid provider ID"),
        (status = 404, description = "Provider not found or inactive")
    )
)]
async fn get_provider() {}

/// List active transfer rules
#[utoipa::path(
    get,
    path = "/api/all-transfer-rules",
    tag = "transfer-rules",
    responses(
        (status = 200, description = "Active transfer rules", body = Vec<DetailedTransferRuleResponse>),
        (status = 500, description = "Storage or assembly failure")
    )
)]
async fn list_transfer_rules() {}

/// Get an active transfer rule by ID
#[utoipa::path(
    get,
    path = "/api/transfer-rule/{id}",
    tag = "transfer-rules",
    params(
        ("id" = String, Path, description = "Transfer rule ID (UUID)")
    ),
    responses(
        (status = 200, description = "Transfer rule found", body = DetailedTransferRuleResponse),
        (status = 400, description = "Invalid transfer rule ID"),
        (status = 404, description = "Transfer rule not found or inactive")
    )
)]
async fn get_transfer_rule() {}

/// List active exchange rates
///
/// Each slot of `data` holds either a rate or `{"error": "..."}` when that
/// rate could not be decoded or assembled.
#[utoipa::path(
    get,
    path = "/api/all-exchange-rates",
    tag = "exchange-rates",
    responses(
        (status = 200, description = "Exchange rates envelope", body = inline(serde_json::Value),
            example = json!({"status": "success", "data": [{"error": "Failed to process rate 6f1c...: related `provider` is missing"}]}))
    )
)]
async fn list_exchange_rates() {}

/// Get an active exchange rate by ID
#[utoipa::path(
    get,
    path = "/api/exchange-rate/{id}",
    tag = "exchange-rates",
    params(
        ("id" = String, Path, description = "Exchange rate ID (UUID)")
    ),
    responses(
        (status = 200, description = "Exchange rate found", body = ExchangeRateResponse),
        (status = 400, description = "Invalid exchange rate ID"),
        (status = 404, description = "Exchange rate not found, inactive, or its provider is inactive")
    )
)]
async fn get_exchange_rate() {}

/// List active currencies
#[utoipa::path(
    get,
    path = "/api/currencies",
    tag = "currencies",
    params(CurrencyQuery),
    responses(
        (status = 200, description = "Active currencies", body = Vec<CurrencyResponse>)
    )
)]
async fn list_currencies() {}

/// Get an active currency by ID
#[utoipa::path(
    get,
    path = "/api/currency/{id}",
    tag = "currencies",
    params(
        ("id" = String, Path, description = "Currency ID (UUID)")
    ),
    responses(
        (status = 200, description = "Currency found", body = CurrencyResponse),
        (status = 400, description = "Invalid currency ID"),
        (status = 404, description = "Currency not found or inactive")
    )
)]
async fn get_currency() {}

/// List active countries with their local currency
#[utoipa::path(
    get,
    path = "/api/countries",
    tag = "countries",
    responses(
        (status = 200, description = "Active countries", body = Vec<CountryResponse>)
    )
)]
async fn list_countries() {}

/// Get an active country by ID
#[utoipa::path(
    get,
    path = "/api/country/{id}",
    tag = "countries",
    params(
        ("id" = String, Path, description = "Country ID (UUID)")
    ),
    responses(
        (status = 200, description = "Country found", body = CountryResponse),
        (status = 400, description = "Invalid country ID"),
        (status = 404, description = "Country not found or inactive")
    )
)]
async fn get_country() {}

/// List active documents
#[utoipa::path(
    get,
    path = "/api/documents",
    tag = "documents",
    responses(
        (status = 200, description = "Active documents", body = Vec<DocumentResponse>)
    )
)]
async fn list_documents() {}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Transfer Rates Service API",
        version = "1.0.0",
        description = "Read-only reference data for money transfers: providers, transfer rules, exchange rates, currencies, countries and required documents.\n\nOnly active records are ever returned. Exchange rates and rules are hidden when their provider is inactive.",
        license(name = "MIT"),
    ),
    paths(
        health,
        list_providers,
        get_provider,
        list_transfer_rules,
        get_transfer_rule,
        list_exchange_rates,
        get_exchange_rate,
        list_currencies,
        get_currency,
        list_countries,
        get_country,
        list_documents,
    ),
    components(
        schemas(
            ProviderListItem,
            TransferRuleSummary,
            ProviderResponse,
            DetailedTransferRuleResponse,
            ExchangeRateResponse,
            CurrencyResponse,
            CountryResponse,
            DocumentResponse,
            ProviderId,
            TransferRuleId,
            ExchangeRateId,
            CurrencyId,
            CountryId,
            DocumentId,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "providers", description = "Transfer providers"),
        (name = "transfer-rules", description = "Corridor fees, limits and required documents"),
        (name = "exchange-rates", description = "Provider exchange rates"),
        (name = "currencies", description = "Currencies"),
        (name = "countries", description = "Countries and their local currency"),
        (name = "documents", description = "Documents a transfer may require"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_route_is_documented() {
        let doc = ApiDoc::openapi();
        for path in [
            "/health",
            "/api/all-providers",
            "/api/provider/{id}",
            "/api/all-transfer-rules",
            "/api/transfer-rule/{id}",
            "/api/all-exchange-rates",
            "/api/exchange-rate/{id}",
            "/api/currencies",
            "/api/currency/{id}",
            "/api/countries",
            "/api/country/{id}",
            "/api/documents",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }
}
