//! # Rates Client SDK
//!
//! A typed Rust client for the Transfer Rates API.

use rates_types::{
    BulkResponse, CountryId, CountryResponse, CurrencyId, CurrencyResponse,
    DetailedTransferRuleResponse, DocumentResponse, ExchangeRateId, ExchangeRateResponse,
    ProviderId, ProviderListItem, ProviderResponse, TransferRuleId,
};
use reqwest::Client;
use serde::de::DeserializeOwned;

/// Error type for client operations.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Transfer Rates API client.
pub struct RatesClient {
    base_url: String,
    http: Client,
}

impl RatesClient {
    /// Creates a new client.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http: Client::new(),
        }
    }

    /// Checks if the API is healthy.
    pub async fn health(&self) -> Result<bool, ClientError> {
        let resp = self.http.get(self.url("/health")).send().await?;
        Ok(resp.status().is_success())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Providers and Rules
    // ─────────────────────────────────────────────────────────────────────────

    /// Lists active providers with their active transfer rules.
    pub async fn list_providers(&self) -> Result<Vec<ProviderListItem>, ClientError> {
        self.get("/api/all-providers").await
    }

    pub async fn get_provider(&self, id: ProviderId) -> Result<ProviderResponse, ClientError> {
        self.get(&format!("/api/provider/{}", id)).await
    }

    pub async fn list_transfer_rules(
        &self,
    ) -> Result<Vec<DetailedTransferRuleResponse>, ClientError> {
        self.get("/api/all-transfer-rules").await
    }

    pub async fn get_transfer_rule(
        &self,
        id: TransferRuleId,
    ) -> Result<DetailedTransferRuleResponse, ClientError> {
        self.get(&format!("/api/transfer-rule/{}", id)).await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Exchange Rates
    // ─────────────────────────────────────────────────────────────────────────

    /// Lists active exchange rates. Entries that failed server-side carry an error.
    pub async fn list_exchange_rates(
        &self,
    ) -> Result<BulkResponse<ExchangeRateResponse>, ClientError> {
        self.get("/api/all-exchange-rates").await
    }

    pub async fn get_exchange_rate(
        &self,
        id: ExchangeRateId,
    ) -> Result<ExchangeRateResponse, ClientError> {
        self.get(&format!("/api/exchange-rate/{}", id)).await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Currencies, Countries and Documents
    // ─────────────────────────────────────────────────────────────────────────

    /// Lists active currencies, optionally only the one with `abbreviation`.
    pub async fn list_currencies(
        &self,
        abbreviation: Option<&str>,
    ) -> Result<Vec<CurrencyResponse>, ClientError> {
        let mut req = self.http.get(self.url("/api/currencies"));
        if let Some(code) = abbreviation {
            req = req.query(&[("abbreviation", code)]);
        }
        let resp = req.send().await?;
        self.handle_response(resp).await
    }

    pub async fn get_currency(&self, id: CurrencyId) -> Result<CurrencyResponse, ClientError> {
        self.get(&format!("/api/currency/{}", id)).await
    }

    pub async fn list_countries(&self) -> Result<Vec<CountryResponse>, ClientError> {
        self.get("/api/countries").await
    }

    pub async fn get_country(&self, id: CountryId) -> Result<CountryResponse, ClientError> {
        self.get(&format!("/api/country/{}", id)).await
    }

    pub async fn list_documents(&self) -> Result<Vec<DocumentResponse>, ClientError> {
        self.get("/api/documents").await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let resp = self.http.get(self.url(path)).send().await?;
        self.handle_response(resp).await
    }

    async fn handle_response<T: DeserializeOwned>(
        &self,
        resp: reqwest::Response,
    ) -> Result<T, ClientError> {
        let status = resp.status();
        if status.is_success() {
            let body = resp.text().await?;
            Ok(serde_json::from_str(&body)?)
        } else {
            let body = resp.text().await.unwrap_or_default();
            let message = serde_json::from_str::<serde_json::Value>(&body)
                .ok()
                .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(String::from))
                .unwrap_or(body);
            Err(ClientError::Api {
                status: status.as_u16(),
                message,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = RatesClient::new("http://localhost:3000");
        assert_eq!(client.base_url, "http://localhost:3000");
    }

    #[test]
    fn test_client_with_trailing_slash() {
        let client = RatesClient::new("http://localhost:3000/");
        assert_eq!(client.url("/api/countries"), "http://localhost:3000/api/countries");
    }

    #[tokio::test]
    async fn test_unreachable_server_is_http_error() {
        let client = RatesClient::new("http://127.0.0.1:9");
        let err = client.list_documents().await.unwrap_err();
        assert!(matches!(err, ClientError::Http(_)));
    }
}
