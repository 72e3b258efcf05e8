//! Data Transfer Objects (DTOs) for responses.
//!
//! Conversions from entities come in two flavours. Plain scalar payloads use
//! `From`. Payloads that need loaded relations use `TryFrom` and fail with an
//! [`AssemblyError`] when a relation is missing, which is what strict
//! endpoints want. Bulk listings wrap each item in a [`BulkEntry`] instead so
//! one bad record does not sink the whole response.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{
    Country, CountryId, Currency, CurrencyId, Document, DocumentId, ExchangeRateId,
    ProviderExchangeRate, ProviderId, TransferProvider, TransferRule, TransferRuleId,
};
use crate::error::AssemblyError;

// ─────────────────────────────────────────────────────────────────────────────
// Reference DTOs
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CurrencyResponse {
    pub id: CurrencyId,
    #[schema(example = "USD")]
    pub abbreviation: String,
    #[schema(example = "US Dollar")]
    pub name: Option<String>,
    #[schema(example = "$")]
    pub symbol: Option<String>,
}

impl From<&Currency> for CurrencyResponse {
    fn from(currency: &Currency) -> Self {
        Self {
            id: currency.id,
            abbreviation: currency.abbreviation.clone(),
            name: currency.name.clone(),
            symbol: currency.symbol.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CountryResponse {
    pub id: CountryId,
    #[schema(example = "Germany")]
    pub name: String,
    #[schema(example = "DE")]
    pub abbreviation: Option<String>,
    pub local_currency_id: Option<CurrencyId>,
    /// Present when the local currency was loaded with the country
    pub local_currency: Option<CurrencyResponse>,
}

impl From<&Country> for CountryResponse {
    fn from(country: &Country) -> Self {
        Self {
            id: country.id,
            name: country.name.clone(),
            abbreviation: country.abbreviation.clone(),
            local_currency_id: country.local_currency_id,
            local_currency: country
                .local_currency
                .loaded()
                .and_then(Option::as_ref)
                .map(CurrencyResponse::from),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ProviderResponse {
    pub id: ProviderId,
    #[schema(example = "Acme Transfers")]
    pub name: String,
    #[schema(example = "https://acme.example")]
    pub url: String,
}

impl From<&TransferProvider> for ProviderResponse {
    fn from(provider: &TransferProvider) -> Self {
        Self {
            id: provider.id,
            name: provider.name.clone(),
            url: provider.url.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DocumentResponse {
    pub id: DocumentId,
    #[schema(example = "Passport")]
    pub name: String,
}

impl From<&Document> for DocumentResponse {
    fn from(document: &Document) -> Self {
        Self {
            id: document.id,
            name: document.name.clone(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Provider Listing DTOs
// ─────────────────────────────────────────────────────────────────────────────

/// Corridor summary of an active rule, as listed under its provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TransferRuleSummary {
    pub id: TransferRuleId,
    pub send_country: CountryResponse,
    pub receive_country: CountryResponse,
    pub transfer_currency: CurrencyResponse,
}

impl TryFrom<&TransferRule> for TransferRuleSummary {
    type Error = AssemblyError;

    fn try_from(rule: &TransferRule) -> Result<Self, Self::Error> {
        Ok(Self {
            id: rule.id,
            send_country: rule.send_country.require_some("send_country")?.into(),
            receive_country: rule.receive_country.require_some("receive_country")?.into(),
            transfer_currency: rule
                .transfer_currency
                .require_some("transfer_currency")?
                .into(),
        })
    }
}

/// An active provider with its active transfer rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ProviderListItem {
    pub id: ProviderId,
    pub name: String,
    pub url: String,
    pub transfer_rules: Vec<TransferRuleSummary>,
}

impl TryFrom<&TransferProvider> for ProviderListItem {
    type Error = AssemblyError;

    fn try_from(provider: &TransferProvider) -> Result<Self, Self::Error> {
        let transfer_rules = provider
            .transfer_rules
            .require("transfer_rules")?
            .iter()
            .map(TransferRuleSummary::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            id: provider.id,
            name: provider.name.clone(),
            url: provider.url.clone(),
            transfer_rules,
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Transfer Rule DTOs
// ─────────────────────────────────────────────────────────────────────────────

/// A rule with everything a client needs to display it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DetailedTransferRuleResponse {
    pub id: TransferRuleId,
    pub provider: ProviderResponse,
    /// Sending country, with its local currency
    pub send_country: CountryResponse,
    /// Receiving country, with its local currency
    pub receive_country: CountryResponse,
    pub transfer_currency: CurrencyResponse,
    #[schema(example = 1.5)]
    pub fee_percentage: Option<f64>,
    #[schema(example = 2.99)]
    pub fee_fixed: Option<f64>,
    #[schema(example = 10.0)]
    pub min_transfer_amount: f64,
    pub max_transfer_amount: Option<f64>,
    #[schema(example = "bank_transfer")]
    pub transfer_method: String,
    #[schema(example = "1 hour")]
    pub min_transfer_time: Option<String>,
    #[schema(example = "2 days")]
    pub max_transfer_time: Option<String>,
    pub required_documents: Vec<DocumentResponse>,
}

impl TryFrom<&TransferRule> for DetailedTransferRuleResponse {
    type Error = AssemblyError;

    fn try_from(rule: &TransferRule) -> Result<Self, Self::Error> {
        let required_documents = rule
            .required_documents
            .require("required_documents")?
            .iter()
            .map(DocumentResponse::from)
            .collect();

        Ok(Self {
            id: rule.id,
            provider: rule.provider.require_some("provider")?.into(),
            send_country: rule.send_country.require_some("send_country")?.into(),
            receive_country: rule.receive_country.require_some("receive_country")?.into(),
            transfer_currency: rule
                .transfer_currency
                .require_some("transfer_currency")?
                .into(),
            fee_percentage: rule.fee_percentage,
            fee_fixed: rule.fee_fixed,
            min_transfer_amount: rule.min_transfer_amount,
            max_transfer_amount: rule.max_transfer_amount,
            transfer_method: rule.transfer_method.clone(),
            min_transfer_time: rule.min_transfer_time.clone(),
            max_transfer_time: rule.max_transfer_time.clone(),
            required_documents,
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Exchange Rate DTOs
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ExchangeRateResponse {
    pub id: ExchangeRateId,
    pub provider: ProviderResponse,
    pub from_currency: CurrencyResponse,
    pub to_currency: CurrencyResponse,
    /// Units of `to_currency` per unit of `from_currency`
    #[schema(example = 0.91)]
    pub rate: f64,
    pub last_updated: Option<DateTime<Utc>>,
}

impl TryFrom<&ProviderExchangeRate> for ExchangeRateResponse {
    type Error = AssemblyError;

    fn try_from(rate: &ProviderExchangeRate) -> Result<Self, Self::Error> {
        if !rate.rate.is_finite() || rate.rate <= 0.0 {
            return Err(AssemblyError::InvalidValue {
                field: "rate",
                reason: format!("{} is not a positive number", rate.rate),
            });
        }

        Ok(Self {
            id: rate.id,
            provider: rate.provider.require_some("provider")?.into(),
            from_currency: rate.from_currency.require_some("from_currency")?.into(),
            to_currency: rate.to_currency.require_some("to_currency")?.into(),
            rate: rate.rate,
            last_updated: Some(rate.last_updated),
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Bulk Listings
// ─────────────────────────────────────────────────────────────────────────────

/// One slot of a tolerant bulk listing: the assembled item or why it failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BulkEntry<T> {
    Item(T),
    Error { error: String },
}

impl<T> BulkEntry<T> {
    pub fn is_error(&self) -> bool {
        matches!(self, BulkEntry::Error { .. })
    }

    pub fn item(&self) -> Option<&T> {
        match self {
            BulkEntry::Item(item) => Some(item),
            BulkEntry::Error { .. } => None,
        }
    }
}

/// Envelope for tolerant bulk listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BulkResponse<T> {
    pub status: String,
    pub data: Vec<BulkEntry<T>>,
}

impl<T> BulkResponse<T> {
    pub fn success(data: Vec<BulkEntry<T>>) -> Self {
        Self {
            status: "success".to_string(),
            data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Related;

    fn loaded_rate() -> ProviderExchangeRate {
        let mut rate =
            ProviderExchangeRate::new(ProviderId::nil(), CurrencyId::nil(), CurrencyId::nil(), 0.91);
        rate.provider = Related::Loaded(Some(TransferProvider::new("Acme", "https://acme.example")));
        rate.from_currency = Related::Loaded(Some(Currency::new("USD")));
        rate.to_currency = Related::Loaded(Some(Currency::new("EUR")));
        rate
    }

    #[test]
    fn test_exchange_rate_assembles_nested_payload() {
        let response = ExchangeRateResponse::try_from(&loaded_rate()).unwrap();
        assert_eq!(response.rate, 0.91);
        assert_eq!(response.provider.name, "Acme");
        assert_eq!(response.from_currency.abbreviation, "USD");
        assert_eq!(response.to_currency.abbreviation, "EUR");
    }

    #[test]
    fn test_missing_provider_fails_assembly() {
        let mut rate = loaded_rate();
        rate.provider = Related::Loaded(None);
        assert_eq!(
            ExchangeRateResponse::try_from(&rate).unwrap_err(),
            AssemblyError::MissingRelation { relation: "provider" }
        );
    }

    #[test]
    fn test_unloaded_rules_fail_provider_listing() {
        let provider = TransferProvider::new("Acme", "https://acme.example");
        assert!(matches!(
            ProviderListItem::try_from(&provider),
            Err(AssemblyError::RelationNotLoaded { relation: "transfer_rules" })
        ));
    }

    #[test]
    fn test_empty_rules_list_is_serialized() {
        let mut provider = TransferProvider::new("Acme", "https://acme.example");
        provider.transfer_rules = Related::Loaded(Vec::new());
        let item = ProviderListItem::try_from(&provider).unwrap();
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["transfer_rules"], serde_json::json!([]));
    }

    #[test]
    fn test_rule_summary_carries_only_the_corridor() {
        let mut rule = TransferRule::new(
            ProviderId::nil(),
            CountryId::nil(),
            CountryId::nil(),
            CurrencyId::nil(),
            "bank_transfer",
        );
        rule.send_country = Related::Loaded(Some(Country::new("United States")));
        rule.receive_country = Related::Loaded(Some(Country::new("Germany")));
        rule.transfer_currency = Related::Loaded(Some(Currency::new("USD")));

        let summary = TransferRuleSummary::try_from(&rule).unwrap();
        let json = serde_json::to_value(&summary).unwrap();
        let mut keys: Vec<&str> = json.as_object().unwrap().keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(
            keys,
            ["id", "receive_country", "send_country", "transfer_currency"]
        );
    }

    #[test]
    fn test_bulk_entry_shapes() {
        let entries: Vec<BulkEntry<DocumentResponse>> = vec![
            BulkEntry::Item(DocumentResponse::from(&Document::new("Passport"))),
            BulkEntry::Error {
                error: "Failed to process rate x: boom".into(),
            },
        ];
        let json = serde_json::to_value(BulkResponse::success(entries)).unwrap();
        assert_eq!(json["status"], "success");
        assert_eq!(json["data"][0]["name"], "Passport");
        assert_eq!(json["data"][1]["error"], "Failed to process rate x: boom");
    }
}
