//! HTTP request handlers.

use std::str::FromStr;
use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;

use rates_types::{
    AppError, CountryId, CurrencyId, ExchangeRateId, ObjectCache, ProviderId,
    ReferenceRepository, TransferRuleId,
};

use crate::ReferenceService;

/// Application state shared across handlers.
pub struct AppState<R: ReferenceRepository, C: ObjectCache> {
    pub service: ReferenceService<R, C>,
}

/// Wrapper to implement IntoResponse for AppError (orphan rule workaround).
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
        };

        let body = serde_json::json!({
            "error": message,
            "code": status.as_u16()
        });

        (status, Json(body)).into_response()
    }
}

/// Parses a path segment into a typed id, rejecting anything that is not a UUID.
fn parse_id<T: FromStr>(raw: &str, label: &str) -> Result<T, ApiError> {
    raw.parse()
        .map_err(|_| ApiError(AppError::BadRequest(format!("Invalid {} ID", label))))
}

/// Query string of the currency listing.
#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
pub struct CurrencyQuery {
    /// Only return the currency with this code (case-insensitive)
    pub abbreviation: Option<String>,
}

/// Health check endpoint.
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "healthy" }))
}

// ─────────────────────────────────────────────────────────────────────────────
// Providers and Rules
// ─────────────────────────────────────────────────────────────────────────────

/// List active providers with their active rules.
#[tracing::instrument(skip(state))]
pub async fn list_providers<R: ReferenceRepository, C: ObjectCache>(
    State(state): State<Arc<AppState<R, C>>>,
) -> Result<impl IntoResponse, ApiError> {
    let providers = state.service.list_providers().await?;
    Ok(Json(providers))
}

#[tracing::instrument(skip(state), fields(provider_id = %id))]
pub async fn get_provider<R: ReferenceRepository, C: ObjectCache>(
    State(state): State<Arc<AppState<R, C>>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let provider_id: ProviderId = parse_id(&id, "provider")?;
    let provider = state.service.get_provider(provider_id).await?;
    Ok(Json(provider))
}

#[tracing::instrument(skip(state))]
pub async fn list_transfer_rules<R: ReferenceRepository, C: ObjectCache>(
    State(state): State<Arc<AppState<R, C>>>,
) -> Result<impl IntoResponse, ApiError> {
    let rules = state.service.list_transfer_rules().await?;
    Ok(Json(rules))
}

#[tracing::instrument(skip(state), fields(rule_id = %id))]
pub async fn get_transfer_rule<R: ReferenceRepository, C: ObjectCache>(
    State(state): State<Arc<AppState<R, C>>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let rule_id: TransferRuleId = parse_id(&id, "transfer rule")?;
    let rule = state.service.get_transfer_rule(rule_id).await?;
    Ok(Json(rule))
}

// ─────────────────────────────────────────────────────────────────────────────
// Exchange Rates
// ─────────────────────────────────────────────────────────────────────────────

/// List active exchange rates. Rates that fail to assemble are reported inline.
#[tracing::instrument(skip(state))]
pub async fn list_exchange_rates<R: ReferenceRepository, C: ObjectCache>(
    State(state): State<Arc<AppState<R, C>>>,
) -> Result<impl IntoResponse, ApiError> {
    let rates = state.service.list_exchange_rates().await?;
    Ok(Json(rates))
}

#[tracing::instrument(skip(state), fields(rate_id = %id))]
pub async fn get_exchange_rate<R: ReferenceRepository, C: ObjectCache>(
    State(state): State<Arc<AppState<R, C>>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let rate_id: ExchangeRateId = parse_id(&id, "exchange rate")?;
    let rate = state.service.get_exchange_rate(rate_id).await?;
    Ok(Json(rate))
}

// ─────────────────────────────────────────────────────────────────────────────
// Currencies, Countries and Documents
// ─────────────────────────────────────────────────────────────────────────────

#[tracing::instrument(skip(state))]
pub async fn list_currencies<R: ReferenceRepository, C: ObjectCache>(
    State(state): State<Arc<AppState<R, C>>>,
    Query(query): Query<CurrencyQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let currencies = state.service.list_currencies(query.abbreviation).await?;
    Ok(Json(currencies))
}

#[tracing::instrument(skip(state), fields(currency_id = %id))]
pub async fn get_currency<R: ReferenceRepository, C: ObjectCache>(
    State(state): State<Arc<AppState<R, C>>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let currency_id: CurrencyId = parse_id(&id, "currency")?;
    let currency = state.service.get_currency(currency_id).await?;
    Ok(Json(currency))
}

#[tracing::instrument(skip(state))]
pub async fn list_countries<R: ReferenceRepository, C: ObjectCache>(
    State(state): State<Arc<AppState<R, C>>>,
) -> Result<impl IntoResponse, ApiError> {
    let countries = state.service.list_countries().await?;
    Ok(Json(countries))
}

#[tracing::instrument(skip(state), fields(country_id = %id))]
pub async fn get_country<R: ReferenceRepository, C: ObjectCache>(
    State(state): State<Arc<AppState<R, C>>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let country_id: CountryId = parse_id(&id, "country")?;
    let country = state.service.get_country(country_id).await?;
    Ok(Json(country))
}

#[tracing::instrument(skip(state))]
pub async fn list_documents<R: ReferenceRepository, C: ObjectCache>(
    State(state): State<Arc<AppState<R, C>>>,
) -> Result<impl IntoResponse, ApiError> {
    let documents = state.service.list_documents().await?;
    Ok(Json(documents))
}
