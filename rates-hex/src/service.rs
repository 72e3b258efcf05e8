//! Reference Data Application Service
//!
//! Orchestrates reads through the repository and cache ports.
//! Contains NO infrastructure logic - only retrieval policy and response assembly.

use std::collections::HashMap;
use std::time::Duration;

use uuid::Uuid;

use rates_types::{
    AppError, BulkEntry, BulkResponse, Country, CountryId, CountryResponse, Currency, CurrencyId,
    CurrencyResponse, DetailedTransferRuleResponse, DocumentResponse, Entity,
    ExchangeRateId, ExchangeRateResponse, ObjectCache, Predicate, ProviderId, ProviderListItem,
    ProviderExchangeRate, ProviderResponse, ReferenceRepository, RepoError, TransferProvider,
    TransferRule, TransferRuleId,
};

use crate::plans;

/// Default lifetime of a cached object snapshot.
pub const DEFAULT_OBJECT_TTL: Duration = Duration::from_secs(60);

/// Default lifetime of a cached currency snapshot.
pub const DEFAULT_CURRENCY_TTL: Duration = Duration::from_secs(1800);

// ─────────────────────────────────────────────────────────────────────────────
// Cache Policy
// ─────────────────────────────────────────────────────────────────────────────

/// Time-to-live per entity class for cache-aside lookups.
#[derive(Debug, Clone)]
pub struct CachePolicy {
    default_ttl: Duration,
    overrides: HashMap<&'static str, Duration>,
}

impl CachePolicy {
    /// A policy with one TTL for every entity class.
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            default_ttl,
            overrides: HashMap::new(),
        }
    }

    /// Overrides the TTL for entity `E`.
    pub fn with_ttl_for<E: Entity>(mut self, ttl: Duration) -> Self {
        self.overrides.insert(E::META.name, ttl);
        self
    }

    pub fn ttl_for<E: Entity>(&self) -> Duration {
        self.overrides
            .get(E::META.name)
            .copied()
            .unwrap_or(self.default_ttl)
    }
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self::new(DEFAULT_OBJECT_TTL).with_ttl_for::<Currency>(DEFAULT_CURRENCY_TTL)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Reference Service
// ─────────────────────────────────────────────────────────────────────────────

/// Application service for reference data reads.
///
/// Generic over the repository and cache ports - adapters are injected at
/// compile time, so tests run against an in-memory mock.
pub struct ReferenceService<R: ReferenceRepository, C: ObjectCache> {
    repo: R,
    cache: C,
    policy: CachePolicy,
}

/// The service as wired by the server binary.
pub type DefaultService = ReferenceService<rates_repo::Repo, rates_repo::MemoryCache>;

impl<R: ReferenceRepository, C: ObjectCache> ReferenceService<R, C> {
    /// Creates a service with the default cache policy.
    pub fn new(repo: R, cache: C) -> Self {
        Self::with_policy(repo, cache, CachePolicy::default())
    }

    pub fn with_policy(repo: R, cache: C, policy: CachePolicy) -> Self {
        Self {
            repo,
            cache,
            policy,
        }
    }

    /// Returns a reference to the underlying repository.
    pub fn repo(&self) -> &R {
        &self.repo
    }

    pub fn cache(&self) -> &C {
        &self.cache
    }

    pub fn policy(&self) -> &CachePolicy {
        &self.policy
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Generic Retrieval
    // ─────────────────────────────────────────────────────────────────────────────

    /// All active rows of `E` matching every filter.
    pub async fn list_active<E: Entity>(&self, filters: Vec<Predicate>) -> Result<Vec<E>, AppError> {
        self.repo
            .fetch_all(E::active().filters(filters))
            .await
            .map_err(storage_error)
    }

    /// Cache-aside lookup of one active row.
    ///
    /// A hit is rebuilt from its scalar snapshot, so relations come back
    /// `NotLoaded`. Misses are never cached.
    pub async fn get_object_by_id<E: Entity>(&self, id: Uuid) -> Result<E, AppError> {
        let name = E::META.name;
        let key = E::cache_key(id);

        if let Some(snapshot) = self.cache.get(&key).await {
            match E::from_record(&snapshot) {
                Ok(entity) => {
                    tracing::info!("Retrieved {} {} from cache", name, id);
                    return Ok(entity);
                }
                Err(e) => {
                    tracing::warn!(key = %key, error = %e, "Discarding undecodable cache snapshot");
                }
            }
        }

        let found = self
            .repo
            .fetch_optional(E::active().by_id(id))
            .await
            .map_err(storage_error)?;

        match found {
            Some(entity) => {
                self.cache
                    .set(&key, entity.to_record(), self.policy.ttl_for::<E>())
                    .await;
                tracing::info!("Found active {}: {}", name, id);
                Ok(entity)
            }
            None => {
                tracing::warn!("Active {} not found for id: {}", name, id);
                Err(not_found::<E>(id))
            }
        }
    }

    /// Flips the active flag of one row and drops its cached snapshot.
    pub async fn set_active<E: Entity>(&self, id: Uuid, active: bool) -> Result<(), AppError> {
        let updated = self
            .repo
            .set_active::<E>(id, active)
            .await
            .map_err(storage_error)?;
        if !updated {
            return Err(not_found::<E>(id));
        }

        self.cache.remove(&E::cache_key(id)).await;
        tracing::info!(entity = E::META.name, %id, active, "Active flag updated");
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Providers
    // ─────────────────────────────────────────────────────────────────────────────

    /// Active providers, each with its active transfer rules.
    #[tracing::instrument(skip(self))]
    pub async fn list_providers(&self) -> Result<Vec<ProviderListItem>, AppError> {
        let providers = self
            .repo
            .fetch_all(plans::providers_with_rules())
            .await
            .map_err(storage_error)?;

        assemble_all(&providers, |p| ProviderListItem::try_from(p))
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_provider(&self, id: ProviderId) -> Result<ProviderResponse, AppError> {
        let provider = self
            .get_object_by_id::<TransferProvider>(id.into_uuid())
            .await?;
        Ok(ProviderResponse::from(&provider))
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Transfer Rules
    // ─────────────────────────────────────────────────────────────────────────────

    #[tracing::instrument(skip(self))]
    pub async fn list_transfer_rules(&self) -> Result<Vec<DetailedTransferRuleResponse>, AppError> {
        let rules = self
            .repo
            .fetch_all(plans::detailed_rules())
            .await
            .map_err(storage_error)?;

        assemble_all(&rules, |r| DetailedTransferRuleResponse::try_from(r))
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_transfer_rule(
        &self,
        id: TransferRuleId,
    ) -> Result<DetailedTransferRuleResponse, AppError> {
        let rule = self
            .repo
            .fetch_optional(plans::detailed_rules().by_id(id.into_uuid()))
            .await
            .map_err(storage_error)?
            .ok_or_else(|| not_found::<TransferRule>(id))?;

        DetailedTransferRuleResponse::try_from(&rule).map_err(|e| {
            tracing::error!(rule_id = %id, error = %e, "Failed to assemble transfer rule");
            AppError::from(e)
        })
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Exchange Rates
    // ─────────────────────────────────────────────────────────────────────────────

    /// Active rates.
    ///
    /// Each rate is decoded and assembled on its own; one that fails is
    /// reported in its slot instead of failing the listing.
    #[tracing::instrument(skip(self))]
    pub async fn list_exchange_rates(&self) -> Result<BulkResponse<ExchangeRateResponse>, AppError> {
        let rates = self
            .repo
            .fetch_each(plans::exchange_rates())
            .await
            .map_err(storage_error)?;

        let data = rates
            .into_iter()
            .map(|(id, decoded)| {
                let assembled = decoded
                    .map_err(|e| e.to_string())
                    .and_then(|rate| ExchangeRateResponse::try_from(&rate).map_err(|e| e.to_string()));
                match assembled {
                    Ok(response) => BulkEntry::Item(response),
                    Err(reason) => {
                        let error = format!("Failed to process rate {}: {}", id, reason);
                        tracing::error!("{}", error);
                        BulkEntry::Error { error }
                    }
                }
            })
            .collect();

        Ok(BulkResponse::success(data))
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_exchange_rate(
        &self,
        id: ExchangeRateId,
    ) -> Result<ExchangeRateResponse, AppError> {
        let rate = self
            .repo
            .fetch_optional(plans::exchange_rate(id.into_uuid()))
            .await
            .map_err(storage_error)?
            .ok_or_else(|| not_found::<ProviderExchangeRate>(id))?;

        ExchangeRateResponse::try_from(&rate).map_err(|e| {
            tracing::error!(rate_id = %id, error = %e, "Failed to assemble exchange rate");
            AppError::from(e)
        })
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Currencies, Countries and Documents
    // ─────────────────────────────────────────────────────────────────────────────

    #[tracing::instrument(skip(self))]
    pub async fn list_currencies(
        &self,
        abbreviation: Option<String>,
    ) -> Result<Vec<CurrencyResponse>, AppError> {
        let currencies = self
            .repo
            .fetch_all(plans::currencies(abbreviation.as_deref()))
            .await
            .map_err(storage_error)?;
        Ok(currencies.iter().map(CurrencyResponse::from).collect())
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_currency(&self, id: CurrencyId) -> Result<CurrencyResponse, AppError> {
        let currency = self.get_object_by_id::<Currency>(id.into_uuid()).await?;
        Ok(CurrencyResponse::from(&currency))
    }

    #[tracing::instrument(skip(self))]
    pub async fn list_countries(&self) -> Result<Vec<CountryResponse>, AppError> {
        let countries = self
            .repo
            .fetch_all(plans::countries())
            .await
            .map_err(storage_error)?;
        Ok(countries.iter().map(CountryResponse::from).collect())
    }

    /// Cached lookup; the local currency is reported by id only.
    #[tracing::instrument(skip(self))]
    pub async fn get_country(&self, id: CountryId) -> Result<CountryResponse, AppError> {
        let country = self.get_object_by_id::<Country>(id.into_uuid()).await?;
        Ok(CountryResponse::from(&country))
    }

    #[tracing::instrument(skip(self))]
    pub async fn list_documents(&self) -> Result<Vec<DocumentResponse>, AppError> {
        let documents = self
            .repo
            .fetch_all(plans::documents())
            .await
            .map_err(storage_error)?;
        Ok(documents.iter().map(DocumentResponse::from).collect())
    }
}

fn not_found<E: Entity>(id: impl std::fmt::Display) -> AppError {
    AppError::NotFound(format!("{} not found with id: {}", E::META.name, id))
}

/// Logs a storage failure in full before it is narrowed to an [`AppError`].
fn storage_error(err: RepoError) -> AppError {
    tracing::error!(error = %err, "Storage query failed");
    AppError::from(err)
}

/// Strict assembly: the first failure fails the whole listing.
fn assemble_all<T, U, F>(items: &[T], assemble: F) -> Result<Vec<U>, AppError>
where
    F: Fn(&T) -> Result<U, rates_types::AssemblyError>,
{
    items
        .iter()
        .map(|item| {
            assemble(item).map_err(|e| {
                tracing::error!(error = %e, "Failed to assemble response");
                AppError::from(e)
            })
        })
        .collect()
}
