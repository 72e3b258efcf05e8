//! Domain models for the transfer rates service.

pub mod content;
pub mod country;
pub mod currency;
pub mod document;
pub mod exchange_rate;
pub mod ids;
pub mod provider;
pub mod transfer_rule;

pub use content::{Media, Text};
pub use country::Country;
pub use currency::Currency;
pub use document::Document;
pub use exchange_rate::ProviderExchangeRate;
pub use ids::{
    CountryId, CurrencyId, DocumentId, ExchangeRateId, MediaId, ProviderId, TextId,
    TransferRuleId,
};
pub use provider::TransferProvider;
pub use transfer_rule::TransferRule;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::DomainError;
use crate::record::Record;

/// Snapshot of the columns every entity table shares.
pub(crate) fn base_record(
    id: Uuid,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: Option<DateTime<Utc>>,
) -> Record {
    Record::new()
        .with("id", id)
        .with("is_active", is_active)
        .with("created_at", created_at)
        .with("updated_at", updated_at)
}

/// Shared columns decoded from a row.
pub(crate) struct Base {
    pub id: Uuid,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Base {
    pub fn read(record: &Record) -> Result<Self, DomainError> {
        Ok(Self {
            id: record.uuid("id")?,
            is_active: record.bool("is_active")?,
            created_at: record.timestamp("created_at")?,
            updated_at: record.opt_timestamp("updated_at")?,
        })
    }
}
