//! Provider exchange rate domain model.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{Base, Currency, CurrencyId, ExchangeRateId, ProviderId, TransferProvider, base_record};
use crate::entity::{
    BASE_COLUMNS, Column, ColumnKind, Entity, EntityMeta, Related, Relation, RelationKind,
};
use crate::error::DomainError;
use crate::record::{Node, Record};

const COLUMNS: [Column; 9] = [
    BASE_COLUMNS[0],
    BASE_COLUMNS[1],
    BASE_COLUMNS[2],
    BASE_COLUMNS[3],
    Column::required("provider_id", ColumnKind::Uuid),
    Column::required("from_currency_id", ColumnKind::Uuid),
    Column::required("to_currency_id", ColumnKind::Uuid),
    Column::required("rate", ColumnKind::Float),
    Column::required("last_updated", ColumnKind::Timestamp),
];

/// The rate a provider applies when converting `from_currency` into `to_currency`.
///
/// A provider publishes at most one rate per currency pair.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderExchangeRate {
    pub id: ExchangeRateId,
    pub provider_id: ProviderId,
    pub from_currency_id: CurrencyId,
    pub to_currency_id: CurrencyId,
    /// Units of `to_currency` per unit of `from_currency`, always > 0
    pub rate: f64,
    /// Stamped by storage on every write
    pub last_updated: DateTime<Utc>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,

    pub provider: Related<Option<TransferProvider>>,
    pub from_currency: Related<Option<Currency>>,
    pub to_currency: Related<Option<Currency>>,
}

impl ProviderExchangeRate {
    pub const PROVIDER: Relation = Relation {
        name: "provider",
        target: &TransferProvider::META,
        kind: RelationKind::ManyToOne {
            foreign_key: "provider_id",
        },
    };

    pub const FROM_CURRENCY: Relation = Relation {
        name: "from_currency",
        target: &Currency::META,
        kind: RelationKind::ManyToOne {
            foreign_key: "from_currency_id",
        },
    };

    pub const TO_CURRENCY: Relation = Relation {
        name: "to_currency",
        target: &Currency::META,
        kind: RelationKind::ManyToOne {
            foreign_key: "to_currency_id",
        },
    };

    /// Creates an unsaved active rate. `last_updated` is reset by storage on insert.
    pub fn new(
        provider_id: ProviderId,
        from_currency_id: CurrencyId,
        to_currency_id: CurrencyId,
        rate: f64,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: ExchangeRateId::nil(),
            provider_id,
            from_currency_id,
            to_currency_id,
            rate,
            last_updated: now,
            is_active: true,
            created_at: now,
            updated_at: None,
            provider: Related::NotLoaded,
            from_currency: Related::NotLoaded,
            to_currency: Related::NotLoaded,
        }
    }

    pub fn deactivated(mut self) -> Self {
        self.is_active = false;
        self
    }
}

impl Entity for ProviderExchangeRate {
    const META: EntityMeta = EntityMeta {
        name: "ProviderExchangeRate",
        table: "provider_exchange_rates",
        columns: &COLUMNS,
        write_timestamps: &["last_updated"],
    };

    fn id(&self) -> Uuid {
        self.id.into_uuid()
    }

    fn is_active(&self) -> bool {
        self.is_active
    }

    fn from_record(record: &Record) -> Result<Self, DomainError> {
        let base = Base::read(record)?;
        Ok(Self {
            id: ExchangeRateId::from_uuid(base.id),
            provider_id: ProviderId::from_uuid(record.uuid("provider_id")?),
            from_currency_id: CurrencyId::from_uuid(record.uuid("from_currency_id")?),
            to_currency_id: CurrencyId::from_uuid(record.uuid("to_currency_id")?),
            rate: record.float("rate")?,
            last_updated: record.timestamp("last_updated")?,
            is_active: base.is_active,
            created_at: base.created_at,
            updated_at: base.updated_at,
            provider: Related::NotLoaded,
            from_currency: Related::NotLoaded,
            to_currency: Related::NotLoaded,
        })
    }

    fn from_node(node: &Node) -> Result<Self, DomainError> {
        let mut rate = Self::from_record(&node.record)?;
        rate.provider = node.related_one(Self::PROVIDER.name)?;
        rate.from_currency = node.related_one(Self::FROM_CURRENCY.name)?;
        rate.to_currency = node.related_one(Self::TO_CURRENCY.name)?;
        Ok(rate)
    }

    fn to_record(&self) -> Record {
        base_record(self.id(), self.is_active, self.created_at, self.updated_at)
            .with("provider_id", self.provider_id.into_uuid())
            .with("from_currency_id", self.from_currency_id.into_uuid())
            .with("to_currency_id", self.to_currency_id.into_uuid())
            .with("rate", self.rate)
            .with("last_updated", self.last_updated)
    }

    fn validate(&self) -> Result<(), DomainError> {
        if !self.rate.is_finite() || self.rate <= 0.0 {
            return Err(DomainError::ValidationError(
                "Exchange rate must be a positive number".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rate(value: f64) -> ProviderExchangeRate {
        ProviderExchangeRate::new(ProviderId::nil(), CurrencyId::nil(), CurrencyId::nil(), value)
    }

    #[test]
    fn test_rate_must_be_positive() {
        assert!(rate(0.91).validate().is_ok());
        assert!(rate(0.0).validate().is_err());
        assert!(rate(-2.0).validate().is_err());
        assert!(rate(f64::NAN).validate().is_err());
    }

    #[test]
    fn test_last_updated_is_a_write_timestamp() {
        assert_eq!(ProviderExchangeRate::META.write_timestamps, &["last_updated"]);
    }
}
