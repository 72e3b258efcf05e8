//! Transfer rule domain model.
//!
//! A rule describes one corridor offered by a provider: where money is sent
//! from and to, in which currency, at what fees and limits, and which
//! documents the sender needs.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{
    Base, Country, CountryId, Currency, CurrencyId, Document, ProviderId, TransferProvider,
    TransferRuleId, base_record,
};
use crate::entity::{
    BASE_COLUMNS, Column, ColumnKind, Entity, EntityMeta, Related, Relation, RelationKind,
    require_non_empty,
};
use crate::error::DomainError;
use crate::record::{Node, Record};

const COLUMNS: [Column; 15] = [
    BASE_COLUMNS[0],
    BASE_COLUMNS[1],
    BASE_COLUMNS[2],
    BASE_COLUMNS[3],
    Column::required("provider_id", ColumnKind::Uuid),
    Column::required("send_country_id", ColumnKind::Uuid),
    Column::required("receive_country_id", ColumnKind::Uuid),
    Column::required("transfer_currency_id", ColumnKind::Uuid),
    Column::nullable("fee_percentage", ColumnKind::Float),
    Column::nullable("fee_fixed", ColumnKind::Float),
    Column::required("min_transfer_amount", ColumnKind::Float),
    Column::nullable("max_transfer_amount", ColumnKind::Float),
    Column::required("transfer_method", ColumnKind::Text),
    Column::nullable("min_transfer_time", ColumnKind::Text),
    Column::nullable("max_transfer_time", ColumnKind::Text),
];

#[derive(Debug, Clone, PartialEq)]
pub struct TransferRule {
    pub id: TransferRuleId,
    pub provider_id: ProviderId,
    pub send_country_id: CountryId,
    pub receive_country_id: CountryId,
    pub transfer_currency_id: CurrencyId,
    /// Percentage fee, 0 to 100
    pub fee_percentage: Option<f64>,
    pub fee_fixed: Option<f64>,
    pub min_transfer_amount: f64,
    pub max_transfer_amount: Option<f64>,
    /// e.g. "bank_transfer", "cash_pickup"
    pub transfer_method: String,
    /// Free-form duration such as "1 hour" or "2 days"
    pub min_transfer_time: Option<String>,
    pub max_transfer_time: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,

    pub provider: Related<Option<TransferProvider>>,
    pub send_country: Related<Option<Country>>,
    pub receive_country: Related<Option<Country>>,
    pub transfer_currency: Related<Option<Currency>>,
    pub required_documents: Related<Vec<Document>>,
}

impl TransferRule {
    pub const PROVIDER: Relation = Relation {
        name: "provider",
        target: &TransferProvider::META,
        kind: RelationKind::ManyToOne {
            foreign_key: "provider_id",
        },
    };

    pub const SEND_COUNTRY: Relation = Relation {
        name: "send_country",
        target: &Country::META,
        kind: RelationKind::ManyToOne {
            foreign_key: "send_country_id",
        },
    };

    pub const RECEIVE_COUNTRY: Relation = Relation {
        name: "receive_country",
        target: &Country::META,
        kind: RelationKind::ManyToOne {
            foreign_key: "receive_country_id",
        },
    };

    pub const TRANSFER_CURRENCY: Relation = Relation {
        name: "transfer_currency",
        target: &Currency::META,
        kind: RelationKind::ManyToOne {
            foreign_key: "transfer_currency_id",
        },
    };

    pub const REQUIRED_DOCUMENTS: Relation = Relation {
        name: "required_documents",
        target: &Document::META,
        kind: RelationKind::ManyToMany {
            table: "transfer_rule_documents",
            owner_key: "transfer_rule_id",
            target_key: "document_id",
            max_links: None,
        },
    };

    /// Creates an unsaved active rule with no fees and no minimum amount.
    pub fn new(
        provider_id: ProviderId,
        send_country_id: CountryId,
        receive_country_id: CountryId,
        transfer_currency_id: CurrencyId,
        transfer_method: impl Into<String>,
    ) -> Self {
        Self {
            id: TransferRuleId::nil(),
            provider_id,
            send_country_id,
            receive_country_id,
            transfer_currency_id,
            fee_percentage: None,
            fee_fixed: None,
            min_transfer_amount: 0.0,
            max_transfer_amount: None,
            transfer_method: transfer_method.into(),
            min_transfer_time: None,
            max_transfer_time: None,
            is_active: true,
            created_at: Utc::now(),
            updated_at: None,
            provider: Related::NotLoaded,
            send_country: Related::NotLoaded,
            receive_country: Related::NotLoaded,
            transfer_currency: Related::NotLoaded,
            required_documents: Related::NotLoaded,
        }
    }

    pub fn with_fees(mut self, percentage: Option<f64>, fixed: Option<f64>) -> Self {
        self.fee_percentage = percentage;
        self.fee_fixed = fixed;
        self
    }

    pub fn with_amounts(mut self, min: f64, max: Option<f64>) -> Self {
        self.min_transfer_amount = min;
        self.max_transfer_amount = max;
        self
    }

    pub fn with_times(mut self, min: Option<&str>, max: Option<&str>) -> Self {
        self.min_transfer_time = min.map(str::to_string);
        self.max_transfer_time = max.map(str::to_string);
        self
    }

    pub fn deactivated(mut self) -> Self {
        self.is_active = false;
        self
    }
}

fn non_negative(field: &str, value: f64) -> Result<(), DomainError> {
    if !value.is_finite() || value < 0.0 {
        return Err(DomainError::ValidationError(format!(
            "{field} must be a non-negative number"
        )));
    }
    Ok(())
}

impl Entity for TransferRule {
    const META: EntityMeta = EntityMeta {
        name: "TransferRule",
        table: "transfer_rules",
        columns: &COLUMNS,
        write_timestamps: &[],
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
            id: TransferRuleId::from_uuid(base.id),
            provider_id: ProviderId::from_uuid(record.uuid("provider_id")?),
            send_country_id: CountryId::from_uuid(record.uuid("send_country_id")?),
            receive_country_id: CountryId::from_uuid(record.uuid("receive_country_id")?),
            transfer_currency_id: CurrencyId::from_uuid(record.uuid("transfer_currency_id")?),
            fee_percentage: record.opt_float("fee_percentage")?,
            fee_fixed: record.opt_float("fee_fixed")?,
            min_transfer_amount: record.float("min_transfer_amount")?,
            max_transfer_amount: record.opt_float("max_transfer_amount")?,
            transfer_method: record.text("transfer_method")?,
            min_transfer_time: record.opt_text("min_transfer_time")?,
            max_transfer_time: record.opt_text("max_transfer_time")?,
            is_active: base.is_active,
            created_at: base.created_at,
            updated_at: base.updated_at,
            provider: Related::NotLoaded,
            send_country: Related::NotLoaded,
            receive_country: Related::NotLoaded,
            transfer_currency: Related::NotLoaded,
            required_documents: Related::NotLoaded,
        })
    }

    fn from_node(node: &Node) -> Result<Self, DomainError> {
        let mut rule = Self::from_record(&node.record)?;
        rule.provider = node.related_one(Self::PROVIDER.name)?;
        rule.send_country = node.related_one(Self::SEND_COUNTRY.name)?;
        rule.receive_country = node.related_one(Self::RECEIVE_COUNTRY.name)?;
        rule.transfer_currency = node.related_one(Self::TRANSFER_CURRENCY.name)?;
        rule.required_documents = node.related_many(Self::REQUIRED_DOCUMENTS.name)?;
        Ok(rule)
    }

    fn to_record(&self) -> Record {
        base_record(self.id(), self.is_active, self.created_at, self.updated_at)
            .with("provider_id", self.provider_id.into_uuid())
            .with("send_country_id", self.send_country_id.into_uuid())
            .with("receive_country_id", self.receive_country_id.into_uuid())
            .with("transfer_currency_id", self.transfer_currency_id.into_uuid())
            .with("fee_percentage", self.fee_percentage)
            .with("fee_fixed", self.fee_fixed)
            .with("min_transfer_amount", self.min_transfer_amount)
            .with("max_transfer_amount", self.max_transfer_amount)
            .with("transfer_method", self.transfer_method.as_str())
            .with("min_transfer_time", self.min_transfer_time.clone())
            .with("max_transfer_time", self.max_transfer_time.clone())
    }

    fn validate(&self) -> Result<(), DomainError> {
        require_non_empty("Transfer method", &self.transfer_method)?;
        if let Some(pct) = self.fee_percentage {
            if !(0.0..=100.0).contains(&pct) {
                return Err(DomainError::ValidationError(
                    "Fee percentage must be between 0 and 100".into(),
                ));
            }
        }
        if let Some(fixed) = self.fee_fixed {
            non_negative("Fixed fee", fixed)?;
        }
        non_negative("Minimum transfer amount", self.min_transfer_amount)?;
        if let Some(max) = self.max_transfer_amount {
            non_negative("Maximum transfer amount", max)?;
        }
        Ok(())
    }
}
