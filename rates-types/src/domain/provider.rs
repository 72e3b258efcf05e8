//! Transfer provider domain model.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{Base, ProviderExchangeRate, ProviderId, TransferRule, base_record};
use crate::entity::{
    BASE_COLUMNS, Column, ColumnKind, Entity, EntityMeta, Related, Relation, RelationKind,
    require_non_empty,
};
use crate::error::DomainError;
use crate::record::{Node, Record};

const COLUMNS: [Column; 6] = [
    BASE_COLUMNS[0],
    BASE_COLUMNS[1],
    BASE_COLUMNS[2],
    BASE_COLUMNS[3],
    Column::required("name", ColumnKind::Text),
    Column::required("url", ColumnKind::Text),
];

/// A money-transfer service publishing rules and exchange rates.
#[derive(Debug, Clone, PartialEq)]
pub struct TransferProvider {
    pub id: ProviderId,
    pub name: String,
    pub url: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub transfer_rules: Related<Vec<TransferRule>>,
    pub exchange_rates: Related<Vec<ProviderExchangeRate>>,
}

impl TransferProvider {
    pub const TRANSFER_RULES: Relation = Relation {
        name: "transfer_rules",
        target: &TransferRule::META,
        kind: RelationKind::OneToMany {
            foreign_key: "provider_id",
        },
    };

    pub const EXCHANGE_RATES: Relation = Relation {
        name: "exchange_rates",
        target: &ProviderExchangeRate::META,
        kind: RelationKind::OneToMany {
            foreign_key: "provider_id",
        },
    };

    /// Creates an unsaved active provider. Storage assigns the id on insert.
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: ProviderId::nil(),
            name: name.into(),
            url: url.into(),
            is_active: true,
            created_at: Utc::now(),
            updated_at: None,
            transfer_rules: Related::NotLoaded,
            exchange_rates: Related::NotLoaded,
        }
    }

    pub fn deactivated(mut self) -> Self {
        self.is_active = false;
        self
    }
}

impl Entity for TransferProvider {
    const META: EntityMeta = EntityMeta {
        name: "TransferProvider",
        table: "transfer_providers",
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
            id: ProviderId::from_uuid(base.id),
            name: record.text("name")?,
            url: record.text("url")?,
            is_active: base.is_active,
            created_at: base.created_at,
            updated_at: base.updated_at,
            transfer_rules: Related::NotLoaded,
            exchange_rates: Related::NotLoaded,
        })
    }

    fn from_node(node: &Node) -> Result<Self, DomainError> {
        let mut provider = Self::from_record(&node.record)?;
        provider.transfer_rules = node.related_many(Self::TRANSFER_RULES.name)?;
        provider.exchange_rates = node.related_many(Self::EXCHANGE_RATES.name)?;
        Ok(provider)
    }

    fn to_record(&self) -> Record {
        base_record(self.id(), self.is_active, self.created_at, self.updated_at)
            .with("name", self.name.as_str())
            .with("url", self.url.as_str())
    }

    fn validate(&self) -> Result<(), DomainError> {
        require_non_empty("Provider name", &self.name)?;
        require_non_empty("Provider url", &self.url)
    }
}
