//! Currency domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Base, CurrencyId, base_record};
use crate::entity::{BASE_COLUMNS, Column, ColumnKind, Entity, EntityMeta, require_non_empty};
use crate::error::DomainError;
use crate::record::Record;

const COLUMNS: [Column; 7] = [
    BASE_COLUMNS[0],
    BASE_COLUMNS[1],
    BASE_COLUMNS[2],
    BASE_COLUMNS[3],
    Column::required("abbreviation", ColumnKind::Text),
    Column::nullable("name", ColumnKind::Text),
    Column::nullable("symbol", ColumnKind::Text),
];

/// A currency such as USD or EUR.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Currency {
    pub id: CurrencyId,
    /// ISO-style code, e.g. "USD"
    pub abbreviation: String,
    pub name: Option<String>,
    pub symbol: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Currency {
    /// Creates an unsaved active currency. Storage assigns the id on insert.
    pub fn new(abbreviation: impl Into<String>) -> Self {
        Self {
            id: CurrencyId::nil(),
            abbreviation: abbreviation.into(),
            name: None,
            symbol: None,
            is_active: true,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.symbol = Some(symbol.into());
        self
    }

    pub fn deactivated(mut self) -> Self {
        self.is_active = false;
        self
    }
}

impl Entity for Currency {
    const META: EntityMeta = EntityMeta {
        name: "Currency",
        table: "currencies",
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
            id: CurrencyId::from_uuid(base.id),
            abbreviation: record.text("abbreviation")?,
            name: record.opt_text("name")?,
            symbol: record.opt_text("symbol")?,
            is_active: base.is_active,
            created_at: base.created_at,
            updated_at: base.updated_at,
        })
    }

    fn to_record(&self) -> Record {
        base_record(self.id(), self.is_active, self.created_at, self.updated_at)
            .with("abbreviation", self.abbreviation.as_str())
            .with("name", self.name.clone())
            .with("symbol", self.symbol.clone())
    }

    fn validate(&self) -> Result<(), DomainError> {
        require_non_empty("Currency abbreviation", &self.abbreviation)
    }
}
