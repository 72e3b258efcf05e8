//! Country domain model.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{Base, CountryId, Currency, CurrencyId, base_record};
use crate::entity::{
    BASE_COLUMNS, Column, ColumnKind, Entity, EntityMeta, Related, Relation, RelationKind,
    require_non_empty,
};
use crate::error::DomainError;
use crate::record::{Node, Record};

const COLUMNS: [Column; 7] = [
    BASE_COLUMNS[0],
    BASE_COLUMNS[1],
    BASE_COLUMNS[2],
    BASE_COLUMNS[3],
    Column::required("name", ColumnKind::Text),
    Column::nullable("abbreviation", ColumnKind::Text),
    Column::nullable("local_currency_id", ColumnKind::Uuid),
];

/// A country money can be sent from or to.
#[derive(Debug, Clone, PartialEq)]
pub struct Country {
    pub id: CountryId,
    pub name: String,
    pub abbreviation: Option<String>,
    pub local_currency_id: Option<CurrencyId>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub local_currency: Related<Option<Currency>>,
}

impl Country {
    pub const LOCAL_CURRENCY: Relation = Relation {
        name: "local_currency",
        target: &Currency::META,
        kind: RelationKind::ManyToOne {
            foreign_key: "local_currency_id",
        },
    };

    /// Creates an unsaved active country. Storage assigns the id on insert.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: CountryId::nil(),
            name: name.into(),
            abbreviation: None,
            local_currency_id: None,
            is_active: true,
            created_at: Utc::now(),
            updated_at: None,
            local_currency: Related::NotLoaded,
        }
    }

    pub fn with_abbreviation(mut self, abbreviation: impl Into<String>) -> Self {
        self.abbreviation = Some(abbreviation.into());
        self
    }

    pub fn with_local_currency(mut self, currency: CurrencyId) -> Self {
        self.local_currency_id = Some(currency);
        self
    }

    pub fn deactivated(mut self) -> Self {
        self.is_active = false;
        self
    }
}

impl Entity for Country {
    const META: EntityMeta = EntityMeta {
        name: "Country",
        table: "countries",
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
            id: CountryId::from_uuid(base.id),
            name: record.text("name")?,
            abbreviation: record.opt_text("abbreviation")?,
            local_currency_id: record.opt_uuid("local_currency_id")?.map(CurrencyId::from_uuid),
            is_active: base.is_active,
            created_at: base.created_at,
            updated_at: base.updated_at,
            local_currency: Related::NotLoaded,
        })
    }

    fn from_node(node: &Node) -> Result<Self, DomainError> {
        let mut country = Self::from_record(&node.record)?;
        country.local_currency = node.related_one(Self::LOCAL_CURRENCY.name)?;
        Ok(country)
    }

    fn to_record(&self) -> Record {
        base_record(self.id(), self.is_active, self.created_at, self.updated_at)
            .with("name", self.name.as_str())
            .with("abbreviation", self.abbreviation.clone())
            .with(
                "local_currency_id",
                self.local_currency_id.map(CurrencyId::into_uuid),
            )
    }

    fn validate(&self) -> Result<(), DomainError> {
        require_non_empty("Country name", &self.name)
    }
}
