//! Document domain model.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{Base, DocumentId, base_record};
use crate::entity::{BASE_COLUMNS, Column, ColumnKind, Entity, EntityMeta};
use crate::error::DomainError;
use crate::record::Record;

/// Longest accepted document name, in characters.
pub const MAX_NAME_LEN: usize = 100;

const COLUMNS: [Column; 5] = [
    BASE_COLUMNS[0],
    BASE_COLUMNS[1],
    BASE_COLUMNS[2],
    BASE_COLUMNS[3],
    Column::required("name", ColumnKind::Text),
];

/// A document a sender must present for a transfer rule (passport, ID card, ...).
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: DocumentId,
    pub name: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Document {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: DocumentId::nil(),
            name: name.into(),
            is_active: true,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    pub fn deactivated(mut self) -> Self {
        self.is_active = false;
        self
    }
}

impl Entity for Document {
    const META: EntityMeta = EntityMeta {
        name: "Document",
        table: "documents",
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
            id: DocumentId::from_uuid(base.id),
            name: record.text("name")?,
            is_active: base.is_active,
            created_at: base.created_at,
            updated_at: base.updated_at,
        })
    }

    fn to_record(&self) -> Record {
        base_record(self.id(), self.is_active, self.created_at, self.updated_at)
            .with("name", self.name.as_str())
    }

    /// Name must hold 1 to 100 characters once trimmed.
    fn validate(&self) -> Result<(), DomainError> {
        let len = self.name.trim().chars().count();
        if len == 0 || len > MAX_NAME_LEN {
            return Err(DomainError::ValidationError(format!(
                "Document name must be between 1 and {MAX_NAME_LEN} characters"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_length_bounds() {
        assert!(Document::new("Passport").validate().is_ok());
        assert!(Document::new("   ").validate().is_err());
        assert!(Document::new("x".repeat(100)).validate().is_ok());
        assert!(Document::new("x".repeat(101)).validate().is_err());
    }
}
