//! The `Entity` trait, table metadata and relation descriptors.
//!
//! Every reference entity implements [`Entity`], which ties a Rust type to its
//! table, its column layout and its scalar snapshot conversions. Queries start
//! from [`Entity::active`], so the active-row convention holds for every
//! entity without each call site having to repeat it.

use uuid::Uuid;

use crate::error::{AssemblyError, DomainError};
use crate::query::{Predicate, Select};
use crate::record::{Node, Record};

// ─────────────────────────────────────────────────────────────────────────────
// Table Metadata
// ─────────────────────────────────────────────────────────────────────────────

/// Storage type of a scalar column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnKind {
    Uuid,
    Text,
    Bool,
    Float,
    Timestamp,
}

/// A scalar column of an entity table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub name: &'static str,
    pub kind: ColumnKind,
    pub nullable: bool,
}

impl Column {
    pub const fn required(name: &'static str, kind: ColumnKind) -> Self {
        Self {
            name,
            kind,
            nullable: false,
        }
    }

    pub const fn nullable(name: &'static str, kind: ColumnKind) -> Self {
        Self {
            name,
            kind,
            nullable: true,
        }
    }
}

/// Columns shared by every entity table, in storage order.
pub const BASE_COLUMNS: [Column; 4] = [
    Column::required("id", ColumnKind::Uuid),
    Column::required("is_active", ColumnKind::Bool),
    Column::required("created_at", ColumnKind::Timestamp),
    Column::nullable("updated_at", ColumnKind::Timestamp),
];

/// Static description of an entity table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntityMeta {
    /// Type name used in cache keys and error messages.
    pub name: &'static str,
    pub table: &'static str,
    /// All scalar columns, base columns included.
    pub columns: &'static [Column],
    /// Timestamp columns stamped with the write time on insert.
    pub write_timestamps: &'static [&'static str],
}

impl EntityMeta {
    pub fn column(&self, name: &str) -> Option<&'static Column> {
        self.columns.iter().find(|c| c.name == name)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Relations
// ─────────────────────────────────────────────────────────────────────────────

/// How two tables are connected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationKind {
    /// The owner row carries `foreign_key` pointing at the target's id.
    ManyToOne { foreign_key: &'static str },
    /// The target rows carry `foreign_key` pointing at the owner's id.
    OneToMany { foreign_key: &'static str },
    /// Rows are connected through an association table.
    ManyToMany {
        table: &'static str,
        owner_key: &'static str,
        target_key: &'static str,
        /// Upper bound on links per owner, enforced on link.
        max_links: Option<usize>,
    },
}

/// A named relation from one entity to another.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Relation {
    pub name: &'static str,
    pub target: &'static EntityMeta,
    pub kind: RelationKind,
}

impl Relation {
    /// True when the relation resolves to a list of rows.
    pub fn is_collection(&self) -> bool {
        !matches!(self.kind, RelationKind::ManyToOne { .. })
    }
}

/// A relation slot on an entity: either not part of the load plan, or loaded.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Related<T> {
    #[default]
    NotLoaded,
    Loaded(T),
}

impl<T> Related<T> {
    pub fn loaded(&self) -> Option<&T> {
        match self {
            Related::NotLoaded => None,
            Related::Loaded(v) => Some(v),
        }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, Related::Loaded(_))
    }

    /// Returns the loaded value or reports the relation as not loaded.
    pub fn require(&self, relation: &'static str) -> Result<&T, AssemblyError> {
        self.loaded()
            .ok_or(AssemblyError::RelationNotLoaded { relation })
    }
}

impl<T> Related<Option<T>> {
    /// Returns the loaded related row, failing when it was not loaded or is absent.
    pub fn require_some(&self, relation: &'static str) -> Result<&T, AssemblyError> {
        self.require(relation)?
            .as_ref()
            .ok_or(AssemblyError::MissingRelation { relation })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Entity Trait
// ─────────────────────────────────────────────────────────────────────────────

/// A reference entity backed by one table.
pub trait Entity: Sized + Send + Sync + 'static {
    const META: EntityMeta;

    fn id(&self) -> Uuid;

    fn is_active(&self) -> bool;

    /// Rebuilds the entity from its scalar columns. Relations come back `NotLoaded`.
    fn from_record(record: &Record) -> Result<Self, DomainError>;

    /// Scalar column snapshot, relations excluded.
    fn to_record(&self) -> Record;

    /// Rebuilds the entity together with whatever relations the node carries.
    fn from_node(node: &Node) -> Result<Self, DomainError> {
        Self::from_record(&node.record)
    }

    /// Write-side validation, run before insert.
    fn validate(&self) -> Result<(), DomainError> {
        Ok(())
    }

    /// Base query restricted to active rows.
    fn active() -> Select<Self> {
        Select::all().filter(Predicate::Active)
    }

    /// Object cache key for the row with `id`.
    fn cache_key(id: Uuid) -> String {
        format!("{}:{}", Self::META.name, id)
    }
}

/// Rejects blank strings.
pub(crate) fn require_non_empty(field: &str, value: &str) -> Result<(), DomainError> {
    if value.trim().is_empty() {
        return Err(DomainError::ValidationError(format!(
            "{field} cannot be empty"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Country, Currency};

    #[test]
    fn test_cache_key_format() {
        let id = Uuid::nil();
        assert_eq!(
            Currency::cache_key(id),
            "Currency:00000000-0000-0000-0000-000000000000"
        );
    }

    #[test]
    fn test_active_query_is_filtered() {
        let select = Country::active();
        assert_eq!(select.predicates(), &[Predicate::Active]);
    }

    #[test]
    fn test_require_some_reports_missing() {
        let rel: Related<Option<Currency>> = Related::Loaded(None);
        assert_eq!(
            rel.require_some("local_currency").unwrap_err(),
            AssemblyError::MissingRelation {
                relation: "local_currency"
            }
        );

        let unloaded: Related<Option<Currency>> = Related::NotLoaded;
        assert_eq!(
            unloaded.require_some("local_currency").unwrap_err(),
            AssemblyError::RelationNotLoaded {
                relation: "local_currency"
            }
        );
    }
}
