//! # Rates Types
//!
//! Domain entities, the active-record query model and port traits for the
//! transfer rates service. This crate has ZERO external IO dependencies - only
//! data structures, query construction and trait definitions.
//!
//! ## Architecture
//!
//! - `domain/` - Reference entities (currencies, countries, providers, rules, rates, content)
//! - `entity` - The `Entity` trait, table metadata and relation descriptors
//! - `record` - Flat column snapshots and loaded entity graphs
//! - `query` - Composable `Select` queries with eager-load plans
//! - `ports/` - Trait definitions that adapters must implement
//! - `dto` - Response payloads and their assembly from loaded entities
//! - `error` - Domain, repository, assembly and application error types

pub mod domain;
pub mod dto;
pub mod entity;
pub mod error;
pub mod ports;
pub mod query;
pub mod record;

// Re-export commonly used types
pub use domain::{
    Country, CountryId, Currency, CurrencyId, Document, DocumentId, ExchangeRateId, Media,
    MediaId, ProviderExchangeRate, ProviderId, Text, TextId, TransferProvider, TransferRule,
    TransferRuleId,
};
pub use dto::*;
pub use entity::{Column, ColumnKind, Entity, EntityMeta, Related, Relation, RelationKind};
pub use error::{AppError, AssemblyError, DomainError, RepoError};
pub use ports::{Decoded, ObjectCache, ReferenceRepository};
pub use query::{Join, Load, Predicate, QueryPlan, Select};
pub use record::{Node, Record, Value};
