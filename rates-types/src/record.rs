//! Flat column snapshots and loaded entity graphs.
//!
//! A [`Record`] is the plain column-name-to-value mapping of one row. It is what
//! storage adapters decode rows into and what the object cache stores. A
//! [`Node`] is a record plus whatever relations an eager-load plan fetched
//! alongside it.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entity::{ColumnKind, Entity, Related};
use crate::error::DomainError;

/// A single scalar column value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Value {
    Null,
    Bool(bool),
    Float(f64),
    Text(String),
    Uuid(Uuid),
    Timestamp(DateTime<Utc>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// The column kind this value would be stored as, `None` for `Null`.
    pub fn kind(&self) -> Option<ColumnKind> {
        match self {
            Value::Null => None,
            Value::Bool(_) => Some(ColumnKind::Bool),
            Value::Float(_) => Some(ColumnKind::Float),
            Value::Text(_) => Some(ColumnKind::Text),
            Value::Uuid(_) => Some(ColumnKind::Uuid),
            Value::Timestamp(_) => Some(ColumnKind::Timestamp),
        }
    }

    fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Float(_) => "float",
            Value::Text(_) => "text",
            Value::Uuid(_) => "uuid",
            Value::Timestamp(_) => "timestamp",
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<Uuid> for Value {
    fn from(v: Uuid) -> Self {
        Value::Uuid(v)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::Timestamp(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

/// Plain column values of one row, keyed by column name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(BTreeMap<String, Value>);

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.insert(column, value);
        self
    }

    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(column.into(), value.into());
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.0.get(column)
    }

    pub fn columns(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn require(&self, column: &str) -> Result<&Value, DomainError> {
        self.0
            .get(column)
            .ok_or_else(|| DomainError::MissingColumn(column.to_string()))
    }

    fn mismatch(column: &str, expected: &'static str, found: &Value) -> DomainError {
        DomainError::InvalidColumn {
            column: column.to_string(),
            expected,
            found: found.type_name(),
        }
    }

    pub fn uuid(&self, column: &str) -> Result<Uuid, DomainError> {
        self.opt_uuid(column)?
            .ok_or_else(|| Self::mismatch(column, "uuid", &Value::Null))
    }

    pub fn opt_uuid(&self, column: &str) -> Result<Option<Uuid>, DomainError> {
        match self.require(column)? {
            Value::Null => Ok(None),
            Value::Uuid(v) => Ok(Some(*v)),
            other => Err(Self::mismatch(column, "uuid", other)),
        }
    }

    pub fn text(&self, column: &str) -> Result<String, DomainError> {
        self.opt_text(column)?
            .ok_or_else(|| Self::mismatch(column, "text", &Value::Null))
    }

    pub fn opt_text(&self, column: &str) -> Result<Option<String>, DomainError> {
        match self.require(column)? {
            Value::Null => Ok(None),
            Value::Text(v) => Ok(Some(v.clone())),
            other => Err(Self::mismatch(column, "text", other)),
        }
    }

    pub fn bool(&self, column: &str) -> Result<bool, DomainError> {
        match self.require(column)? {
            Value::Bool(v) => Ok(*v),
            other => Err(Self::mismatch(column, "bool", other)),
        }
    }

    pub fn float(&self, column: &str) -> Result<f64, DomainError> {
        self.opt_float(column)?
            .ok_or_else(|| Self::mismatch(column, "float", &Value::Null))
    }

    pub fn opt_float(&self, column: &str) -> Result<Option<f64>, DomainError> {
        match self.require(column)? {
            Value::Null => Ok(None),
            Value::Float(v) => Ok(Some(*v)),
            other => Err(Self::mismatch(column, "float", other)),
        }
    }

    pub fn timestamp(&self, column: &str) -> Result<DateTime<Utc>, DomainError> {
        self.opt_timestamp(column)?
            .ok_or_else(|| Self::mismatch(column, "timestamp", &Value::Null))
    }

    pub fn opt_timestamp(&self, column: &str) -> Result<Option<DateTime<Utc>>, DomainError> {
        match self.require(column)? {
            Value::Null => Ok(None),
            Value::Timestamp(v) => Ok(Some(*v)),
            other => Err(Self::mismatch(column, "timestamp", other)),
        }
    }
}

/// A loaded row together with the relations fetched for it.
///
/// Relations absent from the maps were not part of the load plan; an entry
/// holding `None` or an empty vector was loaded and found nothing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Node {
    pub record: Record,
    one: BTreeMap<&'static str, Option<Node>>,
    many: BTreeMap<&'static str, Vec<Node>>,
}

impl Node {
    pub fn new(record: Record) -> Self {
        Self {
            record,
            one: BTreeMap::new(),
            many: BTreeMap::new(),
        }
    }

    pub fn with_one(mut self, relation: &'static str, node: Option<Node>) -> Self {
        self.set_one(relation, node);
        self
    }

    pub fn with_many(mut self, relation: &'static str, nodes: Vec<Node>) -> Self {
        self.set_many(relation, nodes);
        self
    }

    pub fn id(&self) -> Result<Uuid, DomainError> {
        self.record.uuid("id")
    }

    pub fn set_one(&mut self, relation: &'static str, node: Option<Node>) {
        self.one.insert(relation, node);
    }

    pub fn set_many(&mut self, relation: &'static str, nodes: Vec<Node>) {
        self.many.insert(relation, nodes);
    }

    pub fn has_one(&self, relation: &str) -> bool {
        self.one.contains_key(relation)
    }

    pub fn one_mut(&mut self, relation: &str) -> Option<&mut Option<Node>> {
        self.one.get_mut(relation)
    }

    /// Mutable access to a collection, marking it loaded if it was not.
    pub fn many_mut(&mut self, relation: &'static str) -> &mut Vec<Node> {
        self.many.entry(relation).or_default()
    }

    pub fn many(&self, relation: &str) -> Option<&[Node]> {
        self.many.get(relation).map(Vec::as_slice)
    }

    /// Decodes a single-valued relation.
    pub fn related_one<T: Entity>(&self, relation: &str) -> Result<Related<Option<T>>, DomainError> {
        match self.one.get(relation) {
            None => Ok(Related::NotLoaded),
            Some(None) => Ok(Related::Loaded(None)),
            Some(Some(node)) => Ok(Related::Loaded(Some(T::from_node(node)?))),
        }
    }

    /// Decodes a collection relation.
    pub fn related_many<T: Entity>(&self, relation: &str) -> Result<Related<Vec<T>>, DomainError> {
        match self.many.get(relation) {
            None => Ok(Related::NotLoaded),
            Some(nodes) => nodes
                .iter()
                .map(T::from_node)
                .collect::<Result<Vec<_>, _>>()
                .map(Related::Loaded),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typed_getters() {
        let id = Uuid::new_v4();
        let record = Record::new()
            .with("id", id)
            .with("abbreviation", "USD")
            .with("name", None::<String>)
            .with("is_active", true);

        assert_eq!(record.uuid("id").unwrap(), id);
        assert_eq!(record.text("abbreviation").unwrap(), "USD");
        assert_eq!(record.opt_text("name").unwrap(), None);
        assert!(record.bool("is_active").unwrap());
    }

    #[test]
    fn test_missing_column() {
        let record = Record::new();
        assert!(matches!(
            record.text("abbreviation"),
            Err(DomainError::MissingColumn(_))
        ));
    }

    #[test]
    fn test_type_mismatch() {
        let record = Record::new().with("rate", "0.91");
        let err = record.float("rate").unwrap_err();
        assert!(matches!(
            err,
            DomainError::InvalidColumn { expected: "float", found: "text", .. }
        ));
    }

    #[test]
    fn test_snapshot_json_shape() {
        let record = Record::new().with("rate", 0.91).with("name", None::<String>);
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["rate"]["type"], "float");
        assert_eq!(json["name"]["type"], "null");

        let back: Record = serde_json::from_value(json).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn test_node_distinguishes_unloaded_from_empty() {
        let node = Node::new(Record::new()).with_many("transfer_rules", Vec::new());
        assert_eq!(node.many("transfer_rules").map(|n| n.len()), Some(0));
        assert!(node.many("exchange_rates").is_none());
        assert!(!node.has_one("provider"));
    }
}
