//! Composable queries with eager-load plans.
//!
//! Building a [`Select`] is pure: nothing touches storage until a repository
//! executes it. A select carries its row predicates, the single-valued and
//! collection relations to fetch in the same statement ([`Join`]) and the
//! collections to fetch in one batched follow-up query each ([`Load`]).

use std::marker::PhantomData;

use uuid::Uuid;

use crate::entity::{Entity, EntityMeta, Relation};
use crate::record::Value;

/// A row filter.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// `is_active = TRUE`.
    Active,
    /// `column = value`, or `column IS NULL` for [`Value::Null`].
    Eq { column: &'static str, value: Value },
    /// `column IN (values)`; an empty list matches nothing.
    In {
        column: &'static str,
        values: Vec<Value>,
    },
    /// The row has at least one active row across `relation`.
    HasActive(Relation),
}

impl Predicate {
    pub fn eq(column: &'static str, value: impl Into<Value>) -> Self {
        Predicate::Eq {
            column,
            value: value.into(),
        }
    }

    pub fn is_in(column: &'static str, values: impl IntoIterator<Item = Value>) -> Self {
        Predicate::In {
            column,
            values: values.into_iter().collect(),
        }
    }

    pub fn has_active(relation: Relation) -> Self {
        Predicate::HasActive(relation)
    }
}

/// A relation fetched with a `LEFT JOIN` in the parent statement.
#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    pub relation: Relation,
    /// Only match active related rows (condition placed in the `ON` clause).
    pub active_only: bool,
    /// Joins hanging off the related row.
    pub nested: Vec<Join>,
}

impl Join {
    pub fn new(relation: Relation) -> Self {
        Self {
            relation,
            active_only: false,
            nested: Vec::new(),
        }
    }

    pub fn active(relation: Relation) -> Self {
        Self {
            active_only: true,
            ..Self::new(relation)
        }
    }

    /// Chains a join from the related row.
    pub fn then(mut self, join: Join) -> Self {
        self.nested.push(join);
        self
    }
}

/// A collection fetched by one batched `IN (parent ids)` query.
#[derive(Debug, Clone, PartialEq)]
pub struct Load {
    pub relation: Relation,
    pub active_only: bool,
    pub joins: Vec<Join>,
    pub loads: Vec<Load>,
}

impl Load {
    pub fn new(relation: Relation) -> Self {
        Self {
            relation,
            active_only: false,
            joins: Vec::new(),
            loads: Vec::new(),
        }
    }

    pub fn active(relation: Relation) -> Self {
        Self {
            active_only: true,
            ..Self::new(relation)
        }
    }

    pub fn join(mut self, join: Join) -> Self {
        self.joins.push(join);
        self
    }

    pub fn load(mut self, load: Load) -> Self {
        self.loads.push(load);
        self
    }

    /// The query run against the related table for this load.
    pub fn plan(&self) -> QueryPlan {
        QueryPlan {
            meta: *self.relation.target,
            predicates: if self.active_only {
                vec![Predicate::Active]
            } else {
                Vec::new()
            },
            joins: self.joins.clone(),
            loads: self.loads.clone(),
            order_by: Vec::new(),
        }
    }
}

/// Untyped form of a [`Select`], consumed by storage adapters.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryPlan {
    pub meta: EntityMeta,
    pub predicates: Vec<Predicate>,
    pub joins: Vec<Join>,
    pub loads: Vec<Load>,
    pub order_by: Vec<&'static str>,
}

/// A typed query over entity `E`.
#[derive(Debug, Clone)]
pub struct Select<E> {
    predicates: Vec<Predicate>,
    joins: Vec<Join>,
    loads: Vec<Load>,
    order_by: Vec<&'static str>,
    _entity: PhantomData<fn() -> E>,
}

impl<E: Entity> Select<E> {
    /// Every row, active or not. Prefer [`Entity::active`].
    pub fn all() -> Self {
        Self {
            predicates: Vec::new(),
            joins: Vec::new(),
            loads: Vec::new(),
            order_by: Vec::new(),
            _entity: PhantomData,
        }
    }

    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    pub fn filters(mut self, predicates: impl IntoIterator<Item = Predicate>) -> Self {
        self.predicates.extend(predicates);
        self
    }

    pub fn by_id(self, id: Uuid) -> Self {
        self.filter(Predicate::eq("id", id))
    }

    pub fn join(mut self, join: Join) -> Self {
        self.joins.push(join);
        self
    }

    pub fn load(mut self, load: Load) -> Self {
        self.loads.push(load);
        self
    }

    /// Ascending order on a column of `E`.
    pub fn order_by(mut self, column: &'static str) -> Self {
        self.order_by.push(column);
        self
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    pub fn joins(&self) -> &[Join] {
        &self.joins
    }

    pub fn loads(&self) -> &[Load] {
        &self.loads
    }

    pub fn into_plan(self) -> QueryPlan {
        QueryPlan {
            meta: E::META,
            predicates: self.predicates,
            joins: self.joins,
            loads: self.loads,
            order_by: self.order_by,
        }
    }
}
