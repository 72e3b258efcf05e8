//! Executes query plans and stitches results into entity graphs.
//!
//! The primary statement brings back the root rows and every joined relation
//! in one round trip; a fanned-out result (one row per joined document, say)
//! collapses back to one node per root id. Each declared [`Load`] then runs
//! one batched query keyed by the ids gathered so far and attaches its rows
//! in memory.

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::pin::Pin;

use uuid::Uuid;

use rates_types::{Load, Node, QueryPlan, Record, RelationKind, RepoError};

use crate::sql::{JoinSlot, PARENT_LABEL, ParentLink, Statement, render_select, split_label};

/// Minimal surface a database adapter offers the loader and the store.
#[async_trait::async_trait]
pub trait SqlExecutor: Send + Sync {
    fn dialect(&self) -> crate::sql::Dialect;

    /// Runs a query, returning one record per row keyed by column label.
    async fn fetch(&self, statement: &Statement) -> Result<Vec<Record>, RepoError>;

    /// Runs a write, returning the number of affected rows.
    async fn execute(&self, statement: &Statement) -> Result<u64, RepoError>;
}

/// A loaded root node and the parent it was fetched for, if any.
pub type Entry = (Option<Uuid>, Node);

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Runs `plan` and every load hanging off it.
pub fn load<'a, X: SqlExecutor + ?Sized>(
    exec: &'a X,
    plan: &'a QueryPlan,
    link: Option<&'a ParentLink>,
) -> BoxFuture<'a, Result<Vec<Entry>, RepoError>> {
    Box::pin(async move {
        let (statement, slots) = render_select(plan, exec.dialect(), link);
        let rows = exec.fetch(&statement).await?;

        let mut entries: Vec<Entry> = Vec::new();
        let mut seen: HashMap<(Option<Uuid>, Uuid), usize> = HashMap::new();

        for row in rows {
            let parent = match row.get(PARENT_LABEL) {
                Some(_) => row.opt_uuid(PARENT_LABEL)?,
                None => None,
            };
            let mut tables = split_row(row);
            let root = tables.remove(&0).unwrap_or_default();
            let id = root.uuid("id")?;

            let index = *seen.entry((parent, id)).or_insert_with(|| {
                let mut node = Node::new(root);
                init_slots(&mut node, &slots);
                entries.push((parent, node));
                entries.len() - 1
            });
            merge_joins(&mut entries[index].1, &slots, &mut tables)?;
        }

        for nested in &plan.loads {
            attach_load(exec, &mut entries, nested).await?;
        }

        Ok(entries)
    })
}

/// Groups a labelled row into one record per table alias.
fn split_row(row: Record) -> HashMap<usize, Record> {
    let mut tables: HashMap<usize, Record> = HashMap::new();
    for (label, value) in row.columns() {
        if let Some((alias, column)) = split_label(label) {
            tables
                .entry(alias)
                .or_default()
                .insert(column, value.clone());
        }
    }
    tables
}

/// Marks every joined relation as loaded before any row is merged, so a
/// relation with no matching rows still reads as loaded-and-empty.
fn init_slots(node: &mut Node, slots: &[JoinSlot]) {
    for slot in slots {
        if slot.relation.is_collection() {
            node.set_many(slot.relation.name, Vec::new());
        } else {
            node.set_one(slot.relation.name, None);
        }
    }
}

fn merge_joins(
    node: &mut Node,
    slots: &[JoinSlot],
    tables: &mut HashMap<usize, Record>,
) -> Result<(), RepoError> {
    for slot in slots {
        let Some(record) = tables.remove(&slot.alias) else {
            continue;
        };
        // LEFT JOIN without a match yields a row of NULLs.
        let Some(id) = record.opt_uuid("id")? else {
            continue;
        };

        let child = if slot.relation.is_collection() {
            let children = node.many_mut(slot.relation.name);
            match children.iter().position(|c| c.id().ok() == Some(id)) {
                Some(pos) => &mut children[pos],
                None => {
                    let mut child = Node::new(record);
                    init_slots(&mut child, &slot.nested);
                    children.push(child);
                    let last = children.len() - 1;
                    &mut children[last]
                }
            }
        } else {
            let Some(one) = node.one_mut(slot.relation.name) else {
                continue;
            };
            if one.is_none() {
                let mut child = Node::new(record);
                init_slots(&mut child, &slot.nested);
                *one = Some(child);
            }
            match one.as_mut() {
                Some(child) => child,
                None => continue,
            }
        };

        merge_joins(child, &slot.nested, tables)?;
    }
    Ok(())
}

fn distinct(ids: impl IntoIterator<Item = Uuid>) -> Vec<Uuid> {
    let mut seen = HashSet::new();
    ids.into_iter().filter(|id| seen.insert(*id)).collect()
}

async fn attach_load<X: SqlExecutor + ?Sized>(
    exec: &X,
    entries: &mut [Entry],
    load_spec: &Load,
) -> Result<(), RepoError> {
    let relation = load_spec.relation;
    let plan = load_spec.plan();

    match relation.kind {
        RelationKind::ManyToOne { foreign_key } => {
            let mut refs = Vec::with_capacity(entries.len());
            for (_, node) in entries.iter() {
                refs.push(node.record.opt_uuid(foreign_key)?);
            }
            let ids = distinct(refs.iter().flatten().copied());
            let targets: HashMap<Uuid, Node> = if ids.is_empty() {
                HashMap::new()
            } else {
                let link = ParentLink::ById { ids };
                let mut by_id = HashMap::new();
                for (_, node) in load(exec, &plan, Some(&link)).await? {
                    by_id.insert(node.id()?, node);
                }
                by_id
            };
            for ((_, node), fk) in entries.iter_mut().zip(refs) {
                let target = fk.and_then(|id| targets.get(&id).cloned());
                node.set_one(relation.name, target);
            }
        }
        RelationKind::OneToMany { foreign_key } => {
            attach_collection(exec, entries, relation.name, &plan, |ids| {
                ParentLink::ByForeignKey {
                    column: foreign_key,
                    ids,
                }
            })
            .await?;
        }
        RelationKind::ManyToMany {
            table,
            owner_key,
            target_key,
            ..
        } => {
            attach_collection(exec, entries, relation.name, &plan, |ids| {
                ParentLink::ByAssociation {
                    table,
                    owner_key,
                    target_key,
                    ids,
                }
            })
            .await?;
        }
    }
    Ok(())
}

/// Loads a collection for every entry and groups it by parent id. Parents
/// without children get an empty collection.
async fn attach_collection<X: SqlExecutor + ?Sized>(
    exec: &X,
    entries: &mut [Entry],
    name: &'static str,
    plan: &QueryPlan,
    make_link: impl FnOnce(Vec<Uuid>) -> ParentLink + Send,
) -> Result<(), RepoError> {
    let mut parent_ids = Vec::with_capacity(entries.len());
    for (_, node) in entries.iter() {
        parent_ids.push(node.id()?);
    }
    let ids = distinct(parent_ids.iter().copied());

    let mut groups: HashMap<Uuid, Vec<Node>> = HashMap::new();
    if !ids.is_empty() {
        let link = make_link(ids);
        for (parent, child) in load(exec, plan, Some(&link)).await? {
            if let Some(parent) = parent {
                groups.entry(parent).or_default().push(child);
            }
        }
    }

    for ((_, node), id) in entries.iter_mut().zip(parent_ids) {
        let children = groups.get(&id).cloned().unwrap_or_default();
        node.set_many(name, children);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql::{Dialect, label};
    use chrono::Utc;
    use rates_types::{
        CountryId, CurrencyId, Document, Entity, Join, ProviderId, TransferRule, Value,
    };
    use std::sync::Mutex;

    /// Replays canned result sets in order.
    struct Replay {
        results: Mutex<Vec<Vec<Record>>>,
        statements: Mutex<Vec<String>>,
    }

    impl Replay {
        fn new(mut results: Vec<Vec<Record>>) -> Self {
            results.reverse();
            Self {
                results: Mutex::new(results),
                statements: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait::async_trait]
    impl SqlExecutor for Replay {
        fn dialect(&self) -> Dialect {
            Dialect::Sqlite
        }

        async fn fetch(&self, statement: &Statement) -> Result<Vec<Record>, RepoError> {
            self.statements.lock().unwrap().push(statement.sql.clone());
            Ok(self.results.lock().unwrap().pop().unwrap_or_default())
        }

        async fn execute(&self, _statement: &Statement) -> Result<u64, RepoError> {
            Ok(0)
        }
    }

    fn prefixed(alias: usize, record: &Record) -> Record {
        let mut out = Record::new();
        for (column, value) in record.columns() {
            out.insert(label(alias, column), value.clone());
        }
        out
    }

    fn merge(parts: &[Record]) -> Record {
        let mut out = Record::new();
        for part in parts {
            for (column, value) in part.columns() {
                out.insert(column, value.clone());
            }
        }
        out
    }

    fn null_document(alias: usize) -> Record {
        let mut out = Record::new();
        for column in Document::META.columns {
            out.insert(label(alias, column.name), Value::Null);
        }
        out
    }

    fn rule_record(id: Uuid) -> Record {
        let mut rule = TransferRule::new(
            ProviderId::nil(),
            CountryId::nil(),
            CountryId::nil(),
            CurrencyId::nil(),
            "bank_transfer",
        );
        rule.id = rates_types::TransferRuleId::from_uuid(id);
        rule.to_record()
    }

    fn document_record(name: &str) -> Record {
        let mut doc = Document::new(name);
        doc.id = rates_types::DocumentId::from_uuid(Uuid::new_v4());
        doc.created_at = Utc::now();
        doc.to_record()
    }

    #[tokio::test]
    async fn test_joined_fan_out_collapses_to_one_root() {
        let rule_id = Uuid::new_v4();
        let rule = prefixed(0, &rule_record(rule_id));
        let passport = prefixed(1, &document_record("Passport"));
        let utility = prefixed(1, &document_record("Utility bill"));
        let rows = vec![
            merge(&[rule.clone(), passport.clone()]),
            merge(&[rule.clone(), utility]),
            merge(&[rule, passport]),
        ];

        let exec = Replay::new(vec![rows]);
        let plan = TransferRule::active()
            .join(Join::active(TransferRule::REQUIRED_DOCUMENTS))
            .into_plan();
        let entries = load(&exec, &plan, None).await.unwrap();

        assert_eq!(entries.len(), 1);
        let docs = entries[0].1.many("required_documents").unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].record.text("name").unwrap(), "Passport");
    }

    #[tokio::test]
    async fn test_unmatched_join_reads_as_empty() {
        let rule = prefixed(0, &rule_record(Uuid::new_v4()));
        let exec = Replay::new(vec![vec![merge(&[rule, null_document(1)])]]);
        let plan = TransferRule::active()
            .join(Join::active(TransferRule::REQUIRED_DOCUMENTS))
            .into_plan();
        let entries = load(&exec, &plan, None).await.unwrap();

        assert_eq!(entries[0].1.many("required_documents").map(|d| d.len()), Some(0));
    }

    #[tokio::test]
    async fn test_load_skips_query_without_parents() {
        let exec = Replay::new(vec![Vec::new()]);
        let plan = rates_types::TransferProvider::active()
            .load(rates_types::Load::active(
                rates_types::TransferProvider::TRANSFER_RULES,
            ))
            .into_plan();
        let entries = load(&exec, &plan, None).await.unwrap();

        assert!(entries.is_empty());
        assert_eq!(exec.statements.lock().unwrap().len(), 1);
    }
}
