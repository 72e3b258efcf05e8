//! SQL rendering for query plans and writes.
//!
//! Rendering is pure string building. Every selected column is labelled
//! `tN__column`, where `t0` is the primary table and each join gets the next
//! free `N`; the loader uses those labels to split a flat result row back into
//! per-table records.

use uuid::Uuid;

use rates_types::{
    ColumnKind, EntityMeta, Join, Predicate, QueryPlan, Record, Relation, RelationKind, Value,
};

/// Label of the parent id column selected by batched loads.
pub const PARENT_LABEL: &str = "__parent";

/// Placeholder style of the target database.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Sqlite,
    Postgres,
}

/// A rendered statement with its bind values and the columns it returns.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub binds: Vec<(Value, ColumnKind)>,
    /// `(label, kind)` of every selected column, in select order.
    pub columns: Vec<(String, ColumnKind)>,
}

/// A join as laid out in a rendered statement.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinSlot {
    pub relation: Relation,
    pub alias: usize,
    pub active_only: bool,
    pub nested: Vec<JoinSlot>,
}

/// Restricts a batched load to the rows belonging to a set of parents.
#[derive(Debug, Clone, PartialEq)]
pub enum ParentLink {
    /// Child rows whose `column` holds one of the parent ids.
    ByForeignKey { column: &'static str, ids: Vec<Uuid> },
    /// Rows connected to the parents through an association table.
    ByAssociation {
        table: &'static str,
        owner_key: &'static str,
        target_key: &'static str,
        ids: Vec<Uuid>,
    },
    /// Rows referenced directly by id from the parents.
    ById { ids: Vec<Uuid> },
}

pub fn label(alias: usize, column: &str) -> String {
    format!("t{alias}__{column}")
}

/// Splits a `tN__column` label into its alias number and column.
pub fn split_label(label: &str) -> Option<(usize, &str)> {
    let rest = label.strip_prefix('t')?;
    let (alias, column) = rest.split_once("__")?;
    Some((alias.parse().ok()?, column))
}

struct Builder {
    dialect: Dialect,
    sql: String,
    binds: Vec<(Value, ColumnKind)>,
}

impl Builder {
    fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            sql: String::new(),
            binds: Vec::new(),
        }
    }

    fn push(&mut self, sql: &str) {
        self.sql.push_str(sql);
    }

    fn bind(&mut self, value: Value, kind: ColumnKind) {
        self.binds.push((value, kind));
        match self.dialect {
            Dialect::Sqlite => self.sql.push('?'),
            Dialect::Postgres => {
                self.sql.push('$');
                self.sql.push_str(&self.binds.len().to_string());
            }
        }
    }

    fn finish(self, columns: Vec<(String, ColumnKind)>) -> Statement {
        Statement {
            sql: self.sql,
            binds: self.binds,
            columns,
        }
    }
}

fn column_kind(meta: &EntityMeta, column: &str, value: &Value) -> ColumnKind {
    meta.column(column)
        .map(|c| c.kind)
        .or_else(|| value.kind())
        .unwrap_or(ColumnKind::Text)
}

// ─────────────────────────────────────────────────────────────────────────────
// SELECT
// ─────────────────────────────────────────────────────────────────────────────

/// Renders a plan's primary statement, joins included, optionally restricted
/// to the rows belonging to a set of parents.
pub fn render_select(
    plan: &QueryPlan,
    dialect: Dialect,
    link: Option<&ParentLink>,
) -> (Statement, Vec<JoinSlot>) {
    let mut next_alias = 1;
    let slots = layout(&plan.joins, &mut next_alias);

    let mut select_list = Vec::new();
    let mut columns = Vec::new();
    push_columns(&plan.meta, 0, &mut select_list, &mut columns);
    for slot in &slots {
        push_slot_columns(slot, &mut select_list, &mut columns);
    }
    let parent_expr = match link {
        Some(ParentLink::ByForeignKey { column, .. }) => Some(format!("t0.\"{column}\"")),
        Some(ParentLink::ByAssociation { owner_key, .. }) => Some(format!("lk.\"{owner_key}\"")),
        Some(ParentLink::ById { .. }) | None => None,
    };
    if let Some(expr) = parent_expr {
        select_list.push(format!("{expr} AS \"{PARENT_LABEL}\""));
        columns.push((PARENT_LABEL.to_string(), ColumnKind::Uuid));
    }

    let mut b = Builder::new(dialect);
    b.push("SELECT ");
    b.push(&select_list.join(", "));
    b.push(&format!(" FROM {} t0", plan.meta.table));

    if let Some(ParentLink::ByAssociation {
        table, target_key, ..
    }) = link
    {
        b.push(&format!(
            " INNER JOIN {table} lk ON lk.\"{target_key}\" = t0.\"id\""
        ));
    }

    for slot in &slots {
        push_join(&mut b, slot, 0);
    }

    let mut conditions = 0;
    for predicate in &plan.predicates {
        push_condition_prefix(&mut b, &mut conditions);
        push_predicate(&mut b, &plan.meta, predicate);
    }

    match link {
        Some(ParentLink::ByForeignKey { column, ids }) => {
            push_condition_prefix(&mut b, &mut conditions);
            push_in_ids(&mut b, &format!("t0.\"{column}\""), ids);
        }
        Some(ParentLink::ByAssociation { owner_key, ids, .. }) => {
            push_condition_prefix(&mut b, &mut conditions);
            push_in_ids(&mut b, &format!("lk.\"{owner_key}\""), ids);
        }
        Some(ParentLink::ById { ids }) => {
            push_condition_prefix(&mut b, &mut conditions);
            push_in_ids(&mut b, "t0.\"id\"", ids);
        }
        None => {}
    }

    let order: Vec<String> = plan
        .order_by
        .iter()
        .copied()
        .chain(["created_at", "id"])
        .map(|column| format!("t0.\"{column}\""))
        .collect();
    b.push(" ORDER BY ");
    b.push(&order.join(", "));

    (b.finish(columns), slots)
}

fn layout(joins: &[Join], next_alias: &mut usize) -> Vec<JoinSlot> {
    joins
        .iter()
        .map(|join| {
            let alias = *next_alias;
            *next_alias += 1;
            JoinSlot {
                relation: join.relation,
                alias,
                active_only: join.active_only,
                nested: layout(&join.nested, next_alias),
            }
        })
        .collect()
}

fn push_columns(
    meta: &EntityMeta,
    alias: usize,
    select_list: &mut Vec<String>,
    columns: &mut Vec<(String, ColumnKind)>,
) {
    for column in meta.columns {
        let label = label(alias, column.name);
        select_list.push(format!("t{alias}.\"{}\" AS \"{label}\"", column.name));
        columns.push((label, column.kind));
    }
}

fn push_slot_columns(
    slot: &JoinSlot,
    select_list: &mut Vec<String>,
    columns: &mut Vec<(String, ColumnKind)>,
) {
    push_columns(slot.relation.target, slot.alias, select_list, columns);
    for nested in &slot.nested {
        push_slot_columns(nested, select_list, columns);
    }
}

fn push_join(b: &mut Builder, slot: &JoinSlot, parent: usize) {
    let target = slot.relation.target.table;
    let n = slot.alias;
    let active = if slot.active_only {
        format!(" AND t{n}.\"is_active\" = TRUE")
    } else {
        String::new()
    };

    match slot.relation.kind {
        RelationKind::ManyToOne { foreign_key } => b.push(&format!(
            " LEFT JOIN {target} t{n} ON t{n}.\"id\" = t{parent}.\"{foreign_key}\"{active}"
        )),
        RelationKind::OneToMany { foreign_key } => b.push(&format!(
            " LEFT JOIN {target} t{n} ON t{n}.\"{foreign_key}\" = t{parent}.\"id\"{active}"
        )),
        RelationKind::ManyToMany {
            table,
            owner_key,
            target_key,
            ..
        } => b.push(&format!(
            " LEFT JOIN {table} a{n} ON a{n}.\"{owner_key}\" = t{parent}.\"id\" \
             LEFT JOIN {target} t{n} ON t{n}.\"id\" = a{n}.\"{target_key}\"{active}"
        )),
    }

    for nested in &slot.nested {
        push_join(b, nested, n);
    }
}

fn push_condition_prefix(b: &mut Builder, conditions: &mut usize) {
    b.push(if *conditions == 0 { " WHERE " } else { " AND " });
    *conditions += 1;
}

fn push_predicate(b: &mut Builder, meta: &EntityMeta, predicate: &Predicate) {
    match predicate {
        Predicate::Active => b.push("t0.\"is_active\" = TRUE"),
        Predicate::Eq { column, value } if value.is_null() => {
            b.push(&format!("t0.\"{column}\" IS NULL"));
        }
        Predicate::Eq { column, value } => {
            b.push(&format!("t0.\"{column}\" = "));
            b.bind(value.clone(), column_kind(meta, column, value));
        }
        Predicate::In { column, values } => {
            if values.is_empty() {
                b.push("1 = 0");
                return;
            }
            b.push(&format!("t0.\"{column}\" IN ("));
            for (i, value) in values.iter().enumerate() {
                if i > 0 {
                    b.push(", ");
                }
                b.bind(value.clone(), column_kind(meta, column, value));
            }
            b.push(")");
        }
        Predicate::HasActive(relation) => push_has_active(b, relation),
    }
}

fn push_has_active(b: &mut Builder, relation: &Relation) {
    let target = relation.target.table;
    match relation.kind {
        RelationKind::ManyToOne { foreign_key } => b.push(&format!(
            "EXISTS (SELECT 1 FROM {target} ha WHERE ha.\"id\" = t0.\"{foreign_key}\" \
             AND ha.\"is_active\" = TRUE)"
        )),
        RelationKind::OneToMany { foreign_key } => b.push(&format!(
            "EXISTS (SELECT 1 FROM {target} ha WHERE ha.\"{foreign_key}\" = t0.\"id\" \
             AND ha.\"is_active\" = TRUE)"
        )),
        RelationKind::ManyToMany {
            table,
            owner_key,
            target_key,
            ..
        } => b.push(&format!(
            "EXISTS (SELECT 1 FROM {table} hl INNER JOIN {target} ha \
             ON ha.\"id\" = hl.\"{target_key}\" WHERE hl.\"{owner_key}\" = t0.\"id\" \
             AND ha.\"is_active\" = TRUE)"
        )),
    }
}

fn push_in_ids(b: &mut Builder, expr: &str, ids: &[Uuid]) {
    if ids.is_empty() {
        b.push("1 = 0");
        return;
    }
    b.push(expr);
    b.push(" IN (");
    for (i, id) in ids.iter().enumerate() {
        if i > 0 {
            b.push(", ");
        }
        b.bind(Value::Uuid(*id), ColumnKind::Uuid);
    }
    b.push(")");
}

// ─────────────────────────────────────────────────────────────────────────────
// Writes
// ─────────────────────────────────────────────────────────────────────────────

/// `INSERT` of every column of `meta`, values taken from `record`.
pub fn render_insert(meta: &EntityMeta, record: &Record, dialect: Dialect) -> Statement {
    let mut b = Builder::new(dialect);
    let names: Vec<String> = meta.columns.iter().map(|c| format!("\"{}\"", c.name)).collect();
    b.push(&format!(
        "INSERT INTO {} ({}) VALUES (",
        meta.table,
        names.join(", ")
    ));
    for (i, column) in meta.columns.iter().enumerate() {
        if i > 0 {
            b.push(", ");
        }
        let value = record.get(column.name).cloned().unwrap_or(Value::Null);
        b.bind(value, column.kind);
    }
    b.push(")");
    b.finish(Vec::new())
}

/// `UPDATE` of the active flag and `updated_at` of one row.
pub fn render_set_active(
    meta: &EntityMeta,
    id: Uuid,
    active: bool,
    now: chrono::DateTime<chrono::Utc>,
    dialect: Dialect,
) -> Statement {
    let mut b = Builder::new(dialect);
    b.push(&format!("UPDATE {} SET \"is_active\" = ", meta.table));
    b.bind(Value::Bool(active), ColumnKind::Bool);
    b.push(", \"updated_at\" = ");
    b.bind(Value::Timestamp(now), ColumnKind::Timestamp);
    b.push(" WHERE \"id\" = ");
    b.bind(Value::Uuid(id), ColumnKind::Uuid);
    b.finish(Vec::new())
}

/// Association insert for a many-to-many relation, `None` for other kinds.
///
/// With a link limit the insert is conditional on the owner's current link
/// count, so a full owner yields zero affected rows.
pub fn render_link(
    relation: &Relation,
    owner: Uuid,
    target: Uuid,
    dialect: Dialect,
) -> Option<Statement> {
    let RelationKind::ManyToMany {
        table,
        owner_key,
        target_key,
        max_links,
    } = relation.kind
    else {
        return None;
    };

    let mut b = Builder::new(dialect);
    b.push(&format!(
        "INSERT INTO {table} (\"{owner_key}\", \"{target_key}\") "
    ));
    match max_links {
        Some(max) => {
            b.push("SELECT ");
            b.bind(Value::Uuid(owner), ColumnKind::Uuid);
            b.push(", ");
            b.bind(Value::Uuid(target), ColumnKind::Uuid);
            b.push(&format!(
                " WHERE (SELECT COUNT(*) FROM {table} WHERE \"{owner_key}\" = "
            ));
            b.bind(Value::Uuid(owner), ColumnKind::Uuid);
            b.push(&format!(") < {max}"));
        }
        None => {
            b.push("VALUES (");
            b.bind(Value::Uuid(owner), ColumnKind::Uuid);
            b.push(", ");
            b.bind(Value::Uuid(target), ColumnKind::Uuid);
            b.push(")");
        }
    }
    Some(b.finish(Vec::new()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rates_types::{Country, Entity, Join, ProviderExchangeRate, Text, TransferRule};

    #[test]
    fn test_active_by_id_sqlite() {
        let id = Uuid::nil();
        let plan = Country::active().by_id(id).into_plan();
        let (stmt, slots) = render_select(&plan, Dialect::Sqlite, None);

        assert!(slots.is_empty());
        assert!(stmt.sql.starts_with("SELECT t0.\"id\" AS \"t0__id\""));
        assert!(stmt.sql.contains(" FROM countries t0 WHERE t0.\"is_active\" = TRUE AND t0.\"id\" = ?"));
        assert_eq!(stmt.binds, vec![(Value::Uuid(id), ColumnKind::Uuid)]);
        assert_eq!(stmt.columns.len(), Country::META.columns.len());
    }

    #[test]
    fn test_postgres_placeholders_are_numbered() {
        let plan = Country::active()
            .filter(Predicate::eq("name", "Germany"))
            .filter(Predicate::eq("abbreviation", "DE"))
            .into_plan();
        let (stmt, _) = render_select(&plan, Dialect::Postgres, None);
        assert!(stmt.sql.contains("t0.\"name\" = $1 AND t0.\"abbreviation\" = $2"));
    }

    #[test]
    fn test_null_and_empty_in_predicates() {
        let plan = Country::active()
            .filter(Predicate::eq("local_currency_id", Value::Null))
            .filter(Predicate::is_in("id", Vec::new()))
            .into_plan();
        let (stmt, _) = render_select(&plan, Dialect::Sqlite, None);
        assert!(stmt.sql.contains("t0.\"local_currency_id\" IS NULL AND 1 = 0"));
        assert!(stmt.binds.is_empty());
    }

    #[test]
    fn test_nested_and_active_joins() {
        let plan = TransferRule::active()
            .join(Join::new(TransferRule::SEND_COUNTRY).then(Join::new(Country::LOCAL_CURRENCY)))
            .join(Join::active(TransferRule::REQUIRED_DOCUMENTS))
            .into_plan();
        let (stmt, slots) = render_select(&plan, Dialect::Sqlite, None);

        assert_eq!(slots[0].alias, 1);
        assert_eq!(slots[0].nested[0].alias, 2);
        assert_eq!(slots[1].alias, 3);
        assert!(stmt.sql.contains(
            "LEFT JOIN countries t1 ON t1.\"id\" = t0.\"send_country_id\" \
             LEFT JOIN currencies t2 ON t2.\"id\" = t1.\"local_currency_id\""
        ));
        assert!(stmt.sql.contains(
            "LEFT JOIN transfer_rule_documents a3 ON a3.\"transfer_rule_id\" = t0.\"id\" \
             LEFT JOIN documents t3 ON t3.\"id\" = a3.\"document_id\" AND t3.\"is_active\" = TRUE"
        ));
        assert!(stmt.columns.iter().any(|(l, _)| l == "t2__abbreviation"));
    }

    #[test]
    fn test_has_active_many_to_one() {
        let plan = ProviderExchangeRate::active()
            .filter(Predicate::has_active(ProviderExchangeRate::PROVIDER))
            .into_plan();
        let (stmt, _) = render_select(&plan, Dialect::Postgres, None);
        assert!(stmt.sql.contains(
            "EXISTS (SELECT 1 FROM transfer_providers ha WHERE ha.\"id\" = t0.\"provider_id\" \
             AND ha.\"is_active\" = TRUE)"
        ));
    }

    #[test]
    fn test_association_link_selects_parent() {
        let plan = rates_types::Load::active(TransferRule::REQUIRED_DOCUMENTS).plan();
        let link = ParentLink::ByAssociation {
            table: "transfer_rule_documents",
            owner_key: "transfer_rule_id",
            target_key: "document_id",
            ids: vec![Uuid::nil()],
        };
        let (stmt, _) = render_select(&plan, Dialect::Sqlite, Some(&link));
        assert!(stmt.sql.contains("lk.\"transfer_rule_id\" AS \"__parent\""));
        assert!(stmt.sql.contains("INNER JOIN transfer_rule_documents lk ON lk.\"document_id\" = t0.\"id\""));
        assert!(stmt.sql.contains("lk.\"transfer_rule_id\" IN (?)"));
        assert_eq!(stmt.columns.last().map(|c| c.0.as_str()), Some(PARENT_LABEL));
    }

    #[test]
    fn test_limited_link_is_conditional() {
        let stmt = render_link(&Text::MEDIA_FILES, Uuid::nil(), Uuid::nil(), Dialect::Postgres)
            .unwrap();
        assert_eq!(
            stmt.sql,
            "INSERT INTO text_media (\"text_id\", \"media_id\") SELECT $1, $2 \
             WHERE (SELECT COUNT(*) FROM text_media WHERE \"text_id\" = $3) < 10"
        );
        assert!(render_link(&TransferRule::PROVIDER, Uuid::nil(), Uuid::nil(), Dialect::Sqlite).is_none());
    }

    #[test]
    fn test_split_label() {
        assert_eq!(split_label("t12__local_currency_id"), Some((12, "local_currency_id")));
        assert_eq!(split_label(PARENT_LABEL), None);
    }
}
