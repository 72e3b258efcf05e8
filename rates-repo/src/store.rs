//! Backend-independent repository operations.
//!
//! Both database adapters implement [`SqlExecutor`] and delegate their
//! `ReferenceRepository` methods here, so rendering, stitching and write
//! bookkeeping live in one place.

use chrono::{SubsecRound, Utc};
use uuid::Uuid;

use rates_types::{Decoded, DomainError, Entity, Relation, RelationKind, RepoError, Select, Value};

use crate::loader::{self, SqlExecutor};
use crate::sql::{render_insert, render_link, render_set_active};

pub(crate) async fn fetch_all<X, E>(exec: &X, select: Select<E>) -> Result<Vec<E>, RepoError>
where
    X: SqlExecutor + ?Sized,
    E: Entity,
{
    fetch_each(exec, select)
        .await?
        .into_iter()
        .map(|(_, decoded)| decoded.map_err(RepoError::from))
        .collect()
}

pub(crate) async fn fetch_each<X, E>(
    exec: &X,
    select: Select<E>,
) -> Result<Vec<Decoded<E>>, RepoError>
where
    X: SqlExecutor + ?Sized,
    E: Entity,
{
    let plan = select.into_plan();
    let entries = loader::load(exec, &plan, None).await?;
    tracing::debug!(entity = E::META.name, rows = entries.len(), "query loaded");

    entries
        .iter()
        .map(|(_, node)| {
            node.id()
                .map(|id| (id, E::from_node(node)))
                .map_err(RepoError::from)
        })
        .collect()
}

pub(crate) async fn insert<X, E>(exec: &X, entity: E) -> Result<E, RepoError>
where
    X: SqlExecutor + ?Sized,
    E: Entity,
{
    entity.validate()?;

    // Stored timestamps carry microsecond precision on both backends.
    let now = Utc::now().trunc_subsecs(6);
    let mut record = entity.to_record();
    record.insert("id", Uuid::new_v4());
    record.insert("created_at", now);
    record.insert("updated_at", Value::Null);
    for column in E::META.write_timestamps {
        record.insert(*column, now);
    }

    let statement = render_insert(&E::META, &record, exec.dialect());
    exec.execute(&statement).await?;

    let stored = E::from_record(&record)?;
    tracing::info!(entity = E::META.name, id = %stored.id(), "entity inserted");
    Ok(stored)
}

pub(crate) async fn link<X>(
    exec: &X,
    relation: Relation,
    owner: Uuid,
    target: Uuid,
) -> Result<(), RepoError>
where
    X: SqlExecutor + ?Sized,
{
    let Some(statement) = render_link(&relation, owner, target, exec.dialect()) else {
        return Err(DomainError::ValidationError(format!(
            "Relation `{}` cannot be linked directly",
            relation.name
        ))
        .into());
    };

    let affected = exec.execute(&statement).await?;
    if affected == 0 {
        let max = match relation.kind {
            RelationKind::ManyToMany {
                max_links: Some(max),
                ..
            } => max,
            _ => 0,
        };
        return Err(RepoError::Conflict(format!(
            "{owner} already has the maximum of {max} `{}` links",
            relation.name
        )));
    }
    Ok(())
}

pub(crate) async fn set_active<X, E>(exec: &X, id: Uuid, active: bool) -> Result<bool, RepoError>
where
    X: SqlExecutor + ?Sized,
    E: Entity,
{
    let now = Utc::now().trunc_subsecs(6);
    let statement = render_set_active(&E::META, id, active, now, exec.dialect());
    let affected = exec.execute(&statement).await?;
    Ok(affected > 0)
}

/// Maps constraint violations to [`RepoError::Conflict`], everything else to
/// [`RepoError::Database`].
pub(crate) fn map_sqlx_error(err: sqlx::Error) -> RepoError {
    if let sqlx::Error::Database(db) = &err {
        use sqlx::error::ErrorKind;
        match db.kind() {
            ErrorKind::UniqueViolation
            | ErrorKind::ForeignKeyViolation
            | ErrorKind::CheckViolation => {
                return RepoError::Conflict(db.message().to_string());
            }
            _ => {}
        }
    }
    RepoError::Database(err.to_string())
}
