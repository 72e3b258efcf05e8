//! SQLite repository adapter.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::{SqliteArguments, SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use rates_types::{
    ColumnKind, Decoded, Entity, Record, ReferenceRepository, Relation, RepoError, Select, Value,
};

use crate::loader::SqlExecutor;
use crate::sql::{Dialect, Statement};
use crate::store::{self, map_sqlx_error};

// ─────────────────────────────────────────────────────────────────────────────
// SQLite Repository
// ─────────────────────────────────────────────────────────────────────────────

/// SQLite repository implementation.
///
/// Ids and timestamps are stored as text (RFC 3339 with microseconds), flags
/// as integers.
pub struct SqliteRepo {
    pool: SqlitePool,
}

impl SqliteRepo {
    /// Creates a new SQLite repository with automatic migration.
    pub async fn new(database_url: &str, max_connections: u32) -> anyhow::Result<Self> {
        // Ensure on-disk SQLite target directory exists (no-op for in-memory).
        if let Some(path) = database_url.strip_prefix("sqlite://") {
            // Remove query parameters
            let path = path.split('?').next().unwrap_or(path);
            if path != ":memory:"
                && let Some(parent) = std::path::Path::new(path).parent()
                && !parent.as_os_str().is_empty()
            {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .foreign_keys(true);

        // Every connection to an in-memory database sees its own empty database,
        // so the pool is pinned to one connection that never expires.
        let in_memory = database_url.contains(":memory:") || database_url.contains("mode=memory");
        let pool = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(options)
                .await?
        } else {
            SqlitePoolOptions::new()
                .max_connections(max_connections.max(1))
                .connect_with(options)
                .await?
        };

        let repo = Self { pool };
        repo.create_schema().await?;
        tracing::info!(in_memory, "SQLite repository ready");
        Ok(repo)
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Creates the database schema (idempotent).
    pub async fn create_schema(&self) -> Result<(), RepoError> {
        let ddl = include_str!("../migrations/0001_create_reference_tables.sql");
        sqlx::raw_sql(ddl)
            .execute(&self.pool)
            .await
            .map_err(|e| RepoError::Database(e.to_string()))?;
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Value encoding
// ─────────────────────────────────────────────────────────────────────────────

fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn bind_all<'q>(
    mut query: sqlx::query::Query<'q, sqlx::Sqlite, SqliteArguments<'q>>,
    binds: &[(Value, ColumnKind)],
) -> sqlx::query::Query<'q, sqlx::Sqlite, SqliteArguments<'q>> {
    for (value, kind) in binds {
        query = match (value, kind) {
            (Value::Null, ColumnKind::Bool) => query.bind(None::<bool>),
            (Value::Null, ColumnKind::Float) => query.bind(None::<f64>),
            (Value::Null, _) => query.bind(None::<String>),
            (Value::Bool(v), _) => query.bind(*v),
            (Value::Float(v), _) => query.bind(*v),
            (Value::Text(v), _) => query.bind(v.clone()),
            (Value::Uuid(v), _) => query.bind(v.to_string()),
            (Value::Timestamp(v), _) => query.bind(format_timestamp(v)),
        };
    }
    query
}

/// Decodes one row by column kind.
///
/// Id and timestamp text that does not parse is kept as raw text, so the
/// entity decoder rejects that row alone instead of the whole result set.
fn decode_row(row: &SqliteRow, columns: &[(String, ColumnKind)]) -> Result<Record, RepoError> {
    let mut record = Record::new();
    for (label, kind) in columns {
        let name = label.as_str();
        let value: Value = match kind {
            ColumnKind::Bool => row
                .try_get::<Option<bool>, _>(name)
                .map_err(map_sqlx_error)?
                .into(),
            ColumnKind::Float => row
                .try_get::<Option<f64>, _>(name)
                .map_err(map_sqlx_error)?
                .into(),
            ColumnKind::Text => row
                .try_get::<Option<String>, _>(name)
                .map_err(map_sqlx_error)?
                .into(),
            ColumnKind::Uuid => row
                .try_get::<Option<String>, _>(name)
                .map_err(map_sqlx_error)?
                .map(|s| match Uuid::parse_str(&s) {
                    Ok(id) => Value::Uuid(id),
                    Err(_) => Value::Text(s),
                })
                .into(),
            ColumnKind::Timestamp => row
                .try_get::<Option<String>, _>(name)
                .map_err(map_sqlx_error)?
                .map(|s| match DateTime::parse_from_rfc3339(&s) {
                    Ok(dt) => Value::Timestamp(dt.with_timezone(&Utc)),
                    Err(_) => Value::Text(s),
                })
                .into(),
        };
        record.insert(label.clone(), value);
    }
    Ok(record)
}

#[async_trait]
impl SqlExecutor for SqliteRepo {
    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    async fn fetch(&self, statement: &Statement) -> Result<Vec<Record>, RepoError> {
        tracing::trace!(sql = %statement.sql, "sqlite fetch");
        let rows = bind_all(sqlx::query(&statement.sql), &statement.binds)
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        rows.iter()
            .map(|row| decode_row(row, &statement.columns))
            .collect()
    }

    async fn execute(&self, statement: &Statement) -> Result<u64, RepoError> {
        tracing::trace!(sql = %statement.sql, "sqlite execute");
        let result = bind_all(sqlx::query(&statement.sql), &statement.binds)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(result.rows_affected())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Repository implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl ReferenceRepository for SqliteRepo {
    async fn fetch_all<E: Entity>(&self, select: Select<E>) -> Result<Vec<E>, RepoError> {
        store::fetch_all(self, select).await
    }

    async fn fetch_each<E: Entity>(&self, select: Select<E>) -> Result<Vec<Decoded<E>>, RepoError> {
        store::fetch_each(self, select).await
    }

    async fn insert<E: Entity>(&self, entity: E) -> Result<E, RepoError> {
        store::insert(self, entity).await
    }

    async fn link(&self, relation: Relation, owner: Uuid, target: Uuid) -> Result<(), RepoError> {
        store::link(self, relation, owner, target).await
    }

    async fn set_active<E: Entity>(&self, id: Uuid, active: bool) -> Result<bool, RepoError> {
        store::set_active::<_, E>(self, id, active).await
    }
}
