//! PostgreSQL repository adapter.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgArguments, PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use uuid::Uuid;

use rates_types::{
    ColumnKind, Decoded, Entity, Record, ReferenceRepository, Relation, RepoError, Select, Value,
};

use crate::loader::SqlExecutor;
use crate::sql::{Dialect, Statement};
use crate::store::{self, map_sqlx_error};

// ─────────────────────────────────────────────────────────────────────────────
// PostgreSQL Repository
// ─────────────────────────────────────────────────────────────────────────────

/// PostgreSQL repository with native uuid, timestamptz and boolean columns.
pub struct PostgresRepo {
    pool: PgPool,
}

/// Executes SQL statements from a migration file, splitting by semicolons.
async fn execute_migration(pool: &PgPool, sql: &str, name: &str) -> Result<(), anyhow::Error> {
    for statement in sql.split(';') {
        let stmt = statement.trim();
        if !stmt.is_empty() {
            sqlx::query(stmt)
                .execute(pool)
                .await
                .map_err(|e| anyhow::anyhow!("Migration {} failed: {}", name, e))?;
        }
    }
    Ok(())
}

/// Runs all database migrations.
async fn run_migrations(pool: &PgPool) -> Result<(), anyhow::Error> {
    execute_migration(
        pool,
        include_str!("../migrations/0001_create_reference_tables_pg.sql"),
        "0001",
    )
    .await
}

impl PostgresRepo {
    /// Creates a new PostgreSQL repository with automatic migration.
    pub async fn new(database_url: &str, max_connections: u32) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections.max(1))
            .connect(database_url)
            .await?;
        run_migrations(&pool).await?;
        tracing::info!("PostgreSQL repository ready");
        Ok(Self { pool })
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Creates the database schema (for testing with existing pool).
    pub async fn create_schema(&self) -> Result<(), RepoError> {
        run_migrations(&self.pool)
            .await
            .map_err(|e| RepoError::Database(e.to_string()))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Value encoding
// ─────────────────────────────────────────────────────────────────────────────

fn bind_all<'q>(
    mut query: sqlx::query::Query<'q, sqlx::Postgres, PgArguments>,
    binds: &[(Value, ColumnKind)],
) -> sqlx::query::Query<'q, sqlx::Postgres, PgArguments> {
    for (value, kind) in binds {
        query = match (value, kind) {
            (Value::Null, ColumnKind::Uuid) => query.bind(None::<Uuid>),
            (Value::Null, ColumnKind::Text) => query.bind(None::<String>),
            (Value::Null, ColumnKind::Bool) => query.bind(None::<bool>),
            (Value::Null, ColumnKind::Float) => query.bind(None::<f64>),
            (Value::Null, ColumnKind::Timestamp) => query.bind(None::<DateTime<Utc>>),
            (Value::Bool(v), _) => query.bind(*v),
            (Value::Float(v), _) => query.bind(*v),
            (Value::Text(v), _) => query.bind(v.clone()),
            (Value::Uuid(v), _) => query.bind(*v),
            (Value::Timestamp(v), _) => query.bind(*v),
        };
    }
    query
}

fn decode_row(row: &PgRow, columns: &[(String, ColumnKind)]) -> Result<Record, RepoError> {
    let mut record = Record::new();
    for (label, kind) in columns {
        let name = label.as_str();
        let value: Value = match kind {
            ColumnKind::Uuid => row.try_get::<Option<Uuid>, _>(name).map_err(map_sqlx_error)?.into(),
            ColumnKind::Text => row
                .try_get::<Option<String>, _>(name)
                .map_err(map_sqlx_error)?
                .into(),
            ColumnKind::Bool => row.try_get::<Option<bool>, _>(name).map_err(map_sqlx_error)?.into(),
            ColumnKind::Float => row.try_get::<Option<f64>, _>(name).map_err(map_sqlx_error)?.into(),
            ColumnKind::Timestamp => row
                .try_get::<Option<DateTime<Utc>>, _>(name)
                .map_err(map_sqlx_error)?
                .into(),
        };
        record.insert(label.clone(), value);
    }
    Ok(record)
}

#[async_trait]
impl SqlExecutor for PostgresRepo {
    fn dialect(&self) -> Dialect {
        Dialect::Postgres
    }

    async fn fetch(&self, statement: &Statement) -> Result<Vec<Record>, RepoError> {
        tracing::trace!(sql = %statement.sql, "postgres fetch");
        let rows = bind_all(sqlx::query(&statement.sql), &statement.binds)
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        rows.iter()
            .map(|row| decode_row(row, &statement.columns))
            .collect()
    }

    async fn execute(&self, statement: &Statement) -> Result<u64, RepoError> {
        tracing::trace!(sql = %statement.sql, "postgres execute");
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
impl ReferenceRepository for PostgresRepo {
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
