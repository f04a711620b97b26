//! Postgres-backed [`Store`].

use async_trait::async_trait;
use devsync_core::filter::Scalar;
use devsync_core::types::DbId;
use serde_json::Value;
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::query::Query;
use sqlx::{Column, PgPool, Postgres, Row as _, TypeInfo};

use crate::error::StoreError;
use crate::statement::{Count, Insert, Param, RenderedSql, Row, Select, Statement};
use crate::store::Store;

/// Executes rendered statements through a shared connection pool.
///
/// The pool is acquired per statement; nothing is held between calls.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn render(statement: &Statement) -> RenderedSql {
    let sql = statement.to_sql();
    tracing::debug!(sql = %sql.text, params = sql.params.len(), "Executing statement");
    sql
}

/// Bind every parameter in order onto a dynamically-built query.
fn bind_params<'q>(
    mut q: Query<'q, Postgres, PgArguments>,
    params: &'q [Param],
) -> Query<'q, Postgres, PgArguments> {
    for param in params {
        q = match param {
            Param::Null => q.bind(None::<String>),
            Param::Scalar(Scalar::Int(v)) => q.bind(*v),
            Param::Scalar(Scalar::Float(v)) => q.bind(*v),
            Param::Scalar(Scalar::Bool(v)) => q.bind(*v),
            Param::Scalar(Scalar::Text(v)) => q.bind(v.as_str()),
            Param::Scalar(Scalar::Timestamp(v)) => q.bind(*v),
        };
    }
    q
}

/// Decode a row by column type into JSON values. Timestamps become
/// RFC 3339 strings; unknown types are read as text.
fn decode_row(row: &PgRow) -> Result<Row, StoreError> {
    let mut out = Row::with_capacity(row.columns().len());
    for column in row.columns() {
        let i = column.ordinal();
        let value = match column.type_info().name() {
            "INT2" => row.try_get::<Option<i16>, _>(i)?.map(Value::from),
            "INT4" => row.try_get::<Option<i32>, _>(i)?.map(Value::from),
            "INT8" => row.try_get::<Option<i64>, _>(i)?.map(Value::from),
            "FLOAT4" => row
                .try_get::<Option<f32>, _>(i)?
                .map(|v| Value::from(f64::from(v))),
            "FLOAT8" => row.try_get::<Option<f64>, _>(i)?.map(Value::from),
            "BOOL" => row.try_get::<Option<bool>, _>(i)?.map(Value::from),
            "TIMESTAMPTZ" => row
                .try_get::<Option<chrono::DateTime<chrono::Utc>>, _>(i)?
                .map(|t| Value::from(t.to_rfc3339())),
            "TIMESTAMP" => row
                .try_get::<Option<chrono::NaiveDateTime>, _>(i)?
                .map(|t| Value::from(t.and_utc().to_rfc3339())),
            "JSON" | "JSONB" => row.try_get::<Option<Value>, _>(i)?,
            _ => row.try_get::<Option<String>, _>(i)?.map(Value::from),
        };
        out.insert(column.name().to_string(), value.unwrap_or(Value::Null));
    }
    Ok(out)
}

#[async_trait]
impl Store for PgStore {
    async fn fetch_rows(&self, select: &Select) -> Result<Vec<Row>, StoreError> {
        let sql = render(&Statement::Select(select.clone()));
        let rows = bind_params(sqlx::query(&sql.text), &sql.params)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(decode_row).collect()
    }

    async fn fetch_count(&self, count: &Count) -> Result<i64, StoreError> {
        let sql = render(&Statement::Count(count.clone()));
        let row = bind_params(sqlx::query(&sql.text), &sql.params)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.try_get::<i64, _>(0)?)
    }

    async fn insert(&self, insert: &Insert) -> Result<DbId, StoreError> {
        let sql = render(&Statement::Insert(insert.clone()));
        let row = bind_params(sqlx::query(&sql.text), &sql.params)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::MissingId(insert.table.to_string()))?;
        Ok(row.try_get::<i64, _>(0)?)
    }

    async fn execute(&self, statement: &Statement) -> Result<u64, StoreError> {
        if !matches!(statement, Statement::Update(_) | Statement::Delete(_)) {
            return Err(StoreError::Unsupported("execute takes update or delete"));
        }
        let sql = render(statement);
        let result = bind_params(sqlx::query(&sql.text), &sql.params)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        crate::health_check(&self.pool).await?;
        Ok(())
    }
}
