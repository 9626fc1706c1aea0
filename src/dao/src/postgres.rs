use serde_json::Value;
use sqlx::{
    postgres::{PgArguments, PgConnection, PgRow},
    query::Query,
    types::Json,
    Column, Connection, Postgres, Row as _, TypeInfo,
};
use tokio::runtime::{Builder, Runtime};
use tracing::{debug, warn};

use crate::{redact, Dao, DaoError, DaoResult, Dialect, Row};

/// PostgreSQL backend. The driver is async, so every call is driven to
/// completion on a runtime owned by the DAO.
pub struct PostgresDao {
    connection_string: String,
    runtime: Runtime,
    conn: Option<PgConnection>,
}

impl PostgresDao {
    pub fn connect(connection_string: &str) -> DaoResult<PostgresDao> {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|err| DaoError::connection(connection_string, err))?;
        let conn = runtime
            .block_on(PgConnection::connect(connection_string))
            .map_err(|err| DaoError::connection(connection_string, err))?;

        Ok(PostgresDao {
            connection_string: connection_string.to_string(),
            runtime,
            conn: Some(conn),
        })
    }

    fn release(&mut self) {
        self.close();
    }
}

fn ensure<'c>(
    conn: &'c mut Option<PgConnection>,
    runtime: &Runtime,
    connection_string: &str,
) -> DaoResult<&'c mut PgConnection> {
    let connection = match conn.take() {
        Some(connection) => connection,
        None => {
            debug!("re-opening {}", redact(connection_string));
            runtime
                .block_on(PgConnection::connect(connection_string))
                .map_err(|err| DaoError::connection(connection_string, err))?
        }
    };
    Ok(conn.insert(connection))
}

impl Dao for PostgresDao {
    fn dialect(&self) -> Dialect {
        Dialect::Postgres
    }

    fn query(&mut self, sql: &str, params: &[Value]) -> DaoResult<Vec<Row>> {
        debug!(sql, ?params, "postgres query");
        let conn = ensure(&mut self.conn, &self.runtime, &self.connection_string)?;
        let rows = self
            .runtime
            .block_on(bind_all(sqlx::query(sql), params).fetch_all(&mut *conn))?;
        rows.iter().map(decode_row).collect()
    }

    fn trans(&mut self, sql: &str, params: &[Value]) -> DaoResult<bool> {
        debug!(sql, ?params, "postgres trans");
        let conn = ensure(&mut self.conn, &self.runtime, &self.connection_string)?;
        let result = self.runtime.block_on(async {
            let mut tx = conn.begin().await?;
            match bind_all(sqlx::query(sql), params).execute(&mut *tx).await {
                Ok(_) => tx.commit().await,
                Err(err) => {
                    if let Err(rollback_err) = tx.rollback().await {
                        warn!(%rollback_err, "rollback failed");
                    }
                    Err(err)
                }
            }
        });
        self.release();
        result?;
        Ok(true)
    }

    fn trans_query(&mut self, sql: &str, params: &[Value]) -> DaoResult<Vec<Row>> {
        debug!(sql, ?params, "postgres trans_query");
        let conn = ensure(&mut self.conn, &self.runtime, &self.connection_string)?;
        let result = self.runtime.block_on(async {
            let mut tx = conn.begin().await?;
            match bind_all(sqlx::query(sql), params).fetch_all(&mut *tx).await {
                Ok(rows) => tx.commit().await.map(|_| rows),
                Err(err) => {
                    if let Err(rollback_err) = tx.rollback().await {
                        warn!(%rollback_err, "rollback failed");
                    }
                    Err(err)
                }
            }
        });
        self.release();
        result?.iter().map(decode_row).collect()
    }

    fn is_connected(&self) -> bool {
        self.conn.is_some()
    }

    fn close(&mut self) {
        if let Some(conn) = self.conn.take() {
            if let Err(err) = self.runtime.block_on(conn.close()) {
                warn!(%err, "failed to close {}", redact(&self.connection_string));
            }
        }
    }
}

fn bind_all<'q>(
    mut query: Query<'q, Postgres, PgArguments>,
    params: &'q [Value],
) -> Query<'q, Postgres, PgArguments> {
    for param in params {
        query = match param {
            Value::Null => query.bind(None::<String>),
            Value::Bool(b) => query.bind(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => query.bind(i),
                None => query.bind(n.as_f64()),
            },
            Value::String(s) => query.bind(s.as_str()),
            other => query.bind(Json(other)),
        };
    }
    query
}

fn decode_row(row: &PgRow) -> DaoResult<Row> {
    let mut record = Row::new();
    for column in row.columns() {
        let index = column.ordinal();
        let value = decode_value(row, index, column.type_info().name())?;
        record.insert(column.name().to_string(), value);
    }
    Ok(record)
}

fn decode_value(row: &PgRow, index: usize, type_name: &str) -> DaoResult<Value> {
    let value = match type_name {
        "BOOL" => row.try_get::<Option<bool>, _>(index)?.map(Value::from),
        "INT2" => row.try_get::<Option<i16>, _>(index)?.map(Value::from),
        "INT4" => row.try_get::<Option<i32>, _>(index)?.map(Value::from),
        "INT8" => row.try_get::<Option<i64>, _>(index)?.map(Value::from),
        "FLOAT4" => row
            .try_get::<Option<f32>, _>(index)?
            .map(|f| Value::from(f64::from(f))),
        "FLOAT8" => row.try_get::<Option<f64>, _>(index)?.map(Value::from),
        "UUID" => row
            .try_get::<Option<uuid::Uuid>, _>(index)?
            .map(|u| Value::from(u.to_string())),
        "JSON" | "JSONB" => row.try_get::<Option<Value>, _>(index)?,
        "TIMESTAMPTZ" => row
            .try_get::<Option<chrono::DateTime<chrono::Utc>>, _>(index)?
            .map(|t| Value::from(t.to_rfc3339())),
        "TIMESTAMP" => row
            .try_get::<Option<chrono::NaiveDateTime>, _>(index)?
            .map(|t| Value::from(t.to_string())),
        "DATE" => row
            .try_get::<Option<chrono::NaiveDate>, _>(index)?
            .map(|d| Value::from(d.to_string())),
        "TEXT" | "VARCHAR" | "BPCHAR" | "NAME" | "CHAR" | "CITEXT" => {
            row.try_get::<Option<String>, _>(index)?.map(Value::from)
        }
        "NUMERIC" => row
            .try_get::<Option<rust_decimal::Decimal>, _>(index)?
            .map(|d| Value::from(d.to_string())),
        other => {
            debug!(column_type = other, "decoding unknown column type as text");
            row.try_get_unchecked::<Option<String>, _>(index)
                .map_err(|err| {
                    DaoError::UnexpectedResult(format!("cannot decode column {index} of type {other}: {err}"))
                })?
                .map(Value::from)
        }
    };
    Ok(value.unwrap_or(Value::Null))
}
