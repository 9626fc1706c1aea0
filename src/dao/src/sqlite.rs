use std::path::PathBuf;

use rusqlite::{
    params_from_iter,
    types::{Value as SqliteValue, ValueRef},
    Connection, Transaction,
};
use serde_json::Value;
use tracing::{debug, warn};

use crate::{Dao, DaoError, DaoResult, Dialect, Row};

#[derive(Debug, Clone, PartialEq)]
enum Target {
    Memory,
    File(PathBuf),
}

impl Target {
    /// `sqlite:///relative.db`, `sqlite:////abs/path.db`, `sqlite://` and
    /// `sqlite:///:memory:`.
    fn parse(connection_string: &str) -> DaoResult<Target> {
        let rest = connection_string
            .strip_prefix("sqlite://")
            .ok_or_else(|| DaoError::connection(connection_string, "not a sqlite connection string"))?;
        let path = rest.strip_prefix('/').unwrap_or(rest);
        if path.is_empty() || path == ":memory:" {
            Ok(Target::Memory)
        } else {
            Ok(Target::File(PathBuf::from(path)))
        }
    }

    fn open(&self) -> rusqlite::Result<Connection> {
        let conn = match self {
            Target::Memory => Connection::open_in_memory()?,
            Target::File(path) => Connection::open(path)?,
        };
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Ok(conn)
    }
}

pub struct SqliteDao {
    connection_string: String,
    target: Target,
    conn: Option<Connection>,
}

impl SqliteDao {
    pub fn connect(connection_string: &str) -> DaoResult<SqliteDao> {
        let target = Target::parse(connection_string)?;
        let conn = target
            .open()
            .map_err(|err| DaoError::connection(connection_string, err))?;

        Ok(SqliteDao {
            connection_string: connection_string.to_string(),
            target,
            conn: Some(conn),
        })
    }

    fn connection(&mut self) -> DaoResult<&mut Connection> {
        let conn = match self.conn.take() {
            Some(conn) => conn,
            None => {
                debug!("re-opening {}", self.connection_string);
                self.target
                    .open()
                    .map_err(|err| DaoError::connection(&self.connection_string, err))?
            }
        };
        Ok(self.conn.insert(conn))
    }

    /// In-memory databases only live as long as their connection, so those
    /// are never released.
    fn release(&mut self) {
        if self.target != Target::Memory {
            self.close();
        }
    }

    fn in_transaction<T>(
        &mut self,
        work: impl FnOnce(&Transaction) -> rusqlite::Result<T>,
    ) -> DaoResult<T> {
        let conn = self.connection()?;
        let tx = conn.transaction()?;
        let result = match work(&tx) {
            Ok(value) => tx.commit().map(|_| value),
            Err(err) => {
                if let Err(rollback_err) = tx.rollback() {
                    warn!(%rollback_err, "rollback failed");
                }
                Err(err)
            }
        };
        self.release();
        Ok(result?)
    }
}

impl Dao for SqliteDao {
    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    fn query(&mut self, sql: &str, params: &[Value]) -> DaoResult<Vec<Row>> {
        debug!(sql, ?params, "sqlite query");
        let conn = self.connection()?;
        Ok(collect_rows(conn, sql, params)?)
    }

    fn trans(&mut self, sql: &str, params: &[Value]) -> DaoResult<bool> {
        debug!(sql, ?params, "sqlite trans");
        self.in_transaction(|tx| {
            let mut stmt = tx.prepare_cached(sql)?;
            stmt.execute(params_from_iter(params.iter().map(to_sqlite)))?;
            Ok(true)
        })
    }

    fn trans_query(&mut self, sql: &str, params: &[Value]) -> DaoResult<Vec<Row>> {
        debug!(sql, ?params, "sqlite trans_query");
        self.in_transaction(|tx| collect_rows(tx, sql, params))
    }

    fn is_connected(&self) -> bool {
        self.conn.is_some()
    }

    fn close(&mut self) {
        if let Some(conn) = self.conn.take() {
            if let Err((_, err)) = conn.close() {
                warn!(%err, "failed to close {}", self.connection_string);
            }
        }
    }
}

fn collect_rows(conn: &Connection, sql: &str, params: &[Value]) -> rusqlite::Result<Vec<Row>> {
    let mut stmt = conn.prepare_cached(sql)?;
    let names: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
    let mut rows = stmt.query(params_from_iter(params.iter().map(to_sqlite)))?;

    let mut result = Vec::new();
    while let Some(row) = rows.next()? {
        let mut record = Row::new();
        for (index, name) in names.iter().enumerate() {
            record.insert(name.clone(), from_sqlite(row.get_ref(index)?));
        }
        result.push(record);
    }
    Ok(result)
}

fn to_sqlite(value: &Value) -> SqliteValue {
    match value {
        Value::Null => SqliteValue::Null,
        Value::Bool(b) => SqliteValue::Integer(i64::from(*b)),
        Value::Number(n) => match n.as_i64() {
            Some(i) => SqliteValue::Integer(i),
            None => SqliteValue::Real(n.as_f64().unwrap_or_default()),
        },
        Value::String(s) => SqliteValue::Text(s.clone()),
        other => SqliteValue::Text(other.to_string()),
    }
}

fn from_sqlite(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::from(i),
        ValueRef::Real(f) => Value::from(f),
        ValueRef::Text(text) => Value::String(String::from_utf8_lossy(text).into_owned()),
        ValueRef::Blob(bytes) => Value::from(bytes.to_vec()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_targets() {
        assert_eq!(Target::parse("sqlite://").unwrap(), Target::Memory);
        assert_eq!(Target::parse("sqlite:///:memory:").unwrap(), Target::Memory);
        assert_eq!(
            Target::parse("sqlite:///courier.sqlite3").unwrap(),
            Target::File(PathBuf::from("courier.sqlite3"))
        );
        assert_eq!(
            Target::parse("sqlite:////var/lib/gk.db").unwrap(),
            Target::File(PathBuf::from("/var/lib/gk.db"))
        );
        assert!(Target::parse("postgresql://x").is_err());
    }

    #[test]
    fn test_value_conversion() {
        assert_eq!(to_sqlite(&json!(true)), SqliteValue::Integer(1));
        assert_eq!(to_sqlite(&json!(2.5)), SqliteValue::Real(2.5));
        assert_eq!(to_sqlite(&json!(["a"])), SqliteValue::Text("[\"a\"]".to_string()));
        assert_eq!(from_sqlite(ValueRef::Text(b"gk")), json!("gk"));
        assert_eq!(from_sqlite(ValueRef::Null), Value::Null);
    }

    #[test]
    fn test_memory_database_survives_writes() -> DaoResult<()> {
        let mut dao = SqliteDao::connect("sqlite://")?;
        dao.trans("CREATE TABLE t (id INTEGER PRIMARY KEY)", &[])?;
        dao.trans("INSERT INTO t (id) VALUES (?1)", &[json!(1)])?;

        assert!(dao.is_connected());
        assert_eq!(dao.count("t")?, 1);
        Ok(())
    }
}
