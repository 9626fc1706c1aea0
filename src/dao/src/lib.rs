//! # Generic database access
//!
//! A [`Dao`] wraps one connection to a service database and exposes two verbs:
//! `query` for reads and `trans` for writes. Writes always run inside an
//! explicit transaction that is committed on success and rolled back on any
//! error; the connection is released after every write and re-opened on the
//! next call. Values travel as [`serde_json::Value`] and every statement is
//! parameterised using the backend's [`Dialect`].
//!
//! ```no_run
//! # fn main() -> dao::DaoResult<()> {
//! let mut dao = dao::connect("sqlite:///gatekeeper.db")?;
//! let rows = dao.query("SELECT username FROM auth_user WHERE id = ?1", &[42.into()])?;
//! for row in rows {
//!     println!("{}", row["username"]);
//! }
//! # Ok(())
//! # }
//! ```

use serde_json::Value;
use tracing::debug;

mod error;
mod postgres;
mod sqlite;

pub use error::{redact, DaoError, DaoResult};
pub use postgres::PostgresDao;
pub use sqlite::SqliteDao;

/// One result row: column name to value.
pub type Row = serde_json::Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Sqlite,
    Postgres,
}

impl Dialect {
    /// Positional placeholder for the 1-based parameter `index`.
    pub fn placeholder(&self, index: usize) -> String {
        match self {
            Dialect::Sqlite => format!("?{index}"),
            Dialect::Postgres => format!("${index}"),
        }
    }

    pub fn quote_ident(&self, ident: &str) -> String {
        format!("\"{}\"", ident.replace('"', "\"\""))
    }
}

pub trait Dao: Send {
    fn dialect(&self) -> Dialect;

    /// Runs a read statement. No matching rows is an empty vector, not an error.
    fn query(&mut self, sql: &str, params: &[Value]) -> DaoResult<Vec<Row>>;

    /// Runs a write statement in its own transaction and returns `true` once
    /// committed. On failure the transaction is rolled back and the error
    /// returned. The connection is released either way.
    fn trans(&mut self, sql: &str, params: &[Value]) -> DaoResult<bool>;

    /// Like [`Dao::trans`] for writes with a `RETURNING` clause.
    fn trans_query(&mut self, sql: &str, params: &[Value]) -> DaoResult<Vec<Row>>;

    fn is_connected(&self) -> bool;

    fn close(&mut self);

    fn count(&mut self, table: &str) -> DaoResult<i64> {
        let sql = format!(
            "SELECT COUNT(*) AS row_count FROM {}",
            self.dialect().quote_ident(table)
        );
        self.query(&sql, &[])?
            .first()
            .and_then(|row| row.get("row_count"))
            .and_then(Value::as_i64)
            .ok_or_else(|| DaoError::UnexpectedResult(format!("no row count for {table}")))
    }
}

/// Opens a DAO for `postgresql://…` / `postgres://…` or `sqlite:///<path>`
/// connection strings.
pub fn connect(connection_string: &str) -> DaoResult<Box<dyn Dao>> {
    let (scheme, _) = connection_string
        .split_once("://")
        .ok_or_else(|| DaoError::connection(connection_string, "missing scheme"))?;

    debug!(target = %redact(connection_string), "connecting");
    match scheme {
        "sqlite" => Ok(Box::new(SqliteDao::connect(connection_string)?)),
        "postgresql" | "postgres" => Ok(Box::new(PostgresDao::connect(connection_string)?)),
        other => Err(DaoError::connection(
            connection_string,
            format!("unsupported scheme '{other}'"),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholders() {
        assert_eq!(Dialect::Sqlite.placeholder(3), "?3");
        assert_eq!(Dialect::Postgres.placeholder(1), "$1");
    }

    #[test]
    fn test_quote_ident() {
        assert_eq!(Dialect::Postgres.quote_ident("user"), "\"user\"");
        assert_eq!(Dialect::Sqlite.quote_ident("we\"ird"), "\"we\"\"ird\"");
    }

    #[test]
    fn test_malformed_connection_strings() {
        for cs in ["gatekeeper.db", "mysql://u:p@h/db", ""] {
            assert!(matches!(connect(cs), Err(DaoError::Connection { .. })), "{cs}");
        }
    }
}
