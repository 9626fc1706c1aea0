use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::ConfigError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: &str, password: &str) -> Self {
        Credentials {
            username: username.to_string(),
            password: password.to_string(),
        }
    }
}

impl Display for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.username, self.password)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DbType {
    Postgresql,
    Sqlite,
}

impl DbType {
    pub fn scheme(&self) -> &'static str {
        match self {
            DbType::Postgresql => "postgresql",
            DbType::Sqlite => "sqlite",
        }
    }

    fn default_port(&self) -> Option<u16> {
        match self {
            DbType::Postgresql => Some(5432),
            DbType::Sqlite => None,
        }
    }
}

impl FromStr for DbType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "postgresql" | "postgres" => Ok(DbType::Postgresql),
            "sqlite" => Ok(DbType::Sqlite),
            other => Err(ConfigError::UnknownDbType(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DbConfig {
    #[serde(rename = "type")]
    pub db_type: DbType,
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
    /// Database name, or the file path for SQLite.
    pub name: String,
    #[serde(default)]
    pub credentials: Option<Credentials>,
    #[serde(default)]
    pub connection_string: Option<String>,
}

impl DbConfig {
    pub fn postgresql(host: &str, port: u16, name: &str, credentials: Credentials) -> Self {
        DbConfig {
            db_type: DbType::Postgresql,
            host: Some(host.to_string()),
            port: Some(port),
            name: name.to_string(),
            credentials: Some(credentials),
            connection_string: None,
        }
    }

    pub fn sqlite(path: &str) -> Self {
        DbConfig {
            db_type: DbType::Sqlite,
            host: None,
            port: None,
            name: path.to_string(),
            credentials: None,
            connection_string: None,
        }
    }

    /// `<type>://<credentials>@<host>:<port>/<name>` for server databases,
    /// `sqlite:///<name>` for file databases.
    pub fn derive_connection_string(&self) -> String {
        match self.db_type {
            DbType::Sqlite => format!("sqlite:///{}", self.name),
            DbType::Postgresql => {
                let host = self.host.as_deref().unwrap_or("localhost");
                let port = self.port.or(self.db_type.default_port()).unwrap_or(5432);
                match &self.credentials {
                    Some(creds) => format!(
                        "{}://{}@{}:{}/{}",
                        self.db_type.scheme(),
                        creds,
                        host,
                        port,
                        self.name
                    ),
                    None => format!("{}://{}:{}/{}", self.db_type.scheme(), host, port, self.name),
                }
            }
        }
    }

    pub fn connection_string(&self) -> String {
        self.connection_string
            .clone()
            .unwrap_or_else(|| self.derive_connection_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceConfig {
    #[serde(default = "default_scheme")]
    pub scheme: String,
    pub host: String,
    #[serde(default)]
    pub ip: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub credentials: Option<Credentials>,
    #[serde(default)]
    pub db: Option<DbConfig>,
}

impl ServiceConfig {
    pub fn base_url(&self) -> String {
        match self.port {
            Some(port) => format!("{}://{}:{}/", self.scheme, self.host, port),
            None => format!("{}://{}/", self.scheme, self.host),
        }
    }

    /// Fills in the derived DB connection string when the source left it out.
    pub fn normalized(mut self) -> Self {
        if let Some(db) = self.db.as_mut() {
            if db.connection_string.is_none() {
                db.connection_string = Some(db.derive_connection_string());
            }
        }
        self
    }
}

fn default_scheme() -> String {
    "https".to_string()
}

pub fn set_base_service_config(
    scheme: &str,
    host: &str,
    ip: Option<&str>,
    port: Option<u16>,
    credentials: Option<Credentials>,
    db: Option<DbConfig>,
) -> ServiceConfig {
    ServiceConfig {
        scheme: scheme.to_string(),
        host: host.to_string(),
        ip: ip.map(str::to_string),
        port,
        credentials,
        db,
    }
    .normalized()
}
