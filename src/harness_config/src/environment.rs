use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Deployment the harness is pointed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Dev,
    Test,
    Uat,
}

impl Environment {
    pub const ALL: [Environment; 3] = [Environment::Dev, Environment::Test, Environment::Uat];

    pub fn name(&self) -> &'static str {
        match self {
            Environment::Dev => "dev",
            Environment::Test => "test",
            Environment::Uat => "uat",
        }
    }
}

impl Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Environment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dev" | "local" => Ok(Environment::Dev),
            "test" => Ok(Environment::Test),
            "uat" => Ok(Environment::Uat),
            _ => Err(ConfigError::EnvironmentNotFound(s.to_string())),
        }
    }
}

/// Logical backends the harness talks to. The key is the only name used to
/// index both the service table and the API path table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ServiceKind {
    #[serde(rename = "gatekeeper")]
    Gatekeeper,
    #[serde(rename = "courier")]
    Courier,
    #[serde(rename = "screen_writer")]
    ScreenWriter,
    #[serde(rename = "producer")]
    Producer,
    #[serde(rename = "google-server")]
    GoogleServer,
}

impl ServiceKind {
    pub const ALL: [ServiceKind; 5] = [
        ServiceKind::Gatekeeper,
        ServiceKind::Courier,
        ServiceKind::ScreenWriter,
        ServiceKind::Producer,
        ServiceKind::GoogleServer,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            ServiceKind::Gatekeeper => "gatekeeper",
            ServiceKind::Courier => "courier",
            ServiceKind::ScreenWriter => "screen_writer",
            ServiceKind::Producer => "producer",
            ServiceKind::GoogleServer => "google-server",
        }
    }
}

impl Display for ServiceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for ServiceKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "gatekeeper" | "gk" => Ok(ServiceKind::Gatekeeper),
            "courier" => Ok(ServiceKind::Courier),
            "screen_writer" | "screen-writer" | "pack" | "tms" => Ok(ServiceKind::ScreenWriter),
            "producer" => Ok(ServiceKind::Producer),
            "google-server" | "google_server" => Ok(ServiceKind::GoogleServer),
            other => Err(ConfigError::UnknownService(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_names() {
        assert_eq!("dev".parse::<Environment>().unwrap(), Environment::Dev);
        assert_eq!("local".parse::<Environment>().unwrap(), Environment::Dev);
        assert_eq!("UAT".parse::<Environment>().unwrap(), Environment::Uat);
        assert!(matches!(
            "prod".parse::<Environment>(),
            Err(ConfigError::EnvironmentNotFound(name)) if name == "prod"
        ));
    }

    #[test]
    fn test_service_aliases_resolve_to_one_key() {
        assert_eq!("gk".parse::<ServiceKind>().unwrap().key(), "gatekeeper");
        assert_eq!("tms".parse::<ServiceKind>().unwrap().key(), "screen_writer");
        for kind in ServiceKind::ALL {
            assert_eq!(kind.key().parse::<ServiceKind>().unwrap(), kind);
        }
    }
}
