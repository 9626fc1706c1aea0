use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("unknown environment '{0}', expected one of dev (local), test, uat")]
    EnvironmentNotFound(String),
    #[error("unknown service '{0}'")]
    UnknownService(String),
    #[error("service '{0}' is not configured for this environment")]
    ServiceNotConfigured(String),
    #[error("service '{0}' has no database configured")]
    DatabaseNotConfigured(String),
    #[error("unknown database type '{0}', expected postgresql or sqlite")]
    UnknownDbType(String),
    #[error("no API path for {service}.{resource}.{key}")]
    UnknownApiPath {
        service: String,
        resource: String,
        key: String,
    },
    #[error("path template '{template}' takes {expected} parameter(s), got {given}")]
    PathArity {
        template: String,
        expected: usize,
        given: usize,
    },
    #[error("unknown test set '{0}'")]
    UnknownTestSet(String),
    #[error(transparent)]
    Source(#[from] config::ConfigError),
}

pub type ConfigResult<T> = Result<T, ConfigError>;
