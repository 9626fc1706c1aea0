use harness_config::ConfigError;
use model::ModelError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error("invalid URL {url}: {reason}")]
    Url { url: String, reason: String },
    #[error("could not decode {what}: {reason}")]
    Decode { what: &'static str, reason: String },
    #[error("{0} has no credentials configured")]
    MissingCredentials(String),
    #[error("login as {username} failed with status {status}")]
    LoginFailed { username: String, status: u16 },
    #[error("no gatekeeper session, log in first")]
    NotLoggedIn,
    #[error("no verification code was issued for user {0}")]
    NoVerificationCode(i64),
}

impl ServiceError {
    pub(crate) fn decode(what: &'static str, reason: impl ToString) -> Self {
        ServiceError::Decode {
            what,
            reason: reason.to_string(),
        }
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;
