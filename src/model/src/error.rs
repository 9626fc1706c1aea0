use dao::DaoError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("invalid model {model}: {reason}")]
    InvalidModel { model: &'static str, reason: String },
    #[error("{model} has no value for unique key '{key}'")]
    MissingKey {
        model: &'static str,
        key: &'static str,
    },
    #[error("insert into {0} returned no identifier")]
    MissingIdentifier(&'static str),
    #[error("{0} has nothing to persist")]
    EmptyInsert(&'static str),
    #[error("{0} does not serialize to an attribute map")]
    NotAnObject(&'static str),
    #[error(transparent)]
    Dao(#[from] DaoError),
    #[error(transparent)]
    Serde(#[from] serde_json::Error),
}

pub type ModelResult<T> = Result<T, ModelError>;
