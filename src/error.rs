use thiserror::Error;

use vera::error::VeraError;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Vera(#[from] VeraError),

    /// A read or write at the Luup boundary failed. Surfaced as-is; retry
    /// policy belongs to whoever sits in front of the admin api.
    #[error("Communication error: {0}")]
    Communication(String),

    /// A discovered mapping references a feature its capability does not
    /// declare. The record is rejected instead of guessed at.
    #[error("Discovered equipment {equipment}: mapping references unknown feature {feature:?}")]
    StructuralMismatch { equipment: String, feature: String },

    #[error(transparent)]
    IoError(#[from] std::io::Error),

    #[error(transparent)]
    SerdeJson(#[from] serde_json::Error),

    #[error(transparent)]
    SerdeYml(#[from] serde_yml::Error),

    #[error(transparent)]
    Config(#[from] config::ConfigError),

    #[error(transparent)]
    UrlParse(#[from] url::ParseError),

    #[error(transparent)]
    SetLogger(#[from] log::SetLoggerError),
}

impl ApiError {
    pub fn communication(msg: impl Into<String>) -> Self {
        Self::Communication(msg.into())
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        Self::Communication(err.to_string())
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
