use thiserror::Error;

#[derive(Error, Debug)]
pub enum VeraError {
    /// An association state string contained a token the grammar does not
    /// cover. Decoding fails as a whole; tokens are never silently dropped.
    #[error("Invalid association token {0:?}")]
    InvalidAssociationToken(String),
}

pub type VeraResult<T> = Result<T, VeraError>;
