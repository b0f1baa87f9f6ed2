//! Crate-wide error taxonomy (spec §7).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("login failed: {0}")]
    LoginFailed(String),

    #[error("resume failed: {0}")]
    ResumeFailed(String),

    #[error("syntax error")]
    Syntax,

    #[error("backend response error: {0}")]
    BackendResponse(String),

    #[error("backend fatal error: {0}")]
    BackendFatal(String),

    #[error("{0}")]
    GenericBot(String),

    #[error("internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
