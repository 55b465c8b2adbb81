use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid region code: {0:?}")]
    InvalidRegion(String),

    #[error("invalid package id: {0}")]
    InvalidPackageId(String),

    #[error("check-in window ends before it starts")]
    InvertedWindow,
}
