//! Errors raised while constructing core types from untrusted input.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypesError {
    #[error("invalid member id: {0:?}")]
    InvalidMemberId(String),

    #[error("invalid review id: {0:?}")]
    InvalidReviewId(String),
}
