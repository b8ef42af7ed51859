use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PlatformError {
    #[error("member {0} is not in the community")]
    MemberNotFound(String),

    #[error("missing permission: {0}")]
    Forbidden(String),

    #[error("platform request failed: {0}")]
    Request(String),
}
