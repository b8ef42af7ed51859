use biogate_platform::PlatformError;
use biogate_types::{MemberId, ReviewId};
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum VerificationError {
    #[error("review {0} not found (already resolved or never existed)")]
    ReviewNotFound(ReviewId),

    #[error("member {0} is no longer in the community")]
    MemberGone(MemberId),

    #[error("platform action failed: {0}")]
    Platform(#[from] PlatformError),
}
