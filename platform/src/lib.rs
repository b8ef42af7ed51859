//! The chat-platform collaborator, specified only at its interface.
//!
//! The verification engine never talks to a chat service directly. It asks a
//! [`Platform`] to look members up, toggle the unverified marker, deliver
//! structured [`Notice`]s, and post review cases to moderators. Rendering
//! notices into prose is the implementation's job.

pub mod error;
pub mod notice;

pub use error::PlatformError;
pub use notice::{Notice, NotifyResult, ReviewPost};

use async_trait::async_trait;
use biogate_types::{MemberId, MemberInfo};

/// Capabilities the engine consumes from the chat platform.
#[async_trait]
pub trait Platform: Send + Sync {
    /// Current membership snapshot for `member`, or `None` if they are not in
    /// the community (never joined or already left).
    async fn member(&self, member: &MemberId) -> Option<MemberInfo>;

    /// Put the unverified marker on a member.
    async fn add_unverified_marker(&self, member: &MemberId) -> Result<(), PlatformError>;

    /// Remove the unverified marker, which grants full access.
    async fn remove_unverified_marker(&self, member: &MemberId) -> Result<(), PlatformError>;

    /// Deliver a direct notice to a member. Fire-and-forget from the
    /// engine's point of view: a failure is reported, never raised.
    async fn notify(&self, member: &MemberId, notice: Notice) -> NotifyResult;

    /// Post an escalated case to the moderators' review channel.
    async fn post_review(&self, post: ReviewPost) -> NotifyResult;
}
