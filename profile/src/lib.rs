//! The external-profile collaborator.
//!
//! A member proves account ownership by putting their verification code in
//! their public profile bio. This crate validates the submitted profile URL,
//! fetches the page, and extracts the profile data embedded in it.

pub mod bootstrap;
pub mod error;
pub mod http;
pub mod profile;
pub mod url;

pub use error::FetchError;
pub use http::{FetchConfig, HttpProfileFetcher};
pub use profile::ExternalProfile;
pub use url::ProfileUrl;

use async_trait::async_trait;

/// Anything that can turn a validated profile URL into profile data.
#[async_trait]
pub trait ProfileFetcher: Send + Sync {
    async fn fetch_profile(&self, url: &ProfileUrl) -> Result<ExternalProfile, FetchError>;
}
