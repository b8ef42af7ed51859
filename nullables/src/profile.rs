//! Nullable profile fetcher: canned responses keyed by profile id.

use async_trait::async_trait;
use biogate_profile::{ExternalProfile, FetchError, ProfileFetcher, ProfileUrl};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// A test fetcher that never touches the network.
///
/// Unknown profiles answer `Status(404)`, like the real site.
#[derive(Default)]
pub struct NullProfileFetcher {
    responses: Mutex<HashMap<String, Result<ExternalProfile, FetchError>>>,
    requested: Mutex<Vec<String>>,
    delay: Mutex<Option<Duration>>,
}

impl NullProfileFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    fn responses(&self) -> MutexGuard<'_, HashMap<String, Result<ExternalProfile, FetchError>>> {
        self.responses.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Serve `profile` for `profile_id`.
    pub fn set_profile(&self, profile_id: impl ToString, profile: ExternalProfile) {
        self.responses().insert(profile_id.to_string(), Ok(profile));
    }

    /// Fail every fetch of `profile_id` with `error`.
    pub fn set_error(&self, profile_id: impl ToString, error: FetchError) {
        self.responses().insert(profile_id.to_string(), Err(error));
    }

    /// Hold every answer back for `delay` of tokio time, like a slow site.
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap_or_else(PoisonError::into_inner) = Some(delay);
    }

    /// URLs fetched so far, in order.
    pub fn requested(&self) -> Vec<String> {
        self.requested
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl ProfileFetcher for NullProfileFetcher {
    async fn fetch_profile(&self, url: &ProfileUrl) -> Result<ExternalProfile, FetchError> {
        self.requested
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(url.to_string());
        let delay = *self.delay.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.responses()
            .get(url.profile_id())
            .cloned()
            .unwrap_or(Err(FetchError::Status(404)))
    }
}
