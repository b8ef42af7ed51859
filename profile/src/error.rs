use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("request timed out after {attempts} attempt(s)")]
    Timeout { attempts: u32 },

    #[error("connection failed: {0}")]
    Network(String),

    /// The HTTP client itself could not be configured.
    #[error("http client could not be built: {0}")]
    Client(String),

    #[error("HTTP status {0}")]
    Status(u16),

    /// The page was fetched but carried no readable profile data.
    #[error("profile page could not be parsed: {0}")]
    Parse(String),
}

impl FetchError {
    /// Whether the page was retrieved but unreadable, as opposed to not retrieved at all.
    pub fn is_parse(&self) -> bool {
        matches!(self, Self::Parse(_))
    }
}
