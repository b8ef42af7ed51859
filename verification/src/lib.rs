//! Member verification engine.
//!
//! A member proves control of an external game profile by placing a
//! one-time code in its bio. The engine issues the code, tracks the
//! session until it expires, throttles retries, and routes each successful
//! proof either to automatic approval or to a moderator review queue
//! depending on account ages.
//!
//! The chat platform and the external profile site sit behind the
//! [`Platform`](biogate_platform::Platform) and
//! [`ProfileFetcher`](biogate_profile::ProfileFetcher) traits, so the
//! engine itself never touches the network.

pub mod error;
pub mod events;
pub mod expiry;
pub mod member_lock;
pub mod orchestrator;
pub mod outcomes;
pub mod review;
pub mod risk;
pub mod session;
pub mod state;
pub mod stats;
pub mod throttle;

pub use error::VerificationError;
pub use events::{AuditEvent, EventBuffer};
pub use orchestrator::VerificationOrchestrator;
pub use outcomes::{
    ForceOutcome, LeaveOutcome, Resolution, ResolveOutcome, StartOutcome, SubmitOutcome,
};
pub use review::ReviewCase;
pub use risk::{RiskDecision, RiskFlag};
pub use session::{SessionToken, VerificationSession};
pub use state::{FailureCause, SessionPhase};
pub use stats::Counter;
