//! Fundamental types for the biogate verification engine.
//!
//! This crate defines the types shared across every other crate in the workspace:
//! member and review identifiers, verification codes, timestamps, the clock
//! abstraction, and the tunable engine parameters.

pub mod code;
pub mod error;
pub mod member;
pub mod params;
pub mod time;

pub use code::{ReviewId, VerificationCode};
pub use error::TypesError;
pub use member::{MemberId, MemberInfo};
pub use params::EngineParams;
pub use time::{Clock, SystemClock, Timestamp, MILLIS_PER_DAY};
