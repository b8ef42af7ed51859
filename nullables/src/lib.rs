//! Nullable infrastructure for deterministic testing.
//!
//! Everything the engine talks to (clock, chat platform, profile site) is
//! abstracted behind a trait. This crate provides test-friendly
//! implementations that:
//! - Return deterministic values
//! - Can be controlled programmatically
//! - Record what was asked of them for later assertions
//!
//! Usage: swap real implementations for nullables in tests.

pub mod clock;
pub mod platform;
pub mod profile;

pub use clock::NullClock;
pub use platform::{MarkerCall, NullPlatform};
pub use profile::NullProfileFetcher;
