//! Nullable infrastructure for deterministic testing.
//!
//! All external dependencies of the verification core (clock, code
//! generation, OTP delivery, storage) are abstracted behind traits. This crate
//! provides test-friendly implementations that:
//! - Return deterministic values
//! - Can be controlled programmatically
//! - Never touch the filesystem or network
//!
//! Usage: swap real implementations for nullables in tests.

pub mod clock;
pub mod delivery;
pub mod random;
pub mod store;

pub use clock::NullClock;
pub use delivery::{DeliveredOtp, NullDelivery};
pub use random::NullCodeSource;
pub use store::{Fault, NullStore};
