//! LMDB storage backend for student record verification.
//!
//! Implements every storage trait from `sv-store` on a single
//! [`LmdbEnvironment`] using the `heed` LMDB bindings. Values are bincode.

pub mod change_log;
pub mod environment;
pub mod error;
pub mod keys;
pub mod meta;
pub mod migration;
pub mod otp;
pub mod student;

pub use environment::LmdbEnvironment;
pub use error::LmdbError;
