//! HTTP server for student record verification.
//!
//! Provides endpoints for:
//! - Reading a student record and its verification status
//! - Full and partial edits of protected details
//! - Mobile verification by OTP (request a code, submit a code)
//! - Data verification
//! - The per-record change history, paginated
//! - Prometheus metrics

pub mod error;
pub mod handlers;
pub mod pagination;
pub mod server;

pub use error::RpcError;
pub use pagination::{PaginationMeta, PaginationParams};
pub use server::{router, RpcServer, SharedService};
