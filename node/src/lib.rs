//! Student verification node.
//!
//! Wires configuration, logging, metrics, LMDB storage, the verification
//! service and the HTTP server into one process.

pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod node;
pub mod seed;
pub mod shutdown;

pub use config::NodeConfig;
pub use error::NodeError;
pub use logging::{init_logging, LogFormat};
pub use metrics::NodeMetrics;
pub use node::StudentNode;
pub use seed::{SeedFile, SeedReport, SeedStudent};
pub use shutdown::{ShutdownController, ShutdownSignal};
