use thiserror::Error;

#[derive(Debug, Error)]
pub enum NodeError {
    #[error("verification error: {0}")]
    Verification(#[from] sv_verification::VerificationError),

    #[error("store error: {0}")]
    Store(#[from] sv_store::StoreError),

    #[error("LMDB error: {0}")]
    Lmdb(#[from] sv_store_lmdb::LmdbError),

    #[error("config error: {0}")]
    Config(String),

    #[error("seed file error: {0}")]
    Seed(String),

    #[error("logging error: {0}")]
    Logging(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    #[error("RPC server error: {0}")]
    Rpc(#[from] sv_rpc::RpcError),

    #[error("node already started")]
    AlreadyStarted,

    #[error("shutdown timeout")]
    ShutdownTimeout,
}
