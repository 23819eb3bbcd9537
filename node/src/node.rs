//! The verification node: owns the LMDB store, the verification service and
//! the HTTP server task.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use sv_rpc::{RpcServer, SharedService};
use sv_store::{StoreError, StudentStore};
use sv_store_lmdb::{environment::DATABASE_COUNT, LmdbEnvironment};
use sv_types::{StudentRecord, Timestamp};
use sv_verification::VerificationService;

use crate::config::NodeConfig;
use crate::error::NodeError;
use crate::metrics::NodeMetrics;
use crate::seed::{SeedFile, SeedReport};
use crate::shutdown::ShutdownController;

/// Timeout for waiting on background tasks during shutdown.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

pub struct StudentNode {
    config: NodeConfig,
    service: SharedService<LmdbEnvironment>,
    metrics: Arc<NodeMetrics>,
    shutdown: Arc<ShutdownController>,
    task_handles: Vec<JoinHandle<()>>,
}

impl StudentNode {
    /// Validate the configuration and open storage. Nothing is served until
    /// [`StudentNode::start`].
    pub fn new(config: NodeConfig) -> Result<Self, NodeError> {
        config.validate()?;

        let metrics = Arc::new(NodeMetrics::new()?);
        let store = LmdbEnvironment::open(&config.data_dir, DATABASE_COUNT, config.lmdb_map_size)?;
        let service = VerificationService::new(Arc::new(store), config.verification_config())
            .with_events(metrics.clone());

        tracing::info!(
            data_dir = %config.data_dir.display(),
            otp_ttl_secs = config.otp_ttl_secs,
            "node initialised"
        );

        Ok(Self {
            config,
            service: Arc::new(service),
            metrics,
            shutdown: Arc::new(ShutdownController::new()),
            task_handles: Vec::new(),
        })
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    pub fn service(&self) -> &SharedService<LmdbEnvironment> {
        &self.service
    }

    pub fn metrics(&self) -> &NodeMetrics {
        &self.metrics
    }

    pub fn shutdown_controller(&self) -> Arc<ShutdownController> {
        self.shutdown.clone()
    }

    /// Register every student in `seeds` as a new, unverified record.
    /// Roll numbers that already exist are skipped.
    pub fn seed(&self, seeds: &SeedFile) -> Result<SeedReport, NodeError> {
        let store = self.service.store();
        let now = Timestamp::now();
        let mut report = SeedReport::default();

        for seed in &seeds.students {
            let record = StudentRecord::new(seed.roll_no.clone(), seed.details.clone(), now);
            match store.insert_student(&record) {
                Ok(()) => report.inserted += 1,
                Err(StoreError::Duplicate(_)) => {
                    tracing::warn!(roll_no = %seed.roll_no, "student already exists, skipped");
                    report.skipped.push(seed.roll_no.clone());
                }
                Err(e) => return Err(e.into()),
            }
        }

        tracing::info!(
            inserted = report.inserted,
            skipped = report.skipped.len(),
            "seed complete"
        );
        Ok(report)
    }

    /// Bind the HTTP server and serve in the background until
    /// [`StudentNode::stop`]. Returns the bound address.
    pub async fn start(&mut self) -> Result<SocketAddr, NodeError> {
        if !self.task_handles.is_empty() {
            return Err(NodeError::AlreadyStarted);
        }

        let metrics_registry = self
            .config
            .enable_metrics
            .then(|| self.metrics.registry.clone());
        let server = RpcServer::bind(
            self.config.rpc_addr()?,
            self.service.clone(),
            metrics_registry,
        )
        .await?;
        let addr = server.local_addr()?;

        let signal = self.shutdown.signal();
        let handle = tokio::spawn(async move {
            if let Err(e) = server.serve(signal.wait()).await {
                tracing::error!(error = %e, "RPC server exited with error");
            }
        });
        self.task_handles.push(handle);

        tracing::info!(%addr, "node started");
        Ok(addr)
    }

    /// Stop background tasks and flush storage.
    pub async fn stop(&mut self) -> Result<(), NodeError> {
        tracing::info!("node stopping");
        self.shutdown.shutdown();

        let mut timed_out = false;
        for handle in self.task_handles.drain(..) {
            match tokio::time::timeout(SHUTDOWN_TIMEOUT, handle).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => tracing::error!(error = %e, "background task panicked"),
                Err(_) => timed_out = true,
            }
        }

        self.service
            .store()
            .env()
            .force_sync()
            .map_err(sv_store_lmdb::LmdbError::from)?;

        if timed_out {
            return Err(NodeError::ShutdownTimeout);
        }
        tracing::info!("node stopped");
        Ok(())
    }
}
