//! Axum-based RPC server.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Body;
use axum::http::Request;
use axum::routing::{get, post};
use axum::Router;
use prometheus::Registry;
use tower_http::trace::TraceLayer;

use sv_store::RecordStore;
use sv_verification::VerificationService;

use crate::error::RpcError;
use crate::handlers;

/// Verification service shared between request handlers.
pub type SharedService<S> = Arc<VerificationService<S>>;

/// Build the router with every endpoint mounted. `/metrics` is served only
/// when a registry is given.
pub fn router<S: RecordStore + 'static>(
    service: SharedService<S>,
    metrics: Option<Registry>,
) -> Router {
    let mut app: Router = Router::new()
        .route("/health", get(handlers::health))
        .route(
            "/students/:roll_no",
            get(handlers::get_student::<S>)
                .put(handlers::submit_edit::<S>)
                .patch(handlers::submit_patch::<S>),
        )
        .route("/students/:roll_no/verify", post(handlers::verify_data::<S>))
        .route(
            "/students/:roll_no/request-otp",
            post(handlers::request_otp::<S>),
        )
        .route(
            "/students/:roll_no/verify-mobile",
            post(handlers::verify_mobile::<S>),
        )
        .route("/students/:roll_no/history", get(handlers::history::<S>))
        .with_state(service);

    if let Some(registry) = metrics {
        app = app.merge(
            Router::new()
                .route("/metrics", get(handlers::metrics))
                .with_state::<()>(registry),
        );
    }

    app.layer(
        TraceLayer::new_for_http().make_span_with(|req: &Request<Body>| {
            tracing::info_span!(
                "http_request",
                method = %req.method(),
                path = %req.uri().path(),
            )
        }),
    )
}

pub struct RpcServer<S> {
    listener: tokio::net::TcpListener,
    service: SharedService<S>,
    metrics: Option<Registry>,
}

impl<S: RecordStore + 'static> RpcServer<S> {
    /// Bind the listening socket. Port 0 picks a free port.
    pub async fn bind(
        addr: SocketAddr,
        service: SharedService<S>,
        metrics: Option<Registry>,
    ) -> Result<Self, RpcError> {
        let listener = tokio::net::TcpListener::bind(addr).await?;
        Ok(Self {
            listener,
            service,
            metrics,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, RpcError> {
        Ok(self.listener.local_addr()?)
    }

    /// Serve until `shutdown` resolves; in-flight requests are allowed to
    /// finish.
    pub async fn serve<F>(self, shutdown: F) -> Result<(), RpcError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        tracing::info!(addr = %self.local_addr()?, "RPC server listening");
        axum::serve(self.listener, router(self.service, self.metrics))
            .with_graceful_shutdown(shutdown)
            .await?;
        tracing::info!("RPC server stopped");
        Ok(())
    }
}
