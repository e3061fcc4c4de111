#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

mod health;
mod problem;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use faultline_config::Config;
use faultline_core::{ClassificationMap, ProblemRenderer};
use tower_http::trace::TraceLayer;

pub use health::health_handler;
pub use problem::problem_middleware;

/// HTTP composition root: caller routes wrapped in problem handling
pub struct Server {
    router: Router,
    listen_address: SocketAddr,
}

impl Server {
    /// Build the server from configuration
    ///
    /// The classification map is built here, once, from the defaults plus
    /// the configured overrides, and shared read-only by every request.
    pub fn new(config: &Config, routes: Router) -> anyhow::Result<Self> {
        let map = ClassificationMap::from_config(&config.classification)?;
        tracing::debug!(overrides = config.classification.overrides.len(), "classification configured");

        Ok(Self::with_renderer(config, routes, ProblemRenderer::new(Arc::new(map))))
    }

    /// Build the server around an already prepared renderer
    pub fn with_renderer(config: &Config, routes: Router, renderer: ProblemRenderer) -> Self {
        let listen_address = config
            .server
            .listen_address
            .unwrap_or_else(|| SocketAddr::from(([127, 0, 0, 1], 3000)));

        let mut app = routes;

        if config.server.health.enabled {
            app = app.route(&config.server.health.path, axum::routing::get(health::health_handler));
        }

        // Problem responses (innermost, right around the handlers)
        app = app.layer(axum::middleware::from_fn(move |req, next| {
            let renderer = renderer.clone();
            async move { problem::problem_middleware(renderer, req, next).await }
        }));

        app = app.layer(TraceLayer::new_for_http());

        Self {
            router: app,
            listen_address,
        }
    }

    #[must_use]
    pub const fn listen_address(&self) -> SocketAddr {
        self.listen_address
    }

    /// Consume the server and return the inner router
    ///
    /// Useful for testing when the caller manages the listener
    pub fn into_router(self) -> Router {
        self.router
    }

    /// Serve requests until the cancellation token is triggered
    pub async fn serve(self, shutdown: tokio_util::sync::CancellationToken) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(self.listen_address).await?;
        let local_addr = listener.local_addr()?;
        tracing::info!(%local_addr, "server listening");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                shutdown.cancelled().await;
                tracing::info!("graceful shutdown initiated");
            })
            .await?;

        Ok(())
    }
}
