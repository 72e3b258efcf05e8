//! HTTP Server configuration and startup.

use std::sync::Arc;

use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use rates_types::{ObjectCache, ReferenceRepository};

use super::handlers::{self, AppState};
use crate::ReferenceService;
use crate::openapi::ApiDoc;

/// HTTP Server for the Transfer Rates API.
pub struct HttpServer<R: ReferenceRepository, C: ObjectCache> {
    state: Arc<AppState<R, C>>,
}

impl<R: ReferenceRepository, C: ObjectCache> HttpServer<R, C> {
    /// Creates a new HTTP server with the given service.
    pub fn new(service: ReferenceService<R, C>) -> Self {
        Self {
            state: Arc::new(AppState { service }),
        }
    }

    /// Builds the Axum router with all routes.
    pub fn router(&self) -> Router {
        let api = Router::new()
            .route("/health", get(handlers::health))
            .route("/api/all-providers", get(handlers::list_providers::<R, C>))
            .route("/api/provider/{id}", get(handlers::get_provider::<R, C>))
            .route(
                "/api/all-transfer-rules",
                get(handlers::list_transfer_rules::<R, C>),
            )
            .route(
                "/api/transfer-rule/{id}",
                get(handlers::get_transfer_rule::<R, C>),
            )
            .route(
                "/api/all-exchange-rates",
                get(handlers::list_exchange_rates::<R, C>),
            )
            .route(
                "/api/exchange-rate/{id}",
                get(handlers::get_exchange_rate::<R, C>),
            )
            .route("/api/currencies", get(handlers::list_currencies::<R, C>))
            .route("/api/currency/{id}", get(handlers::get_currency::<R, C>))
            .route("/api/countries", get(handlers::list_countries::<R, C>))
            .route("/api/country/{id}", get(handlers::get_country::<R, C>))
            .route("/api/documents", get(handlers::list_documents::<R, C>))
            .with_state(self.state.clone());

        api.merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
            .layer(TraceLayer::new_for_http())
    }

    /// Runs the server on the given address with graceful shutdown.
    pub async fn run(self, addr: &str) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(addr).await?;
        tracing::info!("Server listening on {}", listener.local_addr()?);

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown...");
}
