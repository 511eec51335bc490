/// HTTP front end for the TOTP service.
///
/// Handlers are thin: they decode JSON, call into [`TotpService`] and map
/// [`PkiError`](crate::error::PkiError) to a status code. No key material or
/// seed ever appears in a response body.
pub mod routes;

use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::service::TotpService;

/// Shared application state available to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub service: TotpService,
    /// Log written by the scheduled `log-code` job.
    pub code_log: PathBuf,
}

/// Build the Axum application with all routes and middleware.
pub fn build_app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(routes::health_routes())
        .merge(routes::seed_routes())
        .merge(routes::code_routes())
        .with_state(Arc::new(state))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Start the API server.
pub async fn serve(state: AppState, addr: &str) -> crate::error::Result<()> {
    let app = build_app(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(crate::error::PkiError::Io)?;

    tracing::info!("pki-totp API server listening on {addr}");

    axum::serve(listener, app)
        .await
        .map_err(crate::error::PkiError::Io)?;

    Ok(())
}
