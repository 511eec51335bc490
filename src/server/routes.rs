/// REST API routes.
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use super::AppState;
use crate::codelog;
use crate::crypto::totp::GeneratedCode;
use crate::error::PkiError;

/// Error body returned with every non-2xx status.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub detail: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

/// Caller mistakes are 400. Everything else is 500 with a fixed message, so
/// a failed unwrap looks the same whatever step rejected it.
fn api_error(err: PkiError) -> ApiError {
    let (status, detail) = match &err {
        PkiError::MissingCode | PkiError::InvalidCommitId | PkiError::Encoding(_) => {
            (StatusCode::BAD_REQUEST, err.to_string())
        }
        PkiError::DecryptionFailed | PkiError::NotProvisioned => {
            (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
        PkiError::CodeLogUnavailable(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to read last OTP".to_string(),
        ),
        _ => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Internal server error".to_string(),
        ),
    };
    if status.is_server_error() {
        tracing::error!(error = %err, "request failed");
    }
    (status, Json(ErrorResponse { detail }))
}

// ─── Health ──────────────────────────────────────────────

#[derive(Serialize)]
struct RootResponse {
    message: &'static str,
}

async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        message: "PKI-TOTP service is running",
    })
}

/// Health check response.
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

/// GET /health
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub fn health_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
}

// ─── Seed ────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct DecryptSeedRequest {
    encrypted_seed: String,
}

#[derive(Debug, Serialize)]
struct StatusResponse {
    status: &'static str,
}

/// POST /decrypt-seed: unwrap an RSA-OAEP sealed seed and store it.
async fn decrypt_seed(
    State(state): State<Arc<AppState>>,
    Json(req): Json<DecryptSeedRequest>,
) -> Result<Json<StatusResponse>, ApiError> {
    // RSA private-key operations are CPU-bound.
    tokio::task::spawn_blocking(move || state.service.unwrap_seed(&req.encrypted_seed))
        .await
        .map_err(|e| api_error(PkiError::Io(std::io::Error::other(e))))?
        .map_err(api_error)?;

    Ok(Json(StatusResponse { status: "ok" }))
}

pub fn seed_routes() -> Router<Arc<AppState>> {
    Router::new().route("/decrypt-seed", post(decrypt_seed))
}

// ─── Codes ───────────────────────────────────────────────

/// GET /generate-2fa
async fn generate_code(
    State(state): State<Arc<AppState>>,
) -> Result<Json<GeneratedCode>, ApiError> {
    state.service.generate_code().map(Json).map_err(api_error)
}

#[derive(Debug, Deserialize)]
struct VerifyRequest {
    #[serde(default)]
    code: Option<String>,
}

#[derive(Debug, Serialize)]
struct VerifyResponse {
    valid: bool,
}

/// POST /verify-2fa
async fn verify_code(
    State(state): State<Arc<AppState>>,
    Json(req): Json<VerifyRequest>,
) -> Result<Json<VerifyResponse>, ApiError> {
    let code = req.code.unwrap_or_default();
    let valid = state.service.verify_code(&code).map_err(api_error)?;
    Ok(Json(VerifyResponse { valid }))
}

#[derive(Debug, Serialize)]
struct LatestResponse {
    latest_otp: String,
}

/// GET /latest-2fa: last code written by the scheduled job.
async fn latest_code(
    State(state): State<Arc<AppState>>,
) -> Result<Json<LatestResponse>, ApiError> {
    let latest_otp = codelog::latest_code(&state.code_log).map_err(api_error)?;
    Ok(Json(LatestResponse { latest_otp }))
}

pub fn code_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/generate-2fa", get(generate_code))
        .route("/verify-2fa", post(verify_code))
        .route("/latest-2fa", get(latest_code))
}
