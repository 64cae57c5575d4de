//! JSON API over the current platform login.

use axum::{Json, extract::State};
use marketlink_core::{CatalogAttempt, CatalogQuery, UpstreamIdentity};
use serde::Serialize;
use serde_json::Value;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::AppError;
use crate::models::{PlatformSession, SessionReader};
use crate::state::AppState;

/// Successful catalog response.
#[derive(Debug, Serialize)]
pub struct CatalogResponse {
    /// Endpoint that answered.
    pub endpoint: String,
    /// Upstream payload, unmodified.
    pub payload: Value,
    /// Every attempt made, in order.
    pub diagnostics: Vec<CatalogAttempt>,
}

async fn require_session(session: &Session) -> Result<PlatformSession, AppError> {
    session
        .read_current_session()
        .await?
        .ok_or_else(|| AppError::Unauthorized("no platform session".to_string()))
}

/// GET /api/session - Identity of the logged-in platform user.
#[instrument(skip(session))]
pub async fn current_session(session: Session) -> Result<Json<UpstreamIdentity>, AppError> {
    let stored = require_session(&session).await?;
    Ok(Json(stored.identity))
}

/// GET /api/catalog - Fetch the logged-in vendor's product catalog.
#[instrument(skip(state, session))]
pub async fn catalog(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<CatalogResponse>, AppError> {
    let stored = require_session(&session).await?;
    let query = CatalogQuery::new(stored.access_token, stored.identity.vendor_id);

    let result = state.catalog().resolve_catalog(&query).await?;

    Ok(Json(CatalogResponse {
        endpoint: result.succeeded_endpoint,
        payload: result.normalized_payload,
        diagnostics: result.diagnostics,
    }))
}
