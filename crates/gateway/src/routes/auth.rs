//! Platform login routes.

use axum::{
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;
use tracing::instrument;

use crate::models::{SessionPersister, clear_platform_session};
use crate::services::CallbackParams;
use crate::state::AppState;

/// GET /auth/platform/login - Start the platform OAuth flow.
///
/// The issued state is bound to the browser's session so the callback only
/// accepts it from the same browser.
#[instrument(skip(state, session))]
pub async fn login(State(state): State<AppState>, session: Session) -> Response {
    let platform = &state.config().platform;

    match state
        .authorize()
        .begin(platform.client_id.as_deref(), platform.redirect_uri.as_deref())
    {
        Ok(request) => {
            if let Err(e) = session.bind_login_state(&request.state).await {
                tracing::error!("Failed to store OAuth state in session: {e}");
                return Redirect::to("/login?error=session_error").into_response();
            }
            tracing::info!("Redirecting to platform authorization");
            Redirect::to(&request.url).into_response()
        }
        Err(e) => {
            tracing::error!("Cannot start platform login: {e}");
            Redirect::to("/login?error=config_error").into_response()
        }
    }
}

/// GET /auth/platform/callback - Complete the platform OAuth flow.
#[instrument(skip(state, session, params))]
pub async fn callback(
    State(state): State<AppState>,
    session: Session,
    Query(params): Query<CallbackParams>,
) -> Response {
    let outcome = state.callback().handle(&params, &session).await;
    Redirect::to(&outcome.redirect_location()).into_response()
}

/// POST /auth/logout - Forget the platform login.
#[instrument(skip(session))]
pub async fn logout(session: Session) -> Response {
    if let Err(e) = clear_platform_session(&session).await {
        tracing::error!("Failed to clear platform session: {e}");
    }
    if let Err(e) = session.flush().await {
        tracing::error!("Failed to flush session: {e}");
    }
    Redirect::to("/login").into_response()
}
