//! HTTP route handlers for the gateway.
//!
//! # Route Structure
//!
//! ```text
//! # Platform login
//! GET  /auth/platform/login    - Redirect to the platform's authorization page
//! GET  /auth/platform/callback - OAuth callback, redirects to /dashboard or /login
//! POST /auth/logout            - Forget the platform login
//!
//! # API (requires a platform login)
//! GET  /api/session            - Current platform identity
//! GET  /api/catalog            - Vendor product catalog with per-endpoint diagnostics
//! ```

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

pub mod auth;
pub mod catalog;

/// Build the gateway router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/auth/platform/login", get(auth::login))
        .route("/auth/platform/callback", get(auth::callback))
        .route("/auth/logout", post(auth::logout))
        .route("/api/session", get(catalog::current_session))
        .route("/api/catalog", get(catalog::catalog))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode, header};
    use axum::response::Response;
    use secrecy::SecretString;
    use serde_json::{Value, json};
    use tower::ServiceExt;
    use tower_sessions::{MemoryStore, SessionManagerLayer};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::config::{GatewayConfig, PlatformConfig};
    use crate::middleware::with_cookie_settings;

    fn config(server: &MockServer, client_id: Option<&str>) -> GatewayConfig {
        GatewayConfig {
            database_url: SecretString::from("postgres://localhost/unused"),
            host: "127.0.0.1".parse().unwrap(),
            port: 3001,
            base_url: "http://localhost:3001".to_string(),
            platform: PlatformConfig {
                accounts_url: server.uri(),
                api_url: server.uri(),
                client_id: client_id.map(String::from),
                client_secret: Some(SecretString::from("xK9#mP2$vL5nQ8wR")),
                redirect_uri: Some("http://localhost:3001/auth/platform/callback".to_string()),
                request_timeout: Duration::from_secs(5),
            },
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 1.0,
        }
    }

    fn app(config: GatewayConfig) -> Router {
        let session_layer = with_cookie_settings(
            SessionManagerLayer::new(MemoryStore::default()),
            &config,
        );
        routes()
            .layer(session_layer)
            .with_state(AppState::new(config).unwrap())
    }

    async fn send(app: &Router, request: Request<Body>) -> Response {
        app.clone().oneshot(request).await.unwrap()
    }

    fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
        let mut builder = Request::get(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        builder.body(Body::empty()).unwrap()
    }

    fn location(response: &Response) -> &str {
        response
            .headers()
            .get(header::LOCATION)
            .unwrap()
            .to_str()
            .unwrap()
    }

    fn session_cookie(response: &Response) -> String {
        let set_cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .unwrap()
            .to_str()
            .unwrap();
        set_cookie.split(';').next().unwrap().to_string()
    }

    fn state_from(response: &Response) -> String {
        location(response).rsplit("state=").next().unwrap().to_string()
    }

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    /// Walk through login and callback, returning the session cookie.
    async fn log_in(app: &Router, server: &MockServer, profile: Value) -> String {
        Mock::given(method("POST"))
            .and(path("/oauth/token"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"access_token": "tok-1", "expires_in": 3600})),
            )
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/user"))
            .respond_with(ResponseTemplate::new(200).set_body_json(profile))
            .mount(server)
            .await;

        let response = send(app, get("/auth/platform/login", None)).await;
        let login_cookie = session_cookie(&response);
        let state = state_from(&response);

        let response = send(
            app,
            get(
                &format!("/auth/platform/callback?code=abc&state={state}"),
                Some(&login_cookie),
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert!(location(&response).starts_with("/dashboard?login=success"));

        session_cookie(&response)
    }

    #[tokio::test]
    async fn test_login_redirects_to_platform() {
        let server = MockServer::start().await;
        let app = app(config(&server, Some("client-1")));

        let response = send(&app, get("/auth/platform/login", None)).await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        let expected_prefix = format!(
            "{}/accounts/sso?client_id=client-1&redirect_uri=http%3A%2F%2Flocalhost%3A3001%2Fauth%2Fplatform%2Fcallback&scope=read_products%20write_products&state=",
            server.uri()
        );
        assert!(location(&response).starts_with(&expected_prefix));
    }

    #[tokio::test]
    async fn test_login_without_client_id() {
        let server = MockServer::start().await;
        let app = app(config(&server, None));

        let response = send(&app, get("/auth/platform/login", None)).await;

        assert_eq!(location(&response), "/login?error=config_error");
    }

    #[tokio::test]
    async fn test_callback_with_denied_access() {
        let server = MockServer::start().await;
        let app = app(config(&server, Some("client-1")));

        let response = send(
            &app,
            get("/auth/platform/callback?error=access_denied&state=x", None),
        )
        .await;

        assert_eq!(location(&response), "/login?error=oauth_error");
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_callback_with_forged_state() {
        let server = MockServer::start().await;
        let app = app(config(&server, Some("client-1")));

        let response = send(
            &app,
            get("/auth/platform/callback?code=abc&state=forged", None),
        )
        .await;

        assert_eq!(location(&response), "/login");
    }

    #[tokio::test]
    async fn test_state_redeemed_without_login_cookie_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "t"})))
            .expect(0)
            .mount(&server)
            .await;
        let app = app(config(&server, Some("client-1")));

        let response = send(&app, get("/auth/platform/login", None)).await;
        let state = state_from(&response);

        let response = send(
            &app,
            get(&format!("/auth/platform/callback?code=abc&state={state}"), None),
        )
        .await;

        assert_eq!(location(&response), "/login");
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_full_login_then_session_and_catalog() {
        let server = MockServer::start().await;
        let app = app(config(&server, Some("client-1")));
        let cookie = log_in(&app, &server, json!({"id": 1, "name": "Ada", "vendor_id": 5})).await;

        Mock::given(method("GET"))
            .and(path("/api/vendors/5/products"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 10}])))
            .mount(&server)
            .await;

        let response = send(&app, get("/api/session", Some(&cookie))).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["display_name"], "Ada");
        assert!(body.get("access_token").is_none());

        let response = send(&app, get("/api/catalog", Some(&cookie))).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["payload"], json!([{"id": 10}]));
        assert_eq!(body["diagnostics"].as_array().unwrap().len(), 1);
        assert!(body["endpoint"].as_str().unwrap().ends_with("/api/vendors/5/products"));
    }

    #[tokio::test]
    async fn test_catalog_all_endpoints_failed() {
        let server = MockServer::start().await;
        let app = app(config(&server, Some("client-1")));
        let cookie = log_in(&app, &server, json!({"id": 1})).await;

        let response = send(&app, get("/api/catalog", Some(&cookie))).await;

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let body = body_json(response).await;
        // No vendor id: only the three generic candidates are tried.
        assert_eq!(body["diagnostics"].as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_api_requires_session() {
        let server = MockServer::start().await;
        let app = app(config(&server, Some("client-1")));

        let response = send(&app, get("/api/session", None)).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = send(&app, get("/api/catalog", None)).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_logout_clears_session() {
        let server = MockServer::start().await;
        let app = app(config(&server, Some("client-1")));
        let cookie = log_in(&app, &server, json!({"id": 1})).await;

        let request = Request::post("/auth/logout")
            .header(header::COOKIE, &cookie)
            .body(Body::empty())
            .unwrap();
        let response = send(&app, request).await;
        assert_eq!(location(&response), "/login");

        let response = send(&app, get("/api/session", Some(&cookie))).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
