//! API layer - HTTP handlers and routing
//!
//! This module contains all HTTP API endpoints for the Dispatchboard
//! service. It includes:
//! - Auth endpoints (session exchange, me, logout)
//! - Delivery entry CRUD endpoints
//! - Dashboard summary/trend endpoints
//! - Admin endpoints
//! - Service banner and health probe

pub mod admin;
pub mod auth;
pub mod dashboard;
pub mod entries;
pub mod middleware;
pub mod responses;
pub mod site;

use axum::{
    http::{header, HeaderValue, Method},
    middleware as axum_middleware,
    Router,
};
use tower_http::cors::CorsLayer;

pub use middleware::{ApiError, AppState, AuthenticatedUser, RequestStats};

/// Build the main API router
pub fn build_api_router(state: AppState) -> Router<AppState> {
    // Admin routes (need admin role on top of auth)
    let admin_routes = Router::new()
        .nest("/admin", admin::router())
        .route_layer(axum_middleware::from_fn(middleware::require_admin))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::require_auth,
        ));

    // Protected routes (need auth but not admin)
    let protected_routes = Router::new()
        .nest("/auth", auth::protected_router())
        .nest("/entries", entries::router())
        .nest("/dashboard", dashboard::router())
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::require_auth,
        ));

    // Public routes
    Router::new()
        .merge(site::router())
        .nest("/auth", auth::public_router())
        .merge(admin_routes)
        .merge(protected_routes)
}

/// Build the complete router with middleware
pub fn build_router(state: AppState, cors_origin: &str) -> Router {
    // CORS configuration with credentials for cookie-based auth
    let cors = CorsLayer::new()
        .allow_origin(cors_origin.parse::<HeaderValue>().unwrap())
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::COOKIE])
        .allow_credentials(true);

    Router::new()
        .nest("/api", build_api_router(state.clone()))
        .layer(cors)
        // Request stats middleware (outermost layer, runs for all requests)
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::request_stats_middleware,
        ))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{
        SqlxEntryRepository, SqlxSessionRepository, SqlxUserRepository,
    };
    use crate::db::{create_test_pool, migrations};
    use crate::services::identity::{IdentityError, IdentityProfile, IdentityProvider};
    use crate::services::{AuthService, EntryService};
    use async_trait::async_trait;
    use axum::http::{HeaderName, HeaderValue, StatusCode};
    use axum_test::TestServer;
    use std::collections::HashMap;
    use std::sync::Arc;

    /// Provider double mapping assertions to identities; unknown assertions
    /// are rejected like a real provider would.
    struct MapIdentityProvider {
        identities: HashMap<String, IdentityProfile>,
    }

    #[async_trait]
    impl IdentityProvider for MapIdentityProvider {
        async fn exchange(&self, assertion: &str) -> Result<IdentityProfile, IdentityError> {
            self.identities
                .get(assertion)
                .cloned()
                .ok_or(IdentityError::Rejected)
        }
    }

    fn profile(email: &str, name: &str) -> IdentityProfile {
        IdentityProfile {
            email: email.to_string(),
            name: name.to_string(),
            picture: String::new(),
        }
    }

    async fn test_server() -> TestServer {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let mut identities = HashMap::new();
        identities.insert("alice-assertion".to_string(), profile("alice@example.com", "Alice"));
        identities.insert("bob-assertion".to_string(), profile("bob@example.com", "Bob"));
        identities.insert("admin-assertion".to_string(), profile("admin@example.com", "Admin"));

        let user_repo = SqlxUserRepository::boxed(pool.clone());
        let session_repo = SqlxSessionRepository::boxed(pool.clone());
        let entry_repo = SqlxEntryRepository::boxed(pool.clone());

        let auth_service = Arc::new(AuthService::with_config(
            user_repo.clone(),
            session_repo,
            Arc::new(MapIdentityProvider { identities }),
            7,
            vec!["admin@example.com".to_string()],
        ));
        let entry_service = Arc::new(EntryService::new(entry_repo));

        let state = AppState {
            auth_service,
            entry_service,
            user_repo,
            request_stats: Arc::new(RequestStats::new()),
        };

        TestServer::new(build_router(state, "http://localhost:3000"))
            .expect("Failed to build test server")
    }

    fn session_header(assertion: &str) -> (HeaderName, HeaderValue) {
        (
            HeaderName::from_static("x-session-id"),
            HeaderValue::from_str(assertion).unwrap(),
        )
    }

    fn bearer(token: &str) -> (HeaderName, HeaderValue) {
        (
            HeaderName::from_static("authorization"),
            HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
        )
    }

    /// Login through the API, returning the session token
    async fn login(server: &TestServer, assertion: &str) -> String {
        let (name, value) = session_header(assertion);
        let response = server
            .post("/api/auth/session")
            .add_header(name, value)
            .await;
        assert_eq!(response.status_code(), StatusCode::CREATED);
        let body: serde_json::Value = response.json();
        body["token"].as_str().expect("token missing").to_string()
    }

    fn sample_entry_json() -> serde_json::Value {
        serde_json::json!({
            "date": "2024-05-10",
            "challan_amount": 1000.0,
            "delivered_amount": 600.0,
            "pending_amount": 400.0,
            "vehicle_required": 5,
            "vehicle_confirmed": 4,
            "vehicle_missing": 1,
            "notes": "morning run"
        })
    }

    // ========================================================================
    // Public endpoints
    // ========================================================================

    #[tokio::test]
    async fn test_health_is_public() {
        let server = test_server().await;

        let response = server.get("/api/health").await;
        assert_eq!(response.status_code(), StatusCode::OK);

        let body: serde_json::Value = response.json();
        assert_eq!(body["status"], "healthy");
        assert!(body["timestamp"].is_string());
    }

    #[tokio::test]
    async fn test_banner_is_public() {
        let server = test_server().await;

        let response = server.get("/api/").await;
        assert_eq!(response.status_code(), StatusCode::OK);

        let body: serde_json::Value = response.json();
        assert_eq!(body["message"], "Dispatchboard API");
    }

    // ========================================================================
    // Session exchange
    // ========================================================================

    #[tokio::test]
    async fn test_session_exchange_missing_header_is_bad_request() {
        let server = test_server().await;

        let response = server.post("/api/auth/session").await;
        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_session_exchange_rejected_assertion_is_bad_gateway() {
        let server = test_server().await;

        let (name, value) = session_header("unknown-assertion");
        let response = server
            .post("/api/auth/session")
            .add_header(name, value)
            .await;

        assert_eq!(response.status_code(), StatusCode::BAD_GATEWAY);
        let body: serde_json::Value = response.json();
        assert_eq!(body["error"]["code"], "EXTERNAL_AUTH_FAILED");
    }

    #[tokio::test]
    async fn test_session_exchange_returns_user_and_cookie() {
        let server = test_server().await;

        let (name, value) = session_header("alice-assertion");
        let response = server
            .post("/api/auth/session")
            .add_header(name, value)
            .await;

        assert_eq!(response.status_code(), StatusCode::CREATED);

        let set_cookie = response.header("set-cookie");
        let set_cookie = set_cookie.to_str().unwrap();
        assert!(set_cookie.contains("session="));
        assert!(set_cookie.contains("HttpOnly"));

        let body: serde_json::Value = response.json();
        assert_eq!(body["user"]["email"], "alice@example.com");
        assert_eq!(body["user"]["role"], "user");
        assert!(body["token"].is_string());
    }

    #[tokio::test]
    async fn test_me_returns_current_user() {
        let server = test_server().await;
        let token = login(&server, "alice-assertion").await;

        let (name, value) = bearer(&token);
        let response = server.get("/api/auth/me").add_header(name, value).await;

        assert_eq!(response.status_code(), StatusCode::OK);
        let body: serde_json::Value = response.json();
        assert_eq!(body["email"], "alice@example.com");
    }

    #[tokio::test]
    async fn test_logout_invalidates_token() {
        let server = test_server().await;
        let token = login(&server, "alice-assertion").await;

        let (name, value) = bearer(&token);
        let response = server.post("/api/auth/logout").add_header(name, value).await;
        assert_eq!(response.status_code(), StatusCode::NO_CONTENT);

        let (name, value) = bearer(&token);
        let response = server.get("/api/auth/me").add_header(name, value).await;
        assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
    }

    // ========================================================================
    // Entries
    // ========================================================================

    #[tokio::test]
    async fn test_entries_require_authentication() {
        let server = test_server().await;

        let response = server.get("/api/entries").await;
        assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);

        let body: serde_json::Value = response.json();
        assert_eq!(body["error"]["code"], "UNAUTHENTICATED");
    }

    #[tokio::test]
    async fn test_create_and_list_entries() {
        let server = test_server().await;
        let token = login(&server, "alice-assertion").await;

        let (name, value) = bearer(&token);
        let response = server
            .post("/api/entries")
            .add_header(name, value)
            .json(&sample_entry_json())
            .await;
        assert_eq!(response.status_code(), StatusCode::CREATED);

        let created: serde_json::Value = response.json();
        assert_eq!(created["challan_amount"], 1000.0);
        assert_eq!(created["date"], "2024-05-10");

        let (name, value) = bearer(&token);
        let response = server.get("/api/entries").add_header(name, value).await;
        assert_eq!(response.status_code(), StatusCode::OK);

        let listed: serde_json::Value = response.json();
        assert_eq!(listed.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_create_stamps_session_owner_ignoring_payload() {
        let server = test_server().await;
        let alice_token = login(&server, "alice-assertion").await;

        // A user_id smuggled into the payload is ignored
        let mut body = sample_entry_json();
        body["user_id"] = serde_json::json!(999);

        let (name, value) = bearer(&alice_token);
        let response = server
            .post("/api/entries")
            .add_header(name, value)
            .json(&body)
            .await;
        assert_eq!(response.status_code(), StatusCode::CREATED);

        let created: serde_json::Value = response.json();
        assert_ne!(created["user_id"], 999);
    }

    #[tokio::test]
    async fn test_create_rejects_negative_amounts() {
        let server = test_server().await;
        let token = login(&server, "alice-assertion").await;

        let mut body = sample_entry_json();
        body["challan_amount"] = serde_json::json!(-50.0);

        let (name, value) = bearer(&token);
        let response = server
            .post("/api/entries")
            .add_header(name, value)
            .json(&body)
            .await;

        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
        let error: serde_json::Value = response.json();
        assert_eq!(error["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_users_cannot_see_each_others_entries() {
        let server = test_server().await;
        let alice_token = login(&server, "alice-assertion").await;
        let bob_token = login(&server, "bob-assertion").await;

        let (name, value) = bearer(&alice_token);
        let response = server
            .post("/api/entries")
            .add_header(name, value)
            .json(&sample_entry_json())
            .await;
        let created: serde_json::Value = response.json();
        let entry_id = created["id"].as_i64().unwrap();

        // Bob's listing is empty
        let (name, value) = bearer(&bob_token);
        let response = server.get("/api/entries").add_header(name, value).await;
        let listed: serde_json::Value = response.json();
        assert_eq!(listed.as_array().unwrap().len(), 0);

        // Direct access to Alice's entry is denied without confirming more
        let (name, value) = bearer(&bob_token);
        let response = server
            .get(&format!("/api/entries/{}", entry_id))
            .add_header(name, value)
            .await;
        assert_eq!(response.status_code(), StatusCode::FORBIDDEN);

        // And so is modifying it
        let (name, value) = bearer(&bob_token);
        let response = server
            .put(&format!("/api/entries/{}", entry_id))
            .add_header(name, value)
            .json(&serde_json::json!({"delivered_amount": 0.0}))
            .await;
        assert_eq!(response.status_code(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_absent_entry_is_not_found() {
        let server = test_server().await;
        let token = login(&server, "alice-assertion").await;

        let (name, value) = bearer(&token);
        let response = server.get("/api/entries/9999").add_header(name, value).await;
        assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_update_and_delete_own_entry() {
        let server = test_server().await;
        let token = login(&server, "alice-assertion").await;

        let (name, value) = bearer(&token);
        let response = server
            .post("/api/entries")
            .add_header(name, value)
            .json(&sample_entry_json())
            .await;
        let created: serde_json::Value = response.json();
        let entry_id = created["id"].as_i64().unwrap();

        let (name, value) = bearer(&token);
        let response = server
            .put(&format!("/api/entries/{}", entry_id))
            .add_header(name, value)
            .json(&serde_json::json!({"delivered_amount": 900.0, "pending_amount": 100.0}))
            .await;
        assert_eq!(response.status_code(), StatusCode::OK);

        let updated: serde_json::Value = response.json();
        assert_eq!(updated["delivered_amount"], 900.0);
        // Unpatched fields survive
        assert_eq!(updated["challan_amount"], 1000.0);

        let (name, value) = bearer(&token);
        let response = server
            .delete(&format!("/api/entries/{}", entry_id))
            .add_header(name, value)
            .await;
        assert_eq!(response.status_code(), StatusCode::NO_CONTENT);

        let (name, value) = bearer(&token);
        let response = server
            .get(&format!("/api/entries/{}", entry_id))
            .add_header(name, value)
            .await;
        assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
    }

    // ========================================================================
    // Dashboard
    // ========================================================================

    #[tokio::test]
    async fn test_dashboard_summary_stable_keys() {
        let server = test_server().await;
        let token = login(&server, "alice-assertion").await;

        let (name, value) = bearer(&token);
        let response = server
            .get("/api/dashboard/summary")
            .add_header(name, value)
            .await;
        assert_eq!(response.status_code(), StatusCode::OK);

        // Field names are part of the dashboard contract
        let body: serde_json::Value = response.json();
        for key in [
            "total_challan_amount",
            "total_delivered_amount",
            "total_pending_amount",
            "total_vehicle_required",
            "total_vehicle_confirmed",
            "total_vehicle_missing",
            "delivery_rate",
            "vehicle_utilization_rate",
            "recent_entries_count",
        ] {
            assert!(body.get(key).is_some(), "missing summary key {}", key);
        }

        // Empty store yields additive identities
        assert_eq!(body["delivery_rate"], 0.0);
        assert_eq!(body["recent_entries_count"], 0);
    }

    #[tokio::test]
    async fn test_dashboard_summary_is_scoped_per_user() {
        let server = test_server().await;
        let alice_token = login(&server, "alice-assertion").await;
        let bob_token = login(&server, "bob-assertion").await;

        let (name, value) = bearer(&alice_token);
        server
            .post("/api/entries")
            .add_header(name, value)
            .json(&sample_entry_json())
            .await;

        let (name, value) = bearer(&bob_token);
        let response = server
            .get("/api/dashboard/summary")
            .add_header(name, value)
            .await;
        let body: serde_json::Value = response.json();

        // Bob's dashboard reflects only Bob's (absent) entries
        assert_eq!(body["total_challan_amount"], 0.0);
    }

    #[tokio::test]
    async fn test_chart_data_shape() {
        let server = test_server().await;
        let token = login(&server, "alice-assertion").await;

        let (name, value) = bearer(&token);
        let response = server
            .get("/api/dashboard/chart-data")
            .add_header(name, value)
            .await;
        assert_eq!(response.status_code(), StatusCode::OK);

        let body: serde_json::Value = response.json();
        assert!(body["daily_trend"].is_array());
    }

    // ========================================================================
    // Admin
    // ========================================================================

    #[tokio::test]
    async fn test_admin_routes_rejected_for_regular_user() {
        let server = test_server().await;
        let token = login(&server, "alice-assertion").await;

        for path in ["/api/admin/users", "/api/admin/entries", "/api/admin/export"] {
            let (name, value) = bearer(&token);
            let response = server.get(path).add_header(name, value).await;
            assert_eq!(
                response.status_code(),
                StatusCode::FORBIDDEN,
                "expected 403 on {}",
                path
            );
        }
    }

    #[tokio::test]
    async fn test_admin_sees_all_entries() {
        let server = test_server().await;
        let alice_token = login(&server, "alice-assertion").await;
        let bob_token = login(&server, "bob-assertion").await;
        let admin_token = login(&server, "admin-assertion").await;

        let (name, value) = bearer(&alice_token);
        server
            .post("/api/entries")
            .add_header(name, value)
            .json(&sample_entry_json())
            .await;
        let (name, value) = bearer(&bob_token);
        server
            .post("/api/entries")
            .add_header(name, value)
            .json(&sample_entry_json())
            .await;

        let (name, value) = bearer(&admin_token);
        let response = server.get("/api/admin/entries").add_header(name, value).await;
        assert_eq!(response.status_code(), StatusCode::OK);

        let listed: serde_json::Value = response.json();
        assert_eq!(listed.as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_admin_export_shape() {
        let server = test_server().await;
        let admin_token = login(&server, "admin-assertion").await;

        let (name, value) = bearer(&admin_token);
        let response = server.get("/api/admin/export").add_header(name, value).await;
        assert_eq!(response.status_code(), StatusCode::OK);

        let body: serde_json::Value = response.json();
        assert!(body["export_date"].is_string());
        assert!(body["users"].is_array());
        assert!(body["entries"].is_array());
    }

    #[tokio::test]
    async fn test_admin_role_from_configured_email() {
        let server = test_server().await;
        let admin_token = login(&server, "admin-assertion").await;

        let (name, value) = bearer(&admin_token);
        let response = server.get("/api/auth/me").add_header(name, value).await;
        let body: serde_json::Value = response.json();
        assert_eq!(body["role"], "admin");
    }
}
