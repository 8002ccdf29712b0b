//! Common test utilities for exercising the HTTP API in process.
//!
//! This module provides a test fixture that builds the real router over an
//! in-memory ticket store and a JWT authenticator, so requests can be sent
//! as different users without binding a socket.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use chrono::Duration;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use helpdesk_core::{
    AuthConfig, AuthMethod, Config, DatabaseConfig, JwtAuthenticator, ServerConfig,
    SqliteTicketStore, TicketStore, TicketsConfig, UpdatePolicy,
};

/// Re-export fixtures for test convenience
pub use helpdesk_core::testing::fixtures;

/// Secret shared by the fixture's authenticator and token issuer.
pub const TEST_SECRET: &str = "integration-test-secret";

/// Test fixture for in-process API testing.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_ticket_creation() {
///     let fixture = TestFixture::new();
///
///     let response = fixture.post("/api/v1/tickets", Some("alice"), json!({
///         "title": "Printer",
///         "description": "It is on fire"
///     })).await;
///
///     assert_eq!(response.status, 201);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Ticket store behind the router
    pub store: Arc<dyn TicketStore>,
    issuer: JwtAuthenticator,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestFixture {
    /// Create a fixture with an empty in-memory store and the default update policy.
    pub fn new() -> Self {
        Self::with_config(TestConfig::default())
    }

    /// Create a fixture with custom configuration.
    pub fn with_config(test_config: TestConfig) -> Self {
        let store: Arc<dyn TicketStore> = test_config.store.unwrap_or_else(|| {
            Arc::new(SqliteTicketStore::in_memory().expect("Failed to create ticket store"))
        });

        let config = Config {
            auth: AuthConfig {
                method: AuthMethod::Jwt,
                jwt_secret: Some(TEST_SECRET.to_string()),
            },
            server: ServerConfig {
                host: std::net::IpAddr::V4(std::net::Ipv4Addr::LOCALHOST),
                port: 8080, // Not used for in-process testing
            },
            database: DatabaseConfig::default(),
            tickets: TicketsConfig {
                update_policy: test_config.update_policy,
            },
        };

        let state = Arc::new(helpdesk_server::state::AppState::new(
            config,
            Arc::new(JwtAuthenticator::new(TEST_SECRET)),
            Arc::clone(&store),
        ));

        let router = helpdesk_server::api::create_router(state);

        Self {
            router,
            store,
            issuer: JwtAuthenticator::new(TEST_SECRET),
        }
    }

    /// Issue a session token for a user.
    pub fn token_for(&self, user_id: &str) -> String {
        self.issuer
            .issue(user_id, Duration::hours(1))
            .expect("Failed to issue token")
    }

    /// Send a GET request, optionally as a user.
    pub async fn get(&self, path: &str, user: Option<&str>) -> TestResponse {
        self.request("GET", path, user, None).await
    }

    /// Send a POST request with JSON body.
    pub async fn post(&self, path: &str, user: Option<&str>, body: Value) -> TestResponse {
        self.request("POST", path, user, Some(body)).await
    }

    /// Send a PUT request with JSON body.
    pub async fn put(&self, path: &str, user: Option<&str>, body: Value) -> TestResponse {
        self.request("PUT", path, user, Some(body)).await
    }

    /// Send a PATCH request without a body.
    pub async fn patch(&self, path: &str, user: Option<&str>) -> TestResponse {
        self.request("PATCH", path, user, None).await
    }

    /// Send a DELETE request.
    pub async fn delete(&self, path: &str, user: Option<&str>) -> TestResponse {
        self.request("DELETE", path, user, None).await
    }

    /// Send a request with an explicit Authorization header value.
    pub async fn get_with_authorization(&self, path: &str, authorization: &str) -> TestResponse {
        let request = Request::builder()
            .method("GET")
            .uri(path)
            .header(header::AUTHORIZATION, authorization)
            .body(Body::empty())
            .unwrap();
        self.send(request).await
    }

    /// Send a POST request with raw string body (for testing malformed JSON).
    pub async fn post_raw(&self, path: &str, user: Option<&str>, body: &str) -> TestResponse {
        let mut builder = Request::builder()
            .method("POST")
            .uri(path)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(user) = user {
            builder = builder.header(
                header::AUTHORIZATION,
                format!("Bearer {}", self.token_for(user)),
            );
        }
        let request = builder.body(Body::from(body.to_string())).unwrap();
        self.send(request).await
    }

    /// Create a ticket as a user and return its id.
    pub async fn create_ticket(&self, user: &str, title: &str, categories: &[&str]) -> i64 {
        let response = self
            .post(
                "/api/v1/tickets",
                Some(user),
                serde_json::json!({
                    "title": title,
                    "description": format!("Details about: {}", title),
                    "categories": categories,
                }),
            )
            .await;
        assert_eq!(
            response.status,
            StatusCode::CREATED,
            "Failed to create ticket: {}",
            response.body
        );
        response.body["id"].as_i64().expect("ticket id")
    }

    /// Send a request to the test server.
    async fn request(
        &self,
        method: &str,
        path: &str,
        user: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut request_builder = Request::builder().method(method).uri(path);

        if let Some(user) = user {
            request_builder = request_builder.header(
                header::AUTHORIZATION,
                format!("Bearer {}", self.token_for(user)),
            );
        }

        let body = if let Some(json_body) = body {
            request_builder = request_builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(serde_json::to_vec(&json_body).unwrap())
        } else {
            Body::empty()
        };

        let request = request_builder.body(body).unwrap();
        self.send(request).await
    }

    async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, body }
    }
}

/// Configuration for test fixture.
#[derive(Default)]
pub struct TestConfig {
    /// Store to serve instead of a fresh in-memory one
    pub store: Option<Arc<dyn TicketStore>>,
    pub update_policy: UpdatePolicy,
}

impl TestConfig {
    /// Serve the given store.
    pub fn with_store(store: Arc<dyn TicketStore>) -> Self {
        Self {
            store: Some(store),
            ..Default::default()
        }
    }

    /// Only let posters update their own tickets.
    pub fn owner_only() -> Self {
        Self {
            update_policy: UpdatePolicy::OwnerOnly,
            ..Default::default()
        }
    }
}

/// Helper to assert a response has expected status.
#[macro_export]
macro_rules! assert_status {
    ($response:expr, $status:expr) => {
        assert_eq!(
            $response.status, $status,
            "Expected status {:?}, got {:?}. Body: {}",
            $status,
            $response.status,
            serde_json::to_string_pretty(&$response.body).unwrap_or_default()
        );
    };
}

/// Helper to assert a JSON path equals expected value.
#[macro_export]
macro_rules! assert_json_path {
    ($json:expr, $path:expr, $expected:expr) => {
        let actual = &$json[$path];
        assert_eq!(
            actual, &$expected,
            "Path '{}' expected {:?}, got {:?}",
            $path, $expected, actual
        );
    };
}
