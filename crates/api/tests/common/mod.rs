#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use devsync_api::auth::jwt::{generate_access_token, JwtConfig};
use devsync_api::config::ServerConfig;
use devsync_api::router::build_app_router;
use devsync_api::state::AppState;
use devsync_core::types::DbId;
use devsync_db::entities::{self, UserRepo};
use devsync_db::StoreHandle;
use http_body_util::BodyExt;
use serde_json::{json, Map, Value};
use tower::ServiceExt;

/// Build a test `ServerConfig` with safe defaults and a fixed JWT secret.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:3000".to_string()],
        request_timeout_secs: 30,
        db_max_connections: 1,
        posts_per_page: 10,
        jwt: JwtConfig {
            secret: "test-secret-that-is-long-enough-for-hmac".to_string(),
            access_token_expiry_mins: 15,
        },
    }
}

/// The full application over a fresh in-memory store.
///
/// The router is built with the same middleware stack production uses.
pub struct TestApp {
    pub router: Router,
    pub store: StoreHandle,
    pub config: ServerConfig,
}

impl TestApp {
    pub fn new() -> Self {
        let config = test_config();
        let store: StoreHandle = Arc::new(entities::memory_store());
        let state = AppState::new(store.clone(), config.clone());
        let router = build_app_router(state, &config);
        Self {
            router,
            store,
            config,
        }
    }

    /// Insert a user row directly and return its id and a bearer token.
    pub async fn seed_user(&self, login: &str, role: &str) -> (DbId, String) {
        let mut attributes = Map::new();
        attributes.insert("login".into(), json!(login));
        attributes.insert("email".into(), json!(format!("{login}@example.com")));
        attributes.insert("password".into(), json!("not-a-real-hash"));
        attributes.insert("role".into(), json!(role));
        let user = UserRepo::module(&self.store)
            .create(attributes)
            .await
            .expect("seeding a user should succeed");
        let id = user.id().expect("seeded user has an id");
        let token = generate_access_token(id, &self.config.jwt).expect("token generation");
        (id, token)
    }

    pub async fn send(
        &self,
        method: Method,
        path: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> Response<Body> {
        let mut builder = Request::builder().method(method).uri(path);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        let body = match body {
            Some(json) => {
                builder = builder.header("content-type", "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        self.router
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap()
    }

    pub async fn get(&self, path: &str, token: Option<&str>) -> Response<Body> {
        self.send(Method::GET, path, token, None).await
    }

    pub async fn post_json(&self, path: &str, token: Option<&str>, body: Value) -> Response<Body> {
        self.send(Method::POST, path, token, Some(body)).await
    }

    pub async fn patch_json(&self, path: &str, token: Option<&str>, body: Value) -> Response<Body> {
        self.send(Method::PATCH, path, token, Some(body)).await
    }

    pub async fn delete(&self, path: &str, token: Option<&str>) -> Response<Body> {
        self.send(Method::DELETE, path, token, None).await
    }

    /// Create a post through the API as the token's user and return its id.
    pub async fn create_post(&self, token: &str, body: Value) -> DbId {
        let response = self.post_json("/api/posts", Some(token), body).await;
        assert_eq!(response.status(), 201, "post creation should succeed");
        body_json(response).await["data"]["id"].as_i64().unwrap()
    }
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
