//! Common test utilities and fixtures.
//!
//! Shared schema, identity headers, and a [`TestApp`] that serves the router
//! over a fresh temporary ledger.

#![cfg(feature = "server")]
#![allow(dead_code)]

use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum_test::{TestRequest, TestServer};
use serde_json::{Value, json};
use tempfile::TempDir;

use asset_ledger::server::{
    AppState, AssetsConfig, AuthConfig, Config, CorsConfig, LoggingConfig, ServerConfig,
    StoreConfig, router,
};
use asset_ledger::{AssetTypeSchema, SchemaRegistry};

pub const USER_HEADER: HeaderName = HeaderName::from_static("x-asset-user");
pub const ADMIN_HEADER: HeaderName = HeaderName::from_static("x-asset-admin");

/// Schema used by most tests: every asset needs a `name`, `status` is
/// restricted, and hosts also need an `ip`.
pub fn test_schema() -> SchemaRegistry {
    SchemaRegistry::new(
        AssetTypeSchema::default()
            .require("name")
            .enforce("status", ["enabled", "disabled"]),
    )
    .with_type(
        "host",
        AssetTypeSchema::default()
            .require("name")
            .require("ip")
            .enforce("status", ["enabled", "disabled"]),
    )
}

/// Test application wrapper that manages a temporary ledger.
pub struct TestApp {
    pub server: TestServer,
    _temp_dir: TempDir, // Keep alive for test duration
}

impl TestApp {
    /// Create a new test application with a fresh temporary ledger.
    pub fn new() -> anyhow::Result<Self> {
        Self::with_config(test_schema(), 10)
    }

    pub fn with_config(schema: SchemaRegistry, default_result_size: usize) -> anyhow::Result<Self> {
        let temp_dir = TempDir::new()?;
        let store_path = temp_dir.path().join("ledger");
        let config = Config {
            server: ServerConfig {
                bind: "127.0.0.1".into(),
                port: 0,
            },
            store: StoreConfig {
                path: store_path.to_string_lossy().into(),
            },
            assets: AssetsConfig {
                default_result_size,
            },
            auth: AuthConfig::default(),
            logging: LoggingConfig::default(),
            cors: CorsConfig::default(),
            schema,
        };
        let state = AppState::from_config(&config)?;
        let server = TestServer::new(router(state))?;
        Ok(Self {
            server,
            _temp_dir: temp_dir,
        })
    }

    /// POST as a regular user.
    pub fn create_as(&self, user: &'static str, asset_type: &str, asset_id: &str) -> TestRequest {
        self.server
            .post(&asset_path(asset_type, asset_id))
            .add_header(USER_HEADER, HeaderValue::from_static(user))
    }

    /// POST as an admin.
    pub fn create_as_admin(&self, asset_type: &str, asset_id: &str) -> TestRequest {
        self.create_as("root", asset_type, asset_id)
            .add_header(ADMIN_HEADER, HeaderValue::from_static("true"))
    }

    /// PUT as a regular user.
    pub fn edit_as(&self, user: &'static str, asset_type: &str, asset_id: &str) -> TestRequest {
        self.server
            .put(&asset_path(asset_type, asset_id))
            .add_header(USER_HEADER, HeaderValue::from_static(user))
    }

    /// DELETE as a regular user.
    pub fn delete_as(&self, user: &'static str, asset_type: &str, asset_id: &str) -> TestRequest {
        self.server
            .delete(&asset_path(asset_type, asset_id))
            .add_header(USER_HEADER, HeaderValue::from_static(user))
    }

    /// Create the standard `host/h1` asset as admin.
    pub async fn create_host(&self) -> anyhow::Result<()> {
        self.create_as_admin("host", "h1")
            .json(&json!({ "name": "h1", "ip": "10.0.0.1" }))
            .await
            .assert_status(StatusCode::CREATED);
        Ok(())
    }
}

pub fn asset_path(asset_type: &str, asset_id: &str) -> String {
    format!("/api/v1/assets/{}/{}", asset_type, asset_id)
}

/// Extract the `error.code` of a JSON error response.
pub fn error_code(body: &Value) -> Option<&str> {
    body["error"]["code"].as_str()
}
