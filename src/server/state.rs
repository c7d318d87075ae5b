//! Application state management.

use std::path::Path;
use std::sync::Arc;

use crate::ledger::{FjallLedger, LedgerError};
use crate::schema::SchemaRegistry;
use crate::service::AssetService;

use super::config::{AuthConfig, Config};

/// Service type served over HTTP.
pub type Service = AssetService<FjallLedger, SchemaRegistry>;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    service: Arc<Service>,
    auth: Arc<AuthConfig>,
}

impl AppState {
    /// Open (or initialize) the configured ledger and build the state.
    pub fn from_config(config: &Config) -> Result<Self, StateError> {
        let ledger = FjallLedger::open_or_init(Path::new(&config.store.path)).map_err(|e| {
            StateError::OpenLedger {
                path: config.store.path.clone(),
                source: e,
            }
        })?;
        let service = AssetService::new(ledger, config.schema.clone())
            .with_default_result_size(config.assets.default_result_size);

        Ok(Self::new(service, config.auth.clone()))
    }

    pub fn new(service: Service, auth: AuthConfig) -> Self {
        Self {
            service: Arc::new(service),
            auth: Arc::new(auth),
        }
    }

    pub fn service(&self) -> &Service {
        &self.service
    }

    pub fn auth(&self) -> &AuthConfig {
        &self.auth
    }
}

/// Errors that can occur when setting up application state.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("Failed to open ledger at '{path}': {source}")]
    OpenLedger {
        path: String,
        #[source]
        source: LedgerError,
    },
}
