//! HTTP API server for the asset ledger.
//!
//! Exposes [`AssetService`](crate::service::AssetService) over axum, backed
//! by the fjall ledger. Caller identity comes from trusted headers set by an
//! upstream auth proxy, see [`Caller`].

mod config;
mod error;
mod identity;
mod logging;
mod routes;
mod state;

pub use config::{
    AssetsConfig, AuthConfig, Config, ConfigError, CorsConfig, LogFormat, LoggingConfig,
    ServerConfig, StoreConfig,
};
pub use error::ApiError;
pub use identity::Caller;
pub use logging::{LoggingError, init as init_logging};
pub use routes::router;
pub use state::{AppState, Service, StateError};
