//! Assure360 test app.
//!
//! A small JSON HTTP service exposing informational endpoints. The same axum
//! router is served either by a standalone HTTP listener or, inside AWS
//! Lambda, through an adapter that translates API Gateway invocation events.

pub mod adapter;
pub mod config;
pub mod context;
pub mod envelope;
pub mod error;
pub mod info;
pub mod platform;
pub mod routes;
pub mod runtime;

pub use crate::adapter::{AdapterError, LambdaAdapter};
pub use crate::config::{AppConfig, AppConfigBuilder, ConfigError};
pub use crate::context::InvocationContext;
pub use crate::error::{ApiError, Assure360Error, Result};
pub use crate::info::{AppInfo, EnvSnapshot};
pub use crate::platform::{LambdaPlatform, RuntimePlatform};
pub use crate::routes::{AppState, router};
pub use crate::runtime::{run, run_lambda, serve};
pub use assure360_event::{EventError, InvocationEvent, InvocationResult, RequestOrigin};
