//! JSON bodies returned by the app.
//!
//! Every builder is a pure function of the request time and its inputs, so the
//! HTTP handlers stay thin and the payloads can be checked against a fixed
//! clock.

use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::info::AppInfo;

const HUMAN_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S UTC";

pub const DEFAULT_GREETING_NAME: &str = "World";

/// Formats `now` as ISO-8601 UTC with microseconds and a trailing `Z`.
pub fn timestamp(now: DateTime<Utc>) -> String {
    now.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Identifies the build serving requests.
pub fn runtime_version() -> String {
    format!(
        "{}/{} ({}-{})",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        std::env::consts::OS,
        std::env::consts::ARCH,
    )
}

#[derive(Debug, Serialize, ToSchema)]
pub struct Welcome<'a> {
    pub message: String,
    #[schema(value_type = AppInfo)]
    pub app: &'a AppInfo,
    pub timestamp: String,
}

pub fn welcome(app: &AppInfo, now: DateTime<Utc>) -> Welcome<'_> {
    Welcome {
        message: format!("Welcome to {}!", app.name),
        app,
        timestamp: timestamp(now),
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct Health<'a> {
    #[schema(value_type = String)]
    pub status: &'static str,
    pub timestamp: String,
    #[schema(value_type = AppInfo)]
    pub app: &'a AppInfo,
}

pub fn health(app: &AppInfo, now: DateTime<Utc>) -> Health<'_> {
    Health {
        status: "healthy",
        timestamp: timestamp(now),
        app,
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct Greeting<'a> {
    pub message: String,
    #[schema(value_type = AppInfo)]
    pub app: &'a AppInfo,
    pub timestamp: String,
}

/// Greets `name`, or [`DEFAULT_GREETING_NAME`] when absent.
pub fn greeting<'a>(app: &'a AppInfo, name: Option<&str>, now: DateTime<Utc>) -> Greeting<'a> {
    let name = name.unwrap_or(DEFAULT_GREETING_NAME);
    Greeting {
        message: format!("Hello {name} from Assure360!"),
        app,
        timestamp: timestamp(now),
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TimeReport<'a> {
    pub utc: String,
    pub unix: i64,
    pub formatted: String,
    #[schema(value_type = AppInfo)]
    pub app: &'a AppInfo,
    pub timestamp: String,
}

pub fn time_report(app: &AppInfo, now: DateTime<Utc>) -> TimeReport<'_> {
    let utc = timestamp(now);
    TimeReport {
        timestamp: utc.clone(),
        utc,
        unix: now.timestamp(),
        formatted: now.format(HUMAN_TIME_FORMAT).to_string(),
        app,
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StatusReport<'a> {
    #[schema(value_type = String)]
    pub status: &'static str,
    #[schema(value_type = String)]
    pub uptime: &'static str,
    #[schema(value_type = String)]
    pub version: &'a str,
    #[schema(value_type = String)]
    pub environment: &'a str,
    #[schema(value_type = String)]
    pub region: &'a str,
    pub timestamp: String,
}

pub fn status_report(app: &AppInfo, now: DateTime<Utc>) -> StatusReport<'_> {
    StatusReport {
        status: "operational",
        uptime: "unknown",
        version: &app.version,
        environment: &app.environment,
        region: &app.region,
        timestamp: timestamp(now),
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct InfoReport<'a> {
    #[schema(value_type = AppInfo)]
    pub app: &'a AppInfo,
    pub runtime_version: String,
    pub environment_variables: BTreeMap<String, String>,
    pub timestamp: String,
}

/// `environment_variables` is expected to be pre-filtered, see [`crate::EnvSnapshot::exposed`].
pub fn info_report(
    app: &AppInfo,
    environment_variables: BTreeMap<String, String>,
    now: DateTime<Utc>,
) -> InfoReport<'_> {
    InfoReport {
        app,
        runtime_version: runtime_version(),
        environment_variables,
        timestamp: timestamp(now),
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TestReport {
    #[schema(value_type = String)]
    pub message: &'static str,
    #[schema(value_type = String)]
    pub ci_cd_status: &'static str,
    #[schema(value_type = String)]
    pub deployment: &'static str,
    pub timestamp: String,
}

pub fn test_report(now: DateTime<Utc>) -> TestReport {
    TestReport {
        message: "Test endpoint working!",
        ci_cd_status: "success",
        deployment: "verified",
        timestamp: timestamp(now),
    }
}

/// Body of every 404 and 500 response.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorEnvelope {
    #[schema(value_type = String)]
    pub error: &'static str,
    pub message: String,
    pub timestamp: String,
}

pub fn not_found(path: &str, now: DateTime<Utc>) -> ErrorEnvelope {
    ErrorEnvelope {
        error: "Not Found",
        message: format!("The requested endpoint {path} was not found"),
        timestamp: timestamp(now),
    }
}

pub fn internal_error(now: DateTime<Utc>) -> ErrorEnvelope {
    ErrorEnvelope {
        error: "Internal Server Error",
        message: "An unexpected error occurred".to_owned(),
        timestamp: timestamp(now),
    }
}
