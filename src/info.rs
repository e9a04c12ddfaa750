use std::collections::BTreeMap;
use std::env;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub const APP_NAME: &str = "Assure360 Test App";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");
pub const APP_DESCRIPTION: &str = "Serverless app for CI/CD testing";

const ENVIRONMENT_ENV: &str = "ENVIRONMENT";
const REGION_ENV: &str = "AWS_REGION";
const DEFAULT_ENVIRONMENT: &str = "development";
const DEFAULT_REGION: &str = "unknown";

/// Name prefixes of the environment variables echoed by `/info`.
pub const EXPOSED_ENV_PREFIXES: [&str; 3] = ["AWS_", "LAMBDA_", "ENVIRONMENT"];

/// Static metadata describing the running instance, shared read-only by every handler.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AppInfo {
    pub name: String,
    pub version: String,
    pub description: String,
    pub environment: String,
    pub region: String,
}

impl AppInfo {
    pub fn new(environment: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            name: APP_NAME.to_owned(),
            version: APP_VERSION.to_owned(),
            description: APP_DESCRIPTION.to_owned(),
            environment: environment.into(),
            region: region.into(),
        }
    }

    /// Reads `ENVIRONMENT` and `AWS_REGION`, falling back to `development` and `unknown`.
    pub fn from_snapshot(env: &EnvSnapshot) -> Self {
        Self::new(
            env.get(ENVIRONMENT_ENV).unwrap_or(DEFAULT_ENVIRONMENT),
            env.get(REGION_ENV).unwrap_or(DEFAULT_REGION),
        )
    }
}

impl Default for AppInfo {
    fn default() -> Self {
        Self::new(DEFAULT_ENVIRONMENT, DEFAULT_REGION)
    }
}

/// Point-in-time copy of the process environment.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EnvSnapshot {
    vars: BTreeMap<String, String>,
}

impl EnvSnapshot {
    /// Captures the current process environment. Entries that are not valid UTF-8 are skipped.
    pub fn capture() -> Self {
        env::vars_os()
            .filter_map(|(key, value)| Some((key.into_string().ok()?, value.into_string().ok()?)))
            .collect()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    /// Returns the variables whose names start with one of [`EXPOSED_ENV_PREFIXES`].
    pub fn exposed(&self) -> BTreeMap<String, String> {
        self.vars
            .iter()
            .filter(|(key, _)| {
                EXPOSED_ENV_PREFIXES
                    .iter()
                    .any(|prefix| key.starts_with(prefix))
            })
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }
}

impl<K, V> FromIterator<(K, V)> for EnvSnapshot
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            vars: iter
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        }
    }
}
