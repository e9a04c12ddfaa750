use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use dotenvy::Error as DotenvError;
use thiserror::Error;

use crate::info::{AppInfo, EnvSnapshot};
use crate::platform::RuntimePlatform;

const DEFAULT_PORT: u16 = 8080;
const PORT_ENV: &str = "PORT";
const HOST_ENV: &str = "HOST";

/// Configuration built once at startup, before the router exists.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub platform: RuntimePlatform,
    pub app_info: AppInfo,
    pub env: EnvSnapshot,
}

impl AppConfig {
    /// Loads configuration from the process environment.
    ///
    /// Values from a local `.env` file (parsed via [`dotenvy::dotenv_override`]) override whatever is already set in
    /// the process environment, which makes local development workflows predictable.
    pub fn from_env() -> Result<Self, ConfigError> {
        load_env_overrides()?;
        Self::from_snapshot(EnvSnapshot::capture())
    }

    /// Resolves configuration from an already captured environment.
    pub fn from_snapshot(env: EnvSnapshot) -> Result<Self, ConfigError> {
        let port = match env.get(PORT_ENV) {
            Some(value) => value
                .trim()
                .parse::<u16>()
                .map_err(|_| ConfigError::InvalidPort(value.to_owned()))?,
            None => DEFAULT_PORT,
        };

        let addr = env
            .get(HOST_ENV)
            .and_then(|value| value.parse::<IpAddr>().ok())
            .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));

        Ok(Self {
            bind_addr: SocketAddr::new(addr, port),
            platform: RuntimePlatform::detect(&env),
            app_info: AppInfo::from_snapshot(&env),
            env,
        })
    }

    /// Returns a builder for programmatic overrides.
    pub fn builder() -> AppConfigBuilder {
        AppConfigBuilder::default()
    }
}

impl Default for AppConfig {
    /// Binds to `0.0.0.0:8080` as a standalone server with default app metadata.
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), DEFAULT_PORT),
            platform: RuntimePlatform::default(),
            app_info: AppInfo::default(),
            env: EnvSnapshot::default(),
        }
    }
}

/// Builder type for [`AppConfig`].
#[derive(Default, Clone, Debug)]
pub struct AppConfigBuilder {
    bind_addr: Option<SocketAddr>,
    platform: Option<RuntimePlatform>,
    app_info: Option<AppInfo>,
    env: Option<EnvSnapshot>,
}

impl AppConfigBuilder {
    /// Sets the address for the HTTP listener.
    pub fn bind_addr(mut self, addr: SocketAddr) -> Self {
        self.bind_addr = Some(addr);
        self
    }

    /// Sets the runtime platform instead of detecting it.
    pub fn platform(mut self, platform: RuntimePlatform) -> Self {
        self.platform = Some(platform);
        self
    }

    /// Sets the metadata reported by every endpoint.
    pub fn app_info(mut self, app_info: AppInfo) -> Self {
        self.app_info = Some(app_info);
        self
    }

    /// Sets the environment snapshot `/info` reads from.
    ///
    /// When no [`AppInfo`] is supplied it is derived from this snapshot.
    pub fn env(mut self, env: EnvSnapshot) -> Self {
        self.env = Some(env);
        self
    }

    /// Builds the final configuration.
    pub fn build(self) -> AppConfig {
        let env = self.env.unwrap_or_default();
        let app_info = self
            .app_info
            .unwrap_or_else(|| AppInfo::from_snapshot(&env));

        AppConfig {
            bind_addr: self.bind_addr.unwrap_or_else(|| {
                SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), DEFAULT_PORT)
            }),
            platform: self.platform.unwrap_or_default(),
            app_info,
            env,
        }
    }
}

/// Errors that can occur while building [`AppConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid port: {0}")]
    InvalidPort(String),
    #[error("failed to load .env overrides: {0}")]
    Dotenv(#[from] DotenvError),
}

fn load_env_overrides() -> Result<(), ConfigError> {
    match dotenvy::dotenv_override() {
        Ok(_) => Ok(()),
        Err(err) if err.not_found() => Ok(()),
        Err(err) => Err(ConfigError::Dotenv(err)),
    }
}
