use core_config::{app_info, server::ServerConfig, AppInfo, FromEnv};
use database::redis::RedisConfig;

pub use core_config::Environment;

/// Application configuration, composed from shared config components.
#[derive(Clone, Debug)]
pub struct Config {
    pub app: AppInfo,
    pub redis: RedisConfig,
    pub server: ServerConfig,
    pub environment: Environment,
}

impl Config {
    pub fn from_env() -> eyre::Result<Self> {
        let environment = Environment::from_env();
        let redis = RedisConfig::from_env()?; // Required - will fail if not set
        let server = ServerConfig::from_env()?; // Defaults: HOST=0.0.0.0, PORT=8080

        Ok(Self {
            app: app_info!(),
            redis,
            server,
            environment,
        })
    }
}
