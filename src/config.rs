use anyhow::Result;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use validator::{Validate, ValidationError};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub model: ModelConfig,
    pub forecast: ForecastConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub request_timeout_secs: u64,
    pub body_limit_bytes: usize,
    pub enable_cors: bool,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        Ok(format!("{}:{}", self.host, self.port).parse()?)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
            request_timeout_secs: 30,
            body_limit_bytes: 2 * 1024 * 1024,
            enable_cors: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Model artifact; `.json` is read as JSON, anything else as bincode
    pub path: PathBuf,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("models/pv_model.json"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directives, used when `RUST_LOG` is unset
    pub filter: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info,hyper=warn,tower_http=info".to_string(),
            json: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_horizons"))]
pub struct ForecastConfig {
    /// Steps produced when a request does not name a horizon
    #[validate(range(min = 1))]
    pub default_horizon: u32,
    /// Largest horizon a request may ask for
    #[validate(range(min = 1, max = 8760))]
    pub max_horizon: u32,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            default_horizon: 24,
            max_horizon: 720,
        }
    }
}

fn validate_horizons(cfg: &ForecastConfig) -> Result<(), ValidationError> {
    if cfg.default_horizon > cfg.max_horizon {
        return Err(ValidationError::new("default_horizon_exceeds_max_horizon"));
    }
    Ok(())
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from("config/default.toml")
    }

    /// Built-in defaults, then the TOML file, then `SOLAR__*` env vars.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let figment = Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed("SOLAR__").split("__"));
        let cfg: Config = figment.extract()?;
        cfg.forecast.validate()?;
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let cfg = Config::default();
        assert!(cfg.forecast.validate().is_ok());
        assert_eq!(cfg.forecast.default_horizon, 24);
        assert_eq!(cfg.server.socket_addr().unwrap().port(), 5000);
    }

    #[test]
    fn test_default_above_max_is_rejected() {
        let forecast = ForecastConfig {
            default_horizon: 48,
            max_horizon: 24,
        };
        assert!(forecast.validate().is_err());
    }

    #[test]
    fn test_zero_horizon_is_rejected() {
        let forecast = ForecastConfig {
            default_horizon: 0,
            max_horizon: 24,
        };
        assert!(forecast.validate().is_err());
    }

    #[test]
    fn test_env_overrides_toml() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "solar.toml",
                r#"
                [server]
                port = 8080

                [model]
                path = "models/from_toml.bin"
                "#,
            )?;
            jail.set_env("SOLAR__FORECAST__MAX_HORIZON", "48");

            let cfg = Config::load_from("solar.toml").map_err(|e| e.to_string())?;
            assert_eq!(cfg.server.port, 8080);
            assert_eq!(cfg.server.host, "127.0.0.1");
            assert_eq!(cfg.model.path, PathBuf::from("models/from_toml.bin"));
            assert_eq!(cfg.forecast.max_horizon, 48);
            assert_eq!(cfg.forecast.default_horizon, 24);
            Ok(())
        });
    }
}
