//! Gateway configuration from the environment

use orbital_mechanics::LiveConfig;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

use crate::live::LiveLimits;

pub const DEFAULT_PORT: u16 = 18700;
pub const DEFAULT_CATALOG_PATH: &str = "data/debris_catalog.json";

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct GatewayConfig {
    pub port: u16,
    pub catalog_path: PathBuf,
    pub live: LiveConfig,
    pub limits: LiveLimits,
}

impl GatewayConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unset keys take defaults, unparsable
    /// values are errors.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = LiveConfig::default();
        let default_limits = LiveLimits::default();

        let port = match lookup("DEBRIS_GATEWAY_PORT").or_else(|| lookup("PORT")) {
            Some(raw) => parse("DEBRIS_GATEWAY_PORT", &raw)?,
            None => DEFAULT_PORT,
        };

        let catalog_path = lookup("DEBRIS_CATALOG_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CATALOG_PATH));

        let tick_interval_ms: u64 = match lookup("DEBRIS_LIVE_TICK_MS") {
            Some(raw) => parse("DEBRIS_LIVE_TICK_MS", &raw)?,
            None => defaults.tick_interval_ms,
        };
        // a zero period would spin the animation task
        if tick_interval_ms == 0 {
            return Err(ConfigError::Invalid {
                key: "DEBRIS_LIVE_TICK_MS",
                value: "0".to_string(),
            });
        }

        let sim_step_ms = match lookup("DEBRIS_LIVE_SIM_STEP_SECS") {
            Some(raw) => {
                let secs: f64 = parse("DEBRIS_LIVE_SIM_STEP_SECS", &raw)?;
                if !secs.is_finite() || secs.abs() > 86_400.0 {
                    return Err(ConfigError::Invalid {
                        key: "DEBRIS_LIVE_SIM_STEP_SECS",
                        value: raw,
                    });
                }
                (secs * 1000.0).round() as i64
            }
            None => defaults.sim_step_ms,
        };

        let max_objects = match lookup("DEBRIS_LIVE_MAX_OBJECTS") {
            Some(raw) => parse("DEBRIS_LIVE_MAX_OBJECTS", &raw)?,
            None => defaults.max_objects,
        };

        let idle_secs: u64 = match lookup("DEBRIS_LIVE_IDLE_SECS") {
            Some(raw) => parse("DEBRIS_LIVE_IDLE_SECS", &raw)?,
            None => default_limits.idle_timeout.as_secs(),
        };
        let max_sessions: usize = match lookup("DEBRIS_LIVE_MAX_SESSIONS") {
            Some(raw) => parse("DEBRIS_LIVE_MAX_SESSIONS", &raw)?,
            None => default_limits.max_sessions,
        };
        // zero would end or refuse every session
        for (key, value) in [("DEBRIS_LIVE_IDLE_SECS", idle_secs), ("DEBRIS_LIVE_MAX_SESSIONS", max_sessions as u64)] {
            if value == 0 {
                return Err(ConfigError::Invalid {
                    key,
                    value: "0".to_string(),
                });
            }
        }

        Ok(Self {
            port,
            catalog_path,
            live: LiveConfig {
                tick_interval_ms,
                sim_step_ms,
                max_objects,
            },
            limits: LiveLimits {
                max_sessions,
                idle_timeout: Duration::from_secs(idle_secs),
            },
        })
    }
}

fn parse<T: FromStr>(key: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::Invalid {
        key,
        value: raw.to_string(),
    })
}
