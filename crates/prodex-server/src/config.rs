use prodex_core::{AppError, PipelineConfig};

/// Server settings read from the environment.
///
/// - `PRODEX_ENV` (default `development`)
/// - `PORT` (default `3000`)
/// - `LOG_LEVEL` (default `debug`)
///
/// plus every pipeline variable understood by [`PipelineConfig`].
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub environment: String,
    pub port: u16,
    pub log_level: String,
    pub pipeline: PipelineConfig,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<L>(lookup: L) -> Result<Self, AppError>
    where
        L: Fn(&str) -> Option<String>,
    {
        let port = match lookup("PORT") {
            None => 3000,
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|_| AppError::ConfigError(format!("Invalid PORT '{raw}'")))?,
        };

        Ok(Self {
            environment: lookup("PRODEX_ENV").unwrap_or_else(|| "development".to_string()),
            port,
            log_level: lookup("LOG_LEVEL").unwrap_or_else(|| "debug".to_string()),
            pipeline: PipelineConfig::from_lookup(&lookup)?,
        })
    }
}

/// Load `.env.{PRODEX_ENV}` and then `.env`; variables already set win.
pub fn load_env_files() {
    let environment = std::env::var("PRODEX_ENV").unwrap_or_else(|_| "development".to_string());
    let _ = dotenvy::from_filename(format!(".env.{environment}"));
    let _ = dotenvy::dotenv();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config.environment, "development");
        assert_eq!(config.port, 3000);
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.pipeline.model, "gpt-4");
    }

    #[test]
    fn test_overrides_and_pipeline_passthrough() {
        let config = ServerConfig::from_lookup(|key| match key {
            "PRODEX_ENV" => Some("production".into()),
            "PORT" => Some("8080".into()),
            "PRODEX_MODEL" => Some("gpt-4o".into()),
            _ => None,
        })
        .unwrap();
        assert_eq!(config.environment, "production");
        assert_eq!(config.port, 8080);
        assert_eq!(config.pipeline.model, "gpt-4o");
    }

    #[test]
    fn test_invalid_port() {
        let err = ServerConfig::from_lookup(|key| (key == "PORT").then(|| "http".into()))
            .unwrap_err();
        assert!(matches!(err, AppError::ConfigError(_)));
    }
}
