//! Configuration module
//!
//! This module provides configuration structures for the API and the artifact
//! generation pipeline: server settings, upload limits and the generator endpoint.

use std::env;

// Common constants
const SERVER_PORT: u16 = 8080;
const HTTP_CONCURRENCY_LIMIT: usize = 10_000;
const MAX_ARTIFACT_SIZE_MB: u64 = 10 * 1024;
const MAX_FIELD_BYTES: usize = 64 * 1024;
const GENERATOR_TIMEOUT_SECS: u64 = 300;

/// Base server configuration
#[derive(Clone, Debug)]
pub struct BaseConfig {
    pub server_port: u16,
    pub environment: String,
    pub http_concurrency_limit: usize,
}

/// Artifact generation configuration
#[derive(Clone, Debug)]
pub struct GenerationConfig {
    pub base: BaseConfig,
    /// Largest artifact file accepted, in bytes
    pub max_artifact_size_bytes: u64,
    /// Largest single form field value accepted, in bytes
    pub max_field_bytes: usize,
    pub generator_url: String,
    pub generator_timeout_secs: u64,
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config(pub Box<GenerationConfig>);

impl Config {
    fn as_generation(&self) -> &GenerationConfig {
        &self.0
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        is_production_name(&self.as_generation().base.environment)
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        let config = GenerationConfig::from_env()?;
        Ok(Config(Box::new(config)))
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.as_generation().validate()
    }

    pub fn server_port(&self) -> u16 {
        self.as_generation().base.server_port
    }

    pub fn environment(&self) -> &str {
        &self.as_generation().base.environment
    }

    pub fn http_concurrency_limit(&self) -> usize {
        self.as_generation().base.http_concurrency_limit
    }

    pub fn max_artifact_size_bytes(&self) -> u64 {
        self.as_generation().max_artifact_size_bytes
    }

    pub fn max_field_bytes(&self) -> usize {
        self.as_generation().max_field_bytes
    }

    pub fn generator_url(&self) -> &str {
        &self.as_generation().generator_url
    }

    pub fn generator_timeout_secs(&self) -> u64 {
        self.as_generation().generator_timeout_secs
    }
}

fn is_production_name(environment: &str) -> bool {
    let environment = environment.to_lowercase();
    environment == "production" || environment == "prod"
}

impl GenerationConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let base = BaseConfig {
            server_port: env::var("PORT")
                .unwrap_or_else(|_| SERVER_PORT.to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?,
            environment,
            http_concurrency_limit: env::var("HTTP_CONCURRENCY_LIMIT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(HTTP_CONCURRENCY_LIMIT),
        };

        let max_artifact_size_mb = env::var("MAX_ARTIFACT_SIZE_MB")
            .unwrap_or_else(|_| MAX_ARTIFACT_SIZE_MB.to_string())
            .parse::<u64>()
            .unwrap_or(MAX_ARTIFACT_SIZE_MB);

        let config = GenerationConfig {
            base,
            max_artifact_size_bytes: max_artifact_size_mb.saturating_mul(1024 * 1024),
            max_field_bytes: env::var("MAX_FIELD_BYTES")
                .unwrap_or_else(|_| MAX_FIELD_BYTES.to_string())
                .parse()
                .unwrap_or(MAX_FIELD_BYTES),
            generator_url: env::var("GENERATOR_URL").map_err(|_| {
                anyhow::anyhow!("GENERATOR_URL must be set to the artifact generator endpoint")
            })?,
            generator_timeout_secs: env::var("GENERATOR_TIMEOUT_SECS")
                .unwrap_or_else(|_| GENERATOR_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(GENERATOR_TIMEOUT_SECS),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.max_artifact_size_bytes == 0 {
            return Err(anyhow::anyhow!(
                "MAX_ARTIFACT_SIZE_MB must be greater than zero"
            ));
        }

        if self.max_field_bytes == 0 {
            return Err(anyhow::anyhow!("MAX_FIELD_BYTES must be greater than zero"));
        }

        if self.base.http_concurrency_limit == 0 {
            return Err(anyhow::anyhow!(
                "HTTP_CONCURRENCY_LIMIT must be greater than zero"
            ));
        }

        if !(self.generator_url.starts_with("http://") || self.generator_url.starts_with("https://"))
        {
            return Err(anyhow::anyhow!(
                "GENERATOR_URL must be an http:// or https:// URL"
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> GenerationConfig {
        GenerationConfig {
            base: BaseConfig {
                server_port: 8080,
                environment: "development".to_string(),
                http_concurrency_limit: 16,
            },
            max_artifact_size_bytes: 1024,
            max_field_bytes: 128,
            generator_url: "http://generator.local/api/generate".to_string(),
            generator_timeout_secs: 5,
        }
    }

    #[test]
    fn test_validate_accepts_sample() {
        assert!(sample().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_limits() {
        let mut config = sample();
        config.max_artifact_size_bytes = 0;
        assert!(config.validate().is_err());

        let mut config = sample();
        config.max_field_bytes = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_non_http_generator_url() {
        let mut config = sample();
        config.generator_url = "ftp://generator.local".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("GENERATOR_URL"));
    }

    #[test]
    fn test_production_detection() {
        let mut inner = sample();
        inner.base.environment = "PROD".to_string();
        assert!(Config(Box::new(inner)).is_production());
        assert!(!Config(Box::new(sample())).is_production());
    }
}
