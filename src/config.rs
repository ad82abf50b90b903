//! Configuration management for the churn prediction pipeline

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::Path;

/// Default location of the configuration file
pub const DEFAULT_CONFIG_PATH: &str = "config/config.toml";

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub nats: NatsConfig,
    pub artifacts: ArtifactsConfig,
    pub pipeline: PipelineConfig,
    pub logging: LoggingConfig,
}

/// NATS connection configuration
#[derive(Debug, Clone, Deserialize)]
pub struct NatsConfig {
    /// NATS server URL
    pub url: String,
    /// Subject for incoming customer profiles
    pub request_subject: String,
    /// Subject for responses to requests that carry no reply subject
    pub result_subject: String,
}

/// Fitted artifact locations
#[derive(Debug, Clone, Deserialize)]
pub struct ArtifactsConfig {
    /// Directory holding all artifact files
    pub dir: String,
    /// Classifier file; `.onnx` runs through ONNX Runtime, `.json` is a dense weight export
    #[serde(default = "default_model_file")]
    pub model_file: String,
    #[serde(default = "default_geography_encoder_file")]
    pub geography_encoder_file: String,
    #[serde(default = "default_gender_encoder_file")]
    pub gender_encoder_file: String,
    #[serde(default = "default_scaler_file")]
    pub scaler_file: String,
    /// Number of threads for ONNX inference (default: 1)
    #[serde(default = "default_onnx_threads")]
    pub onnx_threads: usize,
}

fn default_model_file() -> String {
    "model.json".to_string()
}

fn default_geography_encoder_file() -> String {
    "onehot_encoder_geo.json".to_string()
}

fn default_gender_encoder_file() -> String {
    "label_encoder_gender.json".to_string()
}

fn default_scaler_file() -> String {
    "scaler.json".to_string()
}

fn default_onnx_threads() -> usize {
    1
}

/// Pipeline configuration
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    /// Maximum requests scored concurrently
    pub workers: usize,
    /// Seconds between metrics summaries; 0 disables the reporter
    #[serde(default = "default_metrics_interval")]
    pub metrics_interval_secs: u64,
}

fn default_metrics_interval() -> u64 {
    30
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Log format (json, pretty)
    pub format: String,
}

impl LoggingConfig {
    /// Filter directives for the subscriber: `RUST_LOG` wins when it is set,
    /// otherwise the configured level applies to this crate.
    pub fn filter_directives(&self, rust_log: Option<String>) -> String {
        rust_log
            .filter(|directives| !directives.trim().is_empty())
            .unwrap_or_else(|| format!("churn_prediction_pipeline={}", self.level))
    }
}

impl AppConfig {
    /// Load configuration from the default path
    pub fn load() -> Result<Self> {
        Self::load_from_path(DEFAULT_CONFIG_PATH)
    }

    /// Load configuration from a specific path.
    ///
    /// Values can be overridden with `CHURN__<SECTION>__<KEY>` environment
    /// variables, e.g. `CHURN__NATS__URL`.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(Environment::with_prefix("CHURN").separator("__"))
            .build()
            .context("Failed to build configuration")?;

        let config: Self = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.pipeline.workers == 0 {
            anyhow::bail!("pipeline.workers must be at least 1");
        }
        if self.artifacts.onnx_threads == 0 {
            anyhow::bail!("artifacts.onnx_threads must be at least 1");
        }
        match self.logging.format.as_str() {
            "json" | "pretty" => Ok(()),
            other => anyhow::bail!("unknown logging.format {:?}", other),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            nats: NatsConfig {
                url: "nats://localhost:4222".to_string(),
                request_subject: "churn.requests".to_string(),
                result_subject: "churn.results".to_string(),
            },
            artifacts: ArtifactsConfig {
                dir: "artifacts".to_string(),
                model_file: default_model_file(),
                geography_encoder_file: default_geography_encoder_file(),
                gender_encoder_file: default_gender_encoder_file(),
                scaler_file: default_scaler_file(),
                onnx_threads: default_onnx_threads(),
            },
            pipeline: PipelineConfig {
                workers: 4,
                metrics_interval_secs: default_metrics_interval(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "pretty".to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.nats.url, "nats://localhost:4222");
        assert_eq!(config.nats.request_subject, "churn.requests");
        assert_eq!(config.artifacts.model_file, "model.json");
        assert_eq!(config.pipeline.workers, 4);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_applies_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        write!(
            file,
            r#"
[nats]
url = "nats://nats:4222"
request_subject = "req"
result_subject = "res"

[artifacts]
dir = "/srv/artifacts"
model_file = "model.onnx"

[pipeline]
workers = 2

[logging]
level = "debug"
format = "json"
"#
        )
        .unwrap();

        let config = AppConfig::load_from_path(file.path()).unwrap();
        assert_eq!(config.nats.url, "nats://nats:4222");
        assert_eq!(config.artifacts.model_file, "model.onnx");
        assert_eq!(config.artifacts.scaler_file, "scaler.json");
        assert_eq!(config.artifacts.onnx_threads, 1);
        assert_eq!(config.pipeline.metrics_interval_secs, 30);
        assert_eq!(config.logging.format, "json");
    }

    #[test]
    fn test_shipped_config_loads() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join(DEFAULT_CONFIG_PATH);
        let config = AppConfig::load_from_path(path).unwrap();
        assert_eq!(config.artifacts.dir, "artifacts");
    }

    #[test]
    fn test_rejects_unknown_log_format() {
        let mut config = AppConfig::default();
        config.logging.format = "xml".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rust_log_overrides_configured_level() {
        let logging = AppConfig::default().logging;
        assert_eq!(
            logging.filter_directives(None),
            "churn_prediction_pipeline=info"
        );
        assert_eq!(
            logging.filter_directives(Some("  ".to_string())),
            "churn_prediction_pipeline=info"
        );
        assert_eq!(
            logging.filter_directives(Some("churn_prediction_pipeline=debug".to_string())),
            "churn_prediction_pipeline=debug"
        );
    }
}
