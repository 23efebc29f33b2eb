use crate::domain::SourceKind;
use crate::reliability::RetryPolicy;
use crate::sender::TransportConfig;
use clap::parser::ValueSource;
use clap::{ArgMatches, CommandFactory, FromArgMatches, Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use url::Url;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required setting: {0}")]
    Missing(&'static str),
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("File error: {0}")]
    FileError(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Argument error: {0}")]
    ArgError(#[from] clap::Error),
}

/// Verbosity of the forwarder's own logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

#[derive(Parser, Debug, Clone, Serialize, Deserialize)]
#[command(author, version, about, long_about = None)]
#[serde(default)]
pub struct Config {
    /// Ingestion endpoint base URL (required)
    #[arg(long, env = "INGESTOR_CORE_URL")]
    pub ingestor_url: Option<String>,

    /// Hostname resolver cache TTL in seconds
    #[arg(long, env = "IP_RESOLVER_CACHE_TTL_SECONDS", default_value = "300")]
    pub resolver_cache_ttl_secs: u64,

    /// Delivery attempts per event
    #[arg(long, env = "DELIVERY_RETRY_ATTEMPTS", default_value = "3")]
    pub retry_attempts: u32,

    /// Base retry delay in milliseconds, multiplied by the attempt number
    #[arg(long, env = "DELIVERY_RETRY_BASE_DELAY_MS", default_value = "2000")]
    pub retry_base_delay_ms: u64,

    /// Per-request timeout in seconds
    #[arg(long, env = "REQUEST_TIMEOUT_SECS", default_value = "10")]
    pub request_timeout_secs: u64,

    /// Deliveries kept in flight while draining a batch
    #[arg(long, env = "DELIVERY_CONCURRENCY", default_value = "1")]
    pub concurrency: usize,

    /// Log level
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: LogLevel,

    /// Log output format
    #[arg(long, env = "LOG_FORMAT", default_value = "compact")]
    pub log_format: LogFormat,

    /// Configuration file path (optional, TOML)
    #[arg(long, env = "CONFIG_FILE")]
    pub config_file: Option<PathBuf>,

    /// Source kind of the records being ingested
    #[arg(long, env = "SOURCE_KIND", default_value = "syslog")]
    pub kind: SourceKind,

    /// File with one raw JSON record per line (stdin when omitted)
    #[arg(long)]
    pub input: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ingestor_url: None,
            resolver_cache_ttl_secs: 300,
            retry_attempts: 3,
            retry_base_delay_ms: 2000,
            request_timeout_secs: 10,
            concurrency: 1,
            log_level: LogLevel::Info,
            log_format: LogFormat::Compact,
            config_file: None,
            kind: SourceKind::Syslog,
            input: None,
        }
    }
}

impl Config {
    /// Parses CLI arguments (with environment fallbacks) and, when
    /// `--config-file` is given, layers the file underneath: the file
    /// replaces defaults, while anything set on the command line or through
    /// the environment wins over the file.
    pub fn from_args<I, T>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let matches = Config::command().try_get_matches_from(args)?;
        let cli = Config::from_arg_matches(&matches)?;

        let mut config = match cli.config_file.clone() {
            Some(path) => {
                let mut file_config = Self::read_file(&path)?;
                file_config.overlay(cli, &matches);
                file_config.config_file = Some(path);
                file_config
            }
            None => cli,
        };

        config.normalize();
        config.validate()?;
        Ok(config)
    }

    /// Copies every setting that did not come from a clap default.
    fn overlay(&mut self, cli: Config, matches: &ArgMatches) {
        let explicit = |id: &str| {
            matches!(
                matches.value_source(id),
                Some(ValueSource::CommandLine | ValueSource::EnvVariable)
            )
        };

        if explicit("ingestor_url") {
            self.ingestor_url = cli.ingestor_url;
        }
        if explicit("resolver_cache_ttl_secs") {
            self.resolver_cache_ttl_secs = cli.resolver_cache_ttl_secs;
        }
        if explicit("retry_attempts") {
            self.retry_attempts = cli.retry_attempts;
        }
        if explicit("retry_base_delay_ms") {
            self.retry_base_delay_ms = cli.retry_base_delay_ms;
        }
        if explicit("request_timeout_secs") {
            self.request_timeout_secs = cli.request_timeout_secs;
        }
        if explicit("concurrency") {
            self.concurrency = cli.concurrency;
        }
        if explicit("log_level") {
            self.log_level = cli.log_level;
        }
        if explicit("log_format") {
            self.log_format = cli.log_format;
        }
        if explicit("kind") {
            self.kind = cli.kind;
        }
        if explicit("input") {
            self.input = cli.input;
        }
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let mut config = Self::read_file(path.as_ref())?;
        config.normalize();
        config.validate()?;
        Ok(config)
    }

    fn read_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    fn normalize(&mut self) {
        if let Some(url) = &self.ingestor_url {
            let trimmed = url.trim().trim_end_matches('/');
            self.ingestor_url = (!trimmed.is_empty()).then(|| trimmed.to_string());
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let ingestor_url = self.ingestor_url()?;

        let url = Url::parse(ingestor_url).map_err(|e| {
            ConfigError::InvalidUrl(format!("Invalid ingestor URL '{ingestor_url}': {e}"))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidUrl(format!(
                "Ingestor URL '{ingestor_url}' must use http or https"
            )));
        }

        if self.retry_attempts == 0 {
            return Err(ConfigError::InvalidConfig(
                "Retry attempts must be greater than 0".to_string(),
            ));
        }

        if self.request_timeout_secs == 0 {
            return Err(ConfigError::InvalidConfig(
                "Request timeout must be greater than 0".to_string(),
            ));
        }

        if self.concurrency == 0 {
            return Err(ConfigError::InvalidConfig(
                "Concurrency must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    pub fn ingestor_url(&self) -> Result<&str, ConfigError> {
        self.ingestor_url
            .as_deref()
            .filter(|url| !url.trim().is_empty())
            .ok_or(ConfigError::Missing("INGESTOR_CORE_URL"))
    }

    pub fn resolver_ttl(&self) -> Duration {
        Duration::from_secs(self.resolver_cache_ttl_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::linear(
            self.retry_attempts,
            Duration::from_millis(self.retry_base_delay_ms),
        )
    }

    pub fn transport_config(&self) -> Result<TransportConfig, ConfigError> {
        Ok(TransportConfig {
            request_timeout: self.request_timeout(),
            ..TransportConfig::new(self.ingestor_url()?)
        })
    }
}
