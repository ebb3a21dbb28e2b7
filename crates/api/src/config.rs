use chrono::Duration;
use domain::models::MonitorThresholds;
use serde::Deserialize;
use shared::validation::MAX_BOX_COUNT;
use std::net::{AddrParseError, SocketAddr};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub monitor: MonitorConfig,
    #[serde(default)]
    pub radio: RadioConfig,
    #[serde(default)]
    pub notifications: NotificationsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
}

impl From<&DatabaseConfig> for persistence::db::DatabaseConfig {
    fn from(config: &DatabaseConfig) -> Self {
        Self {
            url: config.url.clone(),
            max_connections: config.max_connections,
            min_connections: config.min_connections,
            connect_timeout_secs: config.connect_timeout_secs,
            idle_timeout_secs: config.idle_timeout_secs,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

/// Adherence monitoring settings.
#[derive(Debug, Clone, Deserialize)]
pub struct MonitorConfig {
    /// Advertisements below this RSSI (dBm) are ignored.
    #[serde(default = "default_rssi_threshold")]
    pub rssi_threshold: i16,

    /// Sensor bytes above this value mean the lid is open.
    #[serde(default = "default_sensor_open_threshold")]
    pub sensor_open_threshold: u8,

    /// Seconds after the scheduled time before a closed box is overdue.
    #[serde(default = "default_due_window")]
    pub due_window_secs: u64,

    #[serde(default = "default_evaluation_interval")]
    pub evaluation_interval_secs: u64,

    /// Number of physical boxes, numbered from 1.
    #[serde(default = "default_box_count")]
    pub box_count: u8,

    /// Start a monitoring session when the service boots.
    #[serde(default)]
    pub auto_start: bool,
}

impl MonitorConfig {
    pub fn thresholds(&self) -> MonitorThresholds {
        MonitorThresholds {
            rssi_threshold: self.rssi_threshold,
            sensor_open_threshold: self.sensor_open_threshold,
            due_window: Duration::seconds(self.due_window_secs as i64),
            box_count: self.box_count,
        }
    }
}

/// Where advertisements come from.
#[derive(Debug, Clone, Deserialize)]
pub struct RadioConfig {
    /// Radio provider: bridge (HTTP ingest) or bluetooth (host adapter)
    #[serde(default = "default_radio_provider")]
    pub provider: String,

    /// Seconds to wait before reconnecting to the adapter after an error
    #[serde(default = "default_radio_retry")]
    pub retry_secs: u64,
}

impl Default for RadioConfig {
    fn default() -> Self {
        Self {
            provider: default_radio_provider(),
            retry_secs: default_radio_retry(),
        }
    }
}

/// Delivery of scheduled notifications.
#[derive(Debug, Clone, Deserialize)]
pub struct NotificationsConfig {
    /// Notification provider: console (for development) or webhook
    #[serde(default = "default_notification_provider")]
    pub provider: String,

    /// Webhook URL (required for webhook provider)
    #[serde(default)]
    pub webhook_url: String,

    #[serde(default = "default_dispatch_interval")]
    pub dispatch_interval_secs: u64,

    /// Webhook request timeout in milliseconds
    #[serde(default = "default_notification_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            provider: default_notification_provider(),
            webhook_url: String::new(),
            dispatch_interval_secs: default_dispatch_interval(),
            request_timeout_ms: default_notification_timeout_ms(),
        }
    }
}

// Default value functions
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_request_timeout() -> u64 {
    30
}
fn default_max_connections() -> u32 {
    5
}
fn default_min_connections() -> u32 {
    1
}
fn default_connect_timeout() -> u64 {
    10
}
fn default_idle_timeout() -> u64 {
    600
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "json".to_string()
}
fn default_rssi_threshold() -> i16 {
    domain::models::dose::DEFAULT_RSSI_THRESHOLD
}
fn default_sensor_open_threshold() -> u8 {
    domain::models::dose::DEFAULT_SENSOR_OPEN_THRESHOLD
}
fn default_due_window() -> u64 {
    domain::models::dose::DEFAULT_DUE_WINDOW_SECS as u64
}
fn default_evaluation_interval() -> u64 {
    60
}
fn default_box_count() -> u8 {
    shared::validation::DEFAULT_BOX_COUNT
}
fn default_radio_provider() -> String {
    "bridge".to_string()
}
fn default_radio_retry() -> u64 {
    5
}
fn default_notification_provider() -> String {
    "console".to_string()
}
fn default_dispatch_interval() -> u64 {
    1
}
fn default_notification_timeout_ms() -> u64 {
    5000
}

/// Configuration validation error
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Loading order (later sources override earlier):
    /// 1. config/default.toml - base configuration with defaults
    /// 2. config/local.toml - local overrides (optional, not in git)
    /// 3. Environment variables with PW__ prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(config::Environment::with_prefix("PW").separator("__"))
            .build()?;

        let cfg: Self = config.try_deserialize()?;
        cfg.validate()
            .map_err(|e| config::ConfigError::Message(e.to_string()))?;
        Ok(cfg)
    }

    /// Load configuration for testing with custom overrides.
    ///
    /// This method creates a config entirely from defaults and overrides,
    /// without relying on config files (which may not be accessible during tests).
    #[cfg(test)]
    pub fn load_for_test(overrides: &[(&str, &str)]) -> Result<Self, config::ConfigError> {
        let defaults = r#"
            [server]
            host = "0.0.0.0"
            port = 8080
            request_timeout_secs = 30

            [database]
            url = ""
            max_connections = 5
            min_connections = 1
            connect_timeout_secs = 10
            idle_timeout_secs = 600

            [logging]
            level = "info"
            format = "json"

            [monitor]
            rssi_threshold = -55
            sensor_open_threshold = 128
            due_window_secs = 60
            evaluation_interval_secs = 60
            box_count = 10
            auto_start = false

            [radio]
            provider = "bridge"

            [notifications]
            provider = "console"
            webhook_url = ""
            dispatch_interval_secs = 1
            request_timeout_ms = 5000
        "#;

        let mut builder = config::Config::builder()
            .add_source(config::File::from_str(defaults, config::FileFormat::Toml));

        for (key, value) in overrides {
            builder = builder.set_override(*key, *value)?;
        }

        let cfg: Self = builder.build()?.try_deserialize()?;
        // Skip validation in tests to allow partial configs
        Ok(cfg)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.database.url.is_empty() {
            return Err(ConfigValidationError::MissingRequired(
                "PW__DATABASE__URL environment variable must be set".to_string(),
            ));
        }

        if self.server.port == 0 {
            return Err(ConfigValidationError::InvalidValue(
                "Server port cannot be 0".to_string(),
            ));
        }

        if self.database.min_connections > self.database.max_connections {
            return Err(ConfigValidationError::InvalidValue(
                "min_connections cannot exceed max_connections".to_string(),
            ));
        }

        if self.monitor.box_count == 0 || self.monitor.box_count > MAX_BOX_COUNT {
            return Err(ConfigValidationError::InvalidValue(format!(
                "monitor.box_count must be between 1 and {}",
                MAX_BOX_COUNT
            )));
        }

        if self.monitor.evaluation_interval_secs == 0 {
            return Err(ConfigValidationError::InvalidValue(
                "monitor.evaluation_interval_secs cannot be 0".to_string(),
            ));
        }

        if self.notifications.dispatch_interval_secs == 0 {
            return Err(ConfigValidationError::InvalidValue(
                "notifications.dispatch_interval_secs cannot be 0".to_string(),
            ));
        }

        match self.radio.provider.as_str() {
            "bridge" | "bluetooth" => {}
            other => {
                return Err(ConfigValidationError::InvalidValue(format!(
                    "Unknown radio provider: {}",
                    other
                )))
            }
        }

        match self.notifications.provider.as_str() {
            "console" => {}
            "webhook" if self.notifications.webhook_url.is_empty() => {
                return Err(ConfigValidationError::MissingRequired(
                    "notifications.webhook_url is required for the webhook provider".to_string(),
                ));
            }
            "webhook" => {}
            other => {
                return Err(ConfigValidationError::InvalidValue(format!(
                    "Unknown notification provider: {}",
                    other
                )))
            }
        }

        Ok(())
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, AddrParseError> {
        format!("{}:{}", self.server.host, self.server.port).parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_DB: &str = "sqlite::memory:";

    #[test]
    fn test_config_load_with_defaults() {
        let config =
            Config::load_for_test(&[("database.url", TEST_DB)]).expect("Failed to load config");

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.monitor.rssi_threshold, -55);
        assert_eq!(config.monitor.sensor_open_threshold, 128);
        assert_eq!(config.monitor.due_window_secs, 60);
        assert_eq!(config.monitor.box_count, 10);
        assert_eq!(config.radio.provider, "bridge");
        assert_eq!(config.notifications.provider, "console");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_env_override() {
        let config = Config::load_for_test(&[
            ("database.url", TEST_DB),
            ("server.port", "9000"),
            ("monitor.due_window_secs", "90"),
        ])
        .expect("Failed to load config");

        assert_eq!(config.server.port, 9000);
        assert_eq!(
            config.monitor.thresholds().due_window,
            Duration::seconds(90)
        );
    }

    #[test]
    fn test_config_validation_missing_db_url() {
        let config = Config::load_for_test(&[]).expect("Failed to load config");
        let result = config.validate();
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("PW__DATABASE__URL"));
    }

    #[test]
    fn test_config_validation_box_count() {
        for count in ["0", "100"] {
            let config =
                Config::load_for_test(&[("database.url", TEST_DB), ("monitor.box_count", count)])
                    .expect("Failed to load config");
            assert!(config
                .validate()
                .unwrap_err()
                .to_string()
                .contains("box_count"));
        }
    }

    #[test]
    fn test_config_validation_zero_interval() {
        let config = Config::load_for_test(&[
            ("database.url", TEST_DB),
            ("monitor.evaluation_interval_secs", "0"),
        ])
        .expect("Failed to load config");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_webhook_requires_url() {
        let config = Config::load_for_test(&[
            ("database.url", TEST_DB),
            ("notifications.provider", "webhook"),
        ])
        .expect("Failed to load config");
        assert!(matches!(
            config.validate(),
            Err(ConfigValidationError::MissingRequired(_))
        ));

        let config = Config::load_for_test(&[
            ("database.url", TEST_DB),
            ("notifications.provider", "webhook"),
            ("notifications.webhook_url", "http://localhost:9999/notify"),
        ])
        .expect("Failed to load config");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_unknown_radio() {
        let config =
            Config::load_for_test(&[("database.url", TEST_DB), ("radio.provider", "zigbee")])
                .expect("Failed to load config");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_socket_addr() {
        let config = Config::load_for_test(&[
            ("database.url", TEST_DB),
            ("server.host", "127.0.0.1"),
            ("server.port", "3000"),
        ])
        .expect("Failed to load config");

        assert_eq!(config.socket_addr().unwrap().to_string(), "127.0.0.1:3000");
    }

    #[test]
    fn test_database_config_conversion() {
        let config =
            Config::load_for_test(&[("database.url", TEST_DB)]).expect("Failed to load config");
        let db: persistence::db::DatabaseConfig = (&config.database).into();
        assert!(db.is_in_memory());
        assert_eq!(db.max_connections, 5);
    }
}
