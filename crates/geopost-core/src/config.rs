use crate::error::{GeopostError, Result};
use crate::filter::{ContentFilter, DEFAULT_DENY_LIST};
use crate::models::{DEFAULT_PAGE_SIZE, DEFAULT_RADIUS_KM, MAX_PAGE_SIZE};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Configuration source for tracking where values come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Default value
    Default,
    /// Loaded from config file
    File,
    /// Loaded from environment variable
    Environment,
    /// Provided via CLI argument
    Cli,
}

impl ConfigSource {
    /// Returns the precedence level (higher = higher priority)
    pub fn precedence(&self) -> u8 {
        match self {
            ConfigSource::Default => 0,
            ConfigSource::File => 1,
            ConfigSource::Environment => 2,
            ConfigSource::Cli => 3,
        }
    }
}

/// A configuration value with its source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }

    /// Update the value if the new source has higher precedence
    pub fn update(&mut self, value: T, source: ConfigSource) {
        if source.precedence() > self.source.precedence() {
            self.value = value;
            self.source = source;
        }
    }
}

/// Layered configuration for the ingestion and search pipeline
#[derive(Debug, Clone)]
pub struct LayeredConfig {
    pub index_name: ConfigValue<String>,
    pub bucket: ConfigValue<String>,
    pub column_table: ConfigValue<String>,
    pub default_radius_km: ConfigValue<f64>,
    pub page_size: ConfigValue<usize>,
    pub max_page_size: ConfigValue<usize>,
    pub backend_timeout_secs: ConfigValue<u64>,
    pub deny_list: ConfigValue<Vec<String>>,
}

impl LayeredConfig {
    /// Create a new configuration with default values
    pub fn with_defaults() -> Self {
        Self {
            index_name: ConfigValue::new("around".to_string(), ConfigSource::Default),
            bucket: ConfigValue::new("post-images".to_string(), ConfigSource::Default),
            column_table: ConfigValue::new("post".to_string(), ConfigSource::Default),
            default_radius_km: ConfigValue::new(DEFAULT_RADIUS_KM, ConfigSource::Default),
            page_size: ConfigValue::new(DEFAULT_PAGE_SIZE, ConfigSource::Default),
            max_page_size: ConfigValue::new(MAX_PAGE_SIZE, ConfigSource::Default),
            backend_timeout_secs: ConfigValue::new(10, ConfigSource::Default),
            deny_list: ConfigValue::new(
                DEFAULT_DENY_LIST.iter().map(|w| w.to_string()).collect(),
                ConfigSource::Default,
            ),
        }
    }

    /// Load configuration from a TOML file
    ///
    /// Cross-field checks wait for `validate`, once every layer is applied.
    pub fn load_from_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(GeopostError::ConfigFileNotFound { path: path.to_path_buf() });
        }

        let content = fs::read_to_string(path).map_err(|e| GeopostError::ConfigInvalid {
            key: "file".to_string(),
            reason: format!("Failed to read config file: {}", e),
        })?;

        let file_config: FileConfig =
            toml::from_str(&content).map_err(|e| GeopostError::ConfigInvalid {
                key: "file".to_string(),
                reason: format!("Failed to parse TOML: {}", e),
            })?;

        if let Some(index_name) = file_config.index_name {
            self.index_name.update(index_name, ConfigSource::File);
        }
        if let Some(bucket) = file_config.bucket {
            self.bucket.update(bucket, ConfigSource::File);
        }
        if let Some(column_table) = file_config.column_table {
            self.column_table.update(column_table, ConfigSource::File);
        }
        if let Some(radius) = file_config.default_radius_km {
            self.default_radius_km.update(radius, ConfigSource::File);
        }
        if let Some(page_size) = file_config.page_size {
            self.page_size.update(page_size, ConfigSource::File);
        }
        if let Some(max_page_size) = file_config.max_page_size {
            self.max_page_size.update(max_page_size, ConfigSource::File);
        }
        if let Some(timeout) = file_config.backend_timeout_secs {
            self.backend_timeout_secs.update(timeout, ConfigSource::File);
        }
        if let Some(deny_list) = file_config.deny_list {
            self.deny_list.update(deny_list, ConfigSource::File);
        }

        Ok(self)
    }

    /// Load configuration from environment variables
    ///
    /// Unparseable values are logged and skipped, leaving the lower layer in place.
    pub fn load_from_env(mut self) -> Self {
        if let Ok(index_name) = env::var("GEOPOST_INDEX") {
            self.index_name.update(index_name, ConfigSource::Environment);
        }

        if let Ok(bucket) = env::var("GEOPOST_BUCKET") {
            self.bucket.update(bucket, ConfigSource::Environment);
        }

        if let Ok(table) = env::var("GEOPOST_COLUMN_TABLE") {
            self.column_table.update(table, ConfigSource::Environment);
        }

        if let Some(radius) = env_parsed::<f64>("GEOPOST_DEFAULT_RADIUS_KM") {
            if radius.is_finite() && radius > 0.0 {
                self.default_radius_km.update(radius, ConfigSource::Environment);
            } else {
                tracing::warn!("Ignoring GEOPOST_DEFAULT_RADIUS_KM={}: must be positive", radius);
            }
        }

        if let Some(page_size) = env_parsed::<usize>("GEOPOST_PAGE_SIZE") {
            self.page_size.update(page_size, ConfigSource::Environment);
        }

        if let Some(max_page_size) = env_parsed::<usize>("GEOPOST_MAX_PAGE_SIZE") {
            self.max_page_size.update(max_page_size, ConfigSource::Environment);
        }

        if let Some(timeout) = env_parsed::<u64>("GEOPOST_BACKEND_TIMEOUT_SECS") {
            self.backend_timeout_secs.update(timeout, ConfigSource::Environment);
        }

        // GEOPOST_DENY_LIST is comma-separated
        if let Ok(raw) = env::var("GEOPOST_DENY_LIST") {
            let words = parse_deny_list(&raw);
            self.deny_list.update(words, ConfigSource::Environment);
        }

        self
    }

    /// Update configuration from CLI arguments
    pub fn update_from_cli(&mut self, overrides: CliConfigOverrides) {
        if let Some(index_name) = overrides.index_name {
            self.index_name.update(index_name, ConfigSource::Cli);
        }

        if let Some(bucket) = overrides.bucket {
            self.bucket.update(bucket, ConfigSource::Cli);
        }

        if let Some(radius) = overrides.default_radius_km {
            self.default_radius_km.update(radius, ConfigSource::Cli);
        }

        if let Some(timeout) = overrides.backend_timeout_secs {
            self.backend_timeout_secs.update(timeout, ConfigSource::Cli);
        }
    }

    /// Check cross-field constraints
    pub fn validate(&self) -> Result<()> {
        let radius = self.default_radius_km.value;
        if !radius.is_finite() || radius <= 0.0 {
            return Err(GeopostError::ConfigInvalid {
                key: "default_radius_km".to_string(),
                reason: format!("{} must be a positive number", radius),
            });
        }

        if self.max_page_size.value == 0 {
            return Err(GeopostError::ConfigInvalid {
                key: "max_page_size".to_string(),
                reason: "must be greater than 0".to_string(),
            });
        }

        if self.page_size.value == 0 || self.page_size.value > self.max_page_size.value {
            return Err(GeopostError::ConfigInvalid {
                key: "page_size".to_string(),
                reason: format!(
                    "page_size ({}) must be between 1 and max_page_size ({})",
                    self.page_size.value, self.max_page_size.value
                ),
            });
        }

        if self.backend_timeout_secs.value == 0 {
            return Err(GeopostError::ConfigInvalid {
                key: "backend_timeout_secs".to_string(),
                reason: "must be greater than 0".to_string(),
            });
        }

        if self.index_name.value.trim().is_empty() {
            return Err(GeopostError::ConfigInvalid {
                key: "index_name".to_string(),
                reason: "cannot be empty".to_string(),
            });
        }

        Ok(())
    }

    pub fn content_filter(&self) -> ContentFilter {
        ContentFilter::new(self.deny_list.value.iter().cloned())
    }

    pub fn backend_timeout(&self) -> Duration {
        Duration::from_secs(self.backend_timeout_secs.value)
    }

    /// Get all configuration values as a map for inspection
    pub fn to_inspection_map(&self) -> HashMap<String, (String, ConfigSource)> {
        let mut map = HashMap::new();

        map.insert(
            "index_name".to_string(),
            (self.index_name.value.clone(), self.index_name.source),
        );
        map.insert("bucket".to_string(), (self.bucket.value.clone(), self.bucket.source));
        map.insert(
            "column_table".to_string(),
            (self.column_table.value.clone(), self.column_table.source),
        );
        map.insert(
            "default_radius_km".to_string(),
            (format!("{}km", self.default_radius_km.value), self.default_radius_km.source),
        );
        map.insert(
            "page_size".to_string(),
            (self.page_size.value.to_string(), self.page_size.source),
        );
        map.insert(
            "max_page_size".to_string(),
            (self.max_page_size.value.to_string(), self.max_page_size.source),
        );
        map.insert(
            "backend_timeout_secs".to_string(),
            (format!("{}s", self.backend_timeout_secs.value), self.backend_timeout_secs.source),
        );
        map.insert(
            "deny_list".to_string(),
            (self.deny_list.value.join(","), self.deny_list.source),
        );

        map
    }
}

/// Configuration loaded from TOML file
#[derive(Debug, Deserialize, Serialize)]
struct FileConfig {
    index_name: Option<String>,
    bucket: Option<String>,
    column_table: Option<String>,
    default_radius_km: Option<f64>,
    page_size: Option<usize>,
    max_page_size: Option<usize>,
    backend_timeout_secs: Option<u64>,
    deny_list: Option<Vec<String>>,
}

/// CLI configuration overrides
#[derive(Debug, Default)]
pub struct CliConfigOverrides {
    pub index_name: Option<String>,
    pub bucket: Option<String>,
    pub default_radius_km: Option<f64>,
    pub backend_timeout_secs: Option<u64>,
}

fn env_parsed<T: FromStr>(key: &str) -> Option<T> {
    let raw = env::var(key).ok()?;
    match raw.trim().parse::<T>() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!("Invalid {} value '{}': ignoring", key, raw);
            None
        }
    }
}

/// Parse a comma-separated deny-list, dropping blank entries
pub fn parse_deny_list(raw: &str) -> Vec<String> {
    raw.split(',').map(str::trim).filter(|w| !w.is_empty()).map(String::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = LayeredConfig::with_defaults();
        assert_eq!(config.index_name.value, "around");
        assert_eq!(config.index_name.source, ConfigSource::Default);
        assert_eq!(config.default_radius_km.value, 200.0);
        assert_eq!(config.deny_list.value, vec!["fuck", "dick", "ass"]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_precedence() {
        let mut value = ConfigValue::new(100, ConfigSource::Default);

        value.update(200, ConfigSource::File);
        assert_eq!(value.value, 200);
        assert_eq!(value.source, ConfigSource::File);

        value.update(300, ConfigSource::Environment);
        assert_eq!(value.value, 300);

        value.update(400, ConfigSource::Cli);
        assert_eq!(value.value, 400);
        assert_eq!(value.source, ConfigSource::Cli);

        // Lower precedence should not override
        value.update(500, ConfigSource::File);
        assert_eq!(value.value, 400);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
index_name = "posts-v2"
default_radius_km = 50.0
deny_list = ["spam"]
"#
        )
        .unwrap();

        let config = LayeredConfig::with_defaults().load_from_file(file.path()).unwrap();

        assert_eq!(config.index_name.value, "posts-v2");
        assert_eq!(config.index_name.source, ConfigSource::File);
        assert_eq!(config.default_radius_km.value, 50.0);
        assert!(config.content_filter().is_filtered("buy spam now"));
        assert!(!config.content_filter().is_filtered("what the fuck"));
        assert_eq!(config.bucket.source, ConfigSource::Default);
    }

    #[test]
    fn test_file_with_inconsistent_page_sizes_rejected() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "page_size = 500\nmax_page_size = 100").unwrap();

        let config = LayeredConfig::with_defaults().load_from_file(file.path()).unwrap();
        let result = config.validate();
        assert!(matches!(result, Err(GeopostError::ConfigInvalid { ref key, .. }) if key == "page_size"));
    }

    #[test]
    fn test_zero_backend_timeout_rejected() {
        let mut config = LayeredConfig::with_defaults();
        config.update_from_cli(CliConfigOverrides {
            backend_timeout_secs: Some(0),
            ..Default::default()
        });

        let result = config.validate();
        assert!(
            matches!(result, Err(GeopostError::ConfigInvalid { ref key, .. }) if key == "backend_timeout_secs")
        );
    }

    #[test]
    fn test_missing_file() {
        let result = LayeredConfig::with_defaults().load_from_file("/nonexistent/geopost.toml");
        assert!(matches!(result, Err(GeopostError::ConfigFileNotFound { .. })));
    }

    #[test]
    fn test_cli_overrides() {
        let mut config = LayeredConfig::with_defaults();

        config.update_from_cli(CliConfigOverrides {
            index_name: Some("cli-index".to_string()),
            default_radius_km: Some(25.0),
            ..Default::default()
        });

        assert_eq!(config.index_name.value, "cli-index");
        assert_eq!(config.index_name.source, ConfigSource::Cli);
        assert_eq!(config.default_radius_km.value, 25.0);
        assert_eq!(config.bucket.source, ConfigSource::Default);
    }

    #[test]
    fn test_parse_deny_list() {
        assert_eq!(parse_deny_list("a, b,,c "), vec!["a", "b", "c"]);
        assert!(parse_deny_list(" , ").is_empty());
    }

    #[test]
    fn test_inspection_map() {
        let map = LayeredConfig::with_defaults().to_inspection_map();

        let (radius, source) = &map["default_radius_km"];
        assert_eq!(radius, "200km");
        assert_eq!(*source, ConfigSource::Default);
        assert_eq!(map["backend_timeout_secs"].0, "10s");
    }
}
