//! Configuration management for CostLens
//!
//! Every tunable surface of the engine lives in [`EngineConfig`]. Values are
//! layered, lowest precedence first:
//!
//! 1. Built-in defaults
//! 2. `COSTLENS_*` environment variables
//! 3. A `costlens.yaml` file (explicit path, or the first one found in the
//!    current directory, `~/.config/costlens/` or `~`)

use crate::analytics::{
    AnomalyConfig, CanonicalRule, ForecastConfig, ForecastHorizon, PeriodGranularity,
    ServiceCanonicalizer, SuggestionConfig, DEFAULT_PALETTE,
};
use crate::analytics::normalizer::{BLENDED_COST, UNBLENDED_COST};
use crate::common::env_loader::EnvLoader;
use crate::error::CostLensError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

const CONFIG_FILENAME: &str = "costlens.yaml";
const ENV_PREFIX: &str = "COSTLENS";

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read a configuration file from disk
    #[error("Failed to read configuration file {path}: {source}")]
    FileRead {
        /// Path to the configuration file that could not be read
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse YAML content from a configuration file
    #[error("Invalid YAML syntax in {path}:\n{source}\n\nHint: Check for proper indentation and YAML formatting")]
    YamlParse {
        /// Path to the configuration file with invalid YAML content
        path: PathBuf,
        /// Underlying YAML parsing error
        #[source]
        source: serde_yaml::Error,
    },

    /// Invalid configuration value for a specific field
    #[error("Invalid configuration value for '{field}': {value}\n{hint}")]
    InvalidValue {
        /// Name of the configuration field that has an invalid value
        field: String,
        /// The invalid value that was provided
        value: String,
        /// Helpful hint about how to fix the issue
        hint: String,
    },

    /// Configuration validation failed
    #[error("Configuration validation failed: {message}")]
    Validation {
        /// Descriptive message about the validation failure
        message: String,
    },
}

impl From<CostLensError> for ConfigError {
    fn from(error: CostLensError) -> Self {
        match error {
            CostLensError::InvalidConfiguration {
                parameter,
                value,
                hint,
            } => ConfigError::InvalidValue {
                field: parameter,
                value,
                hint,
            },
            CostLensError::Config(inner) => inner,
            other => ConfigError::Validation {
                message: other.to_string(),
            },
        }
    }
}

/// Configuration for the analytics engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Cost metric names tried in order by the normalizer
    pub metric_priority: Vec<String>,
    /// Ordered service canonicalization rules, first match wins
    pub canonical_rules: Vec<CanonicalRule>,
    /// Colour palette; `colorIndex` indexes into it modulo its length
    pub palette: Vec<String>,
    /// Width of trend periods
    pub granularity: PeriodGranularity,
    /// Anomaly detection settings
    pub anomaly: AnomalyConfig,
    /// Forecast settings
    pub forecast: ForecastConfig,
    /// Optimization suggestion thresholds
    pub suggestions: SuggestionConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            metric_priority: vec![BLENDED_COST.to_string(), UNBLENDED_COST.to_string()],
            canonical_rules: CanonicalRule::defaults(),
            palette: DEFAULT_PALETTE.iter().map(|c| c.to_string()).collect(),
            granularity: PeriodGranularity::default(),
            anomaly: AnomalyConfig::default(),
            forecast: ForecastConfig::default(),
            suggestions: SuggestionConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from defaults, environment and YAML
    ///
    /// When `explicit` is given that file must exist; otherwise the standard
    /// locations are searched and a missing file is not an error. The result
    /// is validated before it is returned.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_env_vars();

        let yaml_path = match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => Self::find_yaml_config_file(),
        };
        if let Some(path) = yaml_path {
            YamlConfig::load_from_file(&path)?.apply_to_config(&mut config);
        }

        config.validate()?;
        tracing::debug!("Effective configuration: {:?}", config);
        Ok(config)
    }

    /// Apply `COSTLENS_*` environment variables to this config
    pub fn apply_env_vars(&mut self) {
        let loader = EnvLoader::new(ENV_PREFIX);

        self.metric_priority = loader.load_list("METRIC_PRIORITY", &self.metric_priority);
        self.granularity = loader.load_parsed("GRANULARITY", self.granularity);

        let anomaly = &mut self.anomaly;
        anomaly.window_days = loader.load_parsed("ANOMALY_WINDOW_DAYS", anomaly.window_days);
        anomaly.min_history = loader.load_parsed("ANOMALY_MIN_HISTORY", anomaly.min_history);
        anomaly.z_threshold = loader.load_parsed("ANOMALY_Z_THRESHOLD", anomaly.z_threshold);
        anomaly.medium_z = loader.load_parsed("ANOMALY_MEDIUM_Z", anomaly.medium_z);
        anomaly.high_z = loader.load_parsed("ANOMALY_HIGH_Z", anomaly.high_z);

        let forecast = &mut self.forecast;
        if let Some(months) = loader.load_optional::<u32>("FORECAST_HORIZON_MONTHS") {
            match ForecastHorizon::try_from(months) {
                Ok(horizon) => forecast.horizon_months = horizon,
                Err(e) => tracing::warn!("Ignoring COSTLENS_FORECAST_HORIZON_MONTHS: {}", e),
            }
        }
        forecast.seasonality_enabled =
            loader.load_parsed("FORECAST_SEASONALITY_ENABLED", forecast.seasonality_enabled);
        forecast.season_length =
            loader.load_parsed("FORECAST_SEASON_LENGTH", forecast.season_length);
        forecast.confidence_decay =
            loader.load_parsed("FORECAST_CONFIDENCE_DECAY", forecast.confidence_decay);
        if let Some(ratio) = loader.load_optional::<Decimal>("FORECAST_REVENUE_PER_DOLLAR") {
            forecast.revenue_per_dollar = Some(ratio);
        }
    }

    /// Find the costlens.yaml configuration file
    ///
    /// The search order is:
    /// 1. Current working directory: `costlens.yaml`
    /// 2. `~/.config/costlens/costlens.yaml`
    /// 3. `~/costlens.yaml`
    pub fn find_yaml_config_file() -> Option<PathBuf> {
        let mut search_paths = vec![PathBuf::from(CONFIG_FILENAME)];

        if let Some(home_dir) = dirs::home_dir() {
            search_paths.push(home_dir.join(".config").join("costlens").join(CONFIG_FILENAME));
            search_paths.push(home_dir.join(CONFIG_FILENAME));
        }

        for config_path in search_paths {
            if let Some(path) = Self::check_config_file(&config_path) {
                tracing::debug!("Found configuration file: {:?}", path);
                return Some(path);
            }
        }

        tracing::debug!("No costlens.yaml configuration file found in any search location");
        None
    }

    /// Check if a configuration file exists and is a regular file
    pub fn check_config_file(config_path: &Path) -> Option<PathBuf> {
        match config_path.try_exists() {
            Ok(true) if config_path.is_file() => Some(config_path.to_path_buf()),
            Ok(true) => {
                tracing::debug!(
                    "Found {:?} but it is not a file (possibly a directory)",
                    config_path
                );
                None
            }
            Ok(false) => None,
            Err(e) => {
                tracing::warn!(
                    "Error checking for configuration file {:?}: {}",
                    config_path,
                    e
                );
                None
            }
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.metric_priority.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "metric_priority".to_string(),
                value: "[]".to_string(),
                hint: format!(
                    "list at least one cost metric, e.g. [{}, {}]",
                    BLENDED_COST, UNBLENDED_COST
                ),
            });
        }
        if let Some(blank) = self.metric_priority.iter().find(|m| m.trim().is_empty()) {
            return Err(ConfigError::InvalidValue {
                field: "metric_priority".to_string(),
                value: format!("{:?}", blank),
                hint: "metric names cannot be blank".to_string(),
            });
        }
        if self.palette.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "palette".to_string(),
                value: "[]".to_string(),
                hint: "the colour palette needs at least one entry".to_string(),
            });
        }

        ServiceCanonicalizer::new(&self.canonical_rules)?;
        self.anomaly.validate()?;
        self.forecast.validate()?;
        self.suggestions.validate()?;
        Ok(())
    }

    /// Render this configuration as YAML
    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        serde_yaml::to_string(self).map_err(|e| ConfigError::Validation {
            message: format!("configuration could not be serialized: {}", e),
        })
    }

    /// Generate an example YAML configuration file content
    pub fn example_yaml_config() -> &'static str {
        r#"# costlens.yaml
# Configuration file for CostLens. Every key is optional.

# Cost metrics tried in order for each billing group
metric_priority:
  - BlendedCost
  - UnblendedCost

# Service name canonicalization, first match wins.
# match_kind: contains (default), exact, prefix or regex
canonical_rules:
  - pattern: "Simple Storage Service"
    canonical_name: "Amazon S3"
  - pattern: "Elastic Compute Cloud"
    canonical_name: "Amazon EC2"
  - pattern: "Data Transfer"
    canonical_name: "AWS Data Transfer"

# monthly or daily trend periods
granularity: monthly

anomaly:
  window_days: 30
  min_history: 3
  z_threshold: 1.5
  medium_z: 2.0
  high_z: 3.0

forecast:
  horizon_months: 6        # 3, 6 or 12
  seasonality_enabled: false
  season_length: 12
  confidence_decay: 0.9
  # revenue_per_dollar: 4.5

suggestions:
  concentration_share_pct: 30
  concentration_savings_rate: 0.20
  reservation_min_total: 100
  reservation_savings_rate: 0.30
  sprawl_max_services: 5
  sprawl_savings_rate: 0.15
"#
    }
}

/// Partial anomaly section of a YAML file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct YamlAnomalyConfig {
    /// Trailing window length in days
    pub window_days: Option<u32>,
    /// Minimum baseline observations
    pub min_history: Option<usize>,
    /// Flagging threshold
    pub z_threshold: Option<f64>,
    /// Medium severity band
    pub medium_z: Option<f64>,
    /// High severity band
    pub high_z: Option<f64>,
}

/// Partial forecast section of a YAML file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct YamlForecastConfig {
    /// Horizon in periods (3, 6 or 12)
    pub horizon_months: Option<ForecastHorizon>,
    /// Apply a learned seasonal index
    pub seasonality_enabled: Option<bool>,
    /// Periods per seasonal cycle
    pub season_length: Option<usize>,
    /// Per-period confidence decay
    pub confidence_decay: Option<f64>,
    /// Confidence ceiling in percent
    pub max_confidence: Option<f64>,
    /// History length at which coverage stops limiting confidence
    pub full_confidence_periods: Option<usize>,
    /// Revenue earned per dollar of spend
    pub revenue_per_dollar: Option<Decimal>,
}

/// Partial suggestions section of a YAML file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct YamlSuggestionConfig {
    /// Concentration threshold in percent
    pub concentration_share_pct: Option<Decimal>,
    /// Concentration savings rate
    pub concentration_savings_rate: Option<Decimal>,
    /// Reservation threshold
    pub reservation_min_total: Option<Decimal>,
    /// Reservation savings rate
    pub reservation_savings_rate: Option<Decimal>,
    /// Sprawl threshold
    pub sprawl_max_services: Option<usize>,
    /// Sprawl savings rate
    pub sprawl_savings_rate: Option<Decimal>,
}

/// Configuration loaded from a costlens.yaml file
///
/// Every field is optional; only the keys present override lower layers.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct YamlConfig {
    /// Metric priority list
    pub metric_priority: Option<Vec<String>>,
    /// Canonicalization rules, replacing the defaults entirely
    pub canonical_rules: Option<Vec<CanonicalRule>>,
    /// Colour palette
    pub palette: Option<Vec<String>>,
    /// Trend period width
    pub granularity: Option<PeriodGranularity>,
    /// Anomaly overrides
    pub anomaly: Option<YamlAnomalyConfig>,
    /// Forecast overrides
    pub forecast: Option<YamlForecastConfig>,
    /// Suggestion overrides
    pub suggestions: Option<YamlSuggestionConfig>,
}

macro_rules! apply_some {
    ($target:expr, $source:expr, [$($field:ident),* $(,)?]) => {
        $(
            if let Some(value) = $source.$field.clone() {
                $target.$field = value;
            }
        )*
    };
}

impl YamlConfig {
    /// Apply YAML values to an existing config; YAML takes precedence
    pub fn apply_to_config(&self, config: &mut EngineConfig) {
        apply_some!(
            config,
            self,
            [metric_priority, canonical_rules, palette, granularity]
        );

        if let Some(anomaly) = &self.anomaly {
            apply_some!(
                config.anomaly,
                anomaly,
                [window_days, min_history, z_threshold, medium_z, high_z]
            );
        }

        if let Some(forecast) = &self.forecast {
            apply_some!(
                config.forecast,
                forecast,
                [
                    horizon_months,
                    seasonality_enabled,
                    season_length,
                    confidence_decay,
                    max_confidence,
                    full_confidence_periods,
                ]
            );
            if forecast.revenue_per_dollar.is_some() {
                config.forecast.revenue_per_dollar = forecast.revenue_per_dollar;
            }
        }

        if let Some(suggestions) = &self.suggestions {
            apply_some!(
                config.suggestions,
                suggestions,
                [
                    concentration_share_pct,
                    concentration_savings_rate,
                    reservation_min_total,
                    reservation_savings_rate,
                    sprawl_max_services,
                    sprawl_savings_rate,
                ]
            );
        }
    }

    /// Load YAML configuration from a file path
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        tracing::info!("Loading YAML configuration from: {:?}", path);

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;

        // An empty file is a valid "no overrides" file
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        serde_yaml::from_str(&content).map_err(|e| ConfigError::YamlParse {
            path: path.to_path_buf(),
            source: e,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::MatchKind;
    use rust_decimal_macros::dec;
    use serial_test::serial;
    use std::env;
    use tempfile::TempDir;

    const ENV_KEYS: &[&str] = &[
        "COSTLENS_METRIC_PRIORITY",
        "COSTLENS_GRANULARITY",
        "COSTLENS_ANOMALY_WINDOW_DAYS",
        "COSTLENS_ANOMALY_MIN_HISTORY",
        "COSTLENS_ANOMALY_Z_THRESHOLD",
        "COSTLENS_ANOMALY_MEDIUM_Z",
        "COSTLENS_ANOMALY_HIGH_Z",
        "COSTLENS_FORECAST_HORIZON_MONTHS",
        "COSTLENS_FORECAST_SEASONALITY_ENABLED",
        "COSTLENS_FORECAST_SEASON_LENGTH",
        "COSTLENS_FORECAST_CONFIDENCE_DECAY",
        "COSTLENS_FORECAST_REVENUE_PER_DOLLAR",
    ];

    fn clear_env() {
        for key in ENV_KEYS {
            env::remove_var(key);
        }
    }

    fn write_yaml(dir: &TempDir, content: &str) -> PathBuf {
        let path = dir.path().join(CONFIG_FILENAME);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.metric_priority, vec!["BlendedCost", "UnblendedCost"]);
        assert_eq!(config.canonical_rules.len(), 3);
        assert_eq!(config.palette.len(), 20);
        assert_eq!(config.granularity, PeriodGranularity::Monthly);
        assert_eq!(config.anomaly.window_days, 30);
        assert_eq!(config.forecast.horizon_months, ForecastHorizon::Six);
        assert!(!config.forecast.seasonality_enabled);
        assert_eq!(config.suggestions.sprawl_max_services, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    #[serial]
    fn test_env_vars_override_defaults() {
        clear_env();
        env::set_var("COSTLENS_ANOMALY_WINDOW_DAYS", "7");
        env::set_var("COSTLENS_FORECAST_HORIZON_MONTHS", "12");
        env::set_var("COSTLENS_FORECAST_SEASONALITY_ENABLED", "true");
        env::set_var("COSTLENS_METRIC_PRIORITY", "AmortizedCost,BlendedCost");
        env::set_var("COSTLENS_GRANULARITY", "daily");
        env::set_var("COSTLENS_FORECAST_REVENUE_PER_DOLLAR", "2.5");

        let mut config = EngineConfig::default();
        config.apply_env_vars();
        clear_env();

        assert_eq!(config.anomaly.window_days, 7);
        assert_eq!(config.forecast.horizon_months, ForecastHorizon::Twelve);
        assert!(config.forecast.seasonality_enabled);
        assert_eq!(config.metric_priority, vec!["AmortizedCost", "BlendedCost"]);
        assert_eq!(config.granularity, PeriodGranularity::Daily);
        assert_eq!(config.forecast.revenue_per_dollar, Some(dec!(2.5)));
    }

    #[test]
    #[serial]
    fn test_invalid_env_horizon_is_ignored() {
        clear_env();
        env::set_var("COSTLENS_FORECAST_HORIZON_MONTHS", "5");
        let mut config = EngineConfig::default();
        config.apply_env_vars();
        clear_env();
        assert_eq!(config.forecast.horizon_months, ForecastHorizon::Six);
    }

    #[test]
    #[serial]
    fn test_yaml_overrides_env() {
        clear_env();
        env::set_var("COSTLENS_ANOMALY_WINDOW_DAYS", "7");
        env::set_var("COSTLENS_ANOMALY_HIGH_Z", "4.0");

        let dir = TempDir::new().unwrap();
        let path = write_yaml(&dir, "anomaly:\n  window_days: 14\n");
        let config = EngineConfig::load(Some(&path)).unwrap();
        clear_env();

        assert_eq!(config.anomaly.window_days, 14);
        // Keys absent from the file keep the env value
        assert_eq!(config.anomaly.high_z, 4.0);
    }

    #[test]
    #[serial]
    fn test_load_without_file_uses_defaults() {
        clear_env();
        let dir = TempDir::new().unwrap();
        let original_dir = env::current_dir().unwrap();
        env::set_current_dir(dir.path()).unwrap();

        let found = EngineConfig::find_yaml_config_file();
        let config = EngineConfig::load(None);

        env::set_current_dir(original_dir).expect("Could not restore original directory");

        // A file in the home directory would be picked up; only assert on cwd
        if found.is_none() {
            assert_eq!(config.unwrap(), EngineConfig::default());
        }
    }

    #[test]
    #[serial]
    fn test_find_yaml_config_file_in_cwd() {
        let dir = TempDir::new().unwrap();
        write_yaml(&dir, "granularity: daily\n");
        let original_dir = env::current_dir().unwrap();
        env::set_current_dir(dir.path()).unwrap();

        let found = EngineConfig::find_yaml_config_file();

        env::set_current_dir(original_dir).expect("Could not restore original directory");
        assert_eq!(found, Some(PathBuf::from(CONFIG_FILENAME)));
    }

    #[test]
    fn test_check_config_file_rejects_directory() {
        let dir = TempDir::new().unwrap();
        assert_eq!(EngineConfig::check_config_file(dir.path()), None);
        assert_eq!(
            EngineConfig::check_config_file(&dir.path().join("missing.yaml")),
            None
        );
    }

    #[test]
    fn test_yaml_full_sections() {
        let yaml = r##"
metric_priority: [UnblendedCost]
canonical_rules:
  - pattern: "^Amazon Relational"
    canonical_name: "Amazon RDS"
    match_kind: regex
palette: ["#000000", "#ffffff"]
forecast:
  horizon_months: 3
  revenue_per_dollar: 4.5
suggestions:
  reservation_min_total: 250
"##;
        let parsed: YamlConfig = serde_yaml::from_str(yaml).unwrap();
        let mut config = EngineConfig::default();
        parsed.apply_to_config(&mut config);

        assert_eq!(config.metric_priority, vec!["UnblendedCost"]);
        assert_eq!(config.canonical_rules[0].match_kind, MatchKind::Regex);
        assert_eq!(config.palette.len(), 2);
        assert_eq!(config.forecast.horizon_months, ForecastHorizon::Three);
        assert_eq!(config.forecast.revenue_per_dollar, Some(dec!(4.5)));
        assert_eq!(config.suggestions.reservation_min_total, dec!(250));
        assert_eq!(config.suggestions.sprawl_max_services, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_yaml_rejects_bad_horizon_and_unknown_keys() {
        assert!(serde_yaml::from_str::<YamlConfig>("forecast:\n  horizon_months: 4\n").is_err());
        assert!(serde_yaml::from_str::<YamlConfig>("windowdays: 4\n").is_err());
    }

    #[test]
    fn test_load_from_file_errors() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope.yaml");
        assert!(matches!(
            YamlConfig::load_from_file(&missing),
            Err(ConfigError::FileRead { .. })
        ));

        let bad = write_yaml(&dir, "anomaly: [unclosed\n");
        let err = YamlConfig::load_from_file(&bad).unwrap_err();
        assert!(matches!(err, ConfigError::YamlParse { .. }));
        assert!(err.to_string().contains("Hint"));
    }

    #[test]
    fn test_load_from_empty_file() {
        let dir = TempDir::new().unwrap();
        let path = write_yaml(&dir, "   \n");
        let parsed = YamlConfig::load_from_file(&path).unwrap();
        assert!(parsed.anomaly.is_none());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = EngineConfig::default();
        config.anomaly.window_days = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { field, .. }) if field == "anomaly.window_days"
        ));

        let mut config = EngineConfig::default();
        config.palette.clear();
        assert!(config.validate().is_err());

        let mut config = EngineConfig::default();
        config.metric_priority.clear();
        assert!(config.validate().is_err());

        let mut config = EngineConfig::default();
        config.canonical_rules = vec![CanonicalRule {
            pattern: "(".to_string(),
            canonical_name: "Broken".to_string(),
            match_kind: MatchKind::Regex,
        }];
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Validation { .. })
        ));
    }

    #[test]
    fn test_example_yaml_parses_and_validates() {
        let parsed: YamlConfig = serde_yaml::from_str(EngineConfig::example_yaml_config()).unwrap();
        let mut config = EngineConfig::default();
        parsed.apply_to_config(&mut config);
        assert!(config.validate().is_ok());
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn test_to_yaml_round_trips_through_full_config() {
        let config = EngineConfig::default();
        let yaml = config.to_yaml().unwrap();
        let parsed: EngineConfig = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_config_error_display() {
        let error = ConfigError::InvalidValue {
            field: "palette".to_string(),
            value: "[]".to_string(),
            hint: "needs colours".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Invalid configuration value for 'palette': []\nneeds colours"
        );
    }
}
