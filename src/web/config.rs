use std::path::PathBuf;
use std::time::Duration;

use chrono_tz::Tz;
use serde::{Deserialize, Deserializer};
use thiserror::Error;

use crate::elements::{
    ConfiguredSource, FileElementSource, HttpElementSource, PayloadFormat, RefreshPolicy,
    ISS_NORAD_ID,
};
use crate::predict::{
    ObserverSite, SearchOptions, DEFAULT_DELTA, DEFAULT_FRESHNESS_HORIZON, MAX_DELTA_SECONDS,
};
use crate::service::ServiceSettings;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub web: WebConfig,
    pub station: StationConfig,
    pub elements: ElementsConfig,
    #[serde(default)]
    pub predict: PredictConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub display: DisplayConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            static_dir: default_static_dir(),
        }
    }
}

fn default_bind() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_static_dir() -> PathBuf {
    PathBuf::from("static")
}

/// The home observer used when a request names no location.
#[derive(Debug, Clone, Deserialize)]
pub struct StationConfig {
    pub name: Option<String>,
    pub coordinates: String,
    #[serde(default)]
    pub altitude_m: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ElementsConfig {
    pub source: SourceConfig,
    #[serde(default = "default_refresh_interval", deserialize_with = "duration")]
    pub refresh_interval: Duration,
    #[serde(default = "default_fetch_timeout", deserialize_with = "duration")]
    pub fetch_timeout: Duration,
    #[serde(default = "default_retry_initial", deserialize_with = "duration")]
    pub retry_initial: Duration,
    #[serde(default = "default_retry_max", deserialize_with = "duration")]
    pub retry_max: Duration,
    /// Answers are flagged stale once the last successful fetch is older than this.
    #[serde(default = "default_max_age", deserialize_with = "duration")]
    pub max_age: Duration,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceConfig {
    Http {
        url: String,
        #[serde(default)]
        format: PayloadFormat,
        #[serde(default = "default_norad_id")]
        norad_id: u64,
    },
    File {
        path: PathBuf,
        #[serde(default = "default_norad_id")]
        norad_id: u64,
    },
}

fn default_norad_id() -> u64 {
    ISS_NORAD_ID
}

fn default_refresh_interval() -> Duration {
    Duration::from_secs(6 * 3600)
}

fn default_fetch_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_retry_initial() -> Duration {
    Duration::from_secs(30)
}

fn default_retry_max() -> Duration {
    Duration::from_secs(30 * 60)
}

fn default_max_age() -> Duration {
    Duration::from_secs(24 * 3600)
}

#[derive(Debug, Clone, Deserialize)]
pub struct PredictConfig {
    #[serde(default = "default_min_elevation")]
    pub default_min_elevation: f64,
    #[serde(default = "default_freshness_horizon", deserialize_with = "duration")]
    pub freshness_horizon: Duration,
    /// Length of the default pass search window.
    #[serde(default = "default_window", deserialize_with = "duration")]
    pub window: Duration,
    #[serde(default = "default_coarse_step", deserialize_with = "duration")]
    pub coarse_step: Duration,
    #[serde(default = "default_max_passes")]
    pub max_passes: usize,
    #[serde(default = "default_search_timeout", deserialize_with = "duration")]
    pub search_timeout: Duration,
}

impl Default for PredictConfig {
    fn default() -> Self {
        Self {
            default_min_elevation: default_min_elevation(),
            freshness_horizon: default_freshness_horizon(),
            window: default_window(),
            coarse_step: default_coarse_step(),
            max_passes: default_max_passes(),
            search_timeout: default_search_timeout(),
        }
    }
}

fn default_min_elevation() -> f64 {
    crate::predict::DEFAULT_MIN_ELEVATION_DEG
}

fn default_freshness_horizon() -> Duration {
    Duration::from_secs(DEFAULT_FRESHNESS_HORIZON.num_seconds().unsigned_abs())
}

fn default_window() -> Duration {
    Duration::from_secs(48 * 3600)
}

fn default_coarse_step() -> Duration {
    Duration::from_secs(60)
}

fn default_max_passes() -> usize {
    10
}

fn default_search_timeout() -> Duration {
    Duration::from_secs(15)
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    /// Interval between the two positions used for the speed estimate.
    #[serde(default = "default_metrics_delta", deserialize_with = "duration")]
    pub delta: Duration,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            delta: default_metrics_delta(),
        }
    }
}

fn default_metrics_delta() -> Duration {
    Duration::from_millis(DEFAULT_DELTA.num_milliseconds().unsigned_abs())
}

#[derive(Debug, Clone, Deserialize)]
pub struct DisplayConfig {
    #[serde(default = "default_timezone", deserialize_with = "timezone")]
    pub timezone: Tz,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            timezone: default_timezone(),
        }
    }
}

fn default_timezone() -> Tz {
    Tz::UTC
}

fn duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    humantime::parse_duration(s.trim()).map_err(serde::de::Error::custom)
}

fn timezone<'de, D>(deserializer: D) -> Result<Tz, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    s.trim()
        .parse::<Tz>()
        .map_err(|e| serde::de::Error::custom(format!("unknown timezone '{}': {}", s, e)))
}

fn to_chrono(d: Duration) -> Result<chrono::Duration, ConfigError> {
    chrono::Duration::from_std(d).map_err(|e| ConfigError::Invalid(e.to_string()))
}

impl Config {
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| -> Result<(), ConfigError> { Err(ConfigError::Invalid(msg)) };

        self.home_observer()?;

        let min_el = self.predict.default_min_elevation;
        if !(0.0..90.0).contains(&min_el) {
            return invalid(format!(
                "predict.default_min_elevation {} outside [0, 90)",
                min_el
            ));
        }
        if self.predict.coarse_step.is_zero() || self.predict.coarse_step > Duration::from_secs(600)
        {
            return invalid("predict.coarse_step must be within (0s, 10m]".into());
        }
        if self.predict.window.is_zero() {
            return invalid("predict.window must be positive".into());
        }
        if self.predict.window > self.predict.freshness_horizon {
            return invalid("predict.window exceeds predict.freshness_horizon".into());
        }
        if self.predict.max_passes == 0 {
            return invalid("predict.max_passes must be at least 1".into());
        }
        let delta = self.metrics.delta.as_secs_f64();
        if delta <= 0.0 || delta > MAX_DELTA_SECONDS {
            return invalid(format!("metrics.delta {}s outside (0, 600]", delta));
        }
        if self.elements.refresh_interval.is_zero() {
            return invalid("elements.refresh_interval must be positive".into());
        }
        if self.elements.retry_initial.is_zero()
            || self.elements.retry_initial > self.elements.retry_max
        {
            return invalid("elements.retry_initial must be positive and <= retry_max".into());
        }
        if let SourceConfig::Http { url, .. } = &self.elements.source {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return invalid(format!("elements.source.url '{}' is not an http(s) URL", url));
            }
        }
        Ok(())
    }

    pub fn home_observer(&self) -> Result<ObserverSite, ConfigError> {
        let label = self.station.name.clone().unwrap_or_else(|| "home".to_string());
        ObserverSite::from_coordinates(label, &self.station.coordinates, self.station.altitude_m)
            .map_err(|e| ConfigError::Invalid(format!("station: {}", e)))
    }

    pub fn element_source(&self) -> Result<ConfiguredSource, ConfigError> {
        match &self.elements.source {
            SourceConfig::Http {
                url,
                format,
                norad_id,
            } => HttpElementSource::new(url.clone(), *format, *norad_id, self.elements.fetch_timeout)
                .map(ConfiguredSource::Http)
                .map_err(|e| ConfigError::Invalid(format!("elements.source: {}", e))),
            SourceConfig::File { path, norad_id } => Ok(ConfiguredSource::File(
                FileElementSource::new(path.clone(), *norad_id),
            )),
        }
    }

    pub fn refresh_policy(&self) -> RefreshPolicy {
        RefreshPolicy {
            interval: self.elements.refresh_interval,
            fetch_timeout: self.elements.fetch_timeout,
            retry_initial: self.elements.retry_initial,
            retry_max: self.elements.retry_max,
        }
    }

    pub fn max_age(&self) -> Result<chrono::Duration, ConfigError> {
        to_chrono(self.elements.max_age)
    }

    pub fn window(&self) -> Result<chrono::Duration, ConfigError> {
        to_chrono(self.predict.window)
    }

    pub fn service_settings(&self) -> Result<ServiceSettings, ConfigError> {
        Ok(ServiceSettings {
            freshness_horizon: to_chrono(self.predict.freshness_horizon)?,
            search: SearchOptions {
                coarse_step: to_chrono(self.predict.coarse_step)?,
                ..SearchOptions::default()
            },
            metrics_delta: to_chrono(self.metrics.delta)?,
            search_timeout: self.predict.search_timeout,
        })
    }
}
