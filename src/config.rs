use crate::error::AppError;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

const ENV_PREFIX: &str = "SAFEROAD";

/// About a century
pub const MAX_DEDUP_WINDOW_DAYS: i64 = 36_500;

/// Top level configuration, layered from defaults, an optional TOML file and
/// `SAFEROAD__SECTION__KEY` environment variables.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Configuration {
    pub classifier: ClassifierConfig,
    pub memory: MemoryConfig,
    pub timeouts: TimeoutConfig,
    pub advisory: AdvisoryConfig,
    pub logging: LoggingConfig,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            classifier: ClassifierConfig::default(),
            memory: MemoryConfig::default(),
            timeouts: TimeoutConfig::default(),
            advisory: AdvisoryConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    pub confidence_weight: f32,
    pub size_weight: f32,
    /// Box-to-image area ratio at which the size score saturates at 1.0
    pub size_saturation_ratio: f32,
    pub high_threshold: f32,
    pub medium_threshold: f32,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            confidence_weight: 0.7,
            size_weight: 0.3,
            size_saturation_ratio: 0.1,
            high_threshold: 0.7,
            medium_threshold: 0.45,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemoryBackend {
    Sqlite,
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MemoryConfig {
    pub backend: MemoryBackend,
    pub path: PathBuf,
    pub proximity_radius_m: f64,
    pub dedup_window_days: i64,
    pub history_limit: usize,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            backend: MemoryBackend::Sqlite,
            path: PathBuf::from("memory_db/road_hazards.sqlite"),
            proximity_radius_m: 50.0,
            dedup_window_days: 7,
            history_limit: 5,
        }
    }
}

impl MemoryConfig {
    /// Saturates instead of panicking when the day count is out of range
    pub fn dedup_window(&self) -> chrono::Duration {
        chrono::Duration::try_days(self.dedup_window_days).unwrap_or(chrono::Duration::MAX)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    pub detector_ms: u64,
    pub advisory_ms: u64,
    pub memory_ms: u64,
    pub emitter_ms: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            detector_ms: 10_000,
            advisory_ms: 3_000,
            memory_ms: 2_000,
            emitter_ms: 5_000,
        }
    }
}

impl TimeoutConfig {
    pub fn detector(&self) -> Duration {
        Duration::from_millis(self.detector_ms)
    }

    pub fn advisory(&self) -> Duration {
        Duration::from_millis(self.advisory_ms)
    }

    pub fn memory(&self) -> Duration {
        Duration::from_millis(self.memory_ms)
    }

    pub fn emitter(&self) -> Duration {
        Duration::from_millis(self.emitter_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AdvisoryConfig {
    /// Takes effect only when a `TextGenerator` is given to `PipelineFactory::text_generator`.
    /// The CLI has none, so it always classifies numerically.
    pub enabled: bool,
}

impl Default for AdvisoryConfig {
    fn default() -> Self {
        Self { enabled: false }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Configuration {
    /// Load defaults, then the optional file, then environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self, AppError> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }
        let settings = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let configuration: Configuration = settings.try_deserialize()?;
        configuration.validate().map_err(AppError::InvalidConfig)?;

        match path {
            Some(path) => info!("Loaded configuration from {:?}", path),
            None => info!("Using default configuration"),
        }
        Ok(configuration)
    }

    /// Stricter thresholds, wider dedup radius. Fewer, more certain reports.
    pub fn strict() -> Self {
        Self {
            classifier: ClassifierConfig {
                high_threshold: 0.8,
                medium_threshold: 0.6,
                ..ClassifierConfig::default()
            },
            memory: MemoryConfig {
                proximity_radius_m: 75.0,
                dedup_window_days: 14,
                ..MemoryConfig::default()
            },
            ..Self::default()
        }
    }

    /// Lower thresholds and a short window, for surveys where recall matters most
    pub fn lenient() -> Self {
        Self {
            classifier: ClassifierConfig {
                high_threshold: 0.6,
                medium_threshold: 0.3,
                ..ClassifierConfig::default()
            },
            memory: MemoryConfig {
                proximity_radius_m: 25.0,
                dedup_window_days: 3,
                ..MemoryConfig::default()
            },
            ..Self::default()
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), String> {
        let classifier = &self.classifier;
        for (name, value) in [
            ("confidence_weight", classifier.confidence_weight),
            ("size_weight", classifier.size_weight),
            ("high_threshold", classifier.high_threshold),
            ("medium_threshold", classifier.medium_threshold),
        ] {
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(format!("classifier.{} must be between 0.0 and 1.0", name));
            }
        }

        if classifier.medium_threshold > classifier.high_threshold {
            return Err("classifier.medium_threshold must not exceed high_threshold".to_string());
        }

        if !(classifier.size_saturation_ratio > 0.0 && classifier.size_saturation_ratio <= 1.0) {
            return Err("classifier.size_saturation_ratio must be in (0.0, 1.0]".to_string());
        }

        if !(self.memory.proximity_radius_m.is_finite() && self.memory.proximity_radius_m > 0.0) {
            return Err("memory.proximity_radius_m must be greater than 0".to_string());
        }

        if self.memory.dedup_window_days <= 0 {
            return Err("memory.dedup_window_days must be greater than 0".to_string());
        }
        if self.memory.dedup_window_days > MAX_DEDUP_WINDOW_DAYS {
            return Err(format!(
                "memory.dedup_window_days must be at most {}",
                MAX_DEDUP_WINDOW_DAYS
            ));
        }

        let timeouts = &self.timeouts;
        if timeouts.detector_ms == 0
            || timeouts.advisory_ms == 0
            || timeouts.memory_ms == 0
            || timeouts.emitter_ms == 0
        {
            return Err("timeouts must be greater than 0".to_string());
        }

        Ok(())
    }
}
