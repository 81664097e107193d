//! Runtime configuration
//!
//! Tunables are read once at startup into an immutable [`EngineConfig`] and
//! passed to the components that need them. An invalid override stops the
//! process: every later search would otherwise run with silently different
//! matching semantics.
//!
//! List sources are loaded separately from YAML (see [`SourcesConfig`]).

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::lists::ListKind;
use crate::normalize::NamePipeline;

/// Default time between refresh cycles
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Default size of the scoring concurrency gate
pub const DEFAULT_WORKERS: usize = 1024;

/// Jaro-Winkler and ranking parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringConfig {
    /// Minimum raw Jaro similarity before the prefix boost applies
    pub boost_threshold: f64,
    /// Maximum number of leading characters counted for the boost
    pub prefix_size: usize,
    /// Added to a token score that is already an exact match
    pub exact_match_favoritism: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            boost_threshold: 0.7,
            prefix_size: 4,
            exact_match_favoritism: 0.0,
        }
    }
}

/// Engine-wide configuration
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub scoring: ScoringConfig,
    /// `None` runs the refresh once at startup and never repeats
    pub refresh_interval: Option<Duration>,
    pub workers: usize,
    pub search_limit: usize,
    pub min_match: f64,
    /// Log every name pipeline step at debug level
    pub debug_pipeline: bool,
    /// Directory holding list files for the first refresh
    pub initial_data_dir: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            scoring: ScoringConfig::default(),
            refresh_interval: Some(DEFAULT_REFRESH_INTERVAL),
            workers: DEFAULT_WORKERS,
            search_limit: 10,
            min_match: 0.0,
            debug_pipeline: false,
            initial_data_dir: None,
        }
    }
}

impl EngineConfig {
    /// Read configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through an arbitrary key lookup.
    ///
    /// Blank values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(v) = get("JARO_WINKLER_BOOST_THRESHOLD") {
            config.scoring.boost_threshold = parse_float("JARO_WINKLER_BOOST_THRESHOLD", &v)?;
        }
        if let Some(v) = get("JARO_WINKLER_PREFIX_SIZE") {
            config.scoring.prefix_size = parse_usize("JARO_WINKLER_PREFIX_SIZE", &v)?;
        }
        if let Some(v) = get("EXACT_MATCH_FAVORITISM") {
            config.scoring.exact_match_favoritism = parse_float("EXACT_MATCH_FAVORITISM", &v)?;
        }
        if let Some(v) = get("DATA_REFRESH_INTERVAL") {
            config.refresh_interval = parse_refresh_interval(&v)?;
        }
        if let Some(v) = get("SEARCH_WORKERS") {
            let workers = parse_usize("SEARCH_WORKERS", &v)?;
            if workers == 0 {
                return Err(ConfigError::OutOfRange {
                    key: "SEARCH_WORKERS",
                    value: v,
                    constraint: "at least 1",
                });
            }
            config.workers = workers;
        }
        if let Some(v) = get("SEARCH_LIMIT") {
            config.search_limit = parse_usize("SEARCH_LIMIT", &v)?;
        }
        if let Some(v) = get("SEARCH_MIN_MATCH") {
            config.min_match = check_min_match(parse_float("SEARCH_MIN_MATCH", &v)?)?;
        }
        if let Some(v) = get("DEBUG_NAME_PIPELINE") {
            config.debug_pipeline = parse_bool("DEBUG_NAME_PIPELINE", &v)?;
        }
        config.initial_data_dir = get("INITIAL_DATA_DIRECTORY").map(PathBuf::from);

        Ok(config)
    }

    /// Apply per-run overrides of the default limit and threshold.
    ///
    /// The threshold is held to the same range as `SEARCH_MIN_MATCH`.
    pub fn with_search_overrides(
        mut self,
        limit: Option<usize>,
        min_match: Option<f64>,
    ) -> Result<Self, ConfigError> {
        if let Some(limit) = limit {
            self.search_limit = limit;
        }
        if let Some(min_match) = min_match {
            self.min_match = check_min_match(min_match)?;
        }
        Ok(self)
    }

    /// Name pipeline honouring `DEBUG_NAME_PIPELINE`
    pub fn name_pipeline(&self) -> NamePipeline {
        NamePipeline::with_debug(self.debug_pipeline)
    }
}

fn check_min_match(min_match: f64) -> Result<f64, ConfigError> {
    if !(0.0..=1.0).contains(&min_match) {
        return Err(ConfigError::OutOfRange {
            key: "SEARCH_MIN_MATCH",
            value: min_match.to_string(),
            constraint: "between 0.0 and 1.0",
        });
    }
    Ok(min_match)
}

fn parse_float(key: &'static str, value: &str) -> Result<f64, ConfigError> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
        .ok_or_else(|| ConfigError::InvalidValue {
            key,
            value: value.to_string(),
            expected: "float",
        })
}

fn parse_usize(key: &'static str, value: &str) -> Result<usize, ConfigError> {
    value
        .trim()
        .parse::<usize>()
        .map_err(|_| ConfigError::InvalidValue {
            key,
            value: value.to_string(),
            expected: "non-negative integer",
        })
}

fn parse_bool(key: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "t" | "true" | "yes" => Ok(true),
        "0" | "f" | "false" | "no" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key,
            value: value.to_string(),
            expected: "bool",
        }),
    }
}

/// Parse a refresh interval.
///
/// `off` disables periodic refresh. Otherwise a positive integer with an
/// optional unit suffix (`ms`, `s`, `m`, `h`); a bare number is seconds.
pub fn parse_refresh_interval(value: &str) -> Result<Option<Duration>, ConfigError> {
    const KEY: &str = "DATA_REFRESH_INTERVAL";

    let value = value.trim();
    if value.eq_ignore_ascii_case("off") {
        return Ok(None);
    }

    let invalid = || ConfigError::InvalidValue {
        key: KEY,
        value: value.to_string(),
        expected: "duration (e.g. 90s, 15m, 1h) or 'off'",
    };

    let split = value
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(value.len());
    let (digits, unit) = value.split_at(split);
    let amount: u64 = digits.parse().map_err(|_| invalid())?;

    let duration = match unit {
        "" | "s" => Duration::from_secs(amount),
        "ms" => Duration::from_millis(amount),
        "m" => Duration::from_secs(amount.saturating_mul(60)),
        "h" => Duration::from_secs(amount.saturating_mul(60 * 60)),
        _ => return Err(invalid()),
    };

    if duration.is_zero() {
        return Err(ConfigError::OutOfRange {
            key: KEY,
            value: value.to_string(),
            constraint: "greater than zero (use 'off' to disable)",
        });
    }

    Ok(Some(duration))
}

// ---------------------------------------------------------------------------
// List sources
// ---------------------------------------------------------------------------

/// Root of the list sources YAML file
#[derive(Debug, Clone, Deserialize)]
pub struct SourcesConfig {
    pub sources: Vec<ListSource>,
}

/// One downloadable list file
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ListSource {
    /// Which record type the file contains
    pub kind: ListKind,
    /// Local file name the download is stored under
    pub file_name: String,
    pub url: String,
}

impl SourcesConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&raw)
    }

    pub fn from_yaml(raw: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(raw)?)
    }
}
