use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

use crate::constants::{
    CROSS_MATCH_RADIUS_ARCSEC, DEFAULT_POSITION_THRESHOLD_ARCSEC, DUST_LOOKUP_TIMEOUT_SECS,
    DUST_SEARCH_RADIUS_DEG, GAIA_EPOCH_OFFSET_YEARS, GAIA_MATCH_THRESHOLD_ARCSEC,
    GAIA_SEARCH_RADIUS_ARCSEC,
};
use crate::error::{Result, SweetCatError};
use crate::pipeline::processing::{HostAssemblerConfig, ParallaxResolverConfig, ReconciliationConfig};

pub const DEFAULT_CONFIG_FILE: &str = "sweetcat.toml";

/// Settings from `sweetcat.toml`. Every field has a default, so the file is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub paths: PathsConfig,
    pub reconcile: ReconcileConfig,
    pub resolution: ResolutionConfig,
    pub commands: CommandsConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// The SWEET-Cat catalog being checked.
    pub catalog: PathBuf,
    /// Where new records are appended.
    pub output: PathBuf,
    pub exoplanets: PathBuf,
    /// Candidate list written by `check` and consumed by `add`.
    pub names: PathBuf,
    pub blacklist: PathBuf,
    /// Names that need manual entry.
    pub manual: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            catalog: PathBuf::from("WEBSITE_online.rdb"),
            output: PathBuf::from("WEBSITE_online_ADD.rdb"),
            exoplanets: PathBuf::from("exo.csv"),
            names: PathBuf::from("names.txt"),
            blacklist: PathBuf::from("blacklist.txt"),
            manual: PathBuf::from("manual.list"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReconcileConfig {
    pub position_threshold_arcsec: f64,
    /// Keep planets whose status is not `Confirmed`.
    pub include_unconfirmed: bool,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            position_threshold_arcsec: DEFAULT_POSITION_THRESHOLD_ARCSEC,
            include_unconfirmed: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ResolutionConfig {
    pub gaia_search_radius_arcsec: f64,
    pub gaia_match_threshold_arcsec: f64,
    pub epoch_offset_years: f64,
    pub cross_match_radius_arcsec: f64,
    pub dust_radius_deg: f64,
    pub dust_timeout_secs: u64,
    /// Timeout for every other external call.
    pub lookup_timeout_secs: u64,
}

impl Default for ResolutionConfig {
    fn default() -> Self {
        Self {
            gaia_search_radius_arcsec: GAIA_SEARCH_RADIUS_ARCSEC,
            gaia_match_threshold_arcsec: GAIA_MATCH_THRESHOLD_ARCSEC,
            epoch_offset_years: GAIA_EPOCH_OFFSET_YEARS,
            cross_match_radius_arcsec: CROSS_MATCH_RADIUS_ARCSEC,
            dust_radius_deg: DUST_SEARCH_RADIUS_DEG,
            dust_timeout_secs: DUST_LOOKUP_TIMEOUT_SECS,
            lookup_timeout_secs: 30,
        }
    }
}

/// External programs bound to the lookup ports. Unbound ports always fail.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CommandsConfig {
    pub astrometry: Option<CommandSpec>,
    pub cross_match: Option<CommandSpec>,
    pub dust: Option<CommandSpec>,
    pub mass: Option<CommandSpec>,
    pub spectroscopic_parallax: Option<CommandSpec>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommandSpec {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub dir: PathBuf,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("logs"),
        }
    }
}

impl Config {
    /// Load `path`, or the defaults when it does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path).map_err(|e| {
            SweetCatError::Config(format!("Failed to read config file '{}': {}", path.display(), e))
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        let positive = [
            ("reconcile.position_threshold_arcsec", self.reconcile.position_threshold_arcsec),
            ("resolution.gaia_search_radius_arcsec", self.resolution.gaia_search_radius_arcsec),
            ("resolution.gaia_match_threshold_arcsec", self.resolution.gaia_match_threshold_arcsec),
            ("resolution.cross_match_radius_arcsec", self.resolution.cross_match_radius_arcsec),
            ("resolution.dust_radius_deg", self.resolution.dust_radius_deg),
        ];
        for (key, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(SweetCatError::Config(format!("{} must be positive, got {}", key, value)));
            }
        }
        if !self.resolution.epoch_offset_years.is_finite() {
            return Err(SweetCatError::Config("resolution.epoch_offset_years must be finite".into()));
        }
        Ok(())
    }

    pub fn reconciliation(&self) -> ReconciliationConfig {
        ReconciliationConfig {
            position_threshold_arcsec: self.reconcile.position_threshold_arcsec,
        }
    }

    pub fn lookup_timeout(&self) -> Duration {
        Duration::from_secs(self.resolution.lookup_timeout_secs)
    }

    pub fn parallax(&self) -> ParallaxResolverConfig {
        let r = &self.resolution;
        ParallaxResolverConfig {
            gaia_search_radius_arcsec: r.gaia_search_radius_arcsec,
            gaia_match_threshold_arcsec: r.gaia_match_threshold_arcsec,
            epoch_offset_years: r.epoch_offset_years,
            dust_radius_deg: r.dust_radius_deg,
            lookup_timeout: self.lookup_timeout(),
            dust_timeout: Duration::from_secs(r.dust_timeout_secs),
        }
    }

    pub fn host(&self) -> HostAssemblerConfig {
        HostAssemblerConfig {
            cross_match_radius_arcsec: self.resolution.cross_match_radius_arcsec,
            lookup_timeout: self.lookup_timeout(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_gives_defaults() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config.paths.catalog, PathBuf::from("WEBSITE_online.rdb"));
        assert_eq!(config.reconcile.position_threshold_arcsec, 5.0);
        assert_eq!(config.parallax().dust_timeout, Duration::from_secs(60));
        assert!(config.commands.astrometry.is_none());
    }

    #[test]
    fn test_partial_sections_keep_other_defaults() {
        let config = Config::from_toml(
            r#"
            [paths]
            catalog = "data/sc.rdb"

            [reconcile]
            include_unconfirmed = true

            [commands.mass]
            program = "python3"
            args = ["scripts/torres.py"]
            "#,
        )
        .unwrap();
        assert_eq!(config.paths.catalog, PathBuf::from("data/sc.rdb"));
        assert_eq!(config.paths.names, PathBuf::from("names.txt"));
        assert!(config.reconcile.include_unconfirmed);
        assert_eq!(config.reconcile.position_threshold_arcsec, 5.0);
        let mass = config.commands.mass.unwrap();
        assert_eq!(mass.program, "python3");
        assert_eq!(mass.args, vec!["scripts/torres.py"]);
    }

    #[test]
    fn test_rejects_non_positive_threshold() {
        let err = Config::from_toml("[reconcile]\nposition_threshold_arcsec = 0.0\n").unwrap_err();
        assert!(matches!(err, SweetCatError::Config(_)));
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(&dir.path().join("sweetcat.toml")).unwrap();
        assert_eq!(config.logging.dir, PathBuf::from("logs"));
    }
}
