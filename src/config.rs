//! Layered configuration loading.
//!
//! Sources, highest priority last:
//! 1. Built-in defaults
//! 2. `~/.config/exoplanet-sky/config.toml` (user-global)
//! 3. `./exoplanet-sky.toml` (or the path passed with `--config`)
//! 4. Environment variables (`EXOSKY_*` prefix, `__` between section and field)
//!
//! `EXOSKY_ENRICHMENT__MAX_CONCURRENT=4` maps to `enrichment.max_concurrent`.

use crate::error::{SkyError, SkyResult};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// NASA Exoplanet Archive TAP query for the planetary-systems table
pub const DEFAULT_ARCHIVE_URL: &str = "https://exoplanetarchive.ipac.caltech.edu/TAP/sync?query=select+pl_name,pl_rade,pl_orbper,pl_masse,sy_snum,sy_dist,pl_eqt,pl_refname,disc_year+from+ps+where+pl_masse+%3E0+and+pl_rade+%3E+0+and+pl_orbper+%3E+0+and+sy_dist+%3E+0+and+pl_eqt+between+-300+and+10000&format=csv";

/// Wikipedia REST API base; summaries live under `/page/summary/<title>`
pub const DEFAULT_SUMMARY_BASE_URL: &str = "https://en.wikipedia.org/api/rest_v1";

pub const ENV_PREFIX: &str = "EXOSKY_";

/// Upper bound for `refresh.max_age_hours` (about a century)
pub const MAX_AGE_HOURS_LIMIT: u64 = 24 * 365 * 100;
pub const LOCAL_CONFIG_FILE: &str = "exoplanet-sky.toml";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SkyConfig {
    #[serde(default)]
    pub archive: ArchiveConfig,
    #[serde(default)]
    pub enrichment: EnrichmentConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub refresh: RefreshConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ArchiveConfig {
    /// CSV endpoint for the dataset
    pub url: String,
    pub timeout_secs: u64,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_ARCHIVE_URL.to_string(),
            timeout_secs: 120,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EnrichmentConfig {
    pub enabled: bool,
    pub base_url: String,
    /// Upper bound on in-flight summary lookups
    pub max_concurrent: usize,
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: DEFAULT_SUMMARY_BASE_URL.to_string(),
            max_concurrent: 8,
            timeout_secs: 10,
            user_agent: format!("exoplanet-sky/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    /// SQLite file holding the key-value store
    pub path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        let path = dirs::data_dir()
            .map(|d| d.join("exoplanet-sky").join("sky.db"))
            .unwrap_or_else(|| PathBuf::from("exoplanet-sky.db"));
        Self { path }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RefreshConfig {
    /// A stored dataset older than this is re-ingested on the next `show`
    pub max_age_hours: u64,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self { max_age_hours: 24 * 7 }
    }
}

impl SkyConfig {
    /// Load from all sources and validate.
    pub fn load(local_override: Option<&Path>) -> SkyResult<Self> {
        let config: SkyConfig = Self::figment(local_override).extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Build the provider chain. Public so tests can layer extra providers.
    pub fn figment(local_override: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                figment = figment.merge(Toml::file(global_path));
            }
        }

        let local_path = local_override
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(LOCAL_CONFIG_FILE));
        if local_path.exists() {
            figment = figment.merge(Toml::file(local_path));
        }

        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("exoplanet-sky").join("config.toml"))
    }

    pub fn validate(&self) -> SkyResult<()> {
        if self.archive.url.trim().is_empty() {
            return Err(invalid("archive.url", "must not be empty"));
        }
        if self.enrichment.enabled && self.enrichment.base_url.trim().is_empty() {
            return Err(invalid("enrichment.base_url", "must not be empty when enrichment is enabled"));
        }
        if self.enrichment.max_concurrent == 0 {
            return Err(invalid("enrichment.max_concurrent", "must be at least 1"));
        }
        if self.refresh.max_age_hours > MAX_AGE_HOURS_LIMIT {
            return Err(invalid(
                "refresh.max_age_hours",
                &format!("must be at most {}", MAX_AGE_HOURS_LIMIT),
            ));
        }
        if self.archive.timeout_secs == 0 || self.enrichment.timeout_secs == 0 {
            return Err(invalid("timeout_secs", "must be at least 1"));
        }
        Ok(())
    }
}

fn invalid(field: &str, reason: &str) -> SkyError {
    SkyError::Config(format!("invalid value for '{}': {}", field, reason))
}
