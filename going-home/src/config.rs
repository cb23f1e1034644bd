//! Process configuration.
//!
//! The commute endpoints come from a small YAML file:
//!
//! ```yaml
//! home: Bern
//! work: Zürich HB
//! ```
//!
//! Everything else (cache location, API endpoint, timings) is collected into
//! [`Settings`] once at startup and handed to the components that need it.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Default location of the locations file, relative to the working directory.
pub const DEFAULT_LOCATIONS_FILE: &str = "config/locations.yml";

/// Default location of the connection cache.
pub const DEFAULT_CACHE_FILE: &str = "cache/PublicTransportFetcherCache.json";

/// Default base URL of the journey API.
pub const DEFAULT_BASE_URL: &str = "http://transport.opendata.ch/v1";

/// Cached data older than this is refetched.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(299);

/// Default request timeout for the journey API.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Errors from loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The locations file could not be read.
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The locations file is not valid YAML or lacks a required key.
    #[error("invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// A location is present but empty.
    #[error("location '{0}' must not be empty")]
    EmptyLocation(LocationRole),
}

/// The two roles a configured location can play.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocationRole {
    #[default]
    Home,
    Work,
}

impl LocationRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            LocationRole::Home => "home",
            LocationRole::Work => "work",
        }
    }

    /// The role at the other end of the commute.
    pub fn opposite(&self) -> Self {
        match self {
            LocationRole::Home => LocationRole::Work,
            LocationRole::Work => LocationRole::Home,
        }
    }
}

impl fmt::Display for LocationRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Station names for both ends of the commute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Locations {
    pub home: String,
    pub work: String,
}

impl Locations {
    pub fn new(home: impl Into<String>, work: impl Into<String>) -> Self {
        Self {
            home: home.into(),
            work: work.into(),
        }
    }

    /// Parse locations from YAML text.
    ///
    /// `path` is only used for error messages.
    pub fn from_yaml(contents: &str, path: &Path) -> Result<Self, ConfigError> {
        let locations: Locations =
            serde_yaml::from_str(contents).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        locations.validate()?;
        Ok(locations)
    }

    /// Load locations from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "loaded locations");
        Self::from_yaml(&contents, path)
    }

    /// The station configured for `role`.
    pub fn get(&self, role: LocationRole) -> &str {
        match role {
            LocationRole::Home => &self.home,
            LocationRole::Work => &self.work,
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for role in [LocationRole::Home, LocationRole::Work] {
            if self.get(role).trim().is_empty() {
                return Err(ConfigError::EmptyLocation(role));
            }
        }
        Ok(())
    }
}

/// Everything a [`TransitFetcher`](crate::fetcher::TransitFetcher) needs,
/// built once at startup and read-only afterwards.
#[derive(Debug, Clone)]
pub struct Settings {
    pub locations: Locations,
    /// Path of the connection cache file.
    pub cache_path: PathBuf,
    /// Base URL of the journey API (without the `/connections` suffix).
    pub base_url: String,
    /// How long fetched data stays fresh.
    pub refresh_interval: Duration,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Settings {
    /// Create settings with defaults for everything but the locations.
    pub fn new(locations: Locations) -> Self {
        Self {
            locations,
            cache_path: PathBuf::from(DEFAULT_CACHE_FILE),
            base_url: DEFAULT_BASE_URL.to_string(),
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    pub fn with_cache_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.cache_path = path.into();
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_refresh_interval(mut self, interval: Duration) -> Self {
        self.refresh_interval = interval;
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}
