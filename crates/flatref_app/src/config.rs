//! Optional RON configuration file.
//!
//! ```ron
//! (
//!     endpoints: (
//!         mirror: "https://mirror.example.org/repo/appstream/{app_id}.flatpakref",
//!     ),
//! )
//! ```
//!
//! Omitted fields keep their built-in defaults.

use std::fs;
use std::path::{Path, PathBuf};

use flatref_engine::{EndpointError, Endpoints};
use flatref_logging::flatref_info;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: ron::error::SpannedError,
    },
    #[error(transparent)]
    Endpoint(#[from] EndpointError),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub endpoints: Endpoints,
}

pub fn parse_config(text: &str, path: &Path) -> Result<FileConfig, ConfigError> {
    let config: FileConfig = ron::from_str(text).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    config.endpoints.validate()?;
    Ok(config)
}

/// Endpoints from `path`, or the defaults when no file is given.
pub fn load_endpoints(path: Option<&Path>) -> Result<Endpoints, ConfigError> {
    let Some(path) = path else {
        return Ok(Endpoints::default());
    };
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let config = parse_config(&text, path)?;
    flatref_info!("Loaded endpoints from {}", path.display());
    Ok(config.endpoints)
}
