use std::env;
use std::path::PathBuf;

use crate::error::{MagiError, MagiErrorKind, MagiResult};

const DEFAULT_ARCHIVE_DIR: &str = "archives";

/// Runtime settings read from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    /// Text that must directly precede a command name.
    pub prefix: String,
    pub token: String,
    /// Root under which each archive run gets a working directory.
    pub archive_dir: PathBuf,
}

impl Config {
    /// Reads `PREFIX`, `TOKEN` and `ARCHIVE_DIR`.
    pub fn from_env() -> MagiResult<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> MagiResult<Self> {
        let required = |key: &str| {
            lookup(key).filter(|v| !v.trim().is_empty()).ok_or_else(|| {
                MagiError::new(MagiErrorKind::Configuration(format!(
                    "expected {key} in the environment"
                )))
            })
        };

        Ok(Self {
            prefix: required("PREFIX")?,
            token: required("TOKEN")?,
            archive_dir: lookup("ARCHIVE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_ARCHIVE_DIR)),
        })
    }
}
