use crate::error::{DirhashError, Result};
use crate::index::{Algorithm, ErrorPolicy, DEFAULT_BUFFER_SIZE};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use xdg::BaseDirectories;

pub const ENV_ALGORITHM: &str = "DIRHASH_ALGORITHM";
pub const ENV_OUTPUT_DIR: &str = "DIRHASH_OUTPUT_DIR";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub algorithm: Algorithm,
    pub on_error: ErrorPolicy,
    /// Base directory for `out_dir_*` run directories.
    pub output_dir: PathBuf,
    pub buffer_size: usize,
    /// The file the settings were read from, if any.
    pub config_path: Option<PathBuf>,
}

/// On-disk form; every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    algorithm: Option<String>,
    on_error: Option<String>,
    output_dir: Option<PathBuf>,
    buffer_size: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            algorithm: Algorithm::default(),
            on_error: ErrorPolicy::default(),
            output_dir: PathBuf::from("."),
            buffer_size: DEFAULT_BUFFER_SIZE,
            config_path: None,
        }
    }
}

impl Config {
    /// Defaults, then the TOML file (`config_override` or the XDG
    /// `dirhash/dirhash.toml`), then the environment.
    pub fn load(config_override: Option<PathBuf>) -> Result<Self> {
        let config_path = match config_override {
            Some(path) => {
                if !path.exists() {
                    return Err(DirhashError::FileNotFound(path));
                }
                Some(path)
            }
            None => BaseDirectories::with_prefix("dirhash")
                .ok()
                .and_then(|xdg| xdg.find_config_file("dirhash.toml")),
        };

        let mut config = match &config_path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;

        log::debug!("Effective configuration: {:?}", config);
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| DirhashError::file_io(path, e))?;
        let mut config = Self::from_toml_str(&contents)?;
        config.config_path = Some(path.to_path_buf());
        Ok(config)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let file: ConfigFile = toml::from_str(contents)?;
        let mut config = Self::default();

        if let Some(algorithm) = file.algorithm {
            config.algorithm = Algorithm::from_str(&algorithm)?;
        }
        if let Some(on_error) = file.on_error {
            config.on_error = ErrorPolicy::from_str(&on_error)?;
        }
        if let Some(output_dir) = file.output_dir {
            config.output_dir = output_dir;
        }
        if let Some(buffer_size) = file.buffer_size {
            if buffer_size == 0 {
                return Err(DirhashError::Config("buffer_size must be greater than zero".to_string()));
            }
            config.buffer_size = buffer_size;
        }

        Ok(config)
    }

    /// Overrides from environment variables, looked up through `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(algorithm) = lookup(ENV_ALGORITHM).filter(|v| !v.is_empty()) {
            self.algorithm = Algorithm::from_str(&algorithm)?;
        }
        if let Some(output_dir) = lookup(ENV_OUTPUT_DIR).filter(|v| !v.is_empty()) {
            self.output_dir = PathBuf::from(output_dir);
        }
        Ok(())
    }
}
