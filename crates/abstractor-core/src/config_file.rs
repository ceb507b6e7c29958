use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Name of the per-directory config file looked up in the working directory.
pub const LOCAL_CONFIG_NAME: &str = ".abstractor.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// On-disk TOML configuration structure.
/// All fields are optional so partial configs work (merge with defaults).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    pub api: Option<ApiConfig>,
    pub input: Option<InputConfig>,
    pub output: Option<OutputConfig>,
    pub review: Option<ReviewConfig>,
}

#[derive(Clone, Default, Serialize, Deserialize)]
pub struct ApiConfig {
    pub key: Option<String>,
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub timeout_secs: Option<u64>,
}

impl std::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiConfig")
            .field("key", &self.key.as_ref().map(|_| "***"))
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InputConfig {
    pub directory: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    pub path: Option<String>,
    pub format: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReviewConfig {
    pub topic: Option<String>,
    pub strict: Option<bool>,
}

/// Platform config directory path: `<config_dir>/abstractor/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("abstractor").join("config.toml"))
}

/// Load config by cascading CWD `.abstractor.toml` over platform config.
/// CWD values override platform values. Missing or unparsable files are
/// skipped.
pub fn load_config() -> ConfigFile {
    let platform = config_path().and_then(|p| load_from_path(&p));
    let cwd = load_from_path(Path::new(LOCAL_CONFIG_NAME));

    match (platform, cwd) {
        (None, None) => ConfigFile::default(),
        (Some(p), None) => p,
        (None, Some(c)) => c,
        (Some(p), Some(c)) => merge(p, c),
    }
}

/// Load a config from a specific path. Returns `None` if the file doesn't
/// exist or can't be parsed.
pub fn load_from_path(path: &Path) -> Option<ConfigFile> {
    match read_config(path) {
        Ok(config) => Some(config),
        Err(ConfigError::Read { .. }) => None,
        Err(e) => {
            tracing::warn!(error = %e, "ignoring config file");
            None
        }
    }
}

/// Read and parse a config file, reporting why it could not be used.
pub fn read_config(path: &Path) -> Result<ConfigFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Take a value from `overlay` if it has one, else from `base`.
fn pick<S, T>(overlay: Option<&S>, base: Option<&S>, get: impl Fn(&S) -> Option<T>) -> Option<T> {
    overlay.and_then(&get).or_else(|| base.and_then(&get))
}

/// Merge two configs: `overlay` values take precedence over `base`.
pub fn merge(base: ConfigFile, overlay: ConfigFile) -> ConfigFile {
    let (ba, oa) = (base.api.as_ref(), overlay.api.as_ref());
    let (bi, oi) = (base.input.as_ref(), overlay.input.as_ref());
    let (bo, oo) = (base.output.as_ref(), overlay.output.as_ref());
    let (br, or) = (base.review.as_ref(), overlay.review.as_ref());

    ConfigFile {
        api: Some(ApiConfig {
            key: pick(oa, ba, |a| a.key.clone()),
            model: pick(oa, ba, |a| a.model.clone()),
            base_url: pick(oa, ba, |a| a.base_url.clone()),
            timeout_secs: pick(oa, ba, |a| a.timeout_secs),
        }),
        input: Some(InputConfig {
            directory: pick(oi, bi, |i| i.directory.clone()),
        }),
        output: Some(OutputConfig {
            path: pick(oo, bo, |o| o.path.clone()),
            format: pick(oo, bo, |o| o.format.clone()),
        }),
        review: Some(ReviewConfig {
            topic: pick(or, br, |r| r.topic.clone()),
            strict: pick(or, br, |r| r.strict),
        }),
    }
}
