use std::path::{Path, PathBuf};
use std::time::Duration;

use pages_publish::RemoteTarget;
use pages_publish::target::DEFAULT_API_BASE_URL;
use pages_publish_github::{DEFAULT_TIMEOUT, GitHubContentsConfig};
use serde::{Deserialize, Serialize};

/// Looks up an environment variable. Injected so resolution is testable.
pub type EnvLookup<'a> = &'a dyn Fn(&str) -> Option<String>;

/// Optional settings from the config file. Every field can be overridden by
/// the environment.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct FileConfig {
    pub token: Option<String>,
    pub owner: Option<String>,
    pub repo: Option<String>,
    pub branch: Option<String>,
    pub source_dir: Option<PathBuf>,
    pub api_base_url: Option<String>,
    pub timeout_secs: Option<u64>,
}

/// Errors raised while resolving configuration, before any network I/O.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("GITHUB_REPO_OWNER and GITHUB_REPO_NAME must be set (env or config file)")]
    MissingRepository,

    #[error("GITHUB_TOKEN (or GH_PAT) must be set (env or config file)")]
    MissingToken,

    #[error("timeout_secs must be at least 1")]
    ZeroTimeout,

    #[error("failed to read config at {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config at {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Everything a publish run needs, resolved once at startup.
#[derive(Debug, Clone)]
pub struct Settings {
    pub target: RemoteTarget,
    pub token: String,
    pub source_dir: PathBuf,
    pub timeout: Duration,
}

impl Settings {
    pub fn contents_config(&self) -> GitHubContentsConfig {
        GitHubContentsConfig {
            target: self.target.clone(),
            token: self.token.clone(),
            timeout: self.timeout,
        }
    }
}

pub fn process_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Config file path: `~/.config/pages-publish/config.toml`
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("pages-publish").join("config.toml"))
}

/// Load the config file.
///
/// An explicitly given file must exist and parse. The default file is
/// optional; if it fails to parse we warn and carry on without it.
pub fn load_file(explicit: Option<&Path>) -> Result<FileConfig, ConfigError> {
    if let Some(path) = explicit {
        return read_file(path);
    }

    match config_path() {
        Some(path) if path.is_file() => read_file(&path).or_else(|e| {
            tracing::warn!("{e}, ignoring it");
            Ok(FileConfig::default())
        }),
        _ => Ok(FileConfig::default()),
    }
}

fn read_file(path: &Path) -> Result<FileConfig, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    toml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Trimmed, with empty strings treated as unset.
fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
}

/// First set value wins.
fn first_set(candidates: &[Option<&str>]) -> Option<String> {
    candidates.iter().find_map(|c| non_empty(*c))
}

/// Source directory: `GH_PAGES_SRC`, then the config file, then `cwd`.
/// Relative paths are taken relative to `cwd`.
pub fn resolve_source_dir(env: EnvLookup<'_>, file: &FileConfig, cwd: &Path) -> PathBuf {
    let from_file = file
        .source_dir
        .as_deref()
        .and_then(Path::to_str)
        .map(str::to_owned);
    let configured = first_set(&[env("GH_PAGES_SRC").as_deref(), from_file.as_deref()]);

    match configured {
        Some(dir) => cwd.join(dir),
        None => cwd.to_path_buf(),
    }
}

/// Resolve publish settings. Precedence: environment, config file, defaults.
pub fn resolve(env: EnvLookup<'_>, file: &FileConfig, cwd: &Path) -> Result<Settings, ConfigError> {
    let owner = first_set(&[env("GITHUB_REPO_OWNER").as_deref(), file.owner.as_deref()]);
    let repo = first_set(&[env("GITHUB_REPO_NAME").as_deref(), file.repo.as_deref()]);
    let (Some(owner), Some(repo)) = (owner, repo) else {
        return Err(ConfigError::MissingRepository);
    };

    let token = first_set(&[
        env("GITHUB_TOKEN").as_deref(),
        env("GH_PAT").as_deref(),
        file.token.as_deref(),
    ])
    .ok_or(ConfigError::MissingToken)?;

    let branch = first_set(&[env("GH_PAGES_BRANCH").as_deref(), file.branch.as_deref()])
        .unwrap_or_else(|| "main".into());

    let api_base_url = first_set(&[
        env("GITHUB_API_URL").as_deref(),
        file.api_base_url.as_deref(),
    ])
    .unwrap_or_else(|| DEFAULT_API_BASE_URL.into());

    let timeout = match file.timeout_secs {
        Some(0) => return Err(ConfigError::ZeroTimeout),
        Some(secs) => Duration::from_secs(secs),
        None => DEFAULT_TIMEOUT,
    };

    Ok(Settings {
        target: RemoteTarget::new(owner, repo, branch).with_api_base_url(api_base_url),
        token,
        source_dir: resolve_source_dir(env, file, cwd),
        timeout,
    })
}
