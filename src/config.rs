//! Configuration handling for the asset server

use anyhow::{bail, Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

pub const DEFAULT_LISTEN_ADDRESS: &str = "0.0.0.0:8080";
pub const DEFAULT_STATIC_DIR: &str = "./dist";
pub const DEFAULT_PATH_PREFIX: &str = "/namerequest";
pub const DEFAULT_ENTRY_DOCUMENT: &str = "index.html";
pub const DEFAULT_CONTENT_SECURITY_POLICY: &str = "default-src 'self' https: data: blob: 'unsafe-inline' 'unsafe-eval'; frame-ancestors 'none'";
/// One year
pub const DEFAULT_HSTS_MAX_AGE: u64 = 31_536_000;

const ENV_PREFIX: &str = "NAMEREQUEST_";

/// User configuration for the server. Every field is optional so that a
/// file, the environment and the command line can each fill in a part.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct ServerConfig {
    /// Socket address to bind
    pub listen_address: Option<String>,
    /// Directory holding the built front-end
    pub static_dir: Option<PathBuf>,
    /// URL prefix the front-end is served under
    pub path_prefix: Option<String>,
    /// Document returned for routes with no matching file
    pub entry_document: Option<String>,
    pub content_security_policy: Option<String>,
    /// Seconds for `Strict-Transport-Security`
    pub hsts_max_age: Option<u64>,
    /// Where saved drafts live
    pub draft_dir: Option<PathBuf>,
}

/// Fully resolved settings the server runs with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerSettings {
    pub listen_address: SocketAddr,
    pub static_dir: PathBuf,
    /// Always starts with `/` and never ends with one
    pub path_prefix: String,
    pub entry_document: String,
    pub content_security_policy: String,
    pub hsts_max_age: u64,
    pub draft_dir: Option<PathBuf>,
}

impl ServerConfig {
    /// Get the config file path
    pub fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("ca", "bcregistry", "namerequest")
            .map(|dirs| dirs.config_dir().join("config.json"))
    }

    /// Load configuration from the default location
    pub fn load() -> Result<Self> {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load configuration from a file, or defaults when it does not exist
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let config = serde_json::from_str(&content)
            .with_context(|| format!("parsing {}", path.display()))?;
        Ok(config)
    }

    /// Save configuration to a file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Apply `NAMEREQUEST_*` variables from the process environment
    pub fn with_env(self) -> Result<Self> {
        self.with_vars(std::env::vars())
    }

    /// Apply `NAMEREQUEST_*` variables from the given pairs. Unrelated
    /// names are ignored.
    pub fn with_vars<I>(mut self, vars: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (key, value) in vars {
            let Some(name) = key.strip_prefix(ENV_PREFIX) else {
                continue;
            };
            match name {
                "LISTEN_ADDRESS" => self.listen_address = Some(value),
                "STATIC_DIR" => self.static_dir = Some(value.into()),
                "PATH_PREFIX" => self.path_prefix = Some(value),
                "ENTRY_DOCUMENT" => self.entry_document = Some(value),
                "CONTENT_SECURITY_POLICY" => self.content_security_policy = Some(value),
                "HSTS_MAX_AGE" => {
                    let seconds = value
                        .parse()
                        .with_context(|| format!("{key} must be a number of seconds"))?;
                    self.hsts_max_age = Some(seconds);
                }
                "DRAFT_DIR" => self.draft_dir = Some(value.into()),
                _ => {}
            }
        }
        Ok(self)
    }

    /// Overlay every field that `other` sets
    pub fn merge(self, other: ServerConfig) -> Self {
        Self {
            listen_address: other.listen_address.or(self.listen_address),
            static_dir: other.static_dir.or(self.static_dir),
            path_prefix: other.path_prefix.or(self.path_prefix),
            entry_document: other.entry_document.or(self.entry_document),
            content_security_policy: other
                .content_security_policy
                .or(self.content_security_policy),
            hsts_max_age: other.hsts_max_age.or(self.hsts_max_age),
            draft_dir: other.draft_dir.or(self.draft_dir),
        }
    }

    /// Fill in defaults and validate
    pub fn resolve(self) -> Result<ServerSettings> {
        let listen = self
            .listen_address
            .as_deref()
            .unwrap_or(DEFAULT_LISTEN_ADDRESS);
        let listen_address = listen
            .parse()
            .with_context(|| format!("invalid listen address {listen:?}"))?;

        let entry_document = self
            .entry_document
            .unwrap_or_else(|| DEFAULT_ENTRY_DOCUMENT.to_string());
        if entry_document.is_empty() || entry_document.contains('/') {
            bail!("entry document must be a plain file name, got {entry_document:?}");
        }

        Ok(ServerSettings {
            listen_address,
            static_dir: self
                .static_dir
                .unwrap_or_else(|| PathBuf::from(DEFAULT_STATIC_DIR)),
            path_prefix: normalize_prefix(
                self.path_prefix.as_deref().unwrap_or(DEFAULT_PATH_PREFIX),
            ),
            entry_document,
            content_security_policy: self
                .content_security_policy
                .unwrap_or_else(|| DEFAULT_CONTENT_SECURITY_POLICY.to_string()),
            hsts_max_age: self.hsts_max_age.unwrap_or(DEFAULT_HSTS_MAX_AGE),
            draft_dir: self.draft_dir,
        })
    }
}

/// `namerequest/` and `/namerequest` both become `/namerequest`. An empty
/// or bare `/` prefix serves from the root.
fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{trimmed}")
    }
}
