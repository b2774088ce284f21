//! Search-path discovery for connection files.
//!
//! # Design
//! - Directory discovery is a pure function of an environment snapshot, a
//!   home directory and a platform, so the priority rules are testable
//!   without touching the real process environment.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Environment variable naming an explicit configuration home.
pub const ENV_SNOWFLAKE_HOME: &str = "SNOWFLAKE_HOME";
/// XDG base directory variable.
pub const ENV_XDG_CONFIG_HOME: &str = "XDG_CONFIG_HOME";
/// Prefix of per-connection, per-field overrides.
pub const ENV_CONNECTION_PREFIX: &str = "SNOWFLAKE_CONNECTIONS";

/// Immutable copy of the environment variables relevant to resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvSnapshot {
    vars: BTreeMap<String, String>,
}

impl EnvSnapshot {
    /// Capture the current process environment, skipping non UTF-8 entries.
    #[must_use]
    pub fn capture() -> Self {
        let vars = std::env::vars_os()
            .filter_map(|(key, value)| Some((key.into_string().ok()?, value.into_string().ok()?)))
            .collect();
        Self { vars }
    }

    /// Build a snapshot from explicit pairs.
    #[must_use]
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let vars = pairs
            .into_iter()
            .map(|(key, value)| (key.into(), value.into()))
            .collect();
        Self { vars }
    }

    /// Look up a variable; set-but-empty variables are returned as `Some("")`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    fn non_empty(&self, key: &str) -> Option<&str> {
        self.get(key).filter(|value| !value.is_empty())
    }
}

/// Operating system family selecting the platform default directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    /// `%USERPROFILE%\AppData\Local\snowflake`
    Windows,
    /// `~/Library/Application Support/snowflake`
    MacOs,
    /// `~/.config/snowflake`
    Linux,
    /// No platform default.
    Other,
}

impl Platform {
    /// Platform the binary was compiled for.
    #[must_use]
    pub const fn current() -> Self {
        if cfg!(target_os = "windows") {
            Self::Windows
        } else if cfg!(target_os = "macos") {
            Self::MacOs
        } else if cfg!(target_os = "linux") {
            Self::Linux
        } else {
            Self::Other
        }
    }

    fn default_dir(self, home: &Path) -> Option<PathBuf> {
        match self {
            Self::Windows => Some(home.join("AppData").join("Local").join("snowflake")),
            Self::MacOs => Some(
                home.join("Library")
                    .join("Application Support")
                    .join("snowflake"),
            ),
            Self::Linux => Some(home.join(".config").join("snowflake")),
            Self::Other => None,
        }
    }
}

/// Candidate configuration directories, highest priority first.
#[must_use]
pub fn search_dirs(env: &EnvSnapshot, home: Option<&Path>, platform: Platform) -> Vec<PathBuf> {
    let mut dirs = Vec::with_capacity(4);
    if let Some(snowflake_home) = env.non_empty(ENV_SNOWFLAKE_HOME) {
        dirs.push(PathBuf::from(snowflake_home));
    }
    if let Some(home) = home {
        dirs.push(home.join(".snowflake"));
    }
    if let Some(xdg) = env.non_empty(ENV_XDG_CONFIG_HOME) {
        dirs.push(PathBuf::from(xdg).join("snowflake"));
    }
    if let Some(default_dir) = home.and_then(|home| platform.default_dir(home)) {
        dirs.push(default_dir);
    }
    dirs
}

/// Name of the override variable for one connection field.
#[must_use]
pub fn override_var(connection: &str, field: &str) -> String {
    format!(
        "{ENV_CONNECTION_PREFIX}_{}_{}",
        connection.to_uppercase(),
        field.to_uppercase()
    )
}
