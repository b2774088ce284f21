//! Named connection resolution.
//!
//! # Design
//! - The first search directory holding either `connections.toml` or
//!   `config.toml` wins outright; lower-priority directories are never merged in.
//! - Within the winning directory `connections.toml` beats `config.toml`.
//! - After parsing, the `private_key_path` alias is applied, then
//!   `SNOWFLAKE_CONNECTIONS_<NAME>_<FIELD>` variables override file values.
//! - Nothing is cached: every lookup re-reads the files.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;
use tracing::debug;

use crate::error::{ConfigError, ConfigResult};
use crate::model::Connection;
use crate::paths::{EnvSnapshot, Platform, override_var, search_dirs};
use crate::source::{ConfigFs, OsFs};

/// Flat file: each connection is a top-level table.
pub const CONNECTIONS_FILE: &str = "connections.toml";
/// Nested file: connections live under `[connections.<name>]`.
pub const CONFIG_FILE: &str = "config.toml";

/// Resolved connections keyed by name.
pub type ConnectionMap = BTreeMap<String, Connection>;

/// Shape of a discovered connection file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileLayout {
    /// `connections.toml`
    Flat,
    /// `config.toml`
    Nested,
}

/// Connection file chosen by the search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatedFile {
    /// Absolute path of the file.
    pub path: PathBuf,
    /// How connections are laid out inside it.
    pub layout: FileLayout,
    /// Raw TOML contents.
    pub contents: String,
}

/// Find the winning connection file across `dirs`.
///
/// Directories are tried in priority order and the first one holding either
/// file wins. Within that directory `connections.toml` is preferred over
/// `config.toml`; a `connections.toml` in a lower-priority directory never
/// beats a `config.toml` in a higher one.
///
/// # Errors
///
/// Returns [`ConfigError::ConfigurationUnavailable`] when no directory holds
/// either file, or an IO error if a present file cannot be read.
pub fn locate(fs: &dyn ConfigFs, dirs: &[PathBuf]) -> ConfigResult<LocatedFile> {
    for dir in dirs {
        for (name, layout) in [
            (CONNECTIONS_FILE, FileLayout::Flat),
            (CONFIG_FILE, FileLayout::Nested),
        ] {
            let path = dir.join(name);
            if let Some(contents) = fs.read_optional(&path)? {
                debug!(path = %path.display(), "using connection file");
                return Ok(LocatedFile {
                    path,
                    layout,
                    contents,
                });
            }
        }
    }
    Err(ConfigError::ConfigurationUnavailable)
}

/// Parse the connections out of a located file.
///
/// Top-level keys that are not tables (for example a default connection name)
/// are skipped.
///
/// # Errors
///
/// Returns an error when the file is not valid TOML or a connection table has
/// fields of the wrong type.
pub fn parse_connections(file: &LocatedFile) -> ConfigResult<ConnectionMap> {
    #[derive(Deserialize)]
    struct NestedFile {
        #[serde(default)]
        connections: toml::Table,
    }

    let parse_error = |source| ConfigError::Parse {
        path: file.path.clone(),
        source,
    };
    let tables = match file.layout {
        FileLayout::Flat => toml::from_str::<toml::Table>(&file.contents).map_err(parse_error)?,
        FileLayout::Nested => {
            toml::from_str::<NestedFile>(&file.contents)
                .map_err(parse_error)?
                .connections
        }
    };

    let mut connections = ConnectionMap::new();
    for (name, value) in tables {
        if !value.is_table() {
            continue;
        }
        let connection = value
            .try_into::<Connection>()
            .map_err(|source| ConfigError::InvalidConnection {
                name: name.clone(),
                source,
            })?;
        connections.insert(name, connection);
    }
    Ok(connections)
}

/// Override file values with `SNOWFLAKE_CONNECTIONS_<NAME>_<FIELD>` variables.
///
/// Only connections already present are touched; a variable that is set but
/// empty still overrides.
pub fn apply_env_overrides(connections: &mut ConnectionMap, env: &EnvSnapshot) {
    for (name, conn) in connections.iter_mut() {
        let lookup = |field: &str| env.get(&override_var(name, field)).map(str::to_string);
        if let Some(value) = lookup("Account") {
            conn.account = value;
        }
        if let Some(value) = lookup("User") {
            conn.user = value;
        }
        if let Some(value) = lookup("Private_Key_File") {
            conn.private_key_file = Some(value);
        }
        if let Some(value) = lookup("Token") {
            conn.token = Some(value);
        }
        if let Some(value) = lookup("Authenticator") {
            conn.authenticator = value;
        }
        if let Some(value) = lookup("Private_Key_Path") {
            conn.private_key_path = Some(value);
        }
        if let Some(value) = lookup("Role") {
            conn.role = Some(value);
        }
    }
}

/// Resolve every connection from search directories, files and environment.
///
/// # Errors
///
/// Propagates [`locate`] and [`parse_connections`] failures.
pub fn resolve_connections(
    fs: &dyn ConfigFs,
    dirs: &[PathBuf],
    env: &EnvSnapshot,
) -> ConfigResult<ConnectionMap> {
    let file = locate(fs, dirs)?;
    let mut connections = parse_connections(&file)?;
    for conn in connections.values_mut() {
        conn.apply_key_path_alias();
    }
    apply_env_overrides(&mut connections, env);
    Ok(connections)
}

#[derive(Clone)]
enum Context {
    Live {
        platform: Platform,
    },
    Fixed {
        dirs: Vec<PathBuf>,
        env: EnvSnapshot,
    },
}

/// Lookup facade over connection files.
#[derive(Clone)]
pub struct ConnectionStore {
    fs: Arc<dyn ConfigFs>,
    context: Context,
}

impl ConnectionStore {
    /// Store backed by the real file system, home directory and process
    /// environment; both are re-read on every lookup.
    #[must_use]
    pub fn from_environment() -> Self {
        Self {
            fs: Arc::new(OsFs),
            context: Context::Live {
                platform: Platform::current(),
            },
        }
    }

    /// Store with explicit search directories and environment.
    #[must_use]
    pub fn new(fs: Arc<dyn ConfigFs>, dirs: Vec<PathBuf>, env: EnvSnapshot) -> Self {
        Self {
            fs,
            context: Context::Fixed { dirs, env },
        }
    }

    /// Store whose directories are derived from `env`, `home` and `platform`.
    #[must_use]
    pub fn discover(
        fs: Arc<dyn ConfigFs>,
        env: EnvSnapshot,
        home: Option<&Path>,
        platform: Platform,
    ) -> Self {
        let dirs = search_dirs(&env, home, platform);
        Self::new(fs, dirs, env)
    }

    /// Every resolved connection.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ConfigurationUnavailable`] when no file is found,
    /// or a parse/IO error for the winning file.
    pub fn list(&self) -> ConfigResult<ConnectionMap> {
        match &self.context {
            Context::Live { platform } => {
                let env = EnvSnapshot::capture();
                let home = dirs::home_dir();
                let dirs = search_dirs(&env, home.as_deref(), *platform);
                resolve_connections(self.fs.as_ref(), &dirs, &env)
            }
            Context::Fixed { dirs, env } => resolve_connections(self.fs.as_ref(), dirs, env),
        }
    }

    /// One connection by name.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ConnectionNotFound`] when the name is absent after
    /// merging, or any error from [`Self::list`].
    pub fn get(&self, name: &str) -> ConfigResult<Connection> {
        self.list()?
            .remove(name)
            .ok_or_else(|| ConfigError::ConnectionNotFound {
                name: name.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paths::{ENV_SNOWFLAKE_HOME, ENV_XDG_CONFIG_HOME};
    use crate::source::MemoryFs;
    use anyhow::Result;
    use publisher_test_support::fixtures::ConfigTree;

    const FLAT: &str = r#"
[default]
account = "acme"
user = "alice"
authenticator = "snowflake_jwt"
private_key_file = "/keys/default.p8"
warehouse = "ignored"

[workbench]
account = "acme"
authenticator = "oauth"
token = "oauth-token"
"#;

    const NESTED: &str = r#"
default_connection_name = "legacy"

[connections.legacy]
account = "older"
user = "bob"
private_key_path = "/keys/legacy.p8"
"#;

    fn dirs() -> Vec<PathBuf> {
        vec![
            PathBuf::from("/high"),
            PathBuf::from("/mid"),
            PathBuf::from("/low"),
        ]
    }

    #[test]
    fn flat_file_parses_and_ignores_unknown_fields() -> Result<()> {
        let fs = MemoryFs::new().with_file("/mid/connections.toml", FLAT);
        let conns = resolve_connections(&fs, &dirs(), &EnvSnapshot::default())?;
        assert_eq!(conns.len(), 2);
        let default = &conns["default"];
        assert_eq!(default.account, "acme");
        assert_eq!(default.user, "alice");
        assert_eq!(default.private_key_file.as_deref(), Some("/keys/default.p8"));
        assert_eq!(conns["workbench"].token.as_deref(), Some("oauth-token"));
        Ok(())
    }

    #[test]
    fn nested_file_reads_connections_table_and_applies_alias() -> Result<()> {
        let fs = MemoryFs::new().with_file("/low/config.toml", NESTED);
        let conns = resolve_connections(&fs, &dirs(), &EnvSnapshot::default())?;
        assert_eq!(conns.len(), 1);
        assert_eq!(
            conns["legacy"].private_key_file.as_deref(),
            Some("/keys/legacy.p8")
        );
        Ok(())
    }

    #[test]
    fn higher_priority_directory_wins_entirely() -> Result<()> {
        let fs = MemoryFs::new()
            .with_file("/high/connections.toml", FLAT)
            .with_file("/low/config.toml", NESTED);
        let conns = resolve_connections(&fs, &dirs(), &EnvSnapshot::default())?;
        assert!(conns.contains_key("default"));
        assert!(!conns.contains_key("legacy"));
        Ok(())
    }

    #[test]
    fn config_toml_in_higher_directory_beats_lower_connections_toml() -> Result<()> {
        let fs = MemoryFs::new()
            .with_file("/high/config.toml", NESTED)
            .with_file("/low/connections.toml", FLAT);
        let conns = resolve_connections(&fs, &dirs(), &EnvSnapshot::default())?;
        assert_eq!(conns.keys().collect::<Vec<_>>(), vec!["legacy"]);
        Ok(())
    }

    #[test]
    fn connections_toml_preferred_within_same_directory() -> Result<()> {
        let fs = MemoryFs::new()
            .with_file("/mid/config.toml", NESTED)
            .with_file("/mid/connections.toml", FLAT);
        let located = locate(&fs, &dirs())?;
        assert_eq!(located.layout, FileLayout::Flat);
        assert_eq!(located.path, PathBuf::from("/mid/connections.toml"));
        Ok(())
    }

    #[test]
    fn missing_files_report_configuration_unavailable() {
        let result = resolve_connections(&MemoryFs::new(), &dirs(), &EnvSnapshot::default());
        assert!(matches!(result, Err(ConfigError::ConfigurationUnavailable)));
    }

    #[test]
    fn malformed_toml_reports_parse_error_with_path() {
        let fs = MemoryFs::new().with_file("/high/connections.toml", "[default\naccount=");
        let result = resolve_connections(&fs, &dirs(), &EnvSnapshot::default());
        match result {
            Err(ConfigError::Parse { path, .. }) => {
                assert_eq!(path, PathBuf::from("/high/connections.toml"));
            }
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn wrongly_typed_fields_report_invalid_connection() {
        let fs = MemoryFs::new().with_file("/high/connections.toml", "[bad]\naccount = 42\n");
        let result = resolve_connections(&fs, &dirs(), &EnvSnapshot::default());
        assert!(matches!(
            result,
            Err(ConfigError::InvalidConnection { ref name, .. }) if name == "bad"
        ));
    }

    #[test]
    fn env_override_targets_only_named_connection() -> Result<()> {
        let fs = MemoryFs::new().with_file("/high/connections.toml", FLAT);
        let env = EnvSnapshot::from_pairs([("SNOWFLAKE_CONNECTIONS_DEFAULT_ACCOUNT", "x")]);
        let conns = resolve_connections(&fs, &dirs(), &env)?;
        assert_eq!(conns["default"].account, "x");
        assert_eq!(conns["workbench"].account, "acme");
        Ok(())
    }

    #[test]
    fn env_overrides_cover_every_field() -> Result<()> {
        let fs = MemoryFs::new().with_file("/high/connections.toml", FLAT);
        let env = EnvSnapshot::from_pairs([
            ("SNOWFLAKE_CONNECTIONS_WORKBENCH_USER", "carol"),
            ("SNOWFLAKE_CONNECTIONS_WORKBENCH_PRIVATE_KEY_FILE", "/env/key.p8"),
            ("SNOWFLAKE_CONNECTIONS_WORKBENCH_TOKEN", "env-token"),
            ("SNOWFLAKE_CONNECTIONS_WORKBENCH_AUTHENTICATOR", "snowflake_jwt"),
            ("SNOWFLAKE_CONNECTIONS_WORKBENCH_PRIVATE_KEY_PATH", "/env/alias.p8"),
            ("SNOWFLAKE_CONNECTIONS_WORKBENCH_ROLE", "PUBLISHER"),
        ]);
        let conns = resolve_connections(&fs, &dirs(), &env)?;
        let workbench = &conns["workbench"];
        assert_eq!(workbench.user, "carol");
        assert_eq!(workbench.private_key_file.as_deref(), Some("/env/key.p8"));
        assert_eq!(workbench.token.as_deref(), Some("env-token"));
        assert_eq!(workbench.authenticator, "snowflake_jwt");
        assert_eq!(workbench.private_key_path.as_deref(), Some("/env/alias.p8"));
        assert_eq!(workbench.role.as_deref(), Some("PUBLISHER"));
        Ok(())
    }

    #[test]
    fn env_cannot_create_connections() -> Result<()> {
        let fs = MemoryFs::new().with_file("/high/connections.toml", FLAT);
        let env = EnvSnapshot::from_pairs([("SNOWFLAKE_CONNECTIONS_GHOST_ACCOUNT", "x")]);
        let store = ConnectionStore::new(Arc::new(fs), dirs(), env);
        assert!(matches!(
            store.get("ghost"),
            Err(ConfigError::ConnectionNotFound { ref name }) if name == "ghost"
        ));
        Ok(())
    }

    #[test]
    fn store_discovers_directories_from_snapshot() -> Result<()> {
        let tree = ConfigTree::new()?;
        tree.write("sf-home/config.toml", NESTED)?;
        tree.write("home/.snowflake/connections.toml", FLAT)?;
        let sf_home = tree.path().join("sf-home");
        let env = EnvSnapshot::from_pairs([
            (ENV_SNOWFLAKE_HOME, sf_home.to_string_lossy().into_owned()),
            (ENV_XDG_CONFIG_HOME, String::new()),
        ]);
        let home = tree.path().join("home");
        let store = ConnectionStore::discover(Arc::new(OsFs), env, Some(&home), Platform::Linux);

        let legacy = store.get("legacy")?;
        assert_eq!(legacy.user, "bob");
        assert!(store.get("default").is_err());
        Ok(())
    }

    #[test]
    fn store_rereads_files_on_every_lookup() -> Result<()> {
        let tree = ConfigTree::new()?;
        let home = tree.path().to_path_buf();
        tree.write(".snowflake/connections.toml", "[first]\naccount = \"a\"\n")?;
        let store = ConnectionStore::discover(
            Arc::new(OsFs),
            EnvSnapshot::default(),
            Some(&home),
            Platform::Other,
        );
        assert!(store.get("first").is_ok());

        tree.write(".snowflake/connections.toml", "[second]\naccount = \"b\"\n")?;
        assert!(store.get("first").is_err());
        assert_eq!(store.get("second")?.account, "b");
        Ok(())
    }
}
