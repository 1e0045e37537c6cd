//! Registry file discovery and loading.

use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::registry::ConfigRegistry;
use crate::config::schema::RegistryFile;
use crate::error::{Error, Result};

/// File name searched for when walking up from the working directory.
pub const REGISTRY_FILE_NAME: &str = "stackplan.yaml";

/// Environment variable naming an explicit registry file.
pub const REGISTRY_ENV: &str = "STACKPLAN_REGISTRY";

/// Where a loaded registry came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrySource {
    /// The embedded default registry.
    Builtin,
    /// A registry file on disk.
    File(PathBuf),
}

impl fmt::Display for RegistrySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Builtin => write!(f, "built-in registry"),
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Loads registries from disk.
///
/// # Examples
///
/// ```no_run
/// use stackplan::config::RegistryLoader;
/// use std::path::Path;
///
/// let (registry, source) = RegistryLoader::load(None, Path::new(".")).unwrap();
/// println!("using {source}: {} environments", registry.list_environments().len());
/// ```
pub struct RegistryLoader;

impl RegistryLoader {
    /// Resolve and load the registry for this invocation.
    ///
    /// Precedence: `explicit` path, then `STACKPLAN_REGISTRY`, then the
    /// nearest `stackplan.yaml` walking up from `working_dir`, then the
    /// built-in registry.
    ///
    /// # Errors
    ///
    /// Returns an error if the selected file cannot be read, parsed, or
    /// validated. An explicitly named file that does not exist is an error;
    /// it never falls back to the built-in registry.
    pub fn load(
        explicit: Option<&Path>,
        working_dir: &Path,
    ) -> Result<(ConfigRegistry, RegistrySource)> {
        let path = match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => match env::var(REGISTRY_ENV) {
                Ok(value) if !value.trim().is_empty() => Some(PathBuf::from(value)),
                _ => Self::discover(working_dir),
            },
        };

        match path {
            Some(path) => {
                log::debug!("loading registry from {}", path.display());
                let registry = ConfigRegistry::from_file(Self::load_file(&path)?)?;
                Ok((registry, RegistrySource::File(path)))
            }
            None => {
                log::debug!("no registry file found, using built-in registry");
                Ok((ConfigRegistry::builtin()?, RegistrySource::Builtin))
            }
        }
    }

    /// Walk up from `start_dir` looking for `stackplan.yaml`.
    #[must_use]
    pub fn discover(start_dir: &Path) -> Option<PathBuf> {
        let mut current = start_dir.to_path_buf();
        loop {
            let candidate = current.join(REGISTRY_FILE_NAME);
            if candidate.is_file() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Load and parse a YAML registry file without validating it.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or the YAML is invalid.
    pub fn load_file(path: &Path) -> Result<RegistryFile> {
        let contents = fs::read_to_string(path).map_err(|e| Error::InvalidPath {
            path: path.to_path_buf(),
            reason: format!("failed to read registry file: {e}"),
        })?;

        serde_yaml::from_str(&contents).map_err(|e| Error::Validation {
            field: format!("{}", path.display()),
            message: format!("invalid YAML: {e}"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::registry::BUILTIN_REGISTRY;
    use serial_test::serial;
    use tempfile::TempDir;

    fn without_registry_env<T>(f: impl FnOnce() -> T) -> T {
        let saved = env::var(REGISTRY_ENV).ok();
        env::remove_var(REGISTRY_ENV);
        let result = f();
        if let Some(val) = saved {
            env::set_var(REGISTRY_ENV, val);
        }
        result
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = RegistryLoader::load_file(Path::new("/nonexistent/stackplan.yaml"));
        assert!(matches!(result, Err(Error::InvalidPath { .. })));
    }

    #[test]
    fn test_load_invalid_yaml() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("bad.yaml");
        fs::write(&path, "app: [unterminated").unwrap();
        assert!(matches!(
            RegistryLoader::load_file(&path),
            Err(Error::Validation { .. })
        ));
    }

    #[test]
    fn test_discover_walks_up() {
        let temp_dir = TempDir::new().unwrap();
        let child = temp_dir.path().join("services").join("ingest");
        fs::create_dir_all(&child).unwrap();
        fs::write(temp_dir.path().join(REGISTRY_FILE_NAME), BUILTIN_REGISTRY).unwrap();

        let found = RegistryLoader::discover(&child).unwrap();
        assert_eq!(found, temp_dir.path().join(REGISTRY_FILE_NAME));
    }

    #[test]
    #[serial]
    fn test_load_falls_back_to_builtin() {
        let temp_dir = TempDir::new().unwrap();
        let (registry, source) =
            without_registry_env(|| RegistryLoader::load(None, temp_dir.path())).unwrap();
        assert_eq!(source, RegistrySource::Builtin);
        assert_eq!(registry.app().name, "streamr-p2p");
    }

    #[test]
    #[serial]
    fn test_explicit_path_wins() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("custom.yaml");
        fs::write(&path, BUILTIN_REGISTRY.replace("streamr-p2p", "relay")).unwrap();

        let (registry, source) =
            without_registry_env(|| RegistryLoader::load(Some(&path), temp_dir.path())).unwrap();
        assert_eq!(source, RegistrySource::File(path));
        assert_eq!(registry.app().name, "relay");
    }

    #[test]
    #[serial]
    fn test_env_var_selects_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("from-env.yaml");
        fs::write(&path, BUILTIN_REGISTRY.replace("streamr-team", "media-team")).unwrap();

        let saved = env::var(REGISTRY_ENV).ok();
        env::set_var(REGISTRY_ENV, &path);
        let result = RegistryLoader::load(None, temp_dir.path());
        match saved {
            Some(val) => env::set_var(REGISTRY_ENV, val),
            None => env::remove_var(REGISTRY_ENV),
        }

        let (registry, _) = result.unwrap();
        assert_eq!(registry.app().owner, "media-team");
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("missing.yaml");
        assert!(RegistryLoader::load(Some(&missing), temp_dir.path()).is_err());
    }
}
