//! Filesystem layout for the provisioned stack
//!
//! Every path is a pure function of the install root, so the whole layout
//! can be pointed at a tempdir in tests.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Well-known port the metastore thrift service binds
pub const METASTORE_PORT: u16 = 9083;

/// Install root and the paths derived from it
#[derive(Debug, Clone)]
pub struct StackPaths {
    /// Directory distributions are unpacked into
    pub root: PathBuf,
}

impl StackPaths {
    /// Resolve the install root
    ///
    /// Resolution order:
    /// 1. CLI override (if provided)
    /// 2. `HIVELET_ROOT` environment variable
    /// 3. The user's home directory
    pub fn discover(cli_override: Option<PathBuf>) -> Result<Self> {
        if let Some(root) = cli_override {
            debug!("using --root override: {}", root.display());
            return Ok(Self { root });
        }

        if let Ok(root) = std::env::var("HIVELET_ROOT") {
            if !root.is_empty() {
                debug!("using HIVELET_ROOT: {root}");
                return Ok(Self {
                    root: PathBuf::from(root),
                });
            }
        }

        let home = dirs::home_dir()
            .context("could not determine a home directory to use as the install root")?;
        Ok(Self { root: home })
    }

    /// Build paths from an explicit root (tests)
    pub fn from_root(root: PathBuf) -> Self {
        Self { root }
    }

    /// Where a distribution with the given directory name lives once unpacked
    pub fn install_dir(&self, dir_name: &str) -> PathBuf {
        self.root.join(dir_name)
    }

    /// Deterministic location of a downloaded archive or jar
    pub fn artifact_path(&self, file_name: &str) -> PathBuf {
        self.root.join(file_name)
    }

    /// Persisted service state (Derby database, warehouse, service log)
    pub fn data_dir(&self) -> PathBuf {
        self.root.join("hivelet-data")
    }

    /// Embedded Derby database backing the metastore
    pub fn derby_dir(&self) -> PathBuf {
        self.data_dir().join("metastore_db")
    }

    /// Warehouse directory handed to the processing engine
    pub fn warehouse_dir(&self) -> PathBuf {
        self.data_dir().join("warehouse")
    }

    /// Combined stdout/stderr of the launched metastore
    pub fn metastore_log(&self) -> PathBuf {
        self.data_dir().join("metastore.log")
    }

    /// Create the data directory tree if missing
    ///
    /// Never touches existing contents; persisted state survives runs
    /// unless an explicit reset removes it first.
    pub fn ensure_data_dirs(&self) -> Result<()> {
        std::fs::create_dir_all(self.warehouse_dir())
            .with_context(|| format!("failed to create {}", self.warehouse_dir().display()))?;
        Ok(())
    }

    /// The metastore site config path inside an unpacked Hive distribution
    pub fn site_config_path(hive_home: &Path) -> PathBuf {
        hive_home.join("conf").join("hive-site.xml")
    }

    /// The Spark defaults file inside an unpacked Spark distribution
    pub fn spark_defaults_path(spark_home: &Path) -> PathBuf {
        spark_home.join("conf").join("spark-defaults.conf")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    #[test]
    fn test_paths_are_pure_functions_of_root() {
        let paths = StackPaths::from_root(PathBuf::from("/sandbox"));
        assert_eq!(
            paths.install_dir("apache-hive-3.1.3-bin"),
            PathBuf::from("/sandbox/apache-hive-3.1.3-bin")
        );
        assert_eq!(
            paths.derby_dir(),
            PathBuf::from("/sandbox/hivelet-data/metastore_db")
        );
        assert_eq!(
            paths.metastore_log(),
            PathBuf::from("/sandbox/hivelet-data/metastore.log")
        );
    }

    #[test]
    fn test_discover_prefers_cli_override() {
        let temp_dir = TempDir::new().unwrap();
        let paths = StackPaths::discover(Some(temp_dir.path().to_path_buf())).unwrap();
        assert_eq!(paths.root, temp_dir.path());
    }

    #[test]
    #[serial(hivelet_root_env)]
    fn test_discover_reads_env_when_no_override() {
        std::env::set_var("HIVELET_ROOT", "/tmp/hivelet-env-test");
        let paths = StackPaths::discover(None).unwrap();
        std::env::remove_var("HIVELET_ROOT");
        assert_eq!(paths.root, PathBuf::from("/tmp/hivelet-env-test"));
    }

    #[test]
    fn test_ensure_data_dirs_preserves_existing_state() {
        let temp_dir = TempDir::new().unwrap();
        let paths = StackPaths::from_root(temp_dir.path().to_path_buf());

        std::fs::create_dir_all(paths.derby_dir()).unwrap();
        std::fs::write(paths.derby_dir().join("seg0"), b"state").unwrap();

        paths.ensure_data_dirs().unwrap();

        assert!(paths.warehouse_dir().exists());
        assert!(paths.derby_dir().join("seg0").exists());
    }
}
