//! Metastore site configuration
//!
//! The site config is always written whole: create or truncate, never
//! merge. Re-running the pipeline rewrites the same fixed document.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::paths::StackPaths;

/// Write the fixed site config into an unpacked Hive distribution
///
/// Returns the path written. Prior file content, if any, is discarded.
pub fn write_site_config(hive_home: &Path, paths: &StackPaths) -> Result<PathBuf> {
    let target = StackPaths::site_config_path(hive_home);
    let conf_dir = target
        .parent()
        .context("site config path has no parent directory")?;
    fs::create_dir_all(conf_dir)
        .with_context(|| format!("failed to create {}", conf_dir.display()))?;

    let content = render_site_config(&paths.derby_dir());
    fs::write(&target, content)
        .with_context(|| format!("failed to write {}", target.display()))?;

    info!("wrote metastore site config to {}", target.display());
    Ok(target)
}

/// The fixed configuration document
///
/// Impersonation off, no child-process local tasks, one compaction worker,
/// local execution framework, embedded Derby store, and the notification
/// auth check disabled: the shape of a single-user throwaway metastore.
fn render_site_config(derby_dir: &Path) -> String {
    format!(
        r#"<?xml version="1.0"?>
<?xml-stylesheet type="text/xsl" href="configuration.xsl"?>
<configuration>
  <property>
    <name>hive.server2.enable.doAs</name>
    <value>false</value>
  </property>
  <property>
    <name>hive.exec.submit.local.task.via.child</name>
    <value>false</value>
  </property>
  <property>
    <name>hive.compactor.worker.threads</name>
    <value>1</value>
  </property>
  <property>
    <name>mapreduce.framework.name</name>
    <value>local</value>
  </property>
  <property>
    <name>javax.jdo.option.ConnectionURL</name>
    <value>jdbc:derby:;databaseName={derby};create=true</value>
  </property>
  <property>
    <name>hive.metastore.event.db.notification.api.auth</name>
    <value>false</value>
  </property>
</configuration>
"#,
        derby = derby_dir.display()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    const REQUIRED_PROPERTIES: &[&str] = &[
        "hive.server2.enable.doAs",
        "hive.exec.submit.local.task.via.child",
        "hive.compactor.worker.threads",
        "mapreduce.framework.name",
        "javax.jdo.option.ConnectionURL",
        "hive.metastore.event.db.notification.api.auth",
    ];

    #[test]
    fn test_all_required_properties_present() {
        let content = render_site_config(Path::new("/sandbox/hivelet-data/metastore_db"));
        for property in REQUIRED_PROPERTIES {
            assert!(
                content.contains(&format!("<name>{property}</name>")),
                "site config should set {property}"
            );
        }
        assert_eq!(content.matches("<property>").count(), 6);
    }

    #[test]
    fn test_connection_url_embeds_derby_path() {
        let content = render_site_config(Path::new("/sandbox/hivelet-data/metastore_db"));
        assert!(content.contains(
            "jdbc:derby:;databaseName=/sandbox/hivelet-data/metastore_db;create=true"
        ));
    }

    #[test]
    fn test_prior_content_is_overwritten() {
        let temp_dir = TempDir::new().unwrap();
        let paths = StackPaths::from_root(temp_dir.path().to_path_buf());
        let hive_home = temp_dir.path().join("apache-hive-3.1.3-bin");

        let target = StackPaths::site_config_path(&hive_home);
        fs::create_dir_all(target.parent().unwrap()).unwrap();
        fs::write(&target, "<configuration>user edits</configuration>").unwrap();

        write_site_config(&hive_home, &paths).unwrap();

        let written = fs::read_to_string(&target).unwrap();
        assert!(!written.contains("user edits"));
        assert_eq!(written, render_site_config(&paths.derby_dir()));
    }

    #[test]
    fn test_rewrites_are_stable() {
        let temp_dir = TempDir::new().unwrap();
        let paths = StackPaths::from_root(temp_dir.path().to_path_buf());
        let hive_home = temp_dir.path().join("apache-hive-3.1.3-bin");

        let target = write_site_config(&hive_home, &paths).unwrap();
        let first = fs::read_to_string(&target).unwrap();

        write_site_config(&hive_home, &paths).unwrap();
        let second = fs::read_to_string(&target).unwrap();

        assert_eq!(first, second);
    }
}
