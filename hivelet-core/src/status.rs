//! Non-destructive report of what is provisioned
//!
//! Purely observational: existence checks and one TCP probe, no writes.

use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::distro::Distribution;
use crate::paths::{StackPaths, METASTORE_PORT};
use crate::provision::Stack;
use crate::spark_config::SENTINEL;

/// Install state of one distribution
#[derive(Debug, Serialize)]
pub struct ComponentStatus {
    pub version: String,
    pub installed: bool,
    pub install_dir: PathBuf,
}

/// Snapshot of the provisioned stack
#[derive(Debug, Serialize)]
pub struct StackStatus {
    pub root: PathBuf,
    pub hive: ComponentStatus,
    pub hadoop: ComponentStatus,
    /// Absent when no Spark version is set
    pub spark: Option<ComponentStatus>,
    pub site_config_present: bool,
    /// Absent when no Spark version is set
    pub integration_configured: Option<bool>,
    pub data_dir_present: bool,
    pub metastore_listening: bool,
}

impl StackStatus {
    pub async fn collect(stack: &Stack) -> Self {
        let hive = component(&stack.paths, Distribution::hive(&stack.versions.hive));
        let hadoop = component(&stack.paths, Distribution::hadoop(&stack.versions.hadoop));
        let spark = stack
            .versions
            .spark
            .as_deref()
            .map(|version| component(&stack.paths, Distribution::spark(version)));

        let site_config_present = StackPaths::site_config_path(&hive.install_dir).exists();

        let integration_configured = spark.as_ref().map(|component| {
            let defaults = StackPaths::spark_defaults_path(&component.install_dir);
            std::fs::read_to_string(defaults)
                .map(|content| content.contains(SENTINEL))
                .unwrap_or(false)
        });

        Self {
            root: stack.paths.root.clone(),
            hive,
            hadoop,
            spark,
            site_config_present,
            integration_configured,
            data_dir_present: stack.paths.data_dir().exists(),
            metastore_listening: port_accepts(METASTORE_PORT).await,
        }
    }
}

fn component(paths: &StackPaths, dist: Distribution) -> ComponentStatus {
    let install_dir = paths.install_dir(dist.install_dir_name());
    ComponentStatus {
        version: dist.version.clone(),
        installed: install_dir.exists(),
        install_dir,
    }
}

async fn port_accepts(port: u16) -> bool {
    let addr = format!("127.0.0.1:{port}");
    matches!(
        tokio::time::timeout(
            Duration::from_millis(500),
            tokio::net::TcpStream::connect(&addr),
        )
        .await,
        Ok(Ok(_))
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::versions::Versions;
    use tempfile::TempDir;

    fn stack_in(temp_dir: &TempDir, spark: Option<&str>) -> Stack {
        let spark = spark.map(|v| v.to_string());
        Stack {
            versions: Versions::from_lookup(move |key| match key {
                "SPARK_VERSION" => spark.clone(),
                _ => None,
            }),
            paths: StackPaths::from_root(temp_dir.path().to_path_buf()),
        }
    }

    #[tokio::test]
    async fn test_fresh_root_reports_nothing_installed() {
        let temp_dir = TempDir::new().unwrap();
        let status = StackStatus::collect(&stack_in(&temp_dir, None)).await;

        assert!(!status.hive.installed);
        assert!(!status.hadoop.installed);
        assert!(status.spark.is_none());
        assert!(!status.site_config_present);
        assert!(status.integration_configured.is_none());
        assert!(!status.data_dir_present);
    }

    #[tokio::test]
    async fn test_installed_components_are_reported() {
        let temp_dir = TempDir::new().unwrap();
        let stack = stack_in(&temp_dir, Some("3.5.1"));

        let hive_home = stack.paths.install_dir("apache-hive-3.1.3-bin");
        std::fs::create_dir_all(hive_home.join("conf")).unwrap();
        std::fs::write(StackPaths::site_config_path(&hive_home), "<configuration/>").unwrap();

        let spark_home = stack.paths.install_dir("spark-3.5.1-bin-hadoop3");
        std::fs::create_dir_all(spark_home.join("conf")).unwrap();
        std::fs::write(
            StackPaths::spark_defaults_path(&spark_home),
            format!("{SENTINEL}\n"),
        )
        .unwrap();

        let status = StackStatus::collect(&stack).await;

        assert!(status.hive.installed);
        assert!(status.site_config_present);
        assert_eq!(status.spark.as_ref().map(|c| c.installed), Some(true));
        assert_eq!(status.integration_configured, Some(true));
    }

    #[tokio::test]
    async fn test_status_serializes_to_json() {
        let temp_dir = TempDir::new().unwrap();
        let status = StackStatus::collect(&stack_in(&temp_dir, None)).await;

        let json = serde_json::to_value(&status).unwrap();
        assert!(json.get("hive").is_some());
        assert!(json.get("metastore_listening").is_some());
    }
}
