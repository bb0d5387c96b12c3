//! Spark integration configuration
//!
//! The integration block is appended to `spark-defaults.conf` exactly once,
//! guarded by a sentinel line. On first application every pre-existing line
//! is commented out rather than deleted, so prior customizations stay
//! recoverable by hand.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

use crate::paths::StackPaths;

/// Marker detecting whether the block has already been appended
pub const SENTINEL: &str = "# hivelet: iceberg catalog wiring, managed block";

/// Catalog name registered with Spark and designated the default
pub const CATALOG_NAME: &str = "hive_prod";

/// Everything the integration block needs to know about the stack
#[derive(Debug)]
pub struct IntegrationSettings<'a> {
    pub runtime_jar: &'a Path,
    pub warehouse_dir: &'a Path,
    pub derby_system_home: &'a Path,
    pub metastore_uri: &'a str,
}

/// Apply the integration block to an unpacked Spark distribution
///
/// Returns `true` if the file was rewritten, `false` if the sentinel was
/// already present and nothing was touched. A missing defaults file is
/// treated as empty.
pub fn apply_integration(spark_home: &Path, settings: &IntegrationSettings<'_>) -> Result<bool> {
    let target = StackPaths::spark_defaults_path(spark_home);
    let conf_dir = target
        .parent()
        .context("spark defaults path has no parent directory")?;
    fs::create_dir_all(conf_dir)
        .with_context(|| format!("failed to create {}", conf_dir.display()))?;

    let existing = if target.exists() {
        fs::read_to_string(&target)
            .with_context(|| format!("failed to read {}", target.display()))?
    } else {
        String::new()
    };

    if existing.contains(SENTINEL) {
        debug!("integration block already present in {}", target.display());
        return Ok(false);
    }

    let rewritten = deactivate_then_append(&existing, &render_block(settings));
    fs::write(&target, rewritten)
        .with_context(|| format!("failed to write {}", target.display()))?;

    info!("appended integration block to {}", target.display());
    Ok(true)
}

/// Comment out every existing line, then append the new block
///
/// N input lines become exactly N commented lines followed by the block.
fn deactivate_then_append(existing: &str, block: &str) -> String {
    let mut out = String::new();
    for line in existing.lines() {
        out.push_str("# ");
        out.push_str(line);
        out.push('\n');
    }
    out.push_str(block);
    out
}

fn render_block(settings: &IntegrationSettings<'_>) -> String {
    format!(
        "{SENTINEL}
spark.sql.variable.substitute true
spark.driver.extraJavaOptions -Dderby.system.home={derby_home}
spark.jars {jar}
spark.sql.catalog.{catalog} org.apache.iceberg.spark.SparkCatalog
spark.sql.catalog.{catalog}.type hive
spark.sql.catalog.{catalog}.uri {uri}
spark.sql.catalog.{catalog}.warehouse {warehouse}
spark.sql.defaultCatalog {catalog}
",
        catalog = CATALOG_NAME,
        derby_home = settings.derby_system_home.display(),
        jar = settings.runtime_jar.display(),
        uri = settings.metastore_uri,
        warehouse = settings.warehouse_dir.display(),
    )
}
