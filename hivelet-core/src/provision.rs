//! The provisioning pipelines
//!
//! Strictly linear, re-entrant sequences: resolve versions and paths once,
//! ensure artifacts, materialize configuration, then hand the port to a
//! fresh service process. Each step either fully succeeds or aborts the
//! run.

use anyhow::Result;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info};

use crate::distro::{Distribution, RuntimeJar};
use crate::fetcher::Fetcher;
use crate::paths::{StackPaths, METASTORE_PORT};
use crate::site_config;
use crate::spark_config::{self, IntegrationSettings};
use crate::supervisor::{self, PortTakeover};
use crate::versions::Versions;

/// How long the opt-in readiness probe keeps trying
pub const READY_TIMEOUT: Duration = Duration::from_secs(30);

/// Everything one provisioning run needs, resolved once at startup
///
/// No step reads the environment after this is built.
#[derive(Debug, Clone)]
pub struct Stack {
    pub versions: Versions,
    pub paths: StackPaths,
}

impl Stack {
    pub fn resolve(root_override: Option<PathBuf>) -> Result<Self> {
        Ok(Self {
            versions: Versions::from_env(),
            paths: StackPaths::discover(root_override)?,
        })
    }
}

/// Run-level switches taken from the command line
#[derive(Debug, Clone, Default)]
pub struct ProvisionOptions {
    /// Wipe persisted state and reinitialize the schema before launch
    pub reset: bool,
    /// Probe the service port after launch instead of returning immediately
    pub wait_ready: bool,
}

/// Variant 1: metastore only
pub async fn provision_metastore(stack: &Stack, opts: &ProvisionOptions) -> Result<()> {
    let fetcher = Fetcher::new(stack.paths.clone())?;

    let hive = Distribution::hive(&stack.versions.hive);
    let hadoop = Distribution::hadoop(&stack.versions.hadoop);
    let hive_home = fetcher.ensure_installed(&hive).await?;
    let hadoop_home = fetcher.ensure_installed(&hadoop).await?;

    stack.paths.ensure_data_dirs()?;
    site_config::write_site_config(&hive_home, &stack.paths)?;

    // A full reset wipes the whole data dir, warehouse included
    restart(stack, &hive_home, &hadoop_home, stack.paths.data_dir(), opts).await
}

/// Variant 2: metastore plus Spark wired through the Iceberg runtime
pub async fn provision_spark(stack: &Stack, opts: &ProvisionOptions) -> Result<()> {
    // Hard precondition: without a Spark version nothing is downloaded
    let spark_version = stack.versions.spark()?.to_string();
    let spark_compat = stack.versions.spark_compat()?;

    let fetcher = Fetcher::new(stack.paths.clone())?;

    let hive = Distribution::hive(&stack.versions.hive);
    let hadoop = Distribution::hadoop(&stack.versions.hadoop);
    let spark = Distribution::spark(&spark_version);
    let hive_home = fetcher.ensure_installed(&hive).await?;
    let hadoop_home = fetcher.ensure_installed(&hadoop).await?;
    let spark_home = fetcher.ensure_installed(&spark).await?;

    let jar = RuntimeJar::iceberg_spark(&spark_compat, &stack.versions.iceberg);
    let runtime_jar = fetcher.ensure_jar(&jar).await?;

    stack.paths.ensure_data_dirs()?;
    site_config::write_site_config(&hive_home, &stack.paths)?;

    let warehouse_dir = stack.paths.warehouse_dir();
    let derby_system_home = stack.paths.data_dir();
    let uri = metastore_uri();
    let settings = IntegrationSettings {
        runtime_jar: &runtime_jar,
        warehouse_dir: &warehouse_dir,
        derby_system_home: &derby_system_home,
        metastore_uri: &uri,
    };
    spark_config::apply_integration(&spark_home, &settings)?;

    // Narrower reset than variant 1: the warehouse survives, only the
    // metastore's own database is rebuilt
    restart(stack, &hive_home, &hadoop_home, stack.paths.derby_dir(), opts).await
}

/// Service endpoint advertised to the processing engine
pub fn metastore_uri() -> String {
    format!("thrift://localhost:{METASTORE_PORT}")
}

/// Kill, optionally wipe and reinitialize, then launch detached
async fn restart(
    stack: &Stack,
    hive_home: &std::path::Path,
    hadoop_home: &std::path::Path,
    reset_dir: PathBuf,
    opts: &ProvisionOptions,
) -> Result<()> {
    match supervisor::clear_port(METASTORE_PORT).await {
        PortTakeover::Terminated { pids } => {
            info!("cleared port {METASTORE_PORT} (killed {pids:?})");
        }
        PortTakeover::NothingListening => {
            debug!("nothing listening on port {METASTORE_PORT}");
        }
    }

    if opts.reset {
        supervisor::reset_state(&reset_dir)?;
        stack.paths.ensure_data_dirs()?;
        supervisor::init_schema(hive_home, hadoop_home, &stack.paths.data_dir()).await?;
    }

    let log = stack.paths.metastore_log();
    let pid = supervisor::launch(hive_home, hadoop_home, &log)?;
    info!("metastore launched (pid {pid}), logging to {}", log.display());

    if opts.wait_ready {
        supervisor::wait_until_ready(METASTORE_PORT, READY_TIMEOUT, &log).await?;
    }

    Ok(())
}
