//! Metastore process supervision
//!
//! Kill whoever holds the well-known port, optionally wipe persisted state
//! and reinitialize the embedded schema, then launch the service detached.
//! There is no graceful shutdown and no lock: at most one listener on the
//! port is enforced by the unconditional kill step alone.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tracing::{debug, error, info};

use crate::error::ProvisionError;

/// Outcome of clearing the service port
#[derive(Debug, PartialEq, Eq)]
pub enum PortTakeover {
    /// Listeners were found and sent SIGKILL
    Terminated { pids: Vec<i32> },
    /// Nothing held the port; the expected case, never an error
    NothingListening,
}

/// Find and forcibly terminate any process listening on `port`
///
/// Listener discovery shells out to `lsof`. A free port, an empty result,
/// or an unusable `lsof` all fold into `NothingListening`.
pub async fn clear_port(port: u16) -> PortTakeover {
    debug!("running lsof -ti tcp:{port} -sTCP:LISTEN");
    let output = match tokio::process::Command::new("lsof")
        .args(["-ti", &format!("tcp:{port}"), "-sTCP:LISTEN"])
        .output()
        .await
    {
        Ok(output) => output,
        Err(e) => {
            debug!("lsof unavailable ({e}); treating port {port} as free");
            return PortTakeover::NothingListening;
        }
    };

    let stdout = String::from_utf8_lossy(&output.stdout);
    let pids: Vec<i32> = stdout
        .split_whitespace()
        .filter_map(|pid| pid.parse().ok())
        .collect();

    if pids.is_empty() {
        return PortTakeover::NothingListening;
    }

    for pid in &pids {
        info!("terminating pid {pid} holding port {port}");
        // SAFETY: plain kill(2) on a pid we just observed; the worst
        // outcome of a stale pid is ESRCH, which we ignore.
        unsafe {
            libc::kill(*pid, libc::SIGKILL);
        }
    }

    PortTakeover::Terminated { pids }
}

/// Remove persisted service state ahead of schema reinitialization
///
/// A missing directory is fine; the caller recreates the tree afterwards.
pub fn reset_state(state_dir: &Path) -> Result<()> {
    if state_dir.exists() {
        info!("removing persisted state at {}", state_dir.display());
        fs::remove_dir_all(state_dir)
            .with_context(|| format!("failed to remove {}", state_dir.display()))?;
    }
    Ok(())
}

/// Reinitialize the embedded Derby schema via the service's own schematool
pub async fn init_schema(hive_home: &Path, hadoop_home: &Path, working_dir: &Path) -> Result<()> {
    let schematool = hive_home.join("bin").join("schematool");
    info!("initializing metastore schema");
    debug!(
        "running {} -dbType derby -initSchema (cwd: {})",
        schematool.display(),
        working_dir.display()
    );

    let output = tokio::process::Command::new(&schematool)
        .args(["-dbType", "derby", "-initSchema"])
        .env("HIVE_HOME", hive_home)
        .env("HADOOP_HOME", hadoop_home)
        .current_dir(working_dir)
        .output()
        .await
        .with_context(|| format!("failed to run {}", schematool.display()))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        error!("schematool failed: {stderr}");
        return Err(ProvisionError::SchemaInitFailed {
            status: output.status.code().unwrap_or(-1),
        }
        .into());
    }

    Ok(())
}

/// Launch the metastore as a detached background process
///
/// Combined stdout/stderr goes to `log_path`. The child is not waited on;
/// it outlives the provisioning run and is only ever stopped by a later
/// run's kill-by-port step.
pub fn launch(hive_home: &Path, hadoop_home: &Path, log_path: &Path) -> Result<u32> {
    let hive = hive_home.join("bin").join("hive");
    let log = fs::File::create(log_path)
        .with_context(|| format!("failed to create log file {}", log_path.display()))?;
    let log_err = log.try_clone().context("failed to clone log handle")?;

    debug!(
        "running {} --service metastore (log: {})",
        hive.display(),
        log_path.display()
    );

    let child = std::process::Command::new(&hive)
        .args(["--service", "metastore"])
        .env("HIVE_HOME", hive_home)
        .env("HADOOP_HOME", hadoop_home)
        .stdin(Stdio::null())
        .stdout(Stdio::from(log))
        .stderr(Stdio::from(log_err))
        .spawn()
        .map_err(|source| ProvisionError::LaunchFailed {
            hive_home: hive_home.to_path_buf(),
            source,
        })?;

    Ok(child.id())
}

/// Bounded readiness probe: connect to the port until it accepts
pub async fn wait_until_ready(port: u16, timeout: Duration, log_path: &Path) -> Result<()> {
    let deadline = tokio::time::Instant::now() + timeout;
    let addr = format!("127.0.0.1:{port}");

    loop {
        match tokio::net::TcpStream::connect(&addr).await {
            Ok(_) => {
                info!("metastore is accepting connections on port {port}");
                return Ok(());
            }
            Err(_) if tokio::time::Instant::now() < deadline => {
                tokio::time::sleep(Duration::from_secs(1)).await;
            }
            Err(_) => {
                return Err(ProvisionError::NotReady {
                    port,
                    secs: timeout.as_secs(),
                    log: log_path.to_path_buf(),
                }
                .into());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_clear_port_with_no_listener() {
        // An idle high port; whether lsof exists or not, a free port is
        // the expected-and-ignored case.
        let takeover = clear_port(49583).await;
        assert_eq!(takeover, PortTakeover::NothingListening);
    }

    #[test]
    fn test_reset_state_removes_directory_tree() {
        let temp_dir = TempDir::new().unwrap();
        let state_dir = temp_dir.path().join("metastore_db");
        fs::create_dir_all(state_dir.join("seg0")).unwrap();
        fs::write(state_dir.join("service.properties"), "derby").unwrap();

        reset_state(&state_dir).unwrap();

        assert!(!state_dir.exists());
    }

    #[test]
    fn test_reset_state_ignores_missing_directory() {
        let temp_dir = TempDir::new().unwrap();
        let state_dir = temp_dir.path().join("never-created");

        reset_state(&state_dir).unwrap();
    }

    #[tokio::test]
    async fn test_wait_until_ready_succeeds_against_live_listener() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        wait_until_ready(port, Duration::from_secs(2), Path::new("/tmp/unused.log"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_wait_until_ready_times_out_on_dead_port() {
        let log = Path::new("/tmp/metastore.log");
        let result = wait_until_ready(49584, Duration::from_millis(50), log).await;
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("did not become ready"));
    }
}
