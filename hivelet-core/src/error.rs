//! Provisioning error types with clear, actionable messages

use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort a provisioning run
#[derive(Error, Debug)]
pub enum ProvisionError {
    /// The spark variant was requested without a Spark version
    #[error("SPARK_VERSION is not set.\n\nThe spark variant needs to know which Spark distribution to wire into the\nmetastore, and there is no safe default. Re-run with the version set, e.g.:\n  SPARK_VERSION=3.5.1 hivelet spark")]
    SparkVersionUnset,

    /// schematool exited non-zero while (re)initializing the embedded schema
    #[error("Metastore schema initialization failed (schematool exited with status {status}).\n\nInspect the schematool output above, then re-run:\n  hivelet metastore reset")]
    SchemaInitFailed { status: i32 },

    /// The metastore process could not be spawned
    #[error("Failed to launch the metastore from {hive_home}")]
    LaunchFailed {
        hive_home: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The readiness probe gave up before the service accepted a connection
    #[error("Metastore did not become ready on port {port} within {secs}s.\n\nCheck the service log for startup errors: {log}")]
    NotReady { port: u16, secs: u64, log: PathBuf },
}
