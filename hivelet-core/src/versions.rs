//! Distribution version resolution
//!
//! Versions come from environment overrides with fixed defaults. Spark has
//! no default: the spark variant treats an unset version as a hard
//! precondition failure before any download is attempted.

use crate::error::ProvisionError;

/// Default Hive distribution version
pub const DEFAULT_HIVE_VERSION: &str = "3.1.3";

/// Default Hadoop distribution version
pub const DEFAULT_HADOOP_VERSION: &str = "3.3.4";

/// Default Iceberg runtime version
pub const DEFAULT_ICEBERG_VERSION: &str = "1.4.3";

/// Scala binary suffix baked into the Iceberg runtime artifact name
pub const SCALA_BINARY_VERSION: &str = "2.12";

/// Resolved distribution versions for one provisioning run
#[derive(Debug, Clone)]
pub struct Versions {
    pub hive: String,
    pub hadoop: String,
    pub iceberg: String,
    /// No default; required by the spark variant only
    pub spark: Option<String>,
}

impl Versions {
    /// Resolve versions from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve versions from an explicit lookup function
    ///
    /// Tests inject a map here instead of mutating the process environment.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let or_default = |key: &str, default: &str| {
            lookup(key)
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        Self {
            hive: or_default("HIVE_VERSION", DEFAULT_HIVE_VERSION),
            hadoop: or_default("HADOOP_VERSION", DEFAULT_HADOOP_VERSION),
            iceberg: or_default("ICEBERG_VERSION", DEFAULT_ICEBERG_VERSION),
            spark: lookup("SPARK_VERSION").filter(|v| !v.is_empty()),
        }
    }

    /// The Spark version, required by the spark variant
    pub fn spark(&self) -> Result<&str, ProvisionError> {
        self.spark
            .as_deref()
            .ok_or(ProvisionError::SparkVersionUnset)
    }

    /// `major.minor` prefix of the Spark version
    ///
    /// Derived by string splitting, not semantic parsing. A version with
    /// fewer than two components is passed through unchanged.
    pub fn spark_compat(&self) -> Result<String, ProvisionError> {
        let full = self.spark()?;
        let mut parts = full.splitn(3, '.');
        match (parts.next(), parts.next()) {
            (Some(major), Some(minor)) => Ok(format!("{major}.{minor}")),
            _ => Ok(full.to_string()),
        }
    }
}
