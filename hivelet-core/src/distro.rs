//! Distribution descriptors
//!
//! Archive names, download URLs, and install directory names are pure
//! functions of {name, version}, resolved once per run and never mutated.

use crate::versions::SCALA_BINARY_VERSION;

const APACHE_ARCHIVE: &str = "https://archive.apache.org/dist";
const MAVEN_CENTRAL: &str = "https://repo1.maven.org/maven2";

/// A versioned, prebuilt software archive unpacked into the install root
#[derive(Debug, Clone)]
pub struct Distribution {
    pub name: &'static str,
    pub version: String,
    archive: String,
    url: String,
    install_dir: String,
}

impl Distribution {
    /// The Hive distribution carrying the metastore service
    pub fn hive(version: &str) -> Self {
        let install_dir = format!("apache-hive-{version}-bin");
        let archive = format!("{install_dir}.tar.gz");
        let url = format!("{APACHE_ARCHIVE}/hive/hive-{version}/{archive}");
        Self {
            name: "hive",
            version: version.to_string(),
            archive,
            url,
            install_dir,
        }
    }

    /// The Hadoop runtime the metastore's filesystem layer needs on disk
    pub fn hadoop(version: &str) -> Self {
        let install_dir = format!("hadoop-{version}");
        let archive = format!("{install_dir}.tar.gz");
        let url = format!("{APACHE_ARCHIVE}/hadoop/common/hadoop-{version}/{archive}");
        Self {
            name: "hadoop",
            version: version.to_string(),
            archive,
            url,
            install_dir,
        }
    }

    /// The Spark distribution wired up by the spark variant
    pub fn spark(version: &str) -> Self {
        let install_dir = format!("spark-{version}-bin-hadoop3");
        let archive = format!("{install_dir}.tgz");
        let url = format!("{APACHE_ARCHIVE}/spark/spark-{version}/{archive}");
        Self {
            name: "spark",
            version: version.to_string(),
            archive,
            url,
            install_dir,
        }
    }

    pub fn archive_file_name(&self) -> &str {
        &self.archive
    }

    pub fn download_url(&self) -> &str {
        &self.url
    }

    pub fn install_dir_name(&self) -> &str {
        &self.install_dir
    }
}

/// The Iceberg Spark runtime: a single jar, used in place, never extracted
#[derive(Debug, Clone)]
pub struct RuntimeJar {
    artifact: String,
    file_name: String,
    url: String,
}

impl RuntimeJar {
    pub fn iceberg_spark(spark_compat: &str, iceberg_version: &str) -> Self {
        let artifact = format!("iceberg-spark-runtime-{spark_compat}_{SCALA_BINARY_VERSION}");
        let file_name = format!("{artifact}-{iceberg_version}.jar");
        let url = format!(
            "{MAVEN_CENTRAL}/org/apache/iceberg/{artifact}/{iceberg_version}/{file_name}"
        );
        Self {
            artifact,
            file_name,
            url,
        }
    }

    pub fn artifact_id(&self) -> &str {
        &self.artifact
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn download_url(&self) -> &str {
        &self.url
    }
}
