//! Distribution installation from upstream archives
//!
//! Download-if-absent, extract-if-absent. An already-installed distribution
//! costs no network or extraction work on re-runs; fetch and extraction
//! failures abort the run without retrying.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::distro::{Distribution, RuntimeJar};
use crate::paths::StackPaths;

/// Installer for upstream distributions
pub struct Fetcher {
    client: reqwest::Client,
    paths: StackPaths,
}

impl Fetcher {
    pub fn new(paths: StackPaths) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("hivelet/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("failed to create HTTP client")?;

        Ok(Self { client, paths })
    }

    /// Ensure a distribution is unpacked under the install root
    ///
    /// Returns the install directory. If it already exists this performs
    /// no work beyond the existence check.
    pub async fn ensure_installed(&self, dist: &Distribution) -> Result<PathBuf> {
        let install_dir = self.paths.install_dir(dist.install_dir_name());
        if install_dir.exists() {
            debug!(
                "{} {} already installed at {}",
                dist.name,
                dist.version,
                install_dir.display()
            );
            return Ok(install_dir);
        }

        let archive = self.paths.artifact_path(dist.archive_file_name());
        if archive.exists() {
            info!("reusing previously downloaded {}", archive.display());
        } else {
            self.download(dist.download_url(), &archive).await?;
        }

        self.extract(&archive)?;

        if !install_dir.exists() {
            anyhow::bail!(
                "extraction of {} did not produce {}; the archive may have a \
                 different root directory name",
                archive.display(),
                install_dir.display()
            );
        }

        // Reclaim the archive's disk space now that it is unpacked
        fs::remove_file(&archive)
            .with_context(|| format!("failed to remove {}", archive.display()))?;

        info!(
            "installed {} {} to {}",
            dist.name,
            dist.version,
            install_dir.display()
        );
        Ok(install_dir)
    }

    /// Ensure a single-file runtime artifact is present, without extraction
    pub async fn ensure_jar(&self, jar: &RuntimeJar) -> Result<PathBuf> {
        let path = self.paths.artifact_path(jar.file_name());
        if path.exists() {
            debug!("{} already present at {}", jar.artifact_id(), path.display());
            return Ok(path);
        }

        self.download(jar.download_url(), &path).await?;
        info!("fetched {} to {}", jar.artifact_id(), path.display());
        Ok(path)
    }

    async fn download(&self, url: &str, dest: &Path) -> Result<()> {
        info!("downloading {url}");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("failed to download {url}"))?;

        if !response.status().is_success() {
            anyhow::bail!("download failed: HTTP {} for {}", response.status(), url);
        }

        let bytes = response
            .bytes()
            .await
            .context("failed to read download response")?;

        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        fs::write(dest, &bytes).with_context(|| format!("failed to write {}", dest.display()))?;

        if !dest.exists() {
            anyhow::bail!("download of {} did not produce {}", url, dest.display());
        }

        Ok(())
    }

    fn extract(&self, archive: &Path) -> Result<()> {
        info!("extracting {}", archive.display());

        let file = fs::File::open(archive)
            .with_context(|| format!("failed to open {}", archive.display()))?;
        let gz_decoder = flate2::read::GzDecoder::new(file);
        let mut tarball = tar::Archive::new(gz_decoder);

        tarball
            .unpack(&self.paths.root)
            .with_context(|| format!("failed to extract {}", archive.display()))?;

        Ok(())
    }
}
