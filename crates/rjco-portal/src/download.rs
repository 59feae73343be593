//! CSV export downloads and their temporary files
//!
//! Exports are fetched with a plain HTTP GET, outside the browser session.

use std::fs;
use std::path::{Path, PathBuf};

use reqwest::blocking::Client;
use tracing::{debug, error, info};

use crate::error::{PortalError, Result};

/// Fetches a remote file into a local path
pub trait Downloader {
    fn download(&self, url: &str, dest: &Path) -> Result<()>;
}

/// [`Downloader`] over a blocking `reqwest` client
pub struct HttpDownloader {
    client: Client,
}

impl HttpDownloader {
    /// Create a downloader with the given request timeout
    pub fn new(config: &rjco_core::DownloadConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(concat!("rjco-scraping/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client })
    }
}

impl Downloader for HttpDownloader {
    fn download(&self, url: &str, dest: &Path) -> Result<()> {
        debug!("Downloading {} -> {}", url, dest.display());

        let response = self.client.get(url).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(PortalError::Network(format!("{} returned HTTP {}", url, status)));
        }

        let bytes = response.bytes()?;
        fs::write(dest, &bytes)?;

        debug!("Downloaded {} bytes to {}", bytes.len(), dest.display());
        Ok(())
    }
}

/// Temporary files created during a run
///
/// Every tracked file is removed by [`TempFiles::cleanup`], and again on
/// drop for anything a failed path left behind.
#[derive(Debug)]
pub struct TempFiles {
    dir: PathBuf,
    files: Vec<PathBuf>,
}

impl TempFiles {
    /// Track files under `dir`, creating it if needed
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            files: Vec::new(),
        })
    }

    /// Reserve a path for `file_name` and track it for removal
    ///
    /// Repeated names get a numeric prefix so two exports never overwrite
    /// each other within one run.
    pub fn reserve(&mut self, file_name: &str) -> PathBuf {
        let mut path = self.dir.join(file_name);
        let mut n = 1;
        while self.files.contains(&path) {
            path = self.dir.join(format!("{}-{}", n, file_name));
            n += 1;
        }
        self.files.push(path.clone());
        path
    }

    pub fn tracked(&self) -> &[PathBuf] {
        &self.files
    }

    /// Remove every tracked file; returns how many were deleted
    pub fn cleanup(&mut self) -> usize {
        let mut removed = 0;
        for file in self.files.drain(..) {
            match fs::remove_file(&file) {
                Ok(()) => removed += 1,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => error!("Could not remove temporary file {}: {}", file.display(), e),
            }
        }
        if removed > 0 {
            info!("Removed {} temporary file(s)", removed);
        }
        removed
    }
}

impl Drop for TempFiles {
    fn drop(&mut self) {
        self.cleanup();
    }
}
