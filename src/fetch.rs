//! Remote media retrieval.
//!
//! Downloads are skip-if-exists: a file already present at its destination is
//! never fetched or overwritten again, so an export can be re-run over a
//! partially populated tree. Bodies stream into a `.part` sibling that is
//! renamed into place only after the transfer completes; an interrupted
//! download therefore never looks like a finished one.
//!
//! A failed fetch is reported as [`DownloadOutcome::Failed`] rather than an
//! error. The caller logs it and carries on without the resource.

use crate::config::DownloadsConfig;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use ureq::Agent;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("HTTP request failed: {0}")]
    Http(String),
    #[error("HTTP {status} for {url}")]
    Status { status: u16, url: String },
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Something that can copy a URL to a local file.
pub trait Fetch {
    fn fetch_to(&self, url: &str, dest: &Path) -> Result<(), FetchError>;
}

/// Blocking HTTP fetcher backed by a pooled `ureq` agent.
pub struct HttpFetcher {
    agent: Agent,
    user_agent: String,
}

impl HttpFetcher {
    pub fn new(config: &DownloadsConfig) -> Self {
        let agent = Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(config.timeout_secs)))
            .http_status_as_error(false)
            .build()
            .into();
        Self {
            agent,
            user_agent: config.user_agent.clone(),
        }
    }
}

impl Fetch for HttpFetcher {
    fn fetch_to(&self, url: &str, dest: &Path) -> Result<(), FetchError> {
        let response = self
            .agent
            .get(url)
            .header("User-Agent", &self.user_agent)
            .call()
            .map_err(|e| FetchError::Http(e.to_string()))?;

        let status = response.status().as_u16();
        if status >= 400 {
            return Err(FetchError::Status {
                status,
                url: url.to_string(),
            });
        }

        let mut reader = response.into_body().into_reader();
        write_atomically(dest, |file| io::copy(&mut reader, file).map(|_| ()))?;
        Ok(())
    }
}

fn part_path(dest: &Path) -> PathBuf {
    let mut name = dest.file_name().unwrap_or_default().to_os_string();
    name.push(".part");
    dest.with_file_name(name)
}

/// Fill `dest` through a `.part` file renamed on success.
pub fn write_atomically(
    dest: &Path,
    fill: impl FnOnce(&mut fs::File) -> io::Result<()>,
) -> io::Result<()> {
    let part = part_path(dest);
    let result = fs::File::create(&part).and_then(|mut file| {
        fill(&mut file)?;
        file.sync_all()
    });
    match result {
        Ok(()) => fs::rename(&part, dest),
        Err(e) => {
            let _ = fs::remove_file(&part);
            Err(e)
        }
    }
}

/// What happened to one attachment download.
#[derive(Debug)]
pub enum DownloadOutcome {
    Downloaded,
    AlreadyPresent,
    /// Downloads are disabled by configuration.
    Skipped,
    Failed(FetchError),
}

/// Fetch `url` into `dest` unless it already exists or downloads are off.
pub fn download(fetcher: &dyn Fetch, url: &str, dest: &Path, skip_downloads: bool) -> DownloadOutcome {
    if dest.exists() {
        tracing::debug!(path = %dest.display(), "File exists, keeping existing content");
        return DownloadOutcome::AlreadyPresent;
    }
    if skip_downloads {
        tracing::debug!(path = %dest.display(), "Skipping download, downloads disabled");
        return DownloadOutcome::Skipped;
    }
    tracing::debug!(url, path = %dest.display(), "Downloading");
    match fetcher.fetch_to(url, dest) {
        Ok(()) => DownloadOutcome::Downloaded,
        Err(e) => DownloadOutcome::Failed(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::FakeFetcher;
    use tempfile::TempDir;

    #[test]
    fn downloads_missing_file() {
        let tmp = TempDir::new().unwrap();
        let dest = tmp.path().join("a.jpg");
        let fetcher = FakeFetcher::default();

        let outcome = download(&fetcher, "https://x/a.jpg", &dest, false);

        assert!(matches!(outcome, DownloadOutcome::Downloaded));
        assert_eq!(fs::read(&dest).unwrap(), b"https://x/a.jpg");
        assert_eq!(fetcher.requests(), vec!["https://x/a.jpg"]);
    }

    #[test]
    fn existing_file_is_never_refetched() {
        let tmp = TempDir::new().unwrap();
        let dest = tmp.path().join("a.jpg");
        fs::write(&dest, b"local").unwrap();
        let fetcher = FakeFetcher::default();

        let outcome = download(&fetcher, "https://x/a.jpg", &dest, false);

        assert!(matches!(outcome, DownloadOutcome::AlreadyPresent));
        assert_eq!(fs::read(&dest).unwrap(), b"local");
        assert!(fetcher.requests().is_empty());
    }

    #[test]
    fn skip_downloads_leaves_no_file() {
        let tmp = TempDir::new().unwrap();
        let dest = tmp.path().join("a.jpg");
        let fetcher = FakeFetcher::default();

        let outcome = download(&fetcher, "https://x/a.jpg", &dest, true);

        assert!(matches!(outcome, DownloadOutcome::Skipped));
        assert!(!dest.exists());
        assert!(fetcher.requests().is_empty());
    }

    #[test]
    fn failure_is_an_outcome_not_an_error() {
        let tmp = TempDir::new().unwrap();
        let dest = tmp.path().join("a.jpg");
        let fetcher = FakeFetcher::failing(&["https://x/a.jpg"]);

        let outcome = download(&fetcher, "https://x/a.jpg", &dest, false);

        assert!(matches!(outcome, DownloadOutcome::Failed(FetchError::Status { status: 404, .. })));
        assert!(!dest.exists());
    }

    #[test]
    fn failed_fill_removes_part_file() {
        let tmp = TempDir::new().unwrap();
        let dest = tmp.path().join("a.jpg");

        let err = write_atomically(&dest, |_| Err(io::Error::other("boom"))).unwrap_err();

        assert_eq!(err.to_string(), "boom");
        assert!(!dest.exists());
        assert!(!part_path(&dest).exists());
    }

    #[test]
    fn part_path_appends_suffix() {
        assert_eq!(
            part_path(Path::new("/out/images/a.jpg")),
            PathBuf::from("/out/images/a.jpg.part")
        );
    }
}
