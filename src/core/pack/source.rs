use std::io::{Seek, SeekFrom};
use std::path::{Path, PathBuf};

use futures_util::StreamExt;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use super::catalog::CatalogClient;
use crate::core::error::{InstallerError, InstallerResult};

/// CurseForge modpack "download page" URL, e.g.
/// `https://www.curseforge.com/minecraft/modpacks/some-pack/download/123`
/// or `.../files/123/file`. Group 3 is the numeric file id.
static PACK_PAGE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(https://|twitch://)www\.curseforge\.com/minecraft/modpacks/[-a-z0-9]+/(download|download-client|files)/(\d+)(/file|\?client=y)?$",
    )
    .expect("pack page pattern is valid")
});

/// Remote locator forms the resolver accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteLocator {
    /// A URL pointing straight at a pack archive.
    DirectZip(String),
    /// A catalog download page; the real URL has to be looked up by file id.
    DownloadPage { file_id: u64 },
}

/// Classify a locator that is not a local path.
pub fn classify_remote(locator: &str) -> Option<RemoteLocator> {
    if (locator.starts_with("https://") || locator.starts_with("http://"))
        && locator.ends_with(".zip")
    {
        return Some(RemoteLocator::DirectZip(locator.to_string()));
    }
    PACK_PAGE_RE.captures(locator).and_then(|caps| {
        caps.get(3)
            .and_then(|m| m.as_str().parse().ok())
            .map(|file_id| RemoteLocator::DownloadPage { file_id })
    })
}

/// Turns a user-supplied path or URL into a readable pack archive.
///
/// Remote archives are streamed into an anonymous temp file that the OS
/// discards when the archive handle drops, on every exit path.
pub struct PackSource {
    client: Client,
    catalog: CatalogClient,
}

impl PackSource {
    pub fn new(client: Client, catalog: CatalogClient) -> Self {
        Self { client, catalog }
    }

    /// Resolve a locator to an open pack archive.
    pub async fn resolve(&self, locator: &str) -> InstallerResult<zip::ZipArchive<std::fs::File>> {
        let path = Path::new(locator);
        if path.exists() {
            debug!("Opening local pack archive {:?}", path);
            let file = std::fs::File::open(path).map_err(|e| InstallerError::Io {
                path: path.to_path_buf(),
                source: e,
            })?;
            return Ok(zip::ZipArchive::new(file)?);
        }

        let url = match classify_remote(locator) {
            Some(RemoteLocator::DirectZip(url)) => url,
            Some(RemoteLocator::DownloadPage { file_id }) => {
                debug!("Resolving download page locator to file id {}", file_id);
                self.catalog.download_url(file_id).await.map_err(|e| {
                    InstallerError::FetchFailed {
                        url: locator.to_string(),
                        reason: e.to_string(),
                    }
                })?
            }
            None => return Err(InstallerError::UnsupportedLocator(locator.to_string())),
        };

        self.fetch_archive(&url).await
    }

    /// Stream a remote archive into a self-discarding backing file.
    async fn fetch_archive(&self, url: &str) -> InstallerResult<zip::ZipArchive<std::fs::File>> {
        info!("Fetching pack archive from {}", url);

        let response =
            self.client
                .get(url)
                .send()
                .await
                .map_err(|e| InstallerError::FetchFailed {
                    url: url.to_string(),
                    reason: e.to_string(),
                })?;

        let status = response.status();
        if !status.is_success() {
            return Err(InstallerError::FetchFailed {
                url: url.to_string(),
                reason: format!("HTTP {}", status.as_u16()),
            });
        }

        let backing = tempfile::tempfile().map_err(|e| InstallerError::Io {
            path: PathBuf::from("<tempfile>"),
            source: e,
        })?;
        let mut file = tokio::fs::File::from_std(backing);

        let mut body = response.bytes_stream();
        while let Some(chunk) = body.next().await {
            let chunk = chunk.map_err(|e| InstallerError::FetchFailed {
                url: url.to_string(),
                reason: e.to_string(),
            })?;
            file.write_all(&chunk)
                .await
                .map_err(|e| InstallerError::Io {
                    path: PathBuf::from("<tempfile>"),
                    source: e,
                })?;
        }
        file.flush().await.map_err(|e| InstallerError::Io {
            path: PathBuf::from("<tempfile>"),
            source: e,
        })?;

        let mut backing = file.into_std().await;
        backing
            .seek(SeekFrom::Start(0))
            .map_err(|e| InstallerError::Io {
                path: PathBuf::from("<tempfile>"),
                source: e,
            })?;

        Ok(zip::ZipArchive::new(backing)?)
    }
}
