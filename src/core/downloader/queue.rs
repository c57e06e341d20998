use std::path::PathBuf;

use futures_util::stream::{self, StreamExt};
use reqwest::Client;
use sha1::{Digest, Sha1};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use crate::core::error::{InstallerError, InstallerResult};

/// A single file to download, with expected size and optional SHA-1.
///
/// Owned by the queue from `add` until the task reaches a terminal state.
#[derive(Debug, Clone)]
pub struct DownloadTask {
    pub url: String,
    pub dest: PathBuf,
    pub size: Option<u64>,
    pub sha1: Option<String>,
}

/// Outcome of a full queue run.
#[derive(Debug)]
pub struct DownloadReport {
    pub completed: usize,
    pub failures: Vec<(DownloadTask, InstallerError)>,
}

impl DownloadReport {
    pub fn all_ok(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Concurrent download queue.
///
/// Tasks are registered up front with [`DownloadQueue::add`] (no network
/// traffic) and executed together by [`DownloadQueue::run`]. Each task
/// streams its body straight to the destination file and verifies the byte
/// count against the expected size. Failures are isolated per task; the
/// queue never retries on its own.
pub struct DownloadQueue {
    client: Client,
    /// Maximum number of parallel downloads.
    concurrency: usize,
    tasks: Vec<DownloadTask>,
}

impl DownloadQueue {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            concurrency: 8,
            tasks: Vec::new(),
        }
    }

    pub fn with_concurrency(mut self, n: usize) -> Self {
        self.concurrency = n;
        self
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Register a download. No request is made until [`DownloadQueue::run`].
    pub fn add(&mut self, url: impl Into<String>, dest: impl Into<PathBuf>, size: Option<u64>) {
        self.tasks.push(DownloadTask {
            url: url.into(),
            dest: dest.into(),
            size,
            sha1: None,
        });
    }

    /// Register a download that must also match a SHA-1 digest.
    pub fn add_with_sha1(
        &mut self,
        url: impl Into<String>,
        dest: impl Into<PathBuf>,
        size: Option<u64>,
        sha1: impl Into<String>,
    ) {
        self.tasks.push(DownloadTask {
            url: url.into(),
            dest: dest.into(),
            size,
            sha1: Some(sha1.into()),
        });
    }

    /// Execute all queued tasks to completion and report the outcome.
    ///
    /// Blocks until every task has reached a terminal state. A failed task
    /// never aborts its siblings or discards their bytes.
    pub async fn run(self) -> DownloadReport {
        let total = self.tasks.len();
        info!(
            "Starting download queue: {} files, concurrency={}",
            total, self.concurrency
        );

        let client = &self.client;
        let results: Vec<_> = stream::iter(self.tasks)
            .map(|task| async move {
                let result = download_one(client, &task).await;
                (task, result)
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        let mut completed = 0usize;
        let mut failures = Vec::new();
        for (task, result) in results {
            match result {
                Ok(()) => {
                    completed += 1;
                    debug!("Downloaded {}/{}: {}", completed, total, task.url);
                }
                Err(e) => {
                    warn!("Download failed for {}: {}", task.url, e);
                    failures.push((task, e));
                }
            }
        }

        info!("Download queue done: {}/{} succeeded", completed, total);
        DownloadReport { completed, failures }
    }
}

/// Stream one body to disk and verify it.
///
/// Creates parent directories as needed, counts the bytes written, and
/// compares them against the expected size after the stream ends.
async fn download_one(client: &Client, task: &DownloadTask) -> InstallerResult<()> {
    if let Some(parent) = task.dest.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| InstallerError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
    }

    let response = client.get(&task.url).send().await?;

    let status = response.status();
    if !status.is_success() {
        return Err(InstallerError::FetchFailed {
            url: task.url.clone(),
            reason: format!("HTTP {}", status.as_u16()),
        });
    }

    let mut written: u64 = 0;
    let mut hasher = task.sha1.as_ref().map(|_| Sha1::new());

    {
        let mut file =
            tokio::fs::File::create(&task.dest)
                .await
                .map_err(|e| InstallerError::Io {
                    path: task.dest.clone(),
                    source: e,
                })?;

        let mut body = response.bytes_stream();
        while let Some(chunk) = body.next().await {
            let chunk = chunk?;
            file.write_all(&chunk).await.map_err(|e| InstallerError::Io {
                path: task.dest.clone(),
                source: e,
            })?;
            written += chunk.len() as u64;
            if let Some(h) = hasher.as_mut() {
                h.update(&chunk);
            }
        }

        file.flush().await.map_err(|e| InstallerError::Io {
            path: task.dest.clone(),
            source: e,
        })?;
        // file is dropped here — critical on Windows
    }

    if let Some(expected) = task.size {
        if written != expected {
            return Err(InstallerError::SizeMismatch {
                path: task.dest.clone(),
                expected,
                actual: written,
            });
        }
    }

    if let (Some(expected), Some(hasher)) = (task.sha1.as_deref(), hasher) {
        let actual = hex::encode(hasher.finalize());
        if actual != expected {
            return Err(InstallerError::Sha1Mismatch {
                path: task.dest.clone(),
                expected: expected.to_string(),
                actual,
            });
        }
    }

    Ok(())
}