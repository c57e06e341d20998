use std::collections::BTreeMap;

use futures_util::stream::{self, StreamExt};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::core::error::{InstallerError, InstallerResult};

const ADDON_API: &str = "https://addons-ecs.forgesvc.net/api/v2/addon";

/// Worker-pool width for per-file fallback lookups. The bulk endpoint is
/// slow, the per-file one is cheap but chatty; 16 in flight keeps the
/// catalog happy.
const METADATA_WORKERS: usize = 16;

// ── Catalog wire schema ─────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogFile {
    pub id: u32,
    pub download_url: String,
    pub file_name: String,
    pub file_length: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogProject {
    pub id: u32,
    #[serde(default)]
    pub latest_files: Vec<CatalogFile>,
}

/// Everything the download stage needs for one mod file.
#[derive(Debug, Clone)]
pub struct ModFileDescriptor {
    pub project_id: u32,
    pub file_id: u32,
    pub download_url: String,
    pub file_name: String,
    pub file_length: u64,
}

impl ModFileDescriptor {
    fn from_catalog(project_id: u32, file: &CatalogFile) -> Self {
        Self {
            project_id,
            file_id: file.id,
            download_url: file.download_url.clone(),
            file_name: file.file_name.clone(),
            file_length: file.file_length,
        }
    }
}

/// Result of resolving a manifest's mod references.
///
/// Resolved descriptors always continue to the download stage; failures are
/// isolated per reference and surfaced as warnings by the caller.
#[derive(Debug, Default)]
pub struct ModResolution {
    pub files: Vec<ModFileDescriptor>,
    pub failures: Vec<InstallerError>,
}

/// Client for the CurseForge add-on catalog.
#[derive(Clone)]
pub struct CatalogClient {
    client: Client,
    base_url: String,
}

impl CatalogClient {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            base_url: ADDON_API.to_string(),
        }
    }

    /// Point the client at a different catalog root.
    pub fn with_base_url(mut self, base: impl Into<String>) -> Self {
        self.base_url = base.into();
        self
    }

    // ── Endpoints ───────────────────────────────────────

    /// Bulk metadata lookup. Returns whatever subset of projects the
    /// catalog chooses to include.
    async fn batch_projects(&self, ids: &[u32]) -> InstallerResult<Vec<CatalogProject>> {
        let projects = self
            .client
            .post(&self.base_url)
            .json(&ids)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(projects)
    }

    /// Per-file metadata lookup.
    async fn file_info(&self, project_id: u32, file_id: u32) -> InstallerResult<CatalogFile> {
        let url = format!("{}/{}/file/{}", self.base_url, project_id, file_id);
        let file = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(file)
    }

    /// Resolve a numeric file id to its raw download URL.
    /// The addon id segment of the path is ignored by the endpoint.
    pub async fn download_url(&self, file_id: u64) -> InstallerResult<String> {
        let url = format!("{}/0/file/{}/download-url", self.base_url, file_id);
        let text = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        Ok(text.trim().to_string())
    }

    // ── Resolution engine ───────────────────────────────

    /// Map every `project id → file id` reference to a download descriptor.
    ///
    /// Phase one posts all project ids to the bulk endpoint and accepts a
    /// project's file only when its id exactly matches the requested one —
    /// the endpoint lists a handful of "latest" files per project, so this
    /// is a gamble that usually pays off in request count. Phase two looks
    /// the remainder up individually over a bounded worker pool; each
    /// failure is isolated to its own reference.
    pub async fn resolve_files(&self, refs: &BTreeMap<u32, u32>) -> ModResolution {
        let total = refs.len();
        let mut resolution = ModResolution::default();
        if total == 0 {
            return resolution;
        }

        info!("Retrieving metadata for {} mods from the catalog", total);

        let mut pending: BTreeMap<u32, u32> = refs.clone();

        // Batch phase: best effort, completeness not guaranteed.
        let ids: Vec<u32> = pending.keys().copied().collect();
        match self.batch_projects(&ids).await {
            Ok(projects) => {
                for project in projects {
                    let Some(&want_file) = pending.get(&project.id) else {
                        continue;
                    };
                    if let Some(file) = project.latest_files.iter().find(|f| f.id == want_file) {
                        resolution
                            .files
                            .push(ModFileDescriptor::from_catalog(project.id, file));
                        pending.remove(&project.id);
                    }
                }
            }
            Err(e) => {
                warn!("Batch metadata lookup failed, falling back per file: {}", e);
            }
        }

        let batch_resolved = resolution.files.len();
        debug!("Got {} batched", batch_resolved);

        // Fallback phase: the rest individually, bounded fan-out, observed
        // in arrival order.
        let mut lookups = stream::iter(pending.iter())
            .map(|(&project_id, &file_id)| {
                let catalog = self;
                async move {
                    let result = catalog.lookup_exact(project_id, file_id).await;
                    (project_id, file_id, result)
                }
            })
            .buffer_unordered(METADATA_WORKERS);

        let mut done = batch_resolved;
        while let Some((project_id, file_id, result)) = lookups.next().await {
            match result {
                Ok(descriptor) => {
                    resolution.files.push(descriptor);
                    done += 1;
                    debug!("Resolved {}/{}: project {}", done, total, project_id);
                }
                Err(e) => {
                    warn!(
                        "Could not get metadata for {}/{}: {}",
                        project_id, file_id, e
                    );
                    let failure = match e {
                        already @ InstallerError::MetadataResolutionFailed { .. } => already,
                        other => InstallerError::MetadataResolutionFailed {
                            project_id,
                            file_id,
                            reason: other.to_string(),
                        },
                    };
                    resolution.failures.push(failure);
                }
            }
        }

        info!(
            "Resolved {}/{} mod references ({} batched)",
            resolution.files.len(),
            total,
            batch_resolved
        );
        resolution
    }

    /// Fallback lookup; the returned file must be the one that was asked for.
    async fn lookup_exact(
        &self,
        project_id: u32,
        file_id: u32,
    ) -> InstallerResult<ModFileDescriptor> {
        let file = self.file_info(project_id, file_id).await?;
        if file.id != file_id {
            return Err(InstallerError::MetadataResolutionFailed {
                project_id,
                file_id,
                reason: format!("catalog returned file {} instead", file.id),
            });
        }
        Ok(ModFileDescriptor::from_catalog(project_id, &file))
    }
}
