use tracing::{debug, info, warn};

use super::catalog::CatalogClient;
use super::manifest::PackManifest;
use super::overlay::extract_overrides;
use super::source::PackSource;
use crate::core::downloader::DownloadQueue;
use crate::core::error::{InstallerError, InstallerResult};
use crate::core::instance::Instance;
use crate::core::loaders::{ForgeInstaller, InstallContext, LoaderInstaller, LoaderInstallOutcome};
use crate::core::state::{context::default_max_memory, LauncherState};

/// Summary of a finished installation.
///
/// `warnings` carries the isolated per-mod failures (metadata lookups and
/// downloads); a non-empty list means "completed with warnings", not
/// failure.
#[derive(Debug)]
pub struct InstallReport {
    pub instance_name: String,
    pub pack_name: String,
    pub pack_version: String,
    pub overrides_copied: usize,
    pub mods_resolved: usize,
    pub mods_downloaded: usize,
    pub warnings: Vec<String>,
}

impl InstallReport {
    pub fn completed_cleanly(&self) -> bool {
        self.warnings.is_empty()
    }
}

/// Sequences a whole modpack installation against a launcher state.
pub struct PackInstaller<'a> {
    state: &'a LauncherState,
    source: PackSource,
    catalog: CatalogClient,
    forge: ForgeInstaller,
}

impl<'a> PackInstaller<'a> {
    pub fn new(state: &'a LauncherState) -> Self {
        let catalog = CatalogClient::new(state.http_client.clone());
        Self {
            state,
            source: PackSource::new(state.http_client.clone(), catalog.clone()),
            catalog,
            forge: ForgeInstaller::new(),
        }
    }

    /// Swap the catalog client (and the pack source that shares it).
    pub fn with_catalog(mut self, catalog: CatalogClient) -> Self {
        self.source = PackSource::new(self.state.http_client.clone(), catalog.clone());
        self.catalog = catalog;
        self
    }

    pub fn with_forge(mut self, forge: ForgeInstaller) -> Self {
        self.forge = forge;
        self
    }

    /// Install the pack at `locator` as a new instance.
    ///
    /// Fails fast on anything up to and including instance creation; once
    /// mod acquisition starts, per-mod failures are collected into the
    /// report instead of aborting the run. Nothing already written is
    /// rolled back on failure.
    pub async fn install(
        &self,
        locator: &str,
        explicit_name: Option<&str>,
    ) -> InstallerResult<InstallReport> {
        let mut archive = self.source.resolve(locator).await?;
        let manifest = PackManifest::from_archive(&mut archive)?;

        let instance_name = match explicit_name {
            Some(name) => {
                info!(
                    "Installing {} version {} as instance {}",
                    manifest.name, manifest.version, name
                );
                name.to_string()
            }
            None => {
                info!("Installing {} version {}", manifest.name, manifest.version);
                manifest.derived_instance_name()
            }
        };

        // Pre-flight: fail before any side effect if the name is taken.
        // Derived names are lossy, so two packs can collide here.
        if self.state.instance_manager.exists(&instance_name) {
            return Err(InstallerError::InstanceExists(instance_name));
        }

        let outcome = self
            .forge
            .install(InstallContext {
                minecraft_version: &manifest.minecraft_version,
                loader_version: &manifest.forge_version,
                versions_root: &self.state.versions_dir(),
                libraries_root: &self.state.libraries_dir(),
                http_client: &self.state.http_client,
            })
            .await?;
        if outcome == LoaderInstallOutcome::AlreadyInstalled {
            debug!("Forge {} was already present", manifest.forge_version);
        }

        let version_id =
            ForgeInstaller::version_id(&manifest.minecraft_version, &manifest.forge_version);
        let mut instance = Instance::new(
            instance_name.clone(),
            version_id,
            self.state.instance_manager.instances_dir(),
        );
        instance.pack_name = Some(manifest.name.clone());
        instance.pack_version = Some(manifest.version.clone());
        let mut instance = self.state.instance_manager.create(instance).await?;

        // Vanilla's 1G default starves a modded instance.
        instance.config.java_memory_max = Some(default_max_memory());
        self.state.instance_manager.save(&instance).await?;

        let overrides_copied =
            extract_overrides(&mut archive, &manifest.overrides, &instance.game_dir())?;

        let resolution = self.catalog.resolve_files(&manifest.mod_refs).await;
        let mods_resolved = resolution.files.len();

        let mut queue = DownloadQueue::new(self.state.http_client.clone());
        let mods_dir = instance.mods_dir();
        for descriptor in &resolution.files {
            queue.add(
                descriptor.download_url.clone(),
                mods_dir.join(&descriptor.file_name),
                Some(descriptor.file_length),
            );
        }

        info!("Downloading mod jars");
        let download_report = queue.run().await;
        let mods_downloaded = download_report.completed;

        let mut warnings: Vec<String> =
            resolution.failures.iter().map(|e| e.to_string()).collect();
        warnings.extend(
            download_report
                .failures
                .iter()
                .map(|(_, e)| e.to_string()),
        );

        if warnings.is_empty() {
            info!("Done installing {}", instance_name);
        } else {
            warn!(
                "Done installing {} with {} warnings",
                instance_name,
                warnings.len()
            );
        }

        Ok(InstallReport {
            instance_name,
            pack_name: manifest.name,
            pack_version: manifest.version,
            overrides_copied,
            mods_resolved,
            mods_downloaded,
            warnings,
        })
    }
}
