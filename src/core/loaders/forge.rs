use std::io::Read;

use async_trait::async_trait;
use tracing::{debug, info};

use super::context::InstallContext;
use super::installer::{LoaderInstaller, LoaderInstallOutcome};
use crate::core::error::{InstallerError, InstallerResult};

const FORGE_MAVEN: &str = "https://maven.minecraftforge.net";

/// Provisions Forge from the official installer JAR.
///
/// Idempotent: if the version JSON for the requested game/loader pair is
/// already present under the versions root, nothing is re-downloaded.
pub struct ForgeInstaller {
    maven_base: String,
}

impl ForgeInstaller {
    pub fn new() -> Self {
        Self {
            maven_base: FORGE_MAVEN.to_string(),
        }
    }

    /// Point the installer at a different Maven root.
    pub fn with_maven_base(mut self, base: impl Into<String>) -> Self {
        self.maven_base = base.into();
        self
    }

    /// Version identifier an instance references, e.g. "1.16.5-forge-36.2.0".
    pub fn version_id(minecraft_version: &str, loader_version: &str) -> String {
        format!("{}-forge-{}", minecraft_version, loader_version)
    }
}

impl Default for ForgeInstaller {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LoaderInstaller for ForgeInstaller {
    async fn install(&self, ctx: InstallContext<'_>) -> InstallerResult<LoaderInstallOutcome> {
        let version_id = Self::version_id(ctx.minecraft_version, ctx.loader_version);
        let version_json_path = ctx
            .versions_root
            .join(&version_id)
            .join(format!("{}.json", version_id));

        if version_json_path.exists() {
            debug!("Forge {} already installed", version_id);
            return Ok(LoaderInstallOutcome::AlreadyInstalled);
        }

        info!(
            "Installing Forge {} for MC {}",
            ctx.loader_version, ctx.minecraft_version
        );

        // Maven coordinate for the installer, e.g. 1.16.5-36.2.0
        let forge_id = format!("{}-{}", ctx.minecraft_version, ctx.loader_version);
        let installer_name = format!("forge-{}-installer.jar", forge_id);
        let installer_url = format!(
            "{}/net/minecraftforge/forge/{}/{}",
            self.maven_base, forge_id, installer_name
        );

        let response = ctx.http_client.get(&installer_url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(InstallerError::DependencyInstallFailed(format!(
                "installer fetch for {} returned HTTP {}",
                forge_id,
                status.as_u16()
            )));
        }
        let installer_bytes = response.bytes().await?;

        // Keep the installer JAR cached under the libraries root, where a
        // launched instance expects Forge artifacts to live.
        let installer_path = ctx
            .libraries_root
            .join("net/minecraftforge/forge")
            .join(&forge_id)
            .join(&installer_name);
        if let Some(parent) = installer_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| InstallerError::Io {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
        }
        tokio::fs::write(&installer_path, &installer_bytes)
            .await
            .map_err(|e| InstallerError::Io {
                path: installer_path.clone(),
                source: e,
            })?;

        // The installer JAR carries the version JSON the launcher needs.
        let cursor = std::io::Cursor::new(installer_bytes.as_ref());
        let mut archive = zip::ZipArchive::new(cursor)?;
        let version_json = {
            let mut file = archive.by_name("version.json").map_err(|e| {
                InstallerError::DependencyInstallFailed(format!(
                    "missing version.json in {}: {}",
                    installer_name, e
                ))
            })?;
            let mut text = String::new();
            file.read_to_string(&mut text)?;
            text
        };

        if let Some(parent) = version_json_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| InstallerError::Io {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
        }
        tokio::fs::write(&version_json_path, version_json)
            .await
            .map_err(|e| InstallerError::Io {
                path: version_json_path.clone(),
                source: e,
            })?;

        info!("Forge {} installed successfully", version_id);
        Ok(LoaderInstallOutcome::Installed)
    }
}
