use std::path::{Path, PathBuf};

use tracing::info;

use super::model::Instance;
use crate::core::error::{InstallerError, InstallerResult};

/// Manages the lifecycle of instances on disk.
///
/// Instances are keyed by name: the directory `instances/<name>/` either
/// holds an `instance.json` or the name is free.
pub struct InstanceManager {
    /// Root directory where all instances live.
    instances_dir: PathBuf,
}

impl InstanceManager {
    pub fn new(instances_dir: PathBuf) -> Self {
        Self { instances_dir }
    }

    pub fn instances_dir(&self) -> &Path {
        &self.instances_dir
    }

    /// Whether an instance of this name is already registered.
    pub fn exists(&self, name: &str) -> bool {
        self.instances_dir.join(name).join("instance.json").exists()
    }

    /// Create a new instance on disk with its subdirectory structure.
    ///
    /// Creates:
    /// - `<instance>/minecraft/`
    /// - `<instance>/minecraft/mods/`
    /// - `<instance>/instance.json`
    pub async fn create(&self, mut instance: Instance) -> InstallerResult<Instance> {
        // Anchor the path under our instances directory
        instance.path = self.instances_dir.join(&instance.name);

        if self.exists(&instance.name) {
            return Err(InstallerError::InstanceExists(instance.name.clone()));
        }

        let minecraft_dir = instance.game_dir();
        let mods_dir = instance.mods_dir();

        tokio::try_join!(create_dir_safe(&minecraft_dir), create_dir_safe(&mods_dir))?;

        // Persist instance.json
        self.save(&instance).await?;

        info!("Created instance '{}' ({})", instance.name, instance.version_id);
        Ok(instance)
    }

    /// Save instance metadata to disk.
    pub async fn save(&self, instance: &Instance) -> InstallerResult<()> {
        let json = serde_json::to_string_pretty(instance)?;
        let config_path = instance.config_path();

        if let Some(parent) = config_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| InstallerError::Io {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
        }

        tokio::fs::write(&config_path, json)
            .await
            .map_err(|e| InstallerError::Io {
                path: config_path,
                source: e,
            })?;

        Ok(())
    }

    /// Load a single instance by name.
    pub async fn load(&self, name: &str) -> InstallerResult<Instance> {
        let config_path = self.instances_dir.join(name).join("instance.json");
        if !config_path.exists() {
            return Err(InstallerError::InstanceNotFound(name.to_string()));
        }

        let json =
            tokio::fs::read_to_string(&config_path)
                .await
                .map_err(|e| InstallerError::Io {
                    path: config_path.clone(),
                    source: e,
                })?;

        let instance: Instance = serde_json::from_str(&json)?;
        Ok(instance)
    }

    /// List all instances.
    pub async fn list(&self) -> InstallerResult<Vec<Instance>> {
        let mut instances = Vec::new();

        if !self.instances_dir.exists() {
            return Ok(instances);
        }

        let mut entries = tokio::fs::read_dir(&self.instances_dir)
            .await
            .map_err(|e| InstallerError::Io {
                path: self.instances_dir.clone(),
                source: e,
            })?;

        while let Some(entry) = entries.next_entry().await.map_err(|e| InstallerError::Io {
            path: self.instances_dir.clone(),
            source: e,
        })? {
            let path = entry.path();
            if path.is_dir() {
                let config_path = path.join("instance.json");
                if config_path.exists() {
                    match tokio::fs::read_to_string(&config_path).await {
                        Ok(json) => match serde_json::from_str::<Instance>(&json) {
                            Ok(inst) => instances.push(inst),
                            Err(e) => {
                                tracing::warn!("Corrupt instance.json at {:?}: {}", config_path, e);
                            }
                        },
                        Err(e) => {
                            tracing::warn!("Cannot read {:?}: {}", config_path, e);
                        }
                    }
                }
            }
        }

        Ok(instances)
    }

    /// Delete an instance from disk.
    pub async fn delete(&self, name: &str) -> InstallerResult<()> {
        let instance_dir = self.instances_dir.join(name);
        if !instance_dir.exists() {
            return Err(InstallerError::InstanceNotFound(name.to_string()));
        }

        tokio::fs::remove_dir_all(&instance_dir)
            .await
            .map_err(|e| InstallerError::Io {
                path: instance_dir,
                source: e,
            })?;

        info!("Deleted instance {}", name);
        Ok(())
    }
}

async fn create_dir_safe(path: &Path) -> InstallerResult<()> {
    tokio::fs::create_dir_all(path)
        .await
        .map_err(|source| InstallerError::Io {
            path: path.to_path_buf(),
            source,
        })
}
