use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

/// Per-instance tunables persisted alongside the identity fields.
///
/// `java_memory_max` uses the launcher's shorthand notation ("4G", "2048M").
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InstanceConfig {
    #[serde(rename = "java.memory.max", skip_serializing_if = "Option::is_none")]
    pub java_memory_max: Option<String>,
}

/// Full instance representation persisted to disk as `instance.json`.
///
/// Each instance has its own folder under `instances/<name>/` with:
/// - `minecraft/`      — game working directory (.minecraft equivalent)
/// - `minecraft/mods/` — mod JARs
/// - `instance.json`   — this serialized struct
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Instance {
    pub name: String,
    pub path: PathBuf,
    /// Version the instance launches, e.g. "1.16.5-forge-36.2.0".
    pub version_id: String,
    /// Display name of the pack this instance was installed from, if any.
    pub pack_name: Option<String>,
    pub pack_version: Option<String>,

    // ── Internal state ──
    pub id: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub config: InstanceConfig,
}

impl Instance {
    /// Create a new instance record rooted under `base_dir/<name>`.
    pub fn new(name: String, version_id: String, base_dir: &std::path::Path) -> Self {
        let path = base_dir.join(&name);

        Self {
            name,
            path,
            version_id,
            pack_name: None,
            pack_version: None,
            id: Uuid::new_v4().to_string(),
            created_at: Utc::now(),
            config: InstanceConfig::default(),
        }
    }

    /// Path to the instance's `minecraft/` game working directory.
    pub fn game_dir(&self) -> PathBuf {
        self.path.join("minecraft")
    }

    /// Path to the `minecraft/mods/` directory.
    pub fn mods_dir(&self) -> PathBuf {
        self.game_dir().join("mods")
    }

    /// Path to this instance's config file.
    pub fn config_path(&self) -> PathBuf {
        self.path.join("instance.json")
    }
}
