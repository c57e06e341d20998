use std::collections::BTreeMap;
use std::io::{Read, Seek};

use serde::Deserialize;

use crate::core::error::{InstallerError, InstallerResult};

const MANIFEST_ENTRY: &str = "manifest.json";
const MANIFEST_TYPE: &str = "minecraftModpack";
const MANIFEST_VERSION: u32 = 1;
const FORGE_PREFIX: &str = "forge-";

// ── Raw wire schema ─────────────────────────────────────

#[derive(Debug, Deserialize)]
struct RawManifest {
    #[serde(rename = "manifestType")]
    manifest_type: String,
    #[serde(rename = "manifestVersion")]
    manifest_version: u32,
    name: String,
    version: String,
    minecraft: RawMinecraft,
    #[serde(default)]
    overrides: String,
    #[serde(default)]
    files: Vec<RawModRef>,
}

#[derive(Debug, Deserialize)]
struct RawMinecraft {
    version: String,
    #[serde(rename = "modLoaders", default)]
    mod_loaders: Vec<RawModLoader>,
}

#[derive(Debug, Deserialize)]
struct RawModLoader {
    id: String,
}

#[derive(Debug, Deserialize)]
struct RawModRef {
    #[serde(rename = "projectID")]
    project_id: u32,
    #[serde(rename = "fileID")]
    file_id: u32,
}

// ── Validated manifest ──────────────────────────────────

/// A validated CurseForge pack manifest.
///
/// Parsed once from the archive's `manifest.json`, immutable thereafter.
#[derive(Debug, Clone)]
pub struct PackManifest {
    pub name: String,
    pub version: String,
    pub minecraft_version: String,
    /// Forge version with the `forge-` prefix already stripped.
    pub forge_version: String,
    /// Path prefix inside the archive holding the loose override files.
    pub overrides: String,
    /// Project id → file id. Duplicate project ids collapse last-write-wins.
    pub mod_refs: BTreeMap<u32, u32>,
}

impl PackManifest {
    /// Locate and validate the manifest entry of a pack archive.
    pub fn from_archive<R: Read + Seek>(
        archive: &mut zip::ZipArchive<R>,
    ) -> InstallerResult<Self> {
        let entry = archive.by_name(MANIFEST_ENTRY).map_err(|e| {
            InstallerError::InvalidManifest(format!("missing {}: {}", MANIFEST_ENTRY, e))
        })?;
        let raw: RawManifest = serde_json::from_reader(entry)
            .map_err(|e| InstallerError::InvalidManifest(e.to_string()))?;
        Self::validate(raw)
    }

    fn validate(raw: RawManifest) -> InstallerResult<Self> {
        if raw.manifest_type != MANIFEST_TYPE {
            return Err(InstallerError::UnsupportedManifest(format!(
                "manifestType is {:?}, expected {:?}",
                raw.manifest_type, MANIFEST_TYPE
            )));
        }
        if raw.manifest_version != MANIFEST_VERSION {
            return Err(InstallerError::UnsupportedManifest(format!(
                "manifestVersion is {}, expected {}",
                raw.manifest_version, MANIFEST_VERSION
            )));
        }
        if raw.minecraft.mod_loaders.len() != 1 {
            return Err(InstallerError::UnsupportedManifest(format!(
                "expected exactly one mod loader, found {}",
                raw.minecraft.mod_loaders.len()
            )));
        }

        let loader_id = &raw.minecraft.mod_loaders[0].id;
        let forge_version = loader_id
            .strip_prefix(FORGE_PREFIX)
            .ok_or_else(|| {
                InstallerError::UnsupportedManifest(format!(
                    "unrecognized mod loader {:?}",
                    loader_id
                ))
            })?
            .to_string();

        let mut mod_refs = BTreeMap::new();
        for mod_ref in &raw.files {
            mod_refs.insert(mod_ref.project_id, mod_ref.file_id);
        }

        Ok(Self {
            name: raw.name,
            version: raw.version,
            minecraft_version: raw.minecraft.version,
            forge_version,
            overrides: raw.overrides,
            mod_refs,
        })
    }

    /// Instance name used when the caller does not supply one.
    pub fn derived_instance_name(&self) -> String {
        format!(
            "{}-{}",
            sanitize_name(&self.name),
            sanitize_name(&self.version)
        )
    }
}

/// Strip/replace characters unsafe for a filesystem path component.
///
/// Whitespace becomes `-`; anything outside `[A-Za-z0-9._-]` is dropped.
/// Deterministic, so the same pack always derives the same instance name.
pub fn sanitize_name(name: &str) -> String {
    name.chars()
        .filter_map(|c| {
            if c.is_whitespace() {
                Some('-')
            } else if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                Some(c)
            } else {
                None
            }
        })
        .collect()
}
