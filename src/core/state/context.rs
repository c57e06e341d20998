use std::path::PathBuf;

use reqwest::Client;

use crate::core::http::build_http_client;
use crate::core::instance::InstanceManager;

const APP_DIR_NAME: &str = "packhorse";

/// Process-wide context handed to the installer at construction.
///
/// Owns the data directory layout (`instances/`, `versions/`, `libraries/`),
/// the shared HTTP client and the instance manager. Created once per
/// invocation and dropped at process exit.
pub struct LauncherState {
    pub data_dir: PathBuf,
    pub instance_manager: InstanceManager,
    pub http_client: Client,
}

impl LauncherState {
    pub fn new() -> Result<Self, reqwest::Error> {
        Self::with_data_dir(default_data_dir())
    }

    /// Build a state rooted at an explicit data directory.
    pub fn with_data_dir(data_dir: PathBuf) -> Result<Self, reqwest::Error> {
        let instance_manager = InstanceManager::new(data_dir.join("instances"));
        let http_client = build_http_client()?;

        Ok(Self {
            data_dir,
            instance_manager,
            http_client,
        })
    }

    pub fn instances_dir(&self) -> PathBuf {
        self.data_dir.join("instances")
    }

    pub fn versions_dir(&self) -> PathBuf {
        self.data_dir.join("versions")
    }

    pub fn libraries_dir(&self) -> PathBuf {
        self.data_dir.join("libraries")
    }
}

fn default_data_dir() -> PathBuf {
    let base = dirs::data_dir().unwrap_or_else(|| PathBuf::from("."));
    let dir = base.join(APP_DIR_NAME);

    if !dir.exists() {
        let _ = std::fs::create_dir_all(&dir);
    }

    dir
}

/// Pick a default `java.memory.max` for a modded instance.
///
/// Modpacks choke on the vanilla 1G default. Aim for 4G, stepping down on
/// machines that cannot spare it.
pub fn default_max_memory() -> String {
    let mut sys = sysinfo::System::new();
    sys.refresh_memory();
    let total_mb = sys.total_memory() / (1024 * 1024);

    if total_mb >= 12 * 1024 {
        "4G".to_string()
    } else if total_mb >= 6 * 1024 {
        "3G".to_string()
    } else {
        "2G".to_string()
    }
}
