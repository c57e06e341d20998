use std::path::Path;

/// Everything a loader installer needs to provision a version.
pub struct InstallContext<'a> {
    pub minecraft_version: &'a str,
    pub loader_version: &'a str,
    pub versions_root: &'a Path,
    pub libraries_root: &'a Path,
    pub http_client: &'a reqwest::Client,
}
