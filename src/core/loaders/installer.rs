use async_trait::async_trait;

use crate::core::error::InstallerResult;

use super::context::InstallContext;

/// Outcome of a loader install.
///
/// A version that was provisioned by an earlier run reports
/// `AlreadyInstalled` — a distinguished success, never an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoaderInstallOutcome {
    Installed,
    AlreadyInstalled,
}

#[async_trait]
pub trait LoaderInstaller: Send + Sync {
    async fn install(&self, ctx: InstallContext<'_>) -> InstallerResult<LoaderInstallOutcome>;
}
