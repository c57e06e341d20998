pub mod core;

pub use crate::core::error::{InstallerError, InstallerResult};
pub use crate::core::pack::{InstallReport, PackInstaller};
pub use crate::core::state::LauncherState;
