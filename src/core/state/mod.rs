pub mod context;

pub use context::LauncherState;
