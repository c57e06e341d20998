pub mod queue;

pub use queue::{DownloadQueue, DownloadReport, DownloadTask};
