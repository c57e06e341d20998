use std::io::{Read, Seek};
use std::path::Path;

use tracing::{debug, warn};

use crate::core::error::{InstallerError, InstallerResult};

/// Copy every archive entry under `overrides_root` into `game_dir`,
/// preserving relative paths and creating directories as needed.
///
/// Entries outside the overrides root and directory entries are skipped.
/// Entry names that would escape the target directory are skipped too —
/// nothing is ever written outside `game_dir`. Returns the number of files
/// written.
pub fn extract_overrides<R: Read + Seek>(
    archive: &mut zip::ZipArchive<R>,
    overrides_root: &str,
    game_dir: &Path,
) -> InstallerResult<usize> {
    let mut written = 0usize;

    for index in 0..archive.len() {
        let mut entry = archive.by_index(index)?;
        if entry.is_dir() {
            continue;
        }

        let Some(entry_path) = entry.enclosed_name() else {
            warn!("Skipping unsafe archive entry {:?}", entry.name());
            continue;
        };
        let Ok(relative) = entry_path.strip_prefix(overrides_root) else {
            continue;
        };

        let dest = game_dir.join(relative);
        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent).map_err(|e| InstallerError::OverlayWriteFailed {
                path: parent.to_path_buf(),
                reason: e.to_string(),
            })?;
        }

        let mut out =
            std::fs::File::create(&dest).map_err(|e| InstallerError::OverlayWriteFailed {
                path: dest.clone(),
                reason: e.to_string(),
            })?;
        std::io::copy(&mut entry, &mut out).map_err(|e| InstallerError::OverlayWriteFailed {
            path: dest.clone(),
            reason: e.to_string(),
        })?;

        written += 1;
    }

    debug!("Copied {} override files into {:?}", written, game_dir);
    Ok(written)
}
