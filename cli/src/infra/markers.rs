//! Infrastructure implementation of the `MarkerStore` port.
//!
//! Markers are plain files in the platform home directory; only their
//! existence matters. Writes go through a temp file and a rename so a crash
//! never leaves a half-written marker behind.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::application::ports::{Marker, MarkerStore};
use crate::domain::settings::{COMPLETION_MARKER_FILE, INSTALL_MARKER_FILE};

/// Marker files kept under the platform home directory.
pub struct FileMarkerStore {
    home: PathBuf,
}

impl FileMarkerStore {
    #[must_use]
    pub fn new(home: &Path) -> Self {
        Self {
            home: home.to_path_buf(),
        }
    }

    /// Location of a marker on disk.
    #[must_use]
    pub fn path(&self, marker: Marker) -> PathBuf {
        self.home.join(match marker {
            Marker::PlatformInstalled => INSTALL_MARKER_FILE,
            Marker::InstallCompleted => COMPLETION_MARKER_FILE,
        })
    }

    fn contents(marker: Marker) -> &'static str {
        match marker {
            Marker::PlatformInstalled => "Initialized",
            Marker::InstallCompleted => "",
        }
    }
}

impl MarkerStore for FileMarkerStore {
    fn is_set(&self, marker: Marker) -> Result<bool> {
        let path = self.path(marker);
        path.try_exists()
            .with_context(|| format!("checking marker {}", path.display()))
    }

    fn set(&self, marker: Marker) -> Result<()> {
        let path = self.path(marker);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating directory {}", parent.display()))?;
        }

        let temp_path = path.with_extension("tmp");
        std::fs::write(&temp_path, Self::contents(marker))
            .with_context(|| format!("writing temp file {}", temp_path.display()))?;
        std::fs::rename(&temp_path, &path)
            .with_context(|| format!("finalizing marker {}", path.display()))?;

        tracing::debug!(marker = ?marker, path = %path.display(), "marker written");
        Ok(())
    }
}
