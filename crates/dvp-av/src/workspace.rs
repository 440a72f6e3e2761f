//! Per-input scratch space.
//!
//! A [`Workspace`] provides a temporary directory for intermediate files
//! (fresh analysis logs, chapter metadata, trimmed intermediates). Files that
//! must outlive the run are moved out with [`Workspace::promote`]; everything
//! else is removed when the workspace is dropped, whether or not the owning
//! step succeeded.

use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Scratch directory scoped to the processing of one input file.
///
/// # Example
///
/// ```no_run
/// use dvp_av::Workspace;
///
/// let workspace = Workspace::new().unwrap();
/// let log = workspace.temp_file("tape01.dvrescue.xml");
/// // ... let the analysis tool write `log` ...
/// workspace.promote(&log, std::path::Path::new("/tapes/tape01.dv_dvpackager")).unwrap();
/// ```
#[derive(Debug)]
pub struct Workspace {
    temp_dir: TempDir,
}

impl Workspace {
    /// Create a new, empty scratch directory.
    pub fn new() -> dvp_core::Result<Self> {
        let temp_dir = tempfile::Builder::new()
            .prefix("dvpackager-")
            .tempdir()
            .map_err(|e| dvp_core::Error::tool("workspace", format!("failed to create temp dir: {e}")))?;

        Ok(Self { temp_dir })
    }

    /// Get the temp directory path.
    pub fn temp_dir(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Create a temp file path with the given name.
    pub fn temp_file(&self, name: &str) -> PathBuf {
        self.temp_dir.path().join(name)
    }

    /// Move a finished artifact into `dest_dir`, keeping its file name.
    ///
    /// Falls back to copy-and-delete when the temp directory lives on another
    /// filesystem.
    pub fn promote(&self, artifact: &Path, dest_dir: &Path) -> dvp_core::Result<PathBuf> {
        let file_name = artifact.file_name().ok_or_else(|| {
            dvp_core::Error::tool("workspace", format!("not a file: {}", artifact.display()))
        })?;
        std::fs::create_dir_all(dest_dir)?;
        let dest = dest_dir.join(file_name);

        if std::fs::rename(artifact, &dest).is_err() {
            std::fs::copy(artifact, &dest)?;
            std::fs::remove_file(artifact)?;
        }

        tracing::debug!("Promoted {} -> {}", artifact.display(), dest.display());
        Ok(dest)
    }
}
