use crate::error::{Error, Result};
use log::{debug, info};
use std::fs;
use std::path::{Path, PathBuf};

pub const FIGURE_EXTENSION: &str = "jpeg";

/// Where the figure of one input file is saved.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputTarget {
    pub directory: PathBuf,
    pub filename: String,
}

impl OutputTarget {
    pub fn new(output_root: &Path, name: &str) -> OutputTarget {
        OutputTarget {
            directory: output_root.to_path_buf(),
            filename: format!("{}.{}", name, FIGURE_EXTENSION),
        }
    }

    pub fn path(&self) -> PathBuf {
        self.directory.join(&self.filename)
    }

    /// Creates the output directory if missing, leaves it alone otherwise.
    pub fn ensure_directory(&self) -> Result<()> {
        if self.directory.is_dir() {
            return Ok(());
        }
        info!("creating {}", self.directory.display());
        fs::create_dir_all(&self.directory).map_err(|source| Error::CreateDir {
            path: self.directory.clone(),
            source,
        })
    }
}

/// Deletes the source csv; only call once the figure is on disk.
pub fn remove_source(path: &Path) -> Result<()> {
    debug!("removing {}", path.display());
    fs::remove_file(path).map_err(|source| Error::Remove {
        path: path.to_path_buf(),
        source,
    })
}
