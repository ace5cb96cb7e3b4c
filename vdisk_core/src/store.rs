//! Disk image storage.

use crate::error::Result;
use crate::image;
use crate::tree::Tree;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Storage location for the persisted disk image.
///
/// Every save is a full rewrite of the image, written atomically so a
/// crash mid-save never leaves a truncated image behind.
#[derive(Debug)]
pub struct Store {
    path: PathBuf,
}

impl Store {
    /// Create a store for the given image path. Performs no I/O; the file
    /// may not exist yet.
    pub fn at<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Path of the disk image file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Serialize the tree and write the complete image atomically.
    pub fn save(&self, tree: &Tree) -> Result<()> {
        let text = image::encode(tree);

        // Stage in the destination directory so persist is a rename
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut temp_file = tempfile::NamedTempFile::new_in(dir)?;
        temp_file.write_all(text.as_bytes())?;
        temp_file.flush()?;
        temp_file.persist(&self.path)?;

        debug!(path = %self.path.display(), bytes = text.len(), "saved disk image");
        Ok(())
    }

    /// Load the tree from the image.
    ///
    /// A missing image file is an empty tree rooted at root, not an error.
    pub fn load(&self) -> Result<Tree> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "no disk image, starting empty");
            return Ok(Tree::new());
        }

        let text = fs::read_to_string(&self.path)?;
        debug!(path = %self.path.display(), bytes = text.len(), "loaded disk image");
        Ok(image::decode(&text))
    }
}
