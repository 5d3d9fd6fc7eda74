//! Structural export service
//!
//! Writes DOT snapshots of the tree to files. A failed write leaves the tree
//! untouched and is returned to the caller.

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use tracing::{debug, instrument};

use crate::application::{ApplicationResult, IoResultExt};
use crate::domain::AvlTree;
use crate::infrastructure::traits::FileSystem;

pub struct ExportService {
    fs: Arc<dyn FileSystem>,
}

impl ExportService {
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self { fs }
    }

    #[instrument(level = "debug", skip(self, tree))]
    pub fn write_dot(&self, tree: &AvlTree, path: &Path) -> ApplicationResult<()> {
        self.fs
            .ensure_parent(path)
            .with_path_context("create export directory", path)?;
        let mut sink = self
            .fs
            .create(path)
            .with_path_context("create export file", path)?;
        tree.export_structure(&mut sink)
            .and_then(|_| sink.flush())
            .with_path_context("write export file", path)?;
        debug!("exported {} nodes to {}", tree.count(), path.display());
        Ok(())
    }
}
