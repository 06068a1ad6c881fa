//! Snapshot save / load of a whole structure as JSON

use std::fs;
use std::path::Path;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{FEAError, FEAResult};
use crate::model::Structure;

/// Current snapshot layout version
pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Serialize)]
struct SnapshotRef<'a> {
    version: u32,
    structure: &'a Structure,
}

#[derive(Deserialize)]
struct Snapshot {
    version: u32,
    structure: Structure,
}

impl Structure {
    /// Write the structure, its results and configuration to `path`
    pub fn save_snapshot(&self, path: impl AsRef<Path>) -> FEAResult<()> {
        let path = path.as_ref();
        let io_err = |source| FEAError::SnapshotIo {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let bytes = serde_json::to_vec_pretty(&SnapshotRef {
            version: SNAPSHOT_VERSION,
            structure: self,
        })
        .map_err(|source| FEAError::SnapshotFormat {
            path: path.to_path_buf(),
            source,
        })?;
        fs::write(path, bytes).map_err(io_err)?;
        debug!("saved snapshot of '{}' to {}", self.name, path.display());
        Ok(())
    }

    /// Read a structure written by [`Structure::save_snapshot`]
    pub fn load_snapshot(path: impl AsRef<Path>) -> FEAResult<Structure> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|source| FEAError::SnapshotIo {
            path: path.to_path_buf(),
            source,
        })?;
        let snapshot: Snapshot =
            serde_json::from_slice(&bytes).map_err(|source| FEAError::SnapshotFormat {
                path: path.to_path_buf(),
                source,
            })?;
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(FEAError::Validation(format!(
                "{} has snapshot version {}, expected {SNAPSHOT_VERSION}",
                path.display(),
                snapshot.version
            )));
        }
        let mut structure = snapshot.structure;
        structure.rebuild_indexes()?;
        debug!(
            "loaded snapshot of '{}' ({} nodes, {} elements)",
            structure.name,
            structure.node_count(),
            structure.element_count()
        );
        Ok(structure)
    }
}
