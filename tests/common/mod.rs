// SPDX-License-Identifier: MIT OR Apache-2.0

//! Helper utilities for directory-tier integration tests.

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tiercfg::service::LayerList;

/// A set of tier roots inside one temporary directory.
///
/// Tiers are created lazily by name and keep the order of their first use,
/// which is also their precedence order in [`TierTree::layers`].
#[allow(dead_code)]
pub struct TierTree {
    dir: TempDir,
    tiers: Vec<String>,
}

#[allow(dead_code)]
impl TierTree {
    /// Creates an empty tree with the given tiers, lowest precedence first.
    pub fn new(tiers: &[&str]) -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        for tier in tiers {
            fs::create_dir_all(dir.path().join(tier)).expect("Failed to create tier");
        }
        TierTree {
            dir,
            tiers: tiers.iter().map(|t| t.to_string()).collect(),
        }
    }

    /// Root directory of a tier.
    pub fn root(&self, tier: &str) -> PathBuf {
        self.dir.path().join(tier)
    }

    /// Writes `content` to `tier/relative`, creating parent directories.
    pub fn write(&self, tier: &str, relative: &str, content: &str) -> PathBuf {
        let path = self.root(tier).join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent dir");
        }
        fs::write(&path, content).expect("Failed to write file");
        path
    }

    /// All tiers as a layer list, in creation order.
    pub fn layers(&self) -> LayerList {
        self.tiers.iter().map(|tier| self.root(tier)).collect()
    }

    /// The temporary directory holding the tiers.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }
}
