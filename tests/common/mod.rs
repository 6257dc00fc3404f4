#![allow(dead_code)]

use std::fs;
use std::path::PathBuf;

use tempfile::{TempDir, tempdir};

/// Scratch directory that cleans up after itself when the test ends.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    /// Writes `contents` to a file under the workspace and returns its path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        fs::write(&path, contents).expect("write temp file");
        path
    }
}
