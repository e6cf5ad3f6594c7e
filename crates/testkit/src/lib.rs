#![warn(missing_docs)]
//! Test fixtures: throwaway data directories and log capture.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Name of the restricted-ids folder inside a [`Scratch`] directory.
pub const RESTRICTED_IDS_DIR: &str = "RestrictedIDs";

/// Install a test-friendly tracing subscriber once per process.
///
/// Output goes through the test harness writer so it only shows for failing
/// tests. Respects `RUST_LOG`, defaulting to `debug`.
pub fn init_test_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

/// A temporary data directory removed on drop.
pub struct Scratch {
    dir: TempDir,
}

impl Scratch {
    /// Create an empty scratch directory.
    pub fn new() -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix("modhelper-")
            .tempdir()
            .context("Failed to create scratch directory")?;
        Ok(Self { dir })
    }

    /// Root of the scratch directory.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Absolute path of `relative` inside the scratch directory.
    pub fn join<P: AsRef<Path>>(&self, relative: P) -> PathBuf {
        self.dir.path().join(relative)
    }

    /// Restricted-ids folder path (not created until something is written).
    pub fn restricted_dir(&self) -> PathBuf {
        self.join(RESTRICTED_IDS_DIR)
    }

    /// Write `lines` (newline-terminated) to `relative`, creating parents.
    pub fn write_lines<P: AsRef<Path>>(&self, relative: P, lines: &[&str]) -> Result<PathBuf> {
        let path = self.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let mut text = String::new();
        for line in lines {
            text.push_str(line);
            text.push('\n');
        }
        fs::write(&path, text).with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(path)
    }

    /// Write a restricted-ids file named `file_name`.
    pub fn write_restricted(&self, file_name: &str, lines: &[&str]) -> Result<PathBuf> {
        self.write_lines(Path::new(RESTRICTED_IDS_DIR).join(file_name), lines)
    }

    /// Read `relative` as text.
    pub fn read<P: AsRef<Path>>(&self, relative: P) -> Result<String> {
        let path = self.join(relative);
        fs::read_to_string(&path).with_context(|| format!("Failed to read {}", path.display()))
    }

    /// Non-empty lines of `relative`.
    pub fn read_lines<P: AsRef<Path>>(&self, relative: P) -> Result<Vec<String>> {
        Ok(self
            .read(relative)?
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(str::to_string)
            .collect())
    }
}
