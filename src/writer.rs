//! Change-Aware File Writer
//!
//! Identical content is never rewritten, so timestamp-based build systems
//! only see files that really changed.

use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tracing::debug;

use crate::hashing::sha256_hex;
use crate::merge::OutputPlan;
use crate::pipeline::CodegenError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteOutcome {
    /// Content identical, file left alone.
    Unchanged,
    /// File created or rewritten.
    Changed,
    /// Content identical but the mtime was pushed forward.
    Touched,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WrittenFile {
    /// Relative to the generation root.
    pub path: PathBuf,
    pub outcome: WriteOutcome,
    pub sha256: String,
}

fn io_error(path: &Path, source: io::Error) -> CodegenError {
    CodegenError::Io {
        path: path.to_path_buf(),
        source,
    }
}

fn same_content(path: &Path, content: &str) -> Result<bool, CodegenError> {
    match fs::read(path) {
        Ok(existing) => Ok(existing == content.as_bytes()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(io_error(path, e)),
    }
}

fn write_through(path: &Path, content: &str) -> Result<(), CodegenError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| io_error(parent, e))?;
    }
    fs::write(path, content).map_err(|e| io_error(path, e))
}

/// Writes `content` unless the file already holds exactly that.
pub fn write_file(path: &Path, content: &str) -> Result<WriteOutcome, CodegenError> {
    if same_content(path, content)? {
        debug!(path = %path.display(), "unchanged");
        return Ok(WriteOutcome::Unchanged);
    }
    write_through(path, content)?;
    debug!(path = %path.display(), "written");
    Ok(WriteOutcome::Changed)
}

/// Like [`write_file`], but an unchanged file still gets a newer mtime.
pub fn write_file_touching(path: &Path, content: &str) -> Result<WriteOutcome, CodegenError> {
    match write_file(path, content)? {
        WriteOutcome::Unchanged => {
            touch(path)?;
            debug!(path = %path.display(), "touched");
            Ok(WriteOutcome::Touched)
        }
        outcome => Ok(outcome),
    }
}

/// Moves the mtime strictly past its previous value.
pub fn touch(path: &Path) -> Result<(), CodegenError> {
    let modified = |p: &Path| -> Result<SystemTime, CodegenError> {
        fs::metadata(p)
            .and_then(|m| m.modified())
            .map_err(|e| io_error(p, e))
    };
    let before = modified(path)?;
    let file = File::options().write(true).open(path).map_err(|e| io_error(path, e))?;

    let now = SystemTime::now();
    let wanted = if now > before { now } else { before + Duration::from_secs(1) };
    file.set_modified(wanted).map_err(|e| io_error(path, e))?;

    // coarse filesystems may have truncated the new stamp back to `before`
    if modified(path)? <= before {
        file.set_modified(before + Duration::from_secs(1))
            .map_err(|e| io_error(path, e))?;
    }
    Ok(())
}

/// Writes every planned file below `root`, in plan order.
pub fn apply_plan(root: &Path, plan: &OutputPlan) -> Result<Vec<WrittenFile>, CodegenError> {
    let mut written = Vec::with_capacity(plan.files.len());
    for file in &plan.files {
        let path = root.join(&file.path);
        let outcome = if file.force_touch {
            write_file_touching(&path, &file.content)?
        } else {
            write_file(&path, &file.content)?
        };
        written.push(WrittenFile {
            path: file.path.clone(),
            outcome,
            sha256: sha256_hex(file.content.as_bytes()),
        });
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::UNIX_EPOCH;

    fn mtime(path: &Path) -> SystemTime {
        fs::metadata(path).unwrap().modified().unwrap()
    }

    fn backdate(path: &Path) -> SystemTime {
        let past = UNIX_EPOCH + Duration::from_secs(1_000_000);
        File::options().write(true).open(path).unwrap().set_modified(past).unwrap();
        mtime(path)
    }

    #[test]
    fn test_identical_content_is_not_rewritten() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Foo.hpp");

        assert_eq!(write_file(&path, "a").unwrap(), WriteOutcome::Changed);
        let past = backdate(&path);
        assert_eq!(write_file(&path, "a").unwrap(), WriteOutcome::Unchanged);
        assert_eq!(mtime(&path), past);
    }

    #[test]
    fn test_different_content_updates_file_and_mtime() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Foo.hpp");

        write_file(&path, "a").unwrap();
        let past = backdate(&path);
        assert_eq!(write_file(&path, "b").unwrap(), WriteOutcome::Changed);
        assert_eq!(fs::read_to_string(&path).unwrap(), "b");
        assert!(mtime(&path) > past);
    }

    #[test]
    fn test_parent_directories_created_lazily() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("binding_arm").join("Foo.hpp");
        assert!(!path.parent().unwrap().exists());
        write_file(&path, "x").unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_forced_touch_moves_mtime_forward() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("GeneratedSource.cpp");

        assert_eq!(write_file_touching(&path, "x").unwrap(), WriteOutcome::Changed);
        let past = backdate(&path);
        assert_eq!(write_file_touching(&path, "x").unwrap(), WriteOutcome::Touched);
        assert!(mtime(&path) > past);
        assert_eq!(fs::read_to_string(&path).unwrap(), "x");
    }

    #[test]
    fn test_touch_is_strict_even_when_clock_lags() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("f");
        fs::write(&path, "x").unwrap();
        let future = SystemTime::now() + Duration::from_secs(3600);
        File::options().write(true).open(&path).unwrap().set_modified(future).unwrap();
        let before = mtime(&path);
        touch(&path).unwrap();
        assert!(mtime(&path) > before);
    }
}
