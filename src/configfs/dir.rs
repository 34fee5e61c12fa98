//! Directory and symlink primitives

use std::fs;
use std::path::{Path, PathBuf};

use nix::sys::stat::Mode;
use nix::unistd;
use tracing::debug;

use crate::error::{GadgetError, Result};

/// Which directory entries `list_dir` reports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryFilter {
    /// Everything except `.` and `..`
    All,
    /// Symbolic links only (configuration bindings)
    Symlinks,
}

/// Create a single directory (rwx for everyone, as configfs expects)
///
/// Fails if the directory already exists; in configfs the mkdir itself
/// instantiates the gadget, function or configuration.
pub fn create_dir(path: &Path) -> Result<()> {
    unistd::mkdir(path, Mode::S_IRWXU | Mode::S_IRWXG | Mode::S_IRWXO).map_err(|errno| {
        GadgetError::from_errno(
            errno,
            format!("Failed to create directory {}", path.display()),
        )
    })?;
    debug!("Created directory {}", path.display());
    Ok(())
}

/// Create directory if not exists
pub fn ensure_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path).map_err(|e| {
        GadgetError::from_io(&e, format!("Failed to create directory {}", path.display()))
    })
}

/// Check whether `path` is an existing directory
pub fn dir_exists(path: &Path) -> bool {
    path.is_dir()
}

/// Create symlink `link` pointing at `target`
pub fn create_symlink(target: &Path, link: &Path) -> Result<()> {
    std::os::unix::fs::symlink(target, link).map_err(|e| {
        GadgetError::from_io(
            &e,
            format!(
                "Failed to create symlink {} -> {}",
                link.display(),
                target.display()
            ),
        )
    })?;
    debug!("Linked {} -> {}", link.display(), target.display());
    Ok(())
}

/// Read the target a symlink points at
pub fn read_link_target(link: &Path) -> Result<PathBuf> {
    fs::read_link(link).map_err(|e| {
        GadgetError::from_io(&e, format!("Failed to read link {}", link.display()))
    })
}

/// List entry names of `path` in ascending byte order
///
/// Names that are not valid UTF-8 cannot be configfs objects created by
/// this crate and are skipped.
pub fn list_dir(path: &Path, filter: EntryFilter) -> Result<Vec<String>> {
    let entries = fs::read_dir(path).map_err(|e| {
        GadgetError::from_io(&e, format!("Failed to read directory {}", path.display()))
    })?;

    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| {
            GadgetError::Io(format!("Failed to read directory {}: {}", path.display(), e))
        })?;

        if filter == EntryFilter::Symlinks {
            let file_type = entry.file_type().map_err(|e| {
                GadgetError::from_io(&e, entry.path().display().to_string())
            })?;
            if !file_type.is_symlink() {
                continue;
            }
        }

        if let Ok(name) = entry.file_name().into_string() {
            names.push(name);
        }
    }

    names.sort();
    Ok(names)
}
