// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Staging directory interaction.

A staging directory is the on-disk input to a package build: a `DEBIAN`
subdirectory holding the control file and maintainer scripts, plus an
arbitrary payload tree mirroring the paths to install.
*/

use {
    crate::error::{DebStageError, Result},
    log::debug,
    std::{
        ffi::OsStr,
        path::{Path, PathBuf},
    },
};

/// Name of the control-metadata subdirectory within a staging directory.
pub const CONTROL_DIRECTORY_NAME: &str = "DEBIAN";

/// Name of the control file within the control-metadata subdirectory.
pub const CONTROL_FILE_NAME: &str = "control";

/// Permission bits required on every control-metadata file.
pub const CONTROL_FILE_MODE: u32 = 0o644;

/// Platform housekeeping files never included in archives.
const HOUSEKEEPING_FILE_NAMES: &[&str] = &[".DS_Store"];

#[cfg(unix)]
fn file_mode(metadata: &std::fs::Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;

    metadata.permissions().mode() & 0o7777
}

#[cfg(windows)]
fn file_mode(_metadata: &std::fs::Metadata) -> u32 {
    CONTROL_FILE_MODE
}

/// A regular file discovered under a staging directory.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StagedFile {
    path: PathBuf,
    relative_path: PathBuf,
    mode: u32,
}

impl StagedFile {
    fn new(path: PathBuf, relative_path: PathBuf, metadata: &std::fs::Metadata) -> Self {
        Self {
            path,
            relative_path,
            mode: file_mode(metadata),
        }
    }

    /// Path of this file on disk.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path of this file relative to the directory it was enumerated from.
    pub fn relative_path(&self) -> &Path {
        &self.relative_path
    }

    /// Unix permission bits of this file.
    pub fn mode(&self) -> u32 {
        self.mode
    }

    /// Read the file content into memory.
    pub fn read_data(&self) -> Result<Vec<u8>> {
        Ok(std::fs::read(&self.path)?)
    }
}

/// A staging directory from which a package is assembled.
#[derive(Clone, Debug)]
pub struct StagingDirectory {
    root: PathBuf,
}

impl StagingDirectory {
    /// Create an instance bound to a staging root path.
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// The staging root path.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the control-metadata subdirectory.
    pub fn control_directory(&self) -> PathBuf {
        self.root.join(CONTROL_DIRECTORY_NAME)
    }

    /// Verify the staging layout.
    ///
    /// The control-metadata subdirectory must exist and be a directory, and
    /// must contain the control file.
    pub fn validate_layout(&self) -> Result<()> {
        let control_directory = self.control_directory();

        if !control_directory.is_dir() {
            return Err(DebStageError::ControlDirectoryInvalid);
        }

        if !control_directory.join(CONTROL_FILE_NAME).is_file() {
            return Err(DebStageError::ControlFileMissing);
        }

        Ok(())
    }

    /// Enumerate regular files directly inside the control-metadata
    /// subdirectory, sorted by file name.
    ///
    /// Returned entries have bare file names as their relative paths.
    pub fn control_files(&self) -> Result<Vec<StagedFile>> {
        let mut files = vec![];

        for entry in std::fs::read_dir(self.control_directory())? {
            let entry = entry?;
            let metadata = entry.metadata()?;

            if !metadata.is_file() {
                continue;
            }

            files.push(StagedFile::new(
                entry.path(),
                PathBuf::from(entry.file_name()),
                &metadata,
            ));
        }

        files.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));

        Ok(files)
    }

    /// Enumerate payload files: every regular file under the staging root
    /// outside the control-metadata subtree.
    ///
    /// The control-metadata subtree is excluded at any depth. Directory
    /// entries and housekeeping files are skipped. Iteration order is
    /// deterministic.
    pub fn data_files(&self) -> Result<Vec<StagedFile>> {
        let control_directory = self.control_directory();

        let mut files = vec![];

        // The walk isn't deterministic on its own, so order entries ourselves.
        let walk = walkdir::WalkDir::new(&self.root)
            .sort_by(|a, b| a.file_name().cmp(b.file_name()));

        for entry in walk {
            let entry = entry?;
            let path = entry.path();

            if path.starts_with(&control_directory) {
                continue;
            }

            if !entry.file_type().is_file() {
                continue;
            }

            if HOUSEKEEPING_FILE_NAMES
                .iter()
                .any(|name| entry.file_name() == OsStr::new(name))
            {
                continue;
            }

            let metadata = entry.metadata()?;
            let relative_path = path.strip_prefix(&self.root)?.to_path_buf();

            debug!("staged {} as {}", path.display(), relative_path.display());

            files.push(StagedFile::new(
                path.to_path_buf(),
                relative_path,
                &metadata,
            ));
        }

        Ok(files)
    }
}
