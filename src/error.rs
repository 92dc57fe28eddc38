// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Error handling. */

use thiserror::Error;

/// Primary crate error type.
#[derive(Debug, Error)]
pub enum DebStageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("directory walk error: {0}")]
    DirectoryWalk(#[from] walkdir::Error),

    #[error("path prefix error: {0}")]
    StripPrefix(#[from] std::path::StripPrefixError),

    #[error("control directory is invalid")]
    ControlDirectoryInvalid,

    #[error("control file missing")]
    ControlFileMissing,

    #[error("invalid file permissions")]
    InvalidFilePermissions,

    #[error("Package name has characters that aren't lowercase alphanums or '-+.'.")]
    PackageNameIllegalChar,

    #[error("Package version {0} doesn't contain any digits.")]
    PackageVersionNoDigits(String),

    #[error("archive member name exceeds 16 bytes: {0}")]
    ArchiveMemberNameTooLong(String),
}

/// Result wrapper for this crate.
pub type Result<T> = std::result::Result<T, DebStageError>;
