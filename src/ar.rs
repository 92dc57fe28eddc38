// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Classic Unix ar archive writing.

An ar archive is the outer envelope of a `.deb` package: an 8 byte global
magic followed by a sequence of members, each a fixed-layout 60 byte ASCII
header and the member content, aligned to 2 bytes. The format is described
in <https://manpages.debian.org/unstable/dpkg-dev/deb.5.en.html>.
*/

use {
    crate::error::{DebStageError, Result},
    std::io::Write,
};

/// File identification bytes stored at the beginning of an archive.
pub const MAGIC: &[u8; 8] = b"!<arch>\n";

/// The terminator for each member header.
pub const HEADER_TERMINATOR: &[u8; 2] = b"`\n";

/// Longest member name representable in this format variant.
pub const MEMBER_NAME_MAX: usize = 16;

/// File mode stamped on every member header (octal regular file, rw-r--r--).
const MEMBER_MODE: &str = "0100644";

/// Streaming writer for ar archives.
///
/// Members are appended one at a time via [Self::append]. The global magic
/// is emitted exactly once, before the first member. Member headers carry
/// uid/gid 0 and a fixed regular-file mode; content is written verbatim
/// without validation.
pub struct ArBuilder<W: Write> {
    writer: W,
    mtime: u64,
    magic_written: bool,
}

impl<W: Write> ArBuilder<W> {
    /// Create a new archive writer emitting to `writer`.
    ///
    /// `mtime` is recorded on every member header, as seconds since the
    /// Unix epoch.
    pub fn new(writer: W, mtime: u64) -> Self {
        Self {
            writer,
            mtime,
            magic_written: false,
        }
    }

    /// Append a member to the archive.
    ///
    /// Members are 2 byte aligned, so content of odd length is followed by
    /// a single newline pad byte. The size header field always records the
    /// unpadded length.
    ///
    /// Names longer than [MEMBER_NAME_MAX] bytes cannot be represented and
    /// are rejected.
    pub fn append(&mut self, name: &str, data: &[u8]) -> Result<()> {
        if name.len() > MEMBER_NAME_MAX {
            return Err(DebStageError::ArchiveMemberNameTooLong(name.to_string()));
        }

        if !self.magic_written {
            self.writer.write_all(MAGIC)?;
            self.magic_written = true;
        }

        // Header fields are ASCII, left justified, space padded.
        write!(self.writer, "{:<16}", name)?;
        write!(self.writer, "{:<12}", self.mtime)?;
        write!(self.writer, "{:<6}", 0)?;
        write!(self.writer, "{:<6}", 0)?;
        write!(self.writer, "{:<8}", MEMBER_MODE)?;
        write!(self.writer, "{:<10}", data.len())?;
        self.writer.write_all(HEADER_TERMINATOR)?;

        self.writer.write_all(data)?;
        if data.len() % 2 == 1 {
            self.writer.write_all(b"\n")?;
        }

        Ok(())
    }

    /// Consume the builder, returning the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}
