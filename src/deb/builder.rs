// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Create .deb package files and their components. */

use {
    crate::{
        ar::ArBuilder,
        binary_package_control::BinaryPackageControlFile,
        error::{DebStageError, Result},
        io::Compression,
        staging::{StagingDirectory, CONTROL_FILE_MODE, CONTROL_FILE_NAME},
    },
    log::debug,
    std::{
        io::{Cursor, Read, Write},
        path::Path,
        time::SystemTime,
    },
};

/// Name of the format version member leading every `.deb` archive.
pub const DEBIAN_BINARY_MEMBER: &str = "debian-binary";

/// Content of the format version member. The trailing space is part of the
/// encoding.
pub const DEBIAN_BINARY_DATA: &[u8] = b"2.0 ";

/// Codec applied to the control archive.
///
/// Independent of the data archive codec, which is caller selected.
const CONTROL_COMPRESSION: Compression = Compression::Gzip;

fn new_tar_header(mtime: u64) -> Result<tar::Header> {
    let mut header = tar::Header::new_gnu();
    header.set_uid(0);
    header.set_gid(0);
    header.set_username("root")?;
    header.set_groupname("root")?;
    header.set_mtime(mtime);

    Ok(header)
}

fn set_header_path(
    builder: &mut tar::Builder<impl Write>,
    header: &mut tar::Header,
    name: &str,
) -> Result<()> {
    // Data archive member names carry a leading `/` so they mirror
    // installed paths. `header.set_path()` refuses absolute paths, so the
    // name field is populated directly.

    // We should only be dealing with GNU headers, which simplifies our code a bit.
    assert!(header.as_ustar().is_none());

    let value_bytes = name.as_bytes();

    let name_buffer = &mut header.as_old_mut().name;

    // If it fits within the buffer, copy it over.
    if value_bytes.len() <= name_buffer.len() {
        name_buffer[0..value_bytes.len()].copy_from_slice(value_bytes);
    } else {
        // Else we emit a special entry to extend the filename. Who knew tar
        // files were this jank.
        let mut header2 = tar::Header::new_gnu();
        let long_link = b"././@LongLink";
        header2.as_gnu_mut().unwrap().name[..long_link.len()].clone_from_slice(&long_link[..]);
        header2.set_mode(0o644);
        header2.set_uid(0);
        header2.set_gid(0);
        header2.set_mtime(0);
        header2.set_size(value_bytes.len() as u64 + 1);
        header2.set_entry_type(tar::EntryType::new(b'L'));
        header2.set_cksum();
        let mut data = value_bytes.chain(std::io::repeat(0).take(1));
        builder.append(&header2, &mut data)?;

        let truncated_bytes = &value_bytes[0..name_buffer.len()];
        name_buffer[0..truncated_bytes.len()].copy_from_slice(truncated_bytes);
    }

    Ok(())
}

/// A builder for the `control.tar.gz` member of a `.deb` file.
///
/// The control-metadata directory is validated before being archived:
/// the staging layout, the permission bits of every file in the directory
/// (which must be exactly `0644`, in both directions), and the `Package` /
/// `Version` fields of the control file.
pub struct ControlTarBuilder<'a> {
    staging: &'a StagingDirectory,
    mtime: u64,
}

impl<'a> ControlTarBuilder<'a> {
    /// Create a new instance over a staging directory.
    pub fn new(staging: &'a StagingDirectory, mtime: u64) -> Self {
        Self { staging, mtime }
    }

    /// Build the compressed control archive.
    ///
    /// Members are every file directly inside the control-metadata
    /// directory, stored under their bare file names.
    pub fn build(&self) -> Result<Vec<u8>> {
        self.staging.validate_layout()?;

        let files = self.staging.control_files()?;

        for file in &files {
            if file.mode() != CONTROL_FILE_MODE {
                return Err(DebStageError::InvalidFilePermissions);
            }
        }

        let control_data =
            std::fs::read(self.staging.control_directory().join(CONTROL_FILE_NAME))?;
        BinaryPackageControlFile::parse_reader(&mut control_data.as_slice())?.validate()?;

        let mut builder = tar::Builder::new(Vec::new());

        for file in &files {
            let data = file.read_data()?;

            debug!("adding control member {}", file.relative_path().display());

            let mut header = new_tar_header(self.mtime)?;
            header.set_path(file.relative_path())?;
            header.set_mode(file.mode());
            header.set_size(data.len() as u64);
            header.set_cksum();
            builder.append(&header, &*data)?;
        }

        let tar_data = builder.into_inner()?;

        CONTROL_COMPRESSION.compress(&mut Cursor::new(tar_data))
    }
}

/// A builder for the `data.tar.<ext>` member carrying the installable
/// payload.
pub struct DataTarBuilder<'a> {
    staging: &'a StagingDirectory,
    compression: Compression,
    mtime: u64,
}

impl<'a> DataTarBuilder<'a> {
    /// Create a new instance over a staging directory.
    pub fn new(staging: &'a StagingDirectory, compression: Compression, mtime: u64) -> Self {
        Self {
            staging,
            compression,
            mtime,
        }
    }

    /// Build the compressed data archive.
    ///
    /// Payload content passes through unvalidated. A staging tree without
    /// payload files produces a valid archive with no members.
    pub fn build(&self) -> Result<Vec<u8>> {
        let mut builder = tar::Builder::new(Vec::new());

        for file in self.staging.data_files()? {
            let data = file.read_data()?;

            let name = format!("/{}", file.relative_path().display());

            debug!("adding data member {}", name);

            let mut header = new_tar_header(self.mtime)?;
            set_header_path(&mut builder, &mut header, &name)?;
            header.set_mode(file.mode());
            header.set_size(data.len() as u64);
            header.set_cksum();
            builder.append(&header, &*data)?;
        }

        let tar_data = builder.into_inner()?;

        self.compression.compress(&mut Cursor::new(tar_data))
    }
}

/// A builder for a `.deb` package file.
///
/// Orchestrates the control and data archive builders over a staging
/// directory and emits the assembled package: the `debian-binary` version
/// member, then `control.tar.gz`, then `data.tar.<ext>`.
pub struct DebBuilder {
    staging: StagingDirectory,
    compression: Compression,
    mtime: Option<SystemTime>,
}

impl DebBuilder {
    /// Construct a new instance over a staging directory root.
    pub fn new(staging_root: impl AsRef<Path>) -> Self {
        Self {
            staging: StagingDirectory::new(staging_root),
            compression: Compression::Gzip,
            mtime: None,
        }
    }

    /// Set the compression format used for the data archive.
    ///
    /// The control archive is always gzip compressed, regardless of this
    /// setting. Not all compression formats are supported by all Linux
    /// distributions.
    pub fn set_compression(mut self, compression: Compression) -> Self {
        self.compression = compression;
        self
    }

    /// Set the modified time to use on archive members.
    ///
    /// If this is called, all archive members will use the specified time,
    /// helping to make archive content deterministic.
    ///
    /// If not called, the current time will be used.
    pub fn set_mtime(mut self, time: Option<SystemTime>) -> Self {
        self.mtime = time;
        self
    }

    fn mtime(&self) -> u64 {
        self.mtime
            .unwrap_or_else(SystemTime::now)
            .duration_since(std::time::UNIX_EPOCH)
            .expect("times before UNIX epoch not accepted")
            .as_secs()
    }

    /// Write `.deb` file content to a writer.
    pub fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        // Validate the layout before any archive work so failures occur
        // before the first byte is written.
        self.staging.validate_layout()?;

        let mtime = self.mtime();

        let control_tar = ControlTarBuilder::new(&self.staging, mtime).build()?;
        let data_tar = DataTarBuilder::new(&self.staging, self.compression, mtime).build()?;

        let mut ar_builder = ArBuilder::new(writer, mtime);

        ar_builder.append(DEBIAN_BINARY_MEMBER, DEBIAN_BINARY_DATA)?;
        ar_builder.append(
            &format!("control.tar{}", CONTROL_COMPRESSION.extension()),
            &control_tar,
        )?;
        ar_builder.append(
            &format!("data.tar{}", self.compression.extension()),
            &data_tar,
        )?;

        Ok(())
    }

    /// Build the package and write it to a file at `dest`.
    ///
    /// The package is fully assembled in memory before the destination file
    /// is created, so no file exists at `dest` if assembly fails.
    pub fn write_to_path(&self, dest: impl AsRef<Path>) -> Result<()> {
        let mut buffer = Vec::new();
        self.write(&mut buffer)?;

        std::fs::write(dest, buffer)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use {super::*, indoc::indoc, std::path::PathBuf};

    #[cfg(unix)]
    use std::os::unix::fs::PermissionsExt;

    fn write_staged_file(path: &Path, data: &[u8]) -> Result<()> {
        std::fs::write(path, data)?;

        #[cfg(unix)]
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o644))?;

        Ok(())
    }

    fn staging_tree(control: &[u8]) -> Result<tempfile::TempDir> {
        let temp = tempfile::tempdir()?;

        std::fs::create_dir(temp.path().join("DEBIAN"))?;
        write_staged_file(&temp.path().join("DEBIAN").join("control"), control)?;

        Ok(temp)
    }

    fn tar_members(tar_data: Vec<u8>) -> Result<Vec<(PathBuf, Vec<u8>)>> {
        let mut archive = tar::Archive::new(Cursor::new(tar_data));

        let mut members = vec![];

        for entry in archive.entries()? {
            let mut entry = entry?;
            let path = entry.path()?.to_path_buf();

            let mut data = vec![];
            entry.read_to_end(&mut data)?;

            members.push((path, data));
        }

        Ok(members)
    }

    #[test]
    fn test_build_package() -> Result<()> {
        let temp = staging_tree(b"test123")?;
        write_staged_file(&temp.path().join("package_file"), b"1234567890")?;

        let dest = temp.path().join("test.deb");
        DebBuilder::new(temp.path()).write_to_path(&dest)?;

        let data = std::fs::read(&dest)?;
        assert!(data.len() > 100);
        assert_eq!(&data[0..8], b"!<arch>\n");

        let contains = |needle: &[u8]| data.windows(needle.len()).any(|window| window == needle);
        assert!(contains(b"debian-binary"));
        assert!(contains(b"control.tar.gz"));
        assert!(contains(b"data.tar."));

        Ok(())
    }

    #[test]
    fn test_member_order_and_content() -> Result<()> {
        let temp = staging_tree(b"test123")?;
        write_staged_file(&temp.path().join("package_file"), b"1234567890")?;

        let mut buffer = vec![];
        DebBuilder::new(temp.path())
            .set_compression(Compression::Bzip2)
            .write(&mut buffer)?;

        let mut archive = ar::Archive::new(Cursor::new(buffer));
        {
            let mut entry = archive.next_entry().unwrap().unwrap();
            assert_eq!(entry.header().identifier(), b"debian-binary");

            let mut data = vec![];
            entry.read_to_end(&mut data)?;
            assert_eq!(data, b"2.0 ");
        }
        {
            let mut entry = archive.next_entry().unwrap().unwrap();
            assert_eq!(entry.header().identifier(), b"control.tar.gz");

            let mut data = vec![];
            entry.read_to_end(&mut data)?;
            assert_eq!(&data[0..4], b"\x1f\x8b\x08\x00");
        }
        {
            let mut entry = archive.next_entry().unwrap().unwrap();
            assert_eq!(entry.header().identifier(), b"data.tar.bz2");

            let mut data = vec![];
            entry.read_to_end(&mut data)?;
            assert_eq!(&data[0..4], b"BZh9");
        }

        assert!(archive.next_entry().is_none());

        Ok(())
    }

    #[test]
    fn test_control_archive_members() -> Result<()> {
        let temp = staging_tree(b"test123")?;
        write_staged_file(&temp.path().join("DEBIAN").join("postinst"), b"echo 1234")?;
        write_staged_file(&temp.path().join("DEBIAN").join("preinst"), b"echo done")?;

        let staging = StagingDirectory::new(temp.path());
        let compressed = ControlTarBuilder::new(&staging, 2).build()?;

        assert_eq!(&compressed[0..4], b"\x1f\x8b\x08\x00");

        let tar_data = Compression::Gzip.decompress(&mut compressed.as_slice())?;

        assert_eq!(
            tar_members(tar_data)?,
            vec![
                (PathBuf::from("control"), b"test123".to_vec()),
                (PathBuf::from("postinst"), b"echo 1234".to_vec()),
                (PathBuf::from("preinst"), b"echo done".to_vec()),
            ]
        );

        Ok(())
    }

    #[test]
    fn test_data_archive_codecs() -> Result<()> {
        for compression in [Compression::Gzip, Compression::Bzip2, Compression::Lzma] {
            let temp = staging_tree(b"test123")?;
            for name in ["test1", "test2", "test3"] {
                write_staged_file(&temp.path().join(name), b"file data 123")?;
            }

            let staging = StagingDirectory::new(temp.path());
            let compressed = DataTarBuilder::new(&staging, compression, 2).build()?;

            let magic: &[u8] = match compression {
                Compression::Gzip => b"\x1f\x8b\x08\x00",
                Compression::Bzip2 => b"BZh9",
                Compression::Lzma => b"\xfd7zX",
            };
            assert_eq!(
                &compressed[0..magic.len()],
                magic,
                "{:?} stream magic",
                compression
            );

            let tar_data = compression.decompress(&mut compressed.as_slice())?;

            assert_eq!(
                tar_members(tar_data)?,
                vec![
                    (PathBuf::from("/test1"), b"file data 123".to_vec()),
                    (PathBuf::from("/test2"), b"file data 123".to_vec()),
                    (PathBuf::from("/test3"), b"file data 123".to_vec()),
                ]
            );
        }

        Ok(())
    }

    #[test]
    fn test_data_archive_nested_paths_and_exclusions() -> Result<()> {
        let temp = staging_tree(b"test123")?;

        std::fs::create_dir_all(temp.path().join("usr").join("bin"))?;
        write_staged_file(&temp.path().join("usr").join("bin").join("app"), b"binary")?;
        write_staged_file(&temp.path().join(".DS_Store"), b"junk")?;

        let staging = StagingDirectory::new(temp.path());
        let compressed = DataTarBuilder::new(&staging, Compression::Gzip, 2).build()?;

        let tar_data = Compression::Gzip.decompress(&mut compressed.as_slice())?;

        assert_eq!(
            tar_members(tar_data)?,
            vec![(PathBuf::from("/usr/bin/app"), b"binary".to_vec())]
        );

        Ok(())
    }

    #[test]
    fn test_data_archive_long_path() -> Result<()> {
        let temp = staging_tree(b"test123")?;

        let long_name = format!("f{}.txt", "u".repeat(200));
        write_staged_file(&temp.path().join(&long_name), b"*")?;

        let staging = StagingDirectory::new(temp.path());
        let compressed = DataTarBuilder::new(&staging, Compression::Gzip, 2).build()?;

        let tar_data = Compression::Gzip.decompress(&mut compressed.as_slice())?;
        let members = tar_members(tar_data)?;

        assert_eq!(members.len(), 1);
        assert_eq!(
            members[0].0,
            PathBuf::from(format!("/f{}.txt", "u".repeat(200)))
        );

        Ok(())
    }

    #[test]
    fn test_data_archive_empty_payload() -> Result<()> {
        let temp = staging_tree(b"test123")?;

        let staging = StagingDirectory::new(temp.path());
        let compressed = DataTarBuilder::new(&staging, Compression::Gzip, 2).build()?;

        let tar_data = Compression::Gzip.decompress(&mut compressed.as_slice())?;
        assert!(tar_members(tar_data)?.is_empty());

        Ok(())
    }

    #[test]
    fn test_missing_control_directory() -> Result<()> {
        let temp = tempfile::tempdir()?;
        write_staged_file(&temp.path().join("package_file"), b"1234567890")?;

        let dest = temp.path().join("test.deb");
        let err = DebBuilder::new(temp.path()).write_to_path(&dest).unwrap_err();

        assert_eq!(err.to_string(), "control directory is invalid");
        assert!(!dest.exists());

        Ok(())
    }

    #[test]
    fn test_missing_control_file() -> Result<()> {
        let temp = tempfile::tempdir()?;
        std::fs::create_dir(temp.path().join("DEBIAN"))?;

        let dest = temp.path().join("test.deb");
        let err = DebBuilder::new(temp.path()).write_to_path(&dest).unwrap_err();

        assert_eq!(err.to_string(), "control file missing");
        assert!(!dest.exists());

        Ok(())
    }

    #[test]
    #[cfg(unix)]
    fn test_invalid_control_file_permissions() -> Result<()> {
        for mode in [0o777, 0o600] {
            let temp = staging_tree(b"test123")?;
            std::fs::set_permissions(
                temp.path().join("DEBIAN").join("control"),
                std::fs::Permissions::from_mode(mode),
            )?;

            let dest = temp.path().join("test.deb");
            let err = DebBuilder::new(temp.path()).write_to_path(&dest).unwrap_err();

            assert_eq!(err.to_string(), "invalid file permissions");
            assert!(!dest.exists());
        }

        Ok(())
    }

    #[test]
    #[cfg(unix)]
    fn test_invalid_maintainer_script_permissions() -> Result<()> {
        let temp = staging_tree(b"test123")?;
        write_staged_file(&temp.path().join("DEBIAN").join("postinst"), b"echo 1234")?;
        std::fs::set_permissions(
            temp.path().join("DEBIAN").join("postinst"),
            std::fs::Permissions::from_mode(0o755),
        )?;

        let err = DebBuilder::new(temp.path())
            .write(&mut Vec::new())
            .unwrap_err();
        assert_eq!(err.to_string(), "invalid file permissions");

        Ok(())
    }

    #[test]
    fn test_invalid_package_name() -> Result<()> {
        let temp = staging_tree(
            indoc! {"
                Package: com.testINVALID
                Version: 1.0
                Architecture: arm64
            "}
            .as_bytes(),
        )?;

        let dest = temp.path().join("test.deb");
        let err = DebBuilder::new(temp.path()).write_to_path(&dest).unwrap_err();

        assert_eq!(
            err.to_string(),
            "Package name has characters that aren't lowercase alphanums or '-+.'."
        );
        assert!(!dest.exists());

        Ok(())
    }

    #[test]
    fn test_invalid_package_version() -> Result<()> {
        let temp = staging_tree(
            indoc! {"
                Package: com.test
                Version: womp
                Architecture: arm64
            "}
            .as_bytes(),
        )?;

        let dest = temp.path().join("test.deb");
        let err = DebBuilder::new(temp.path()).write_to_path(&dest).unwrap_err();

        assert_eq!(
            err.to_string(),
            "Package version womp doesn't contain any digits."
        );
        assert!(!dest.exists());

        Ok(())
    }

    #[test]
    fn test_explicit_mtime() -> Result<()> {
        let temp = staging_tree(b"test123")?;

        let build = || -> Result<Vec<u8>> {
            let mut buffer = vec![];
            DebBuilder::new(temp.path())
                .set_mtime(Some(SystemTime::UNIX_EPOCH))
                .write(&mut buffer)?;
            Ok(buffer)
        };

        // A pinned mtime makes output reproducible byte for byte.
        assert_eq!(build()?, build()?);

        Ok(())
    }
}
