// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! I/O helpers. */

use {crate::error::Result, std::io::Read};

/// Compression format applied to `.deb` member archives.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Compression {
    /// Gzip compression (`.gz` extension).
    Gzip,

    /// Bzip2 compression (`.bz2` extension).
    Bzip2,

    /// LZMA compression, stored in an xz container (`.xz` extension).
    Lzma,
}

impl Compression {
    /// Filename extension for archives compressed in this format.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Gzip => ".gz",
            Self::Bzip2 => ".bz2",
            Self::Lzma => ".xz",
        }
    }

    /// Compress input data from a reader.
    pub fn compress(&self, reader: &mut impl Read) -> Result<Vec<u8>> {
        let mut buffer = vec![];

        match self {
            Self::Gzip => {
                let header = libflate::gzip::HeaderBuilder::new().finish();

                let mut encoder = libflate::gzip::Encoder::with_options(
                    &mut buffer,
                    libflate::gzip::EncodeOptions::new().header(header),
                )?;
                std::io::copy(reader, &mut encoder)?;
                encoder.finish().into_result()?;
            }
            Self::Bzip2 => {
                let mut encoder =
                    bzip2::write::BzEncoder::new(buffer, bzip2::Compression::best());
                std::io::copy(reader, &mut encoder)?;
                buffer = encoder.finish()?;
            }
            Self::Lzma => {
                let mut encoder = xz2::write::XzEncoder::new(buffer, 6);
                std::io::copy(reader, &mut encoder)?;
                buffer = encoder.finish()?;
            }
        }

        Ok(buffer)
    }

    /// Decompress input data from a reader.
    pub fn decompress(&self, reader: &mut impl Read) -> Result<Vec<u8>> {
        let mut buffer = vec![];

        match self {
            Self::Gzip => {
                let mut decoder = libflate::gzip::Decoder::new(reader)?;
                std::io::copy(&mut decoder, &mut buffer)?;
            }
            Self::Bzip2 => {
                let mut decoder = bzip2::read::BzDecoder::new(reader);
                std::io::copy(&mut decoder, &mut buffer)?;
            }
            Self::Lzma => {
                let mut decoder = xz2::read::XzDecoder::new(reader);
                std::io::copy(&mut decoder, &mut buffer)?;
            }
        }

        Ok(buffer)
    }
}
