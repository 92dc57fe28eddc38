// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Debian binary package control files. */

use {
    crate::{
        control::{ControlFileParser, ControlParagraph},
        error::{DebStageError, Result},
    },
    std::{
        io::BufRead,
        ops::{Deref, DerefMut},
    },
};

/// A Debian binary package control file/paragraph.
///
/// See <https://www.debian.org/doc/debian-policy/ch-controlfields.html#binary-package-control-files-debian-control>.
///
/// Binary package control files are defined by a single paragraph with
/// well-defined fields. This type is a low-level wrapper around an inner
/// [ControlParagraph]. [Deref] and [DerefMut] can be used to operate on the
/// inner [ControlParagraph]. [From] and [Into] are implemented in both
/// directions to enable cheap coercion between the types.
///
/// All field accessors return [Option]: staging trees in the wild carry
/// control files with free-form content, and fields are only validated
/// when present. See [Self::validate].
#[derive(Clone, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct BinaryPackageControlFile<'a> {
    paragraph: ControlParagraph<'a>,
}

impl<'a> Deref for BinaryPackageControlFile<'a> {
    type Target = ControlParagraph<'a>;

    fn deref(&self) -> &Self::Target {
        &self.paragraph
    }
}

impl<'a> DerefMut for BinaryPackageControlFile<'a> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.paragraph
    }
}

impl<'a> From<ControlParagraph<'a>> for BinaryPackageControlFile<'a> {
    fn from(paragraph: ControlParagraph<'a>) -> Self {
        Self { paragraph }
    }
}

impl<'a> From<BinaryPackageControlFile<'a>> for ControlParagraph<'a> {
    fn from(cf: BinaryPackageControlFile<'a>) -> Self {
        cf.paragraph
    }
}

impl BinaryPackageControlFile<'static> {
    /// Construct an instance by parsing control file data from a reader.
    ///
    /// Only the first paragraph is retained. Input without any parseable
    /// `Key: Value` lines yields an instance with no fields.
    pub fn parse_reader<R: BufRead>(reader: &mut R) -> Result<Self> {
        let mut parser = ControlFileParser::default();

        loop {
            let mut line = String::new();

            if reader.read_line(&mut line)? == 0 {
                break;
            }

            if let Some(paragraph) = parser.write_line(&line) {
                return Ok(Self { paragraph });
            }
        }

        Ok(Self {
            paragraph: parser.finish().unwrap_or_default(),
        })
    }

    /// Parse a control file from a string.
    pub fn parse_str(s: &str) -> Result<Self> {
        let mut reader = std::io::BufReader::new(s.as_bytes());
        Self::parse_reader(&mut reader)
    }
}

impl<'a> BinaryPackageControlFile<'a> {
    /// The `Package` field value.
    pub fn package(&self) -> Option<&str> {
        self.paragraph.field_str("Package")
    }

    /// The `Version` field as its original string.
    pub fn version_str(&self) -> Option<&str> {
        self.paragraph.field_str("Version")
    }

    /// The `Architecture` field.
    pub fn architecture(&self) -> Option<&str> {
        self.paragraph.field_str("Architecture")
    }

    /// The `Maintainer` field.
    pub fn maintainer(&self) -> Option<&str> {
        self.paragraph.field_str("Maintainer")
    }

    /// The `Description` field.
    pub fn description(&self) -> Option<&str> {
        self.paragraph.field_str("Description")
    }

    /// Validate the fields enforced at package build time.
    ///
    /// The `Package` name must consist of lowercase alphanumerics plus
    /// `-+.`, beginning with an alphanumeric. The `Version` string must
    /// contain at least one digit. Each check only applies when the field
    /// is present.
    pub fn validate(&self) -> Result<()> {
        if let Some(package) = self.package() {
            if !package_name_valid(package) {
                return Err(DebStageError::PackageNameIllegalChar);
            }
        }

        if let Some(version) = self.version_str() {
            if !version.chars().any(|c| c.is_ascii_digit()) {
                return Err(DebStageError::PackageVersionNoDigits(version.to_string()));
            }
        }

        Ok(())
    }
}

fn package_name_valid(name: &str) -> bool {
    let mut chars = name.chars();

    match chars.next() {
        Some(c) if c.is_ascii_lowercase() || c.is_ascii_digit() => {}
        _ => return false,
    }

    chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '+' | '.' | '-'))
}
