// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Debian binary package assembly.

This crate builds Debian binary packages (`.deb` files) from a staging
directory laid out the way `dpkg-deb --build` expects: a `DEBIAN/`
subdirectory holding the control file and maintainer scripts, plus an
arbitrary payload tree mirroring the paths to install on the target system.

A `.deb` file is a Unix ar archive holding a format version marker and two
compressed tar archives. The modules here map onto that structure:

The [ar] module implements the outer container encoding:
[ar::ArBuilder] writes the byte-exact ar envelope with its fixed-layout
member headers and 2 byte alignment.

The [staging] module is the filesystem layer. [staging::StagingDirectory]
validates the staging layout and enumerates the control-metadata file set
and the payload tree (the control-metadata subtree is excluded from the
payload at any depth, as are housekeeping files like `.DS_Store`).

The [control] module defines control file primitives:
[control::ControlParagraph] holds `Key: Value` fields and
[control::ControlFileParser] parses them leniently from file content.
[binary_package_control::BinaryPackageControlFile] layers typed accessors
and build-time validation of the `Package` and `Version` fields on top.

The [io] module defines [io::Compression], the codecs a data archive can be
compressed with (gzip, bzip2, LZMA/xz).

The [deb] module ties it together. [deb::builder::ControlTarBuilder]
produces the `control.tar.gz` member after validating permissions and
control fields, [deb::builder::DataTarBuilder] produces the
`data.tar.<ext>` member, and [deb::builder::DebBuilder] assembles the final
package:

```no_run
use debstage::{deb::builder::DebBuilder, io::Compression};

# fn main() -> debstage::error::Result<()> {
DebBuilder::new("/path/to/staging")
    .set_compression(Compression::Lzma)
    .write_to_path("package.deb")?;
# Ok(())
# }
```

Validation failures surface before any output is produced: a build either
yields a complete package at the destination or no file at all.
*/

pub mod ar;
pub mod binary_package_control;
pub mod control;
pub mod deb;
pub mod error;
pub mod io;
pub mod staging;
