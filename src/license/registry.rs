// src/license/registry.rs

//! Canonical license identifier registry.
//!
//! An immutable lookup service over the SPDX identifier taxonomy,
//! constructed once per run and shared read-only. The table carries the
//! identifiers that actually occur in distro package metadata; it is not
//! the full SPDX list.

/// Immutable canonical-identifier lookup service.
#[derive(Debug, Clone, Copy)]
pub struct LicenseRegistry {
    identifiers: &'static [&'static str],
    deprecated: &'static [&'static str],
}

impl LicenseRegistry {
    pub fn new() -> Self {
        Self {
            identifiers: IDENTIFIERS,
            deprecated: DEPRECATED,
        }
    }

    /// Canonical casing for `token`, if it names a known identifier.
    pub fn lookup(&self, token: &str) -> Option<&'static str> {
        self.identifiers
            .iter()
            .copied()
            .find(|id| id.eq_ignore_ascii_case(token))
    }

    /// Whether `id` is marked deprecated in the taxonomy.
    pub fn is_deprecated(&self, id: &str) -> bool {
        self.deprecated.iter().any(|d| d.eq_ignore_ascii_case(id))
    }
}

impl Default for LicenseRegistry {
    fn default() -> Self {
        Self::new()
    }
}

const IDENTIFIERS: &[&str] = &[
    "0BSD",
    "AFL-2.1",
    "AFL-3.0",
    "AGPL-1.0-only",
    "AGPL-1.0-or-later",
    "AGPL-3.0",
    "AGPL-3.0-only",
    "AGPL-3.0-or-later",
    "Apache-1.0",
    "Apache-1.1",
    "Apache-2.0",
    "Artistic-1.0",
    "Artistic-1.0-Perl",
    "Artistic-2.0",
    "BSD-1-Clause",
    "BSD-2-Clause",
    "BSD-2-Clause-FreeBSD",
    "BSD-2-Clause-NetBSD",
    "BSD-2-Clause-Patent",
    "BSD-3-Clause",
    "BSD-3-Clause-Clear",
    "BSD-4-Clause",
    "BSD-4-Clause-UC",
    "BSL-1.0",
    "Bitstream-Vera",
    "CC-BY-3.0",
    "CC-BY-4.0",
    "CC-BY-SA-3.0",
    "CC-BY-SA-4.0",
    "CC0-1.0",
    "CDDL-1.0",
    "CDDL-1.1",
    "CECILL-2.1",
    "CPL-1.0",
    "ClArtistic",
    "EPL-1.0",
    "EPL-2.0",
    "EUPL-1.1",
    "EUPL-1.2",
    "FSFAP",
    "FSFUL",
    "FSFULLR",
    "FTL",
    "GFDL-1.1",
    "GFDL-1.1-only",
    "GFDL-1.1-or-later",
    "GFDL-1.2",
    "GFDL-1.2-only",
    "GFDL-1.2-or-later",
    "GFDL-1.3",
    "GFDL-1.3-only",
    "GFDL-1.3-or-later",
    "GPL-1.0",
    "GPL-1.0-only",
    "GPL-1.0-or-later",
    "GPL-2.0",
    "GPL-2.0+",
    "GPL-2.0-only",
    "GPL-2.0-or-later",
    "GPL-3.0",
    "GPL-3.0+",
    "GPL-3.0-only",
    "GPL-3.0-or-later",
    "HPND",
    "ICU",
    "IJG",
    "ISC",
    "LGPL-2.0",
    "LGPL-2.0-only",
    "LGPL-2.0-or-later",
    "LGPL-2.1",
    "LGPL-2.1-only",
    "LGPL-2.1-or-later",
    "LGPL-3.0",
    "LGPL-3.0-only",
    "LGPL-3.0-or-later",
    "LPPL-1.3c",
    "Latex2e",
    "MIT",
    "MIT-0",
    "MIT-CMU",
    "MPL-1.0",
    "MPL-1.1",
    "MPL-2.0",
    "MS-PL",
    "NCSA",
    "NTP",
    "OFL-1.0",
    "OFL-1.1",
    "OLDAP-2.8",
    "OpenSSL",
    "OSL-3.0",
    "PHP-2.02",
    "PHP-3.0",
    "PHP-3.01",
    "PostgreSQL",
    "PSF-2.0",
    "Python-2.0",
    "Ruby",
    "SGI-B-2.0",
    "SMLNJ",
    "Sendmail",
    "Sleepycat",
    "TCL",
    "UPL-1.0",
    "Unicode-DFS-2016",
    "Unlicense",
    "Vim",
    "W3C",
    "WTFPL",
    "X11",
    "XFree86-1.1",
    "ZPL-2.1",
    "Zend-2.0",
    "Zlib",
    "bzip2-1.0.6",
    "curl",
    "libpng",
    "libpng-2.0",
    "libtiff",
    "zlib-acknowledgement",
];

/// Identifiers the taxonomy has retired in favor of `-only`/`-or-later`
/// forms (or renamed outright). They still resolve, but are flagged.
const DEPRECATED: &[&str] = &[
    "AGPL-3.0",
    "BSD-2-Clause-FreeBSD",
    "BSD-2-Clause-NetBSD",
    "GFDL-1.1",
    "GFDL-1.2",
    "GFDL-1.3",
    "GPL-1.0",
    "GPL-2.0",
    "GPL-2.0+",
    "GPL-3.0",
    "GPL-3.0+",
    "LGPL-2.0",
    "LGPL-2.1",
    "LGPL-3.0",
];
