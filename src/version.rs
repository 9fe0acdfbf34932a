//! Toolchain version and target width handling.
//!
//! Versions are compared numerically on `(major, minor)`. Lexical comparison
//! of dotted strings gets `"1.20" < "1.7"` wrong and is never used here.

use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// A toolchain release, reduced to the two components that decide layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GoVersion {
    pub major: u32,
    pub minor: u32,
}

impl GoVersion {
    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }
}

/// Leading decimal digits of `s`, if there are any.
fn leading_number(s: &str) -> Option<u32> {
    let end = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    if end == 0 {
        return None;
    }
    s[..end].parse().ok()
}

impl FromStr for GoVersion {
    type Err = Error;

    /// Accepts `1.22`, `go1.22`, `go1.21.4` and `1.21rc2`. Patch numbers and
    /// pre-release suffixes do not affect the layout and are dropped.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || Error::InvalidVersion(s.to_string());
        let trimmed = s.trim();
        let trimmed = trimmed.strip_prefix("go").unwrap_or(trimmed);

        let mut parts = trimmed.splitn(3, '.');
        let major_str = parts.next().ok_or_else(invalid)?;
        if major_str.is_empty() || !major_str.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let major = major_str.parse().map_err(|_| invalid())?;
        let minor = parts.next().and_then(leading_number).ok_or_else(invalid)?;
        Ok(Self { major, minor })
    }
}

impl fmt::Display for GoVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Target pointer width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bitness {
    Bits32,
    Bits64,
}

impl Bitness {
    pub fn from_is_64(is_64: bool) -> Self {
        if is_64 {
            Bitness::Bits64
        } else {
            Bitness::Bits32
        }
    }

    /// Size of a pointer in bytes.
    pub fn pointer_width(self) -> u64 {
        match self {
            Bitness::Bits32 => 4,
            Bitness::Bits64 => 8,
        }
    }

    pub fn bits(self) -> u32 {
        self.pointer_width() as u32 * 8
    }
}

/// A run of releases that share one moduledata layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Lineage {
    /// 1.5 and 1.6: `typelinks` still points at type descriptors directly.
    Go1_5,
    /// 1.7 through 1.17: `types`/`etypes` and `itablinks`.
    Go1_7,
    /// 1.18 and 1.19: `rodata`, `gofunc` and `textsectmap`.
    Go1_18,
    /// 1.20 and 1.21: coverage counter bounds.
    Go1_20,
    /// 1.22: `inittasks`.
    Go1_22,
}

impl Lineage {
    pub const ALL: [Lineage; 5] = [
        Lineage::Go1_5,
        Lineage::Go1_7,
        Lineage::Go1_18,
        Lineage::Go1_20,
        Lineage::Go1_22,
    ];

    /// First and last release (inclusive) using this lineage's layout.
    pub const fn range(self) -> (GoVersion, GoVersion) {
        match self {
            Lineage::Go1_5 => (GoVersion::new(1, 5), GoVersion::new(1, 6)),
            Lineage::Go1_7 => (GoVersion::new(1, 7), GoVersion::new(1, 17)),
            Lineage::Go1_18 => (GoVersion::new(1, 18), GoVersion::new(1, 19)),
            Lineage::Go1_20 => (GoVersion::new(1, 20), GoVersion::new(1, 21)),
            Lineage::Go1_22 => (GoVersion::new(1, 22), GoVersion::new(1, 22)),
        }
    }

    /// The release that introduced this layout.
    pub const fn first(self) -> GoVersion {
        self.range().0
    }

    pub fn for_version(version: GoVersion) -> Option<Lineage> {
        Self::ALL.into_iter().find(|lineage| {
            let (lo, hi) = lineage.range();
            lo <= version && version <= hi
        })
    }
}

impl fmt::Display for Lineage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.first())
    }
}
