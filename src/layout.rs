//! Moduledata layout registry.
//!
//! This module records where each field of the runtime's `moduledata`
//! structure sits for every supported (release lineage, pointer width) pair.
//! The offsets are ABI facts recovered from the toolchain; they are data, not
//! policy, and overlapping entries in the table are reproduced as found.

use std::fmt;

use crate::error::{Error, Result};
use crate::version::{Bitness, GoVersion, Lineage};

/// Location of a field within the moduledata blob.
///
/// A `size` of zero marks a field that does not exist in the layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FieldOffset {
    /// Byte offset from the start of the structure.
    pub offset: u64,
    /// Width of the field in bytes.
    pub size: u64,
}

impl FieldOffset {
    pub const ABSENT: FieldOffset = FieldOffset { offset: 0, size: 0 };

    pub const fn new(offset: u64, size: u64) -> Self {
        Self { offset, size }
    }

    pub fn is_present(&self) -> bool {
        self.size != 0
    }

    /// One past the last byte of the field, if it does not overflow.
    pub fn end(&self) -> Option<u64> {
        self.offset.checked_add(self.size)
    }
}

/// Names of the moduledata fields the registry knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Text,
    Types,
    ETypes,
    Typelinks,
    ITablinks,
    Ftab,
    Minpc,
    Textsectmap,
    LegacyTypes,
    Rodata,
    Gofunc,
    Covctrs,
    Ecovctrs,
    InitTasks,
}

impl Field {
    pub const ALL: [Field; 14] = [
        Field::Text,
        Field::Types,
        Field::ETypes,
        Field::Typelinks,
        Field::ITablinks,
        Field::Ftab,
        Field::Minpc,
        Field::Textsectmap,
        Field::LegacyTypes,
        Field::Rodata,
        Field::Gofunc,
        Field::Covctrs,
        Field::Ecovctrs,
        Field::InitTasks,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Field::Text => "text",
            Field::Types => "types",
            Field::ETypes => "etypes",
            Field::Typelinks => "typelinks",
            Field::ITablinks => "itablinks",
            Field::Ftab => "ftab",
            Field::Minpc => "minpc",
            Field::Textsectmap => "textsectmap",
            Field::LegacyTypes => "legacy types",
            Field::Rodata => "rodata",
            Field::Gofunc => "gofunc",
            Field::Covctrs => "covctrs",
            Field::Ecovctrs => "ecovctrs",
            Field::InitTasks => "inittasks",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Field offsets of the moduledata structure for one release lineage and
/// pointer width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    pub text: FieldOffset,
    pub types: FieldOffset,
    pub etypes: FieldOffset,
    pub typelinks: FieldOffset,
    pub itablinks: FieldOffset,
    pub ftab: FieldOffset,
    pub minpc: FieldOffset,
    pub textsectmap: FieldOffset,
    /// Only in 1.5 and 1.6.
    pub legacy_types: FieldOffset,
    /// Added in 1.18.
    pub rodata: FieldOffset,
    /// Added in 1.18.
    pub gofunc: FieldOffset,
    /// Added in 1.20.
    pub covctrs: FieldOffset,
    /// Added in 1.20.
    pub ecovctrs: FieldOffset,
    /// Added in 1.22.
    pub inittasks: FieldOffset,
    /// Pointer size in bytes, 4 or 8.
    pub ptr_size: u64,
}

impl Layout {
    /// A layout in which every field is absent.
    pub const fn absent(bitness: Bitness) -> Self {
        let ptr_size = match bitness {
            Bitness::Bits32 => 4,
            Bitness::Bits64 => 8,
        };
        Self {
            text: FieldOffset::ABSENT,
            types: FieldOffset::ABSENT,
            etypes: FieldOffset::ABSENT,
            typelinks: FieldOffset::ABSENT,
            itablinks: FieldOffset::ABSENT,
            ftab: FieldOffset::ABSENT,
            minpc: FieldOffset::ABSENT,
            textsectmap: FieldOffset::ABSENT,
            legacy_types: FieldOffset::ABSENT,
            rodata: FieldOffset::ABSENT,
            gofunc: FieldOffset::ABSENT,
            covctrs: FieldOffset::ABSENT,
            ecovctrs: FieldOffset::ABSENT,
            inittasks: FieldOffset::ABSENT,
            ptr_size,
        }
    }

    pub fn get(&self, field: Field) -> FieldOffset {
        match field {
            Field::Text => self.text,
            Field::Types => self.types,
            Field::ETypes => self.etypes,
            Field::Typelinks => self.typelinks,
            Field::ITablinks => self.itablinks,
            Field::Ftab => self.ftab,
            Field::Minpc => self.minpc,
            Field::Textsectmap => self.textsectmap,
            Field::LegacyTypes => self.legacy_types,
            Field::Rodata => self.rodata,
            Field::Gofunc => self.gofunc,
            Field::Covctrs => self.covctrs,
            Field::Ecovctrs => self.ecovctrs,
            Field::InitTasks => self.inittasks,
        }
    }

    /// Fields present in this layout, in declaration order.
    pub fn present_fields(&self) -> impl Iterator<Item = Field> + '_ {
        Field::ALL.into_iter().filter(|f| self.get(*f).is_present())
    }

    /// Smallest buffer length that covers every present field.
    pub fn min_len(&self) -> u64 {
        self.present_fields()
            .filter_map(|f| self.get(f).end())
            .max()
            .unwrap_or(0)
    }

    pub fn bitness(&self) -> Bitness {
        Bitness::from_is_64(self.ptr_size == 8)
    }
}

const fn at(offset: u64, size: u64) -> FieldOffset {
    FieldOffset::new(offset, size)
}

const GO1_5_32: Layout = Layout {
    text: at(0x40, 4),
    typelinks: at(0x60, 12),
    ftab: at(0x8, 12),
    minpc: at(0x20, 4),
    legacy_types: at(0x60, 12),
    ..Layout::absent(Bitness::Bits32)
};

const GO1_5_64: Layout = Layout {
    text: at(0x80, 8),
    typelinks: at(0xc0, 24),
    ftab: at(0x10, 24),
    minpc: at(0x40, 8),
    legacy_types: at(0xc0, 24),
    ..Layout::absent(Bitness::Bits64)
};

const GO1_7_32: Layout = Layout {
    text: at(0x40, 4),
    types: at(0x60, 4),
    etypes: at(0x64, 4),
    typelinks: at(0x68, 12),
    itablinks: at(0x74, 12),
    ftab: at(0x8, 12),
    minpc: at(0x20, 4),
    ..Layout::absent(Bitness::Bits32)
};

const GO1_7_64: Layout = Layout {
    text: at(0x80, 8),
    types: at(0xc0, 8),
    etypes: at(0xc8, 8),
    typelinks: at(0xd0, 24),
    itablinks: at(0xe8, 24),
    ftab: at(0x10, 24),
    minpc: at(0x40, 8),
    ..Layout::absent(Bitness::Bits64)
};

const GO1_18_32: Layout = Layout {
    textsectmap: at(0x80, 12),
    rodata: at(0x70, 4),
    gofunc: at(0x74, 4),
    ..GO1_7_32
};

const GO1_18_64: Layout = Layout {
    textsectmap: at(0x100, 24),
    rodata: at(0xe0, 8),
    gofunc: at(0xe8, 8),
    ..GO1_7_64
};

const GO1_20_32: Layout = Layout {
    covctrs: at(0x78, 4),
    ecovctrs: at(0x7c, 4),
    ..GO1_18_32
};

const GO1_20_64: Layout = Layout {
    covctrs: at(0xf0, 8),
    ecovctrs: at(0xf8, 8),
    ..GO1_18_64
};

const GO1_22_32: Layout = Layout {
    inittasks: at(0x8c, 12),
    ..GO1_20_32
};

const GO1_22_64: Layout = Layout {
    inittasks: at(0x118, 24),
    ..GO1_20_64
};

/// Looks up the registered layout for a lineage and pointer width.
pub fn layout_for(lineage: Lineage, bitness: Bitness) -> &'static Layout {
    match (lineage, bitness) {
        (Lineage::Go1_5, Bitness::Bits32) => &GO1_5_32,
        (Lineage::Go1_5, Bitness::Bits64) => &GO1_5_64,
        (Lineage::Go1_7, Bitness::Bits32) => &GO1_7_32,
        (Lineage::Go1_7, Bitness::Bits64) => &GO1_7_64,
        (Lineage::Go1_18, Bitness::Bits32) => &GO1_18_32,
        (Lineage::Go1_18, Bitness::Bits64) => &GO1_18_64,
        (Lineage::Go1_20, Bitness::Bits32) => &GO1_20_32,
        (Lineage::Go1_20, Bitness::Bits64) => &GO1_20_64,
        (Lineage::Go1_22, Bitness::Bits32) => &GO1_22_32,
        (Lineage::Go1_22, Bitness::Bits64) => &GO1_22_64,
    }
}

/// Every registered key with its layout.
pub fn registered() -> impl Iterator<Item = (Lineage, Bitness, &'static Layout)> {
    Lineage::ALL.into_iter().flat_map(|lineage| {
        [Bitness::Bits32, Bitness::Bits64]
            .into_iter()
            .map(move |bitness| (lineage, bitness, layout_for(lineage, bitness)))
    })
}

/// Resolves the layout for a version string, failing on unknown releases.
pub fn resolve(version: &str, bitness: Bitness) -> Result<&'static Layout> {
    resolve_version(version.parse()?, bitness)
}

/// Resolves the layout for an already parsed release.
pub fn resolve_version(version: GoVersion, bitness: Bitness) -> Result<&'static Layout> {
    let lineage = Lineage::for_version(version).ok_or_else(|| Error::UnknownVersion {
        version: version.to_string(),
        bits: bitness.bits(),
    })?;
    tracing::debug!(
        "resolved version {} ({}-bit) to {} layout",
        version,
        bitness.bits(),
        lineage
    );
    Ok(layout_for(lineage, bitness))
}

/// Outcome of a lenient lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// The version maps to a registered layout.
    Known(&'static Layout),
    /// The version was not recognised; every field is absent.
    Fallback(Layout),
}

impl Resolution {
    pub fn layout(&self) -> &Layout {
        match self {
            Resolution::Known(layout) => layout,
            Resolution::Fallback(layout) => layout,
        }
    }

    pub fn is_known(&self) -> bool {
        matches!(self, Resolution::Known(_))
    }
}

/// Resolves a layout, substituting an all-absent layout for unknown or
/// unparseable versions.
pub fn resolve_lenient(version: &str, bitness: Bitness) -> Resolution {
    Resolution::or_absent(resolve(version, bitness), bitness)
}

impl Resolution {
    /// Turns a strict lookup into a lenient one.
    pub(crate) fn or_absent(lookup: Result<&'static Layout>, bitness: Bitness) -> Self {
        match lookup {
            Ok(layout) => Resolution::Known(layout),
            Err(err) => {
                tracing::warn!("{}; falling back to an empty layout", err);
                Resolution::Fallback(Layout::absent(bitness))
            }
        }
    }
}
