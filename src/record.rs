//! Moduledata record assembly.
//!
//! `Parser` resolves the layout once, decodes the fields every release has,
//! then walks the version-gated tiers:
//! 1. Before 1.7: the legacy `typelinks` view of type descriptors.
//! 2. 1.7 and later: `rodata` and `gofunc`.
//! 3. 1.20 and later: coverage counter bounds.
//! 4. 1.22 and later: `inittasks`.
//!
//! Each tier is only entered from the one before it. Fields a layout does not
//! carry stay zero.

use object::Endianness;

use crate::decode::{read_scalar, read_slice, SliceDescriptor};
use crate::error::Result;
use crate::layout::{resolve_version, Field, Layout, Resolution};
use crate::version::{Bitness, GoVersion};

const RODATA_SINCE: GoVersion = GoVersion::new(1, 7);
const COVERAGE_SINCE: GoVersion = GoVersion::new(1, 20);
const INIT_TASKS_SINCE: GoVersion = GoVersion::new(1, 22);

/// Version-independent view of a decoded moduledata structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ModuleRecord {
    /// Start of the text section (`text`).
    pub text_va: u64,
    /// Start of the type descriptor area.
    pub types: u64,
    /// End of the type descriptor area.
    pub etypes: u64,
    /// Offsets of the types reachable through reflection.
    pub typelinks: SliceDescriptor,
    /// Offsets of the itabs built at link time.
    pub itablinks: SliceDescriptor,
    /// The function table (`ftab`).
    pub ftab: SliceDescriptor,
    /// Lowest program counter covered by the module.
    pub minpc: u64,
    /// Text section map for binaries with multiple text sections.
    pub textsectmap: SliceDescriptor,
    /// Type descriptor pointers, 1.5 and 1.6 only.
    pub legacy_types: SliceDescriptor,
    /// Start of read-only data, 1.18 onwards.
    pub rodata: u64,
    /// Start of the function metadata blob, 1.18 onwards.
    pub gofunc: u64,
    /// Start of the coverage counters, 1.20 onwards.
    pub covctrs: u64,
    /// End of the coverage counters, 1.20 onwards.
    pub ecovctrs: u64,
    /// Package init tasks, 1.22 onwards.
    pub inittasks: SliceDescriptor,
    /// False when the version was not recognised and a lenient parse used
    /// the empty layout.
    pub layout_known: bool,
}

/// Decodes moduledata blobs for one target.
#[derive(Debug, Clone, Copy)]
pub struct Parser {
    bitness: Bitness,
    endian: Endianness,
    lenient: bool,
}

impl Parser {
    pub fn new(bitness: Bitness, endian: Endianness) -> Self {
        Self {
            bitness,
            endian,
            lenient: false,
        }
    }

    /// Decode unknown versions against an all-absent layout instead of
    /// failing.
    pub fn lenient(mut self, lenient: bool) -> Self {
        self.lenient = lenient;
        self
    }

    /// Decodes `data` as the moduledata of a `version` binary.
    ///
    /// Fails on the first field that does not fit the buffer, naming it.
    pub fn parse(&self, data: &[u8], version: &str) -> Result<ModuleRecord> {
        let parsed = version.parse::<GoVersion>();
        let lookup = parsed.clone().and_then(|v| resolve_version(v, self.bitness));
        let resolution = if self.lenient {
            Resolution::or_absent(lookup, self.bitness)
        } else {
            Resolution::Known(lookup?)
        };
        // Only unparseable in lenient mode, where every field is absent anyway.
        let parsed = parsed.ok();
        let layout = resolution.layout();
        tracing::debug!(
            "parsing {} bytes of moduledata for {} ({}-bit, {:?})",
            data.len(),
            version,
            self.bitness.bits(),
            self.endian
        );

        let mut md = ModuleRecord {
            layout_known: resolution.is_known(),
            ..ModuleRecord::default()
        };
        let fields = FieldReader {
            data,
            layout,
            endian: self.endian,
        };

        md.text_va = fields.scalar(Field::Text)?;
        md.types = fields.scalar(Field::Types)?;
        md.etypes = fields.scalar(Field::ETypes)?;
        md.typelinks = fields.slice(Field::Typelinks)?;
        md.itablinks = fields.slice(Field::ITablinks)?;
        md.ftab = fields.slice(Field::Ftab)?;
        md.minpc = fields.scalar(Field::Minpc)?;
        md.textsectmap = fields.slice(Field::Textsectmap)?;

        let Some(version) = parsed else {
            return Ok(md);
        };

        if version < RODATA_SINCE {
            md.legacy_types = fields.slice(Field::LegacyTypes)?;
        } else {
            md.rodata = fields.scalar(Field::Rodata)?;
            md.gofunc = fields.scalar(Field::Gofunc)?;

            if version >= COVERAGE_SINCE {
                md.covctrs = fields.scalar(Field::Covctrs)?;
                md.ecovctrs = fields.scalar(Field::Ecovctrs)?;

                if version >= INIT_TASKS_SINCE {
                    md.inittasks = fields.slice(Field::InitTasks)?;
                }
            }
        }

        Ok(md)
    }
}

/// Field-name-aware wrapper around the decoders.
struct FieldReader<'a> {
    data: &'a [u8],
    layout: &'a Layout,
    endian: Endianness,
}

impl FieldReader<'_> {
    fn scalar(&self, field: Field) -> Result<u64> {
        read_scalar(self.data, self.layout.get(field), self.endian)
            .map_err(|e| e.in_field(field))
    }

    fn slice(&self, field: Field) -> Result<SliceDescriptor> {
        read_slice(self.data, self.layout.get(field), self.layout.ptr_size, self.endian)
            .map_err(|e| e.in_field(field))
    }
}

/// Decodes `data` as the moduledata of a `version` binary.
///
/// Unknown versions are an error; use [`Parser::lenient`] to decode them
/// against an empty layout instead.
pub fn parse(
    data: &[u8],
    version: &str,
    bitness: Bitness,
    endian: Endianness,
) -> Result<ModuleRecord> {
    Parser::new(bitness, endian).parse(data, version)
}
