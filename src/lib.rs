//! Moduledata decoding library.
//!
//! This library decodes the runtime `moduledata` structure embedded in
//! compiled Go binaries, whose layout changes between toolchain releases and
//! pointer widths. It is organized into several modules:
//! - `version`: Release parsing, pointer widths and layout lineages.
//! - `layout`: The per-release field offset registry.
//! - `decode`: Bounds-checked scalar and slice header readers.
//! - `record`: Assembly of a version-independent `ModuleRecord`.
//! - `validate`: Consistency checks against the function table.
//! - `config`: CLI configuration.

pub mod config;
pub mod decode;
pub mod error;
pub mod layout;
pub mod record;
pub mod validate;
pub mod version;

pub use decode::{read_scalar, read_slice, SliceDescriptor};
pub use error::{Error, Result, ValidationError};
pub use layout::{
    resolve, resolve_lenient, resolve_version, Field, FieldOffset, Layout, Resolution,
};
pub use record::{parse, ModuleRecord, Parser};
pub use validate::validate;
pub use version::{Bitness, GoVersion, Lineage};
