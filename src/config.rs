//! Configuration module.
//!
//! This module defines the command-line interface (CLI) for the decoder using `clap`.
//! It handles the input file, the region holding the moduledata, and the target
//! description (release, pointer width, byte order) supplied by the caller.

use clap::{Parser, ValueEnum};
use object::Endianness;
use std::path::PathBuf;

use crate::version::Bitness;

/// Decode the runtime moduledata structure of a compiled Go binary.
///
/// The moduledata region is selected with `--section`, `--offset` and `--length`;
/// the toolchain release and target width must be supplied, they are not detected.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// Executable, or a raw dump of the moduledata region
    pub input: PathBuf,

    /// Toolchain release the binary was built with (e.g. 1.22 or go1.21.4)
    #[arg(long = "go-version")]
    pub go_version: String,

    /// Target pointer width
    #[arg(long, value_enum, default_value = "64")]
    pub bits: Bits,

    /// Decode multi-byte fields as big-endian
    #[arg(long)]
    pub big_endian: bool,

    /// Section containing the moduledata; without it offsets are file offsets
    #[arg(long)]
    pub section: Option<String>,

    /// Start of the moduledata within the section or file
    #[arg(long, default_value = "0", value_parser = parse_number)]
    pub offset: u64,

    /// Number of bytes to hand to the decoder (defaults to the rest of the region)
    #[arg(long, value_parser = parse_number)]
    pub length: Option<u64>,

    /// First function entry from the function table; enables validation
    #[arg(long, value_parser = parse_number)]
    pub expected_text: Option<u64>,

    /// Decode unknown releases against an empty layout instead of failing
    #[arg(long)]
    pub lenient: bool,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info", help = "Set the logging level")]
    pub log_level: String,
}

impl Config {
    pub fn bitness(&self) -> Bitness {
        match self.bits {
            Bits::B32 => Bitness::Bits32,
            Bits::B64 => Bitness::Bits64,
        }
    }

    pub fn endianness(&self) -> Endianness {
        crate::decode::endianness(!self.big_endian)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Bits {
    #[value(name = "32")]
    B32,
    #[value(name = "64")]
    B64,
}

/// Parses a decimal or `0x`-prefixed hexadecimal number.
pub fn parse_number(s: &str) -> Result<u64, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => s.parse(),
    };
    parsed.map_err(|e| format!("invalid number {s:?}: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_in_hex_and_decimal() {
        assert_eq!(parse_number("0x4a0"), Ok(0x4a0));
        assert_eq!(parse_number("0X10"), Ok(16));
        assert_eq!(parse_number("1184"), Ok(1184));
        assert!(parse_number("0xzz").is_err());
        assert!(parse_number("").is_err());
    }

    #[test]
    fn parses_a_full_command_line() {
        let config = Config::try_parse_from([
            "moduledata",
            "a.out",
            "--go-version",
            "go1.21.4",
            "--bits",
            "32",
            "--big-endian",
            "--section",
            ".noptrdata",
            "--offset",
            "0x2a0",
            "--expected-text",
            "0x401000",
        ])
        .unwrap();
        assert_eq!(config.bitness(), Bitness::Bits32);
        assert_eq!(config.endianness(), Endianness::Big);
        assert_eq!(config.section.as_deref(), Some(".noptrdata"));
        assert_eq!(config.offset, 0x2a0);
        assert_eq!(config.length, None);
        assert_eq!(config.expected_text, Some(0x401000));
        assert!(!config.lenient);
    }

    #[test]
    fn defaults_to_64_bit_little_endian() {
        let config =
            Config::try_parse_from(["moduledata", "dump.bin", "--go-version", "1.22"]).unwrap();
        assert_eq!(config.bitness(), Bitness::Bits64);
        assert_eq!(config.endianness(), Endianness::Little);
        assert_eq!(config.offset, 0);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn version_is_required() {
        assert!(Config::try_parse_from(["moduledata", "a.out"]).is_err());
        let bad_width = ["moduledata", "a.out", "--go-version", "1.22", "--bits", "16"];
        assert!(Config::try_parse_from(bad_width).is_err());
    }
}
