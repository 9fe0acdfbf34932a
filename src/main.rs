//! Entry point for the moduledata decoder.
//!
//! This file handles high-level application flow:
//! 1. Parse command-line arguments using `clap`.
//! 2. Map the input file and cut out the moduledata region, optionally inside a
//!    named section located with the `object` crate.
//! 3. Decode the record for the requested release and target.
//! 4. Print it, and validate it when a first function entry was supplied.
//!
//! Error handling is done via `anyhow`.

use anyhow::{Context, Result};
use clap::Parser as _;
use memmap2::Mmap;
use object::{Object, ObjectSection};
use std::fs::File;
use tracing_subscriber::EnvFilter;

use moduledata::config::Config;
use moduledata::{validate, ModuleRecord, Parser, SliceDescriptor};

/// Selects `[offset, offset + length)` from `data`, or everything from `offset`.
fn region(data: &[u8], offset: u64, length: Option<u64>) -> Result<&[u8]> {
    let start = usize::try_from(offset).context("offset does not fit in memory")?;
    let end = match length {
        Some(len) => start
            .checked_add(usize::try_from(len).context("length does not fit in memory")?)
            .context("region end overflows")?,
        None => data.len(),
    };
    data.get(start..end).with_context(|| {
        format!(
            "region {:#x}..{:#x} is outside the {} byte input",
            start,
            end,
            data.len()
        )
    })
}

fn print_record(md: &ModuleRecord) {
    let slice = |s: &SliceDescriptor| format!("{:#x} len={} cap={}", s.data, s.length, s.capacity);
    println!("text         {:#x}", md.text_va);
    println!("types        {:#x}", md.types);
    println!("etypes       {:#x}", md.etypes);
    println!("typelinks    {}", slice(&md.typelinks));
    println!("itablinks    {}", slice(&md.itablinks));
    println!("ftab         {}", slice(&md.ftab));
    println!("minpc        {:#x}", md.minpc);
    println!("textsectmap  {}", slice(&md.textsectmap));
    println!("legacytypes  {}", slice(&md.legacy_types));
    println!("rodata       {:#x}", md.rodata);
    println!("gofunc       {:#x}", md.gofunc);
    println!("covctrs      {:#x}", md.covctrs);
    println!("ecovctrs     {:#x}", md.ecovctrs);
    println!("inittasks    {}", slice(&md.inittasks));
}

fn main() -> Result<()> {
    let config = Config::parse();

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .context("invalid log level")?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let file = File::open(&config.input)
        .with_context(|| format!("failed to open {}", config.input.display()))?;
    let mmap = unsafe { Mmap::map(&file)? };

    let data = match &config.section {
        Some(name) => {
            let obj = object::File::parse(&*mmap).context("failed to parse object file")?;
            let section = obj.section_by_name(name).with_context(|| {
                format!("no section named {} in {}", name, config.input.display())
            })?;
            tracing::debug!(
                "section {} at {:#x}, {} bytes",
                name,
                section.address(),
                section.size()
            );
            section
                .data()
                .with_context(|| format!("failed to read section {}", name))?
        }
        None => &mmap[..],
    };
    let data = region(data, config.offset, config.length)?;

    let parser = Parser::new(config.bitness(), config.endianness()).lenient(config.lenient);
    let md = parser
        .parse(data, &config.go_version)
        .context("failed to decode moduledata")?;
    if !md.layout_known {
        tracing::debug!("decoded {} against an empty layout", config.go_version);
    }
    print_record(&md);

    if let Some(expected) = config.expected_text {
        validate(&md, expected).context("moduledata failed validation")?;
        println!("validation passed");
    }
    Ok(())
}
