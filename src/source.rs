//! Source resolution.
//!
//! A locator names the document bytes: a filesystem path, a `file:` URL, an
//! `http(s)` URL, or any of those followed by `!entry/path` to address a
//! member of a zip / tar / tar.gz / tgz archive. Resolution is behind the
//! [`SourceReader`] trait so embedders can supply credentials, caching, or
//! sandboxing; [`DefaultSourceReader`] covers the common cases.
//!
//! Whatever the transport, the reader returns the full byte payload; the
//! engine materializes one document per call anyway.

use std::fmt;
use std::fs;
use std::io::{Cursor, Read};

use flate2::read::GzDecoder;
use tracing::debug;

use crate::error::{Error, Result};

/// Parsed locator: base resource plus optional archive entry path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locator {
    pub base: String,
    pub entry: Option<String>,
}

impl Locator {
    /// Split `base!entry` syntax. A locator without `!` is just a base.
    pub fn parse(raw: &str) -> Locator {
        match raw.split_once('!') {
            Some((base, entry)) if !base.is_empty() && !entry.is_empty() => Locator {
                base: base.to_string(),
                entry: Some(entry.to_string()),
            },
            _ => Locator {
                base: raw.to_string(),
                entry: None,
            },
        }
    }

    /// Resolve a relative reference (a DTD system identifier, typically)
    /// against this locator's base directory. Absolute paths and full URLs
    /// pass through unchanged.
    pub fn sibling(&self, reference: &str) -> Locator {
        if reference.contains("://") || reference.starts_with('/') {
            return Locator::parse(reference);
        }
        let base = match self.base.rfind('/') {
            Some(slash) => format!("{}/{}", &self.base[..slash], reference),
            None => reference.to_string(),
        };
        Locator { base, entry: None }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.entry {
            Some(entry) => write!(f, "{}!{}", self.base, entry),
            None => f.write_str(&self.base),
        }
    }
}

/// Byte-stream supplier for a locator. Implementations fail with
/// [`Error::SourceUnavailable`] for anything that cannot be opened.
pub trait SourceReader {
    fn open(&self, locator: &Locator) -> Result<Vec<u8>>;
}

/// Files, `file:` URLs, HTTP(S) URLs, and archive entries.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultSourceReader;

impl SourceReader for DefaultSourceReader {
    fn open(&self, locator: &Locator) -> Result<Vec<u8>> {
        let base = read_base(&locator.base)?;
        let bytes = match &locator.entry {
            None => base,
            Some(entry) => extract_entry(locator, base, entry)?,
        };
        debug!(locator = %locator, bytes = bytes.len(), "source resolved");
        Ok(bytes)
    }
}

fn read_base(base: &str) -> Result<Vec<u8>> {
    if base.starts_with("http://") || base.starts_with("https://") {
        let response = reqwest::blocking::get(base)
            .map_err(|e| Error::unavailable(base, e.to_string()))?;
        if !response.status().is_success() {
            return Err(Error::unavailable(base, format!("HTTP {}", response.status())));
        }
        return response
            .bytes()
            .map(|b| b.to_vec())
            .map_err(|e| Error::unavailable(base, e.to_string()));
    }
    let path = base
        .strip_prefix("file://")
        .or_else(|| base.strip_prefix("file:"))
        .unwrap_or(base);
    fs::read(path).map_err(|e| Error::unavailable(base, e.to_string()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ArchiveKind {
    Zip,
    Tar,
    TarGz,
}

/// Dispatch on the base's extension, ignoring any URL query string.
fn archive_kind(base: &str) -> Option<ArchiveKind> {
    let path = base.split(['?', '#']).next().unwrap_or(base).to_ascii_lowercase();
    if path.ends_with(".zip") {
        Some(ArchiveKind::Zip)
    } else if path.ends_with(".tar.gz") || path.ends_with(".tgz") {
        Some(ArchiveKind::TarGz)
    } else if path.ends_with(".tar") {
        Some(ArchiveKind::Tar)
    } else {
        None
    }
}

fn extract_entry(locator: &Locator, base: Vec<u8>, entry: &str) -> Result<Vec<u8>> {
    match archive_kind(&locator.base) {
        Some(ArchiveKind::Zip) => {
            let mut archive = zip::ZipArchive::new(Cursor::new(base))
                .map_err(|e| Error::unavailable(locator.to_string(), e.to_string()))?;
            let mut file = archive
                .by_name(entry)
                .map_err(|e| Error::unavailable(locator.to_string(), e.to_string()))?;
            let mut bytes = Vec::with_capacity(file.size() as usize);
            file.read_to_end(&mut bytes)
                .map_err(|e| Error::unavailable(locator.to_string(), e.to_string()))?;
            Ok(bytes)
        }
        Some(ArchiveKind::Tar) => tar_entry(Cursor::new(base), locator, entry),
        Some(ArchiveKind::TarGz) => tar_entry(GzDecoder::new(Cursor::new(base)), locator, entry),
        None => Err(Error::unavailable(
            locator.to_string(),
            "base is not a recognized archive (.zip, .tar, .tar.gz, .tgz)",
        )),
    }
}

fn tar_entry<R: Read>(reader: R, locator: &Locator, entry: &str) -> Result<Vec<u8>> {
    let mut archive = tar::Archive::new(reader);
    let entries = archive
        .entries()
        .map_err(|e| Error::unavailable(locator.to_string(), e.to_string()))?;
    for member in entries {
        let mut member = member.map_err(|e| Error::unavailable(locator.to_string(), e.to_string()))?;
        let matches = member
            .path()
            .map(|p| p.to_string_lossy() == entry)
            .unwrap_or(false);
        if matches {
            let mut bytes = Vec::new();
            member
                .read_to_end(&mut bytes)
                .map_err(|e| Error::unavailable(locator.to_string(), e.to_string()))?;
            return Ok(bytes);
        }
    }
    Err(Error::unavailable(
        locator.to_string(),
        format!("archive has no entry '{entry}'"),
    ))
}
