//! Stage 1: OCF ZIP decoding.
//!
//! Exposes the container as an ordered entry list plus a lazy path → bytes
//! mapping. Entry data is decompressed only when a later stage asks for it;
//! the central directory scan performed here touches metadata alone.

pub(crate) mod errors;

use crate::archive::errors::{ArchiveError, ArchiveResult};
use crate::context::ValidationContext;
use crate::messages::{EpubLocation, MessageId};
use crate::util::sync::Lock;
use log::debug;
use std::collections::HashMap;
use std::io::{self, Cursor, Read};
use std::str;
use zip::CompressionMethod;
use zip::ZipArchive as Zip;
use zip::result::ZipError;

/// Characters the OCF specification forbids in entry names.
const FORBIDDEN_CHARS: &[char] = &['"', '*', ':', '<', '>', '?', '\\', '|'];

/// Metadata of one archive entry, in original storage order.
#[derive(Debug)]
pub(crate) struct EntryInfo {
    /// Decoded entry path, as stored in the central directory.
    pub(crate) path: String,
    /// `true` when the entry uses the STORE compression method.
    pub(crate) stored: bool,
    pub(crate) is_dir: bool,
    /// `false` when the raw name bytes are not valid UTF-8.
    pub(crate) utf8_name: bool,
}

/// Read-only view of the OCF container.
pub(crate) struct OcfArchive<'a> {
    zip: Lock<Zip<Cursor<&'a [u8]>>>,
    entries: Vec<EntryInfo>,
    index: HashMap<String, usize>,
}

impl<'a> OcfArchive<'a> {
    pub(crate) fn new(bytes: &'a [u8]) -> ArchiveResult<Self> {
        let mut zip = Zip::new(Cursor::new(bytes)).map_err(|error| ArchiveError::Unreadable {
            source: io::Error::from(error),
        })?;

        let mut entries = Vec::with_capacity(zip.len());
        let mut index = HashMap::with_capacity(zip.len());

        for i in 0..zip.len() {
            let file = zip.by_index(i).map_err(|error| ArchiveError::Unreadable {
                source: io::Error::from(error),
            })?;

            let info = EntryInfo {
                path: file.name().to_owned(),
                stored: file.compression() == CompressionMethod::Stored,
                is_dir: file.is_dir(),
                utf8_name: str::from_utf8(file.name_raw()).is_ok(),
            };
            index.insert(info.path.clone(), i);
            entries.push(info);
        }

        Ok(Self {
            zip: Lock::new(zip),
            entries,
            index,
        })
    }

    /// Entries in original storage order, directories included.
    pub(crate) fn entries(&self) -> &[EntryInfo] {
        &self.entries
    }

    pub(crate) fn has(&self, path: &str) -> bool {
        self.index.contains_key(path)
    }

    /// Decompresses and returns the entry bytes.
    pub(crate) fn read(&self, path: &str) -> ArchiveResult<Vec<u8>> {
        if !self.index.contains_key(path) {
            return Err(ArchiveError::NotFound {
                path: path.to_owned(),
            });
        }
        let mut zip = self.zip.lock().map_err(|_| ArchiveError::Poisoned)?;

        let mut file = zip.by_name(path).map_err(|error| match error {
            ZipError::FileNotFound => ArchiveError::NotFound {
                path: path.to_owned(),
            },
            error => ArchiveError::CannotRead {
                source: io::Error::from(error),
                path: path.to_owned(),
            },
        })?;

        let mut bytes = Vec::with_capacity(file.size() as usize);
        file.read_to_end(&mut bytes)
            .map_err(|error| ArchiveError::CannotRead {
                source: error,
                path: path.to_owned(),
            })?;
        Ok(bytes)
    }
}

/// Describes why an entry path violates the OCF filename rules, if it does.
pub(crate) fn path_defect(entry: &EntryInfo) -> Option<String> {
    if !entry.utf8_name {
        return Some("entry name is not valid UTF-8".to_owned());
    }
    let path = entry.path.as_str();

    if path.starts_with('/') {
        return Some("entry name must not start with '/'".to_owned());
    }
    if let Some(forbidden) = path.chars().find(|c| FORBIDDEN_CHARS.contains(c)) {
        return Some(format!("entry name contains the forbidden character '{forbidden}'"));
    }
    if let Some(control) = path.chars().find(|c| c.is_control()) {
        return Some(format!(
            "entry name contains the control character U+{:04X}",
            control as u32
        ));
    }
    // Trailing empty segment is the directory marker; interior dot segments
    // would escape or alias container paths.
    if path
        .split('/')
        .any(|segment| matches!(segment, "." | ".."))
    {
        return Some("entry name contains a '.' or '..' segment".to_owned());
    }
    None
}

/// Decodes the input bytes into an [`OcfArchive`] on the context.
pub(crate) fn run<'a>(ctx: &mut ValidationContext<'a>) {
    let archive = match OcfArchive::new(ctx.bytes) {
        Ok(archive) => archive,
        Err(error) => {
            ctx.report(
                MessageId::Pkg008,
                None,
                format!("corrupted or unreadable ZIP archive: {error}"),
            );
            return;
        }
    };
    debug!("archive decoded: {} entries", archive.entries().len());

    let defects: Vec<(String, String)> = archive
        .entries()
        .iter()
        .filter_map(|entry| path_defect(entry).map(|defect| (entry.path.clone(), defect)))
        .collect();

    for (path, defect) in defects {
        ctx.report(MessageId::Ocf004, Some(EpubLocation::path(path)), defect);
    }
    ctx.archive = Some(archive);
}
