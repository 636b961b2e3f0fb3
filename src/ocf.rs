//! Stage 2: OCF envelope validation.
//!
//! Runs before any semantic processing: the `mimetype` contract, the
//! `META-INF/container.xml` rootfile declarations, and the optional
//! `META-INF` sidecar files.

use crate::consts::{mime, ocf};
use crate::context::ValidationContext;
use crate::messages::{EpubLocation, MessageId, Severity};
use crate::parser::{self, ParserResult, XmlIssue};
use crate::parser::xml::{XmlEvent, XmlReader};
use log::debug;

struct Rootfile {
    full_path: String,
    media_type: Option<String>,
    offset: usize,
}

pub(crate) fn run(ctx: &mut ValidationContext<'_>) {
    // The archive moves out while this stage reports against the context
    // and returns once the checks are done.
    let Some(archive) = ctx.archive.take() else {
        return;
    };

    check_mimetype(ctx, &archive);
    check_container(ctx, &archive);
    check_meta_inf_entries(ctx, &archive);

    ctx.archive = Some(archive);
}

fn check_mimetype(ctx: &mut ValidationContext<'_>, archive: &crate::archive::OcfArchive<'_>) {
    let position = archive
        .entries()
        .iter()
        .position(|entry| entry.path == ocf::MIMETYPE_PATH);

    let Some(position) = position else {
        ctx.report(
            MessageId::Pkg006,
            None,
            "required `mimetype` entry is missing".to_owned(),
        );
        return;
    };
    let location = || Some(EpubLocation::path(ocf::MIMETYPE_PATH));

    if position != 0 {
        ctx.report(
            MessageId::Pkg007,
            location(),
            format!("`mimetype` entry must be first in the archive, found at position {position}"),
        );
    }
    if !archive.entries()[position].stored {
        ctx.report(
            MessageId::Pkg007,
            location(),
            "`mimetype` entry must be stored uncompressed".to_owned(),
        );
    }
    match archive.read(ocf::MIMETYPE_PATH) {
        Ok(bytes) if bytes != ocf::MIMETYPE_CONTENT => {
            ctx.report(
                MessageId::Pkg007,
                location(),
                format!(
                    "`mimetype` entry must contain exactly `application/epub+zip` \
                     with no padding, found {} bytes",
                    bytes.len()
                ),
            );
        }
        Ok(_) => {}
        Err(error) => {
            ctx.report_as(
                MessageId::Rsc004,
                Severity::Error,
                location(),
                error.to_string(),
            );
        }
    }
}

fn check_container(ctx: &mut ValidationContext<'_>, archive: &crate::archive::OcfArchive<'_>) {
    let data = match archive.read(ocf::CONTAINER_PATH) {
        Ok(data) => data,
        Err(error) if error.is_not_found() => {
            ctx.report(
                MessageId::Opf002,
                None,
                "required `META-INF/container.xml` is missing".to_owned(),
            );
            return;
        }
        Err(error) => {
            ctx.report(
                MessageId::Rsc004,
                Some(EpubLocation::path(ocf::CONTAINER_PATH)),
                error.to_string(),
            );
            return;
        }
    };

    let rootfiles = match parse_rootfiles(&data) {
        Ok(rootfiles) => rootfiles,
        Err(issue) => {
            let (line, column) = parser::line_col(&data, issue.offset);
            ctx.report(
                MessageId::Opf002,
                Some(EpubLocation::at(ocf::CONTAINER_PATH, line, column)),
                format!("`container.xml` is not well-formed: {}", issue.message),
            );
            return;
        }
    };

    if rootfiles.is_empty() {
        ctx.report(
            MessageId::Opf002,
            Some(EpubLocation::path(ocf::CONTAINER_PATH)),
            "`container.xml` declares no `<rootfile>` element".to_owned(),
        );
        return;
    }

    for rootfile in &rootfiles {
        ctx.rootfiles.push(rootfile.full_path.clone());

        if !archive.has(&rootfile.full_path) {
            let (line, column) = parser::line_col(&data, rootfile.offset);
            // An individual dangling rootfile does not end the run as long
            // as another one resolves.
            ctx.report_as(
                MessageId::Opf002,
                Severity::Error,
                Some(EpubLocation::at(ocf::CONTAINER_PATH, line, column)),
                format!(
                    "rootfile `full-path=\"{}\"` does not reference an archive entry",
                    rootfile.full_path
                ),
            );
        }
    }

    // Although rare, multiple package locations could exist.
    // The first resolvable `application/oebps-package+xml` rootfile is the
    // primary package document.
    let primary = rootfiles.iter().find(|rootfile| {
        rootfile.media_type.as_deref() == Some(mime::OEBPS_PACKAGE)
            && archive.has(&rootfile.full_path)
    });

    match primary {
        Some(rootfile) => {
            debug!("primary package document: {}", rootfile.full_path);
            ctx.opf_path = Some(rootfile.full_path.clone());
        }
        None => {
            ctx.report(
                MessageId::Opf002,
                Some(EpubLocation::path(ocf::CONTAINER_PATH)),
                "no rootfile resolves to a package document \
                 with media type `application/oebps-package+xml`"
                    .to_owned(),
            );
        }
    }
}

fn parse_rootfiles(data: &[u8]) -> ParserResult<Vec<Rootfile>> {
    let mut reader = XmlReader::from_bytes(data);
    let mut rootfiles = Vec::new();

    while let Some(event) = reader.next() {
        let XmlEvent::Start(el) = event? else {
            continue;
        };
        if !el.is_local_name(ocf::ROOT_FILE) {
            continue;
        }
        let Some(full_path) = el.get_attribute(ocf::FULL_PATH) else {
            continue;
        };
        rootfiles.push(Rootfile {
            full_path,
            media_type: el.get_attribute(ocf::MEDIA_TYPE),
            offset: el.offset(),
        });
    }
    Ok(rootfiles)
}

fn check_meta_inf_entries(ctx: &mut ValidationContext<'_>, archive: &crate::archive::OcfArchive<'_>) {
    let paths: Vec<String> = archive
        .entries()
        .iter()
        .filter(|entry| !entry.is_dir && entry.path.starts_with(ocf::META_INF_DIR))
        .map(|entry| entry.path.clone())
        .collect();

    for path in paths {
        if path == ocf::CONTAINER_PATH {
            continue;
        }
        if !ocf::OPTIONAL_META_INF.contains(&path.as_str()) {
            ctx.report(
                MessageId::Opf003,
                Some(EpubLocation::path(&path)),
                format!("unexpected file `{path}` in the `META-INF` directory"),
            );
            continue;
        }
        // Optional sidecars get a well-formedness pass and nothing more.
        match archive.read(&path) {
            Ok(data) => {
                if let Err(issue) = well_formed(&data) {
                    let (line, column) = parser::line_col(&data, issue.offset);
                    ctx.report(
                        MessageId::Rsc005,
                        Some(EpubLocation::at(&path, line, column)),
                        format!("`{path}` is not well-formed: {}", issue.message),
                    );
                }
            }
            Err(error) => {
                ctx.report_as(
                    MessageId::Rsc004,
                    Severity::Error,
                    Some(EpubLocation::path(&path)),
                    error.to_string(),
                );
            }
        }
    }
}

fn well_formed(data: &[u8]) -> Result<(), XmlIssue> {
    let mut reader = XmlReader::from_bytes(data);

    while let Some(event) = reader.next() {
        event?;
    }
    Ok(())
}
