//! Stage 5: schema validation glue.
//!
//! The pipeline talks to a [`SchemaEngine`] through a narrow seam:
//! schema selector plus XML bytes in, finding list out. Engines hold native
//! resources, so every run is a scoped acquisition ending in
//! [`SchemaEngine::dispose`]; a disposed engine rejects further calls,
//! which the pipeline surfaces as a fatal `SCH-001`.
//!
//! The built-in [`StructuralEngine`] checks the grammar skeleton of
//! `container.xml` and the package document: required elements and
//! attributes, with line/column positions for every finding.

use crate::consts::{ocf, opf};
use crate::context::ValidationContext;
use crate::messages::{EpubLocation, MessageId};
use crate::parser::{self, ParserResult};
use crate::parser::xml::{XmlEvent, XmlReader};
use log::debug;

/// Schema selector; stands in for a schema path.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum SchemaDoc {
    Container,
    Package,
}

/// One grammar violation, positioned within the validated document.
#[derive(Debug)]
pub(crate) struct SchemaFinding {
    pub(crate) line: u32,
    pub(crate) column: u32,
    pub(crate) message: String,
}

/// Infrastructure failures of a schema engine; distinct from findings.
#[derive(thiserror::Error, Debug)]
pub(crate) enum SchemaEngineError {
    /// The engine was used after [`SchemaEngine::dispose`].
    #[error("schema engine used after disposal")]
    Disposed,
}

pub(crate) trait SchemaEngine {
    fn validate(
        &mut self,
        schema: SchemaDoc,
        data: &[u8],
    ) -> Result<Vec<SchemaFinding>, SchemaEngineError>;

    /// Releases engine resources; subsequent calls to `validate` fail.
    fn dispose(&mut self);
}

/// Built-in engine checking structural grammar skeletons.
pub(crate) struct StructuralEngine {
    disposed: bool,
}

impl StructuralEngine {
    pub(crate) fn new() -> Self {
        Self { disposed: false }
    }
}

impl SchemaEngine for StructuralEngine {
    fn validate(
        &mut self,
        schema: SchemaDoc,
        data: &[u8],
    ) -> Result<Vec<SchemaFinding>, SchemaEngineError> {
        if self.disposed {
            return Err(SchemaEngineError::Disposed);
        }
        let findings = match schema {
            SchemaDoc::Container => check_container(data),
            SchemaDoc::Package => check_package(data),
        };
        // A document that fails to parse produced its parse message
        // elsewhere; the grammar pass degrades to silence.
        Ok(findings.unwrap_or_default())
    }

    fn dispose(&mut self) {
        self.disposed = true;
    }
}

fn finding(data: &[u8], offset: usize, message: String) -> SchemaFinding {
    let (line, column) = parser::line_col(data, offset);
    SchemaFinding {
        line,
        column,
        message,
    }
}

fn check_container(data: &[u8]) -> ParserResult<Vec<SchemaFinding>> {
    let mut reader = XmlReader::from_bytes(data);
    let mut findings = Vec::new();
    let mut root_seen = false;
    let mut rootfiles = 0usize;

    while let Some(event) = reader.next() {
        let XmlEvent::Start(el) = event? else {
            continue;
        };
        if !root_seen {
            root_seen = true;
            if !el.is_local_name(b"container") {
                findings.push(finding(
                    data,
                    el.offset(),
                    format!("expected `container` root element, found `{}`", el.name_decoded()),
                ));
            }
        }
        if el.is_local_name(ocf::ROOT_FILE) {
            rootfiles += 1;
            if el.get_attribute(ocf::FULL_PATH).is_none() {
                findings.push(finding(
                    data,
                    el.offset(),
                    "`rootfile` is missing its required `full-path` attribute".to_owned(),
                ));
            }
            if el.get_attribute(ocf::MEDIA_TYPE).is_none() {
                findings.push(finding(
                    data,
                    el.offset(),
                    "`rootfile` is missing its required `media-type` attribute".to_owned(),
                ));
            }
        }
    }
    if root_seen && rootfiles == 0 {
        findings.push(finding(
            data,
            0,
            "`container` must declare at least one `rootfile`".to_owned(),
        ));
    }
    Ok(findings)
}

fn check_package(data: &[u8]) -> ParserResult<Vec<SchemaFinding>> {
    let mut reader = XmlReader::from_bytes(data);
    let mut findings = Vec::new();

    let mut package_offset = None;
    let mut has_metadata = false;
    let mut has_manifest = false;
    let mut has_spine = false;
    let mut has_identifier = false;
    let mut has_title = false;
    let mut has_language = false;

    while let Some(event) = reader.next() {
        let XmlEvent::Start(el) = event? else {
            continue;
        };
        match el.local_name() {
            b"package" if package_offset.is_none() => {
                package_offset = Some(el.offset());
                if el.get_attribute(opf::VERSION).is_none() {
                    findings.push(finding(
                        data,
                        el.offset(),
                        "`package` is missing its required `version` attribute".to_owned(),
                    ));
                }
                if el.get_attribute(opf::UNIQUE_ID).is_none() {
                    findings.push(finding(
                        data,
                        el.offset(),
                        "`package` is missing its required `unique-identifier` attribute"
                            .to_owned(),
                    ));
                }
            }
            b"metadata" => has_metadata = true,
            b"manifest" => has_manifest = true,
            b"spine" => has_spine = true,
            b"item" => {
                for (attribute, name) in [
                    (opf::ID, "id"),
                    (opf::HREF, "href"),
                    (opf::MEDIA_TYPE, "media-type"),
                ] {
                    if el.get_attribute(attribute).is_none() {
                        findings.push(finding(
                            data,
                            el.offset(),
                            format!("`item` is missing its required `{name}` attribute"),
                        ));
                    }
                }
            }
            b"itemref" => {
                if el.get_attribute(opf::IDREF).is_none() {
                    findings.push(finding(
                        data,
                        el.offset(),
                        "`itemref` is missing its required `idref` attribute".to_owned(),
                    ));
                }
            }
            _ => {}
        }
        match el.name() {
            b"dc:identifier" => has_identifier = true,
            b"dc:title" => has_title = true,
            b"dc:language" => has_language = true,
            _ => {}
        }
    }

    if let Some(offset) = package_offset {
        for (present, name) in [
            (has_metadata, "metadata"),
            (has_manifest, "manifest"),
            (has_spine, "spine"),
        ] {
            if !present {
                findings.push(finding(
                    data,
                    offset,
                    format!("`package` is missing its required `{name}` child"),
                ));
            }
        }
        if has_metadata {
            for (present, name) in [
                (has_identifier, "dc:identifier"),
                (has_title, "dc:title"),
                (has_language, "dc:language"),
            ] {
                if !present {
                    findings.push(finding(
                        data,
                        offset,
                        format!("`metadata` is missing the required `{name}` element"),
                    ));
                }
            }
        }
    }
    Ok(findings)
}

/// Runs the schema layer over `container.xml` and the primary package
/// document, inside one scoped engine acquisition.
pub(crate) fn run(ctx: &mut ValidationContext<'_>) {
    let Some(archive) = ctx.archive.take() else {
        return;
    };
    let mut engine = StructuralEngine::new();
    let mut engine_error = None;

    let mut documents = vec![(SchemaDoc::Container, ocf::CONTAINER_PATH.to_owned())];
    if let Some(opf_path) = &ctx.opf_path {
        documents.push((SchemaDoc::Package, opf_path.clone()));
    }

    for (schema, path) in documents {
        let Ok(data) = archive.read(&path) else {
            // Missing documents were reported by earlier stages.
            continue;
        };
        match engine.validate(schema, &data) {
            Ok(findings) => {
                debug!("schema pass over {path}: {} findings", findings.len());
                for f in findings {
                    ctx.report(
                        MessageId::Rsc005,
                        Some(EpubLocation::at(&path, f.line, f.column)),
                        f.message,
                    );
                }
            }
            Err(error) => {
                engine_error = Some(error);
                break;
            }
        }
    }
    // Disposal runs on every exit path, including the error one.
    engine.dispose();
    ctx.archive = Some(archive);

    if let Some(error) = engine_error {
        ctx.report(MessageId::Sch001, None, error.to_string());
    }
}
