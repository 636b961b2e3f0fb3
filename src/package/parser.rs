//! Stage 4: package document parsing.
//!
//! Turns the primary OPF into a [`PackageDocument`] while reporting the
//! model-level rule violations (duplicate ids, dangling references,
//! property vocabulary, fallback chains). Grammar-level omissions are the
//! schema layer's concern and are not duplicated here.

mod manifest;
mod metadata;
mod spine;

use crate::consts::{mime, opf, opf::bytes};
use crate::context::ValidationContext;
use crate::messages::{EpubLocation, MessageId, Severity};
use crate::options::EpubVersion;
use crate::package::{
    Collection, GuideReference, ManifestItem, MetaEntry, Metadata, PackageDocument, SpineItemRef,
};
use crate::parser::{self, ParserResult};
use crate::parser::xml::{XmlEvent, XmlReader, XmlStartElement};
use crate::util::uri;
use indexmap::IndexMap;
use log::debug;
use std::collections::BTreeSet;

pub(crate) fn run(ctx: &mut ValidationContext<'_>) {
    let Some(opf_path) = ctx.opf_path.clone() else {
        return;
    };
    let Some(archive) = ctx.archive.take() else {
        return;
    };
    let data = match archive.read(&opf_path) {
        Ok(data) => data,
        Err(error) => {
            ctx.archive = Some(archive);
            ctx.report(
                MessageId::Rsc004,
                Some(EpubLocation::path(&opf_path)),
                error.to_string(),
            );
            return;
        }
    };
    ctx.archive = Some(archive);

    PackageParser::new(ctx, &data, opf_path).parse();
    post_checks(ctx);
}

/// Spine data plus the attributes hoisted off the `<spine>` element.
pub(super) struct ParsedSpine {
    pub(super) itemrefs: Vec<SpineItemRef>,
    pub(super) toc: Option<String>,
    pub(super) page_progression: Option<String>,
}

pub(super) struct PackageParser<'ctx, 'i, 'data> {
    pub(super) ctx: &'ctx mut ValidationContext<'i>,
    pub(super) reader: XmlReader<'data>,
    pub(super) data: &'data [u8],
    pub(super) opf_path: String,
    pub(super) opf_dir: String,
    raw_version: Option<String>,
    unique_identifier_id: Option<String>,
    version: Option<EpubVersion>,
    metadata: Option<Metadata>,
    pub(super) refining: Vec<MetaEntry>,
    manifest: Option<IndexMap<String, ManifestItem>>,
    spine: Option<ParsedSpine>,
    guide: Vec<GuideReference>,
    collections: Vec<Collection>,
}

impl<'ctx, 'i, 'data> PackageParser<'ctx, 'i, 'data> {
    fn new(
        ctx: &'ctx mut ValidationContext<'i>,
        data: &'data [u8],
        opf_path: String,
    ) -> Self {
        Self {
            ctx,
            reader: XmlReader::from_bytes(data),
            data,
            opf_dir: uri::parent(&opf_path).to_owned(),
            opf_path,
            raw_version: None,
            unique_identifier_id: None,
            version: None,
            metadata: None,
            refining: Vec::new(),
            manifest: None,
            spine: None,
            guide: Vec::new(),
            collections: Vec::new(),
        }
    }

    fn parse(mut self) {
        if let Err(issue) = self.handle_opf() {
            let (line, column) = parser::line_col(self.data, issue.offset);
            let location = EpubLocation::at(&self.opf_path, line, column);
            self.ctx.report(
                MessageId::Rsc005,
                Some(location),
                format!("package document is not well-formed: {}", issue.message),
            );
        }

        let Some(version) = self.version else {
            // Without a package root there is nothing to validate against.
            if !self.ctx.halted() {
                self.ctx.report(
                    MessageId::Opf002,
                    Some(EpubLocation::path(&self.opf_path)),
                    "package document has no `<package>` root element".to_owned(),
                );
            }
            return;
        };

        let mut document = PackageDocument {
            version,
            raw_version: self.raw_version.unwrap_or_default(),
            unique_identifier_id: self.unique_identifier_id,
            metadata: self.metadata.unwrap_or_default(),
            manifest: self.manifest.unwrap_or_default(),
            spine: Vec::new(),
            spine_toc: None,
            page_progression: None,
            guide: self.guide,
            collections: self.collections,
        };
        if let Some(spine) = self.spine {
            document.spine = spine.itemrefs;
            document.spine_toc = spine.toc;
            document.page_progression = spine.page_progression;
        }
        metadata::attach_refinements(self.ctx, &self.opf_path, &mut document, self.refining);

        debug!(
            "package document parsed: {} manifest items, {} spine itemrefs",
            document.manifest.len(),
            document.spine.len()
        );
        self.ctx.package = Some(document);
    }

    fn handle_opf(&mut self) -> ParserResult<()> {
        while let Some(event) = self.reader.next() {
            let XmlEvent::Start(el) = event? else {
                continue;
            };
            match el.local_name() {
                bytes::PACKAGE => self.parse_package(&el),
                bytes::METADATA if self.version.is_some() => {
                    let metadata = self.parse_metadata()?;
                    self.metadata.replace(metadata);
                }
                bytes::MANIFEST if self.version.is_some() => {
                    let manifest = self.parse_manifest()?;
                    self.manifest.replace(manifest);
                }
                bytes::SPINE if self.version.is_some() => {
                    let spine = self.parse_spine(&el)?;
                    self.spine.replace(spine);
                }
                bytes::GUIDE if self.version.is_some() => self.parse_guide()?,
                bytes::COLLECTION if self.version.is_some() => self.parse_collection(&el)?,
                _ => {}
            }
            if self.ctx.halted() {
                break;
            }
        }
        Ok(())
    }

    /// Parses the root element attributes and detects the rule set.
    fn parse_package(&mut self, package: &XmlStartElement<'_>) {
        let raw = package.get_attribute(opf::VERSION).unwrap_or_default();
        self.unique_identifier_id = package.get_attribute(opf::UNIQUE_ID);

        let detected = EpubVersion::parse(&raw);
        let location = self.location(package.offset());

        let effective = match (detected, self.ctx.options.version) {
            (Some(detected), Some(forced)) => {
                if detected != forced {
                    self.ctx.report_as(
                        MessageId::Opf001,
                        Severity::Warning,
                        Some(location),
                        format!(
                            "detected version {detected} differs from the requested \
                             version {forced}; validating as {forced}"
                        ),
                    );
                }
                Some(forced)
            }
            (Some(detected), None) => Some(detected),
            (None, _) => {
                self.ctx.report(
                    MessageId::Opf001,
                    Some(location),
                    format!("unknown or unsupported EPUB version `{raw}`"),
                );
                None
            }
        };

        self.raw_version = Some(raw);
        if let Some(effective) = effective {
            self.ctx.version = effective;
            self.version = Some(effective);
        }
    }

    fn parse_guide(&mut self) -> ParserResult<()> {
        while let Some(reference) = self.next_child(bytes::GUIDE, bytes::REFERENCE)? {
            self.guide.push(GuideReference {
                ref_type: reference.get_attribute(opf::GUIDE_TYPE),
                title: reference.get_attribute(opf::GUIDE_TITLE),
                href: reference.get_attribute(opf::HREF),
            });
        }
        Ok(())
    }

    fn parse_collection(&mut self, collection: &XmlStartElement<'_>) -> ParserResult<()> {
        let role = collection.get_attribute(opf::ROLE);

        match role {
            Some(role) => self.collections.push(Collection { role }),
            None => {
                let location = self.location(collection.offset());
                self.ctx.report(
                    MessageId::Rsc005,
                    Some(location),
                    "`<collection>` is missing its required `role` attribute".to_owned(),
                );
            }
        }
        if collection.is_self_closing() {
            return Ok(());
        }
        // Collections may nest; skip the subtree.
        let mut depth = 0usize;
        while let Some(event) = self.reader.next() {
            match event? {
                XmlEvent::Start(el) if el.is_local_name(bytes::COLLECTION) && !el.is_self_closing() => {
                    depth += 1;
                }
                XmlEvent::End(el) if el.local_name().as_ref() == bytes::COLLECTION => {
                    if depth == 0 {
                        break;
                    }
                    depth -= 1;
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Advances to the next `child` start element, stopping at the `parent`
    /// end tag.
    pub(super) fn next_child(
        &mut self,
        parent: &[u8],
        child: &[u8],
    ) -> ParserResult<Option<XmlStartElement<'data>>> {
        while let Some(event) = self.reader.next() {
            return Ok(Some(match event? {
                XmlEvent::Start(el) if el.is_local_name(child) => el,
                XmlEvent::End(el) if el.local_name().as_ref() == parent => break,
                _ => continue,
            }));
        }
        Ok(None)
    }

    pub(super) fn location(&self, offset: usize) -> EpubLocation {
        let (line, column) = parser::line_col(self.data, offset);
        EpubLocation::at(&self.opf_path, line, column)
    }
}

/// Model-level rules evaluated once the whole document is available.
fn post_checks(ctx: &mut ValidationContext<'_>) {
    let Some(package) = ctx.package.take() else {
        return;
    };
    let opf_path = ctx.opf_path.clone().unwrap_or_default();
    let opf_location = || Some(EpubLocation::path(&opf_path));

    // EPUB 3 requires a last-modified timestamp.
    if package.version.is_epub3() && !package.metadata.has(opf::MODIFIED) {
        ctx.report(
            MessageId::Opf053,
            opf_location(),
            "EPUB 3 metadata is missing the required `dcterms:modified` property".to_owned(),
        );
    }

    // The unique-identifier attribute must select an existing dc:identifier.
    if let Some(unique_id) = &package.unique_identifier_id {
        let resolves = package
            .metadata
            .by_name(opf::IDENTIFIER)
            .any(|entry| entry.id.as_deref() == Some(unique_id));
        if !resolves {
            ctx.report(
                MessageId::Rsc005,
                opf_location(),
                format!("`unique-identifier=\"{unique_id}\"` does not match any `dc:identifier`"),
            );
        }
    }

    check_nav_property(ctx, &package, &opf_path);
    check_spine(ctx, &package, &opf_path);
    check_fallbacks(ctx, &package, &opf_path);

    ctx.package = Some(package);
}

fn check_nav_property(ctx: &mut ValidationContext<'_>, package: &PackageDocument, opf_path: &str) {
    let nav_count = package
        .manifest
        .values()
        .filter(|item| item.properties.has(opf::NAV_PROPERTY))
        .count();

    if package.version.is_epub3() {
        match nav_count {
            1 => {}
            0 => ctx.report(
                MessageId::Opf030,
                Some(EpubLocation::path(opf_path)),
                "no manifest item carries the `nav` property".to_owned(),
            ),
            n => ctx.report(
                MessageId::Opf030,
                Some(EpubLocation::path(opf_path)),
                format!("{n} manifest items carry the `nav` property, expected exactly one"),
            ),
        }
    } else if nav_count > 0 {
        ctx.report(
            MessageId::Opf030,
            Some(EpubLocation::path(opf_path)),
            "the `nav` item property is not defined for EPUB 2".to_owned(),
        );
    }
}

fn check_spine(ctx: &mut ValidationContext<'_>, package: &PackageDocument, opf_path: &str) {
    for itemref in &package.spine {
        if !package.manifest.contains_key(&itemref.idref) {
            let location = itemref
                .position
                .map(|(line, column)| EpubLocation::at(opf_path, line, column))
                .or_else(|| Some(EpubLocation::path(opf_path)));
            ctx.report(
                MessageId::Rsc005,
                location,
                format!(
                    "spine itemref `idref=\"{}\"` does not match any manifest item",
                    itemref.idref
                ),
            );
        }
    }

    match &package.spine_toc {
        Some(toc_id) => match package.manifest.get(toc_id) {
            Some(item) if item.media_type == mime::NCX => {}
            Some(item) => ctx.report(
                MessageId::Ncx001,
                Some(EpubLocation::path(opf_path)),
                format!(
                    "spine `toc=\"{toc_id}\"` references media type `{}`, expected `{}`",
                    item.media_type,
                    mime::NCX
                ),
            ),
            None => ctx.report(
                MessageId::Rsc005,
                Some(EpubLocation::path(opf_path)),
                format!("spine `toc=\"{toc_id}\"` does not match any manifest item"),
            ),
        },
        None if package.version.is_epub2() => {
            ctx.report(
                MessageId::Ncx001,
                Some(EpubLocation::path(opf_path)),
                "EPUB 2 spine is missing the `toc` attribute referencing the NCX".to_owned(),
            );
        }
        None => {}
    }
}

fn check_fallbacks(ctx: &mut ValidationContext<'_>, package: &PackageDocument, opf_path: &str) {
    // Dangling fallback targets.
    for item in package.manifest.values() {
        if let Some(fallback) = &item.fallback
            && !package.manifest.contains_key(fallback)
        {
            let location = item
                .position
                .map(|(line, column)| EpubLocation::at(opf_path, line, column));
            ctx.report(
                MessageId::Rsc005,
                location,
                format!(
                    "manifest item `{}` declares fallback `{fallback}`, \
                     which does not match any manifest item",
                    item.id
                ),
            );
        }
    }

    // Fallback cycles; each cycle is reported once.
    let mut flagged: BTreeSet<String> = BTreeSet::new();

    for id in package.manifest.keys() {
        if flagged.contains(id) {
            continue;
        }
        let mut seen = BTreeSet::new();
        seen.insert(id.clone());
        let mut cursor = package.manifest[id].fallback.clone();

        while let Some(next) = cursor {
            if seen.contains(&next) {
                let location = package.manifest[id]
                    .position
                    .map(|(line, column)| EpubLocation::at(opf_path, line, column));
                ctx.report(
                    MessageId::Opf045,
                    location,
                    format!("fallback chain starting at manifest item `{id}` forms a cycle"),
                );
                flagged.extend(seen);
                break;
            }
            seen.insert(next.clone());
            cursor = package
                .manifest
                .get(&next)
                .and_then(|item| item.fallback.clone());
        }
    }
}
