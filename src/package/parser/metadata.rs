use crate::consts::opf::{self, bytes};
use crate::context::ValidationContext;
use crate::messages::{EpubLocation, MessageId};
use crate::package::{MetaEntry, Metadata, PackageDocument, Refinement};
use crate::package::parser::PackageParser;
use crate::parser::ParserResult;
use crate::parser::xml::XmlEvent;
use std::collections::{BTreeMap, BTreeSet};

const DC_PREFIX: &[u8] = b"dc:";

impl PackageParser<'_, '_, '_> {
    /// Parses `<metadata>`: Dublin Core elements plus both `<meta>` styles.
    ///
    /// Refining metas (`refines="#id"`) are held back on the parser and
    /// attached once the manifest is available.
    pub(super) fn parse_metadata(&mut self) -> ParserResult<Metadata> {
        let mut entries = Vec::new();

        while let Some(event) = self.reader.next() {
            match event? {
                XmlEvent::Start(el) => {
                    let position = {
                        let location = self.location(el.offset());
                        (location.line.unwrap_or(1), location.column.unwrap_or(1))
                    };

                    if el.name().starts_with(DC_PREFIX) {
                        let name = el.name_decoded();
                        let id = el.get_attribute(opf::ID);
                        let value = self.reader.get_element_text(&el)?;

                        entries.push(MetaEntry {
                            name,
                            value,
                            id,
                            refines: None,
                            refinements: Vec::new(),
                            position: Some(position),
                        });
                    } else if el.is_local_name(bytes::META) {
                        let id = el.get_attribute(opf::ID);

                        if let Some(property) = el.get_attribute(opf::PROPERTY) {
                            // EPUB 3 style: <meta property="...">value</meta>
                            let refines = el.get_attribute(opf::REFINES);
                            let value = self.reader.get_element_text(&el)?;
                            let entry = MetaEntry {
                                name: property,
                                value,
                                id,
                                refines,
                                refinements: Vec::new(),
                                position: Some(position),
                            };
                            if entry.refines.is_some() {
                                self.refining.push(entry);
                            } else {
                                entries.push(entry);
                            }
                        } else if let Some(name) = el.get_attribute(opf::NAME) {
                            // EPUB 2 style: <meta name="..." content="..."/>
                            entries.push(MetaEntry {
                                name,
                                value: el.get_attribute(opf::CONTENT).unwrap_or_default(),
                                id,
                                refines: None,
                                refinements: Vec::new(),
                                position: Some(position),
                            });
                        }
                    }
                }
                XmlEvent::End(el) if el.local_name().as_ref() == bytes::METADATA => break,
                _ => {}
            }
        }
        Ok(Metadata { entries })
    }
}

/// Resolves `refines` targets against metadata entries and manifest items,
/// attaching each refining meta as a [`Refinement`] property bag entry.
pub(super) fn attach_refinements(
    ctx: &mut ValidationContext<'_>,
    opf_path: &str,
    document: &mut PackageDocument,
    refining: Vec<MetaEntry>,
) {
    report_refines_cycles(ctx, opf_path, &refining);

    let refining_ids: BTreeSet<&str> = refining
        .iter()
        .filter_map(|entry| entry.id.as_deref())
        .collect();

    for entry in &refining {
        let Some(raw_target) = entry.refines.as_deref() else {
            continue;
        };
        let target = raw_target.strip_prefix('#').unwrap_or(raw_target);
        let refinement = Refinement {
            property: entry.name.clone(),
            value: entry.value.clone(),
        };

        if let Some(meta) = document
            .metadata
            .entries
            .iter_mut()
            .find(|meta| meta.id.as_deref() == Some(target))
        {
            meta.refinements.push(refinement);
        } else if let Some(item) = document
            .manifest
            .values_mut()
            .find(|item| item.id == target)
        {
            item.refinements.push(refinement);
        } else if !refining_ids.contains(target) {
            // A refinement of another refining meta is accepted silently;
            // anything else is a dangling reference.
            let location = entry
                .position
                .map(|(line, column)| EpubLocation::at(opf_path, line, column));
            ctx.report(
                MessageId::Rsc005,
                location,
                format!("`refines=\"{raw_target}\"` does not match any element id"),
            );
        }
    }
}

fn report_refines_cycles(ctx: &mut ValidationContext<'_>, opf_path: &str, refining: &[MetaEntry]) {
    let targets: BTreeMap<&str, &str> = refining
        .iter()
        .filter_map(|entry| {
            let id = entry.id.as_deref()?;
            let target = entry.refines.as_deref()?;
            Some((id, target.strip_prefix('#').unwrap_or(target)))
        })
        .collect();

    let mut flagged: BTreeSet<&str> = BTreeSet::new();

    for &start in targets.keys() {
        if flagged.contains(start) {
            continue;
        }
        let mut seen = BTreeSet::from([start]);
        let mut cursor = targets.get(start).copied();

        while let Some(current) = cursor {
            if seen.contains(current) {
                ctx.report(
                    MessageId::Rsc005,
                    Some(EpubLocation::path(opf_path)),
                    format!("circular `refines` chain involving id `{start}`"),
                );
                flagged.extend(seen);
                break;
            }
            seen.insert(current);
            cursor = targets.get(current).copied();
        }
    }
}
