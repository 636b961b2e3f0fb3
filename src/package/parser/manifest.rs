use crate::consts::opf::{self, bytes};
use crate::messages::MessageId;
use crate::package::{ManifestItem, Properties};
use crate::package::parser::PackageParser;
use crate::parser::ParserResult;
use crate::parser::xml::XmlStartElement;
use crate::util::uri;
use indexmap::IndexMap;
use std::collections::BTreeSet;

impl PackageParser<'_, '_, '_> {
    pub(super) fn parse_manifest(&mut self) -> ParserResult<IndexMap<String, ManifestItem>> {
        let mut entries = IndexMap::new();
        let mut seen_paths = BTreeSet::new();

        while let Some(item) = self.next_child(bytes::MANIFEST, bytes::ITEM)? {
            self.parse_item(&item, &mut entries, &mut seen_paths);
        }
        Ok(entries)
    }

    fn parse_item(
        &mut self,
        item: &XmlStartElement<'_>,
        entries: &mut IndexMap<String, ManifestItem>,
        seen_paths: &mut BTreeSet<String>,
    ) {
        let mut attributes = item.attributes();
        let location = self.location(item.offset());
        let position = (location.line.unwrap_or(1), location.column.unwrap_or(1));

        // Required attributes; their absence is a grammar defect reported
        // by the schema layer, so the item is simply skipped here.
        let (Some(id), Some(href_raw)) = (
            attributes.remove(opf::ID),
            attributes.remove(opf::HREF),
        ) else {
            return;
        };

        if entries.contains_key(&id) {
            self.ctx.report(
                MessageId::Rsc005,
                Some(location),
                format!("duplicate manifest item id `{id}`"),
            );
            return;
        }

        let media_type = attributes.remove(opf::MEDIA_TYPE);
        if media_type.as_deref().is_some_and(|mt| mt.trim().is_empty()) {
            self.ctx.report(
                MessageId::Rsc005,
                Some(location.clone()),
                format!("manifest item `{id}` has an empty `media-type`"),
            );
        }

        let remote = uri::has_scheme(&href_raw);
        let href = if remote {
            href_raw.clone()
        } else {
            uri::resolve(&self.opf_dir, &href_raw)
        };
        let path = if remote {
            String::new()
        } else {
            uri::decode(uri::path(&href)).into_owned()
        };

        if !remote && !seen_paths.insert(path.clone()) {
            self.ctx.report(
                MessageId::Opf074,
                Some(location.clone()),
                format!("manifest items share the resource `{path}` after href normalization"),
            );
        }

        let properties = Properties::parse(attributes.remove(opf::PROPERTIES));
        self.check_item_properties(&id, &properties, &location);

        let mut media_type = media_type.unwrap_or_default();
        // Lowercase to enforce uniformity for content dispatch.
        media_type.make_ascii_lowercase();

        let entry = ManifestItem {
            href: href.clone(),
            href_raw,
            path,
            media_type,
            properties,
            fallback: attributes.remove(opf::FALLBACK),
            media_overlay: attributes.remove(opf::MEDIA_OVERLAY),
            refinements: Vec::new(),
            remote,
            position: Some(position),
            id: id.clone(),
        };
        entries.insert(id, entry);
    }

    fn check_item_properties(
        &mut self,
        id: &str,
        properties: &Properties,
        location: &crate::messages::EpubLocation,
    ) {
        if properties.is_empty() {
            return;
        }
        if self.ctx.version.is_epub2() {
            self.ctx.report(
                MessageId::Opf027,
                Some(location.clone()),
                format!("manifest item `{id}` uses the `properties` attribute, \
                         which is not defined for EPUB 2"),
            );
            return;
        }
        for token in properties.iter() {
            // Prefixed tokens belong to foreign vocabularies.
            if !token.contains(':') && !opf::ITEM_PROPERTIES.contains(&token) {
                self.ctx.report(
                    MessageId::Opf027,
                    Some(location.clone()),
                    format!("undefined item property `{token}` on manifest item `{id}`"),
                );
            }
        }
    }
}
