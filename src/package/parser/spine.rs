use crate::consts::opf::{self, bytes};
use crate::messages::MessageId;
use crate::package::{Properties, SpineItemRef};
use crate::package::parser::{PackageParser, ParsedSpine};
use crate::parser::ParserResult;
use crate::parser::xml::XmlStartElement;

const PAGE_PROGRESSION_VALUES: &[&str] = &["ltr", "rtl", "default"];

impl PackageParser<'_, '_, '_> {
    pub(super) fn parse_spine(
        &mut self,
        spine: &XmlStartElement<'_>,
    ) -> ParserResult<ParsedSpine> {
        let toc = spine.get_attribute(opf::TOC);
        let page_progression = spine.get_attribute(opf::PAGE_PROGRESSION_DIRECTION);

        if let Some(direction) = page_progression.as_deref()
            && !PAGE_PROGRESSION_VALUES.contains(&direction)
        {
            let location = self.location(spine.offset());
            self.ctx.report(
                MessageId::Rsc005,
                Some(location),
                format!("invalid `page-progression-direction` value `{direction}`"),
            );
        }

        let mut itemrefs = Vec::new();

        while let Some(itemref) = self.next_child(bytes::SPINE, bytes::ITEMREF)? {
            let location = self.location(itemref.offset());
            let position = (location.line.unwrap_or(1), location.column.unwrap_or(1));

            // A missing idref is a grammar defect left to the schema layer.
            let Some(idref) = itemref.get_attribute(opf::IDREF) else {
                continue;
            };
            let linear = itemref
                .get_attribute(opf::LINEAR)
                .is_none_or(|linear| linear != "no");
            let properties = Properties::parse(itemref.get_attribute(opf::PROPERTIES));
            self.check_itemref_properties(&idref, &properties, &location);

            itemrefs.push(SpineItemRef {
                idref,
                linear,
                properties,
                position: Some(position),
            });
        }

        Ok(ParsedSpine {
            itemrefs,
            toc,
            page_progression,
        })
    }

    fn check_itemref_properties(
        &mut self,
        idref: &str,
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
                format!("spine itemref `{idref}` uses the `properties` attribute, \
                         which is not defined for EPUB 2"),
            );
            return;
        }
        for token in properties.iter() {
            if !token.contains(':') && !opf::ITEMREF_PROPERTIES.contains(&token) {
                self.ctx.report(
                    MessageId::Opf027,
                    Some(location.clone()),
                    format!("undefined itemref property `{token}` on spine itemref `{idref}`"),
                );
            }
        }
    }
}
