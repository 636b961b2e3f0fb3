//! SVG content document checks.

use crate::consts::{ns, xhtml, xhtml::bytes};
use crate::content::collect_ref;
use crate::context::{ContentRef, ValidationContext};
use crate::messages::{EpubLocation, MessageId};
use crate::package::ManifestItem;
use crate::parser;
use crate::parser::xml::{XmlEvent, XmlReader};
use std::collections::BTreeSet;

pub(crate) fn check(ctx: &mut ValidationContext<'_>, item: &ManifestItem, data: &[u8]) {
    let mut reader = XmlReader::from_bytes(data);
    let mut ids = BTreeSet::new();
    let mut refs: Vec<ContentRef> = Vec::new();
    let mut root_checked = false;

    loop {
        match reader.next() {
            None => break,
            Some(Err(issue)) => {
                let (line, column) = parser::line_col(data, issue.offset);
                ctx.report(
                    MessageId::Rsc016,
                    Some(EpubLocation::at(&item.path, line, column)),
                    format!("SVG document is not well-formed: {}", issue.message),
                );
                break;
            }
            Some(Ok(XmlEvent::Start(el))) => {
                if !root_checked {
                    root_checked = true;
                    if !el.is_local_name(bytes::SVG) {
                        let (line, column) = parser::line_col(data, el.offset());
                        ctx.report(
                            MessageId::Med001,
                            Some(EpubLocation::at(&item.path, line, column)),
                            format!(
                                "resource declared as `image/svg+xml` has root element `{}`, \
                                 expected `svg` in the `{}` namespace",
                                el.name_decoded(),
                                ns::SVG
                            ),
                        );
                    }
                }
                if let Some(id) = el
                    .get_attribute(xhtml::ID)
                    .or_else(|| el.get_attribute(xhtml::XML_ID))
                {
                    ids.insert(id);
                }
                let (line, column) = parser::line_col(data, el.offset());
                for attribute in xhtml::REF_ATTRIBUTES {
                    if let Some(value) = el.get_attribute(attribute) {
                        collect_ref(&mut refs, &item.path, line, column, &value);
                    }
                }
            }
            Some(Ok(_)) => {}
        }
    }

    ctx.ids_by_path.insert(item.path.clone(), ids);
    ctx.references.extend(refs);
}
