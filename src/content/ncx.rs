//! NCX document checks (EPUB 2 navigation, legacy in EPUB 3).

use crate::consts::{ncx, ncx::bytes, ns, xhtml};
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
    let mut root_ok = false;
    let mut has_nav_map = false;
    let mut uid: Option<String> = None;

    loop {
        match reader.next() {
            None => break,
            Some(Err(issue)) => {
                let (line, column) = parser::line_col(data, issue.offset);
                ctx.report(
                    MessageId::Ncx002,
                    Some(EpubLocation::at(&item.path, line, column)),
                    format!("NCX document is not well-formed: {}", issue.message),
                );
                break;
            }
            Some(Ok(XmlEvent::Start(el))) => {
                if !root_checked {
                    root_checked = true;
                    root_ok = el.is_local_name(bytes::NCX)
                        && el.get_attribute(xhtml::XMLNS).as_deref() == Some(ns::NCX);
                }
                match el.local_name() {
                    name if name == bytes::NAV_MAP => has_nav_map = true,
                    name if name == bytes::META => {
                        if el.get_attribute("name").as_deref() == Some(ncx::UID_META) {
                            uid = Some(el.get_attribute("content").unwrap_or_default());
                        }
                    }
                    name if name == bytes::CONTENT => {
                        if let Some(src) = el.get_attribute(ncx::SRC) {
                            let (line, column) = parser::line_col(data, el.offset());
                            collect_ref(&mut refs, &item.path, line, column, &src);
                        }
                    }
                    _ => {}
                }
                if let Some(id) = el.get_attribute(xhtml::ID) {
                    ids.insert(id);
                }
            }
            Some(Ok(_)) => {}
        }
    }

    if root_checked && !root_ok {
        ctx.report(
            MessageId::Ncx001,
            Some(EpubLocation::path(&item.path)),
            format!("NCX root element must be `ncx` in the `{}` namespace", ns::NCX),
        );
    }
    if root_ok && !has_nav_map {
        ctx.report(
            MessageId::Ncx001,
            Some(EpubLocation::path(&item.path)),
            "NCX document is missing its `navMap` element".to_owned(),
        );
    }

    match uid {
        // A missing dtb:uid stays silent; an empty one is worth a warning.
        Some(uid) if uid.trim().is_empty() => {
            ctx.report(
                MessageId::Ncx003,
                Some(EpubLocation::path(&item.path)),
                "`dtb:uid` meta is present but empty".to_owned(),
            );
        }
        Some(uid) => ctx.ncx_uid = Some(uid),
        None => {}
    }

    ctx.ids_by_path.insert(item.path.clone(), ids);
    ctx.references.extend(refs);
}
