//! XHTML content document checks.

use crate::consts::{ns, xhtml, xhtml::bytes};
use crate::content::collect_ref;
use crate::context::{ContentRef, ValidationContext};
use crate::messages::{EpubLocation, MessageId};
use crate::package::ManifestItem;
use crate::parser;
use crate::parser::xml::{XmlEvent, XmlReader};
use crate::util::str::ellipsize;
use std::collections::BTreeSet;

pub(crate) fn check(ctx: &mut ValidationContext<'_>, item: &ManifestItem, data: &[u8]) {
    scan_ampersands(ctx, &item.path, data);

    let mut ids = BTreeSet::new();
    let mut refs: Vec<ContentRef> = Vec::new();

    let mut reader = XmlReader::from_bytes(data);
    let mut stack: Vec<Vec<u8>> = Vec::new();
    let mut root_checked = false;
    let mut has_head = false;
    let mut has_title = false;
    let mut has_body = false;

    loop {
        match reader.next() {
            None => break,
            Some(Err(issue)) => {
                let (line, column) = parser::line_col(data, issue.offset);
                ctx.report(
                    MessageId::Htm004,
                    Some(EpubLocation::at(&item.path, line, column)),
                    format!("document is not well-formed: {}", issue.message),
                );
                // Degrade: keep whatever was collected before the failure.
                break;
            }
            Some(Ok(XmlEvent::Start(el))) => {
                if !root_checked {
                    root_checked = true;
                    let namespace = el.get_attribute(xhtml::XMLNS);
                    if !el.is_local_name(bytes::HTML) || namespace.as_deref() != Some(ns::XHTML) {
                        let (line, column) = parser::line_col(data, el.offset());
                        ctx.report(
                            MessageId::Htm001,
                            Some(EpubLocation::at(&item.path, line, column)),
                            format!(
                                "expected `<html xmlns=\"{}\">` as the document root",
                                ns::XHTML
                            ),
                        );
                    }
                }
                match el.local_name() {
                    name if name == bytes::HEAD => has_head = true,
                    name if name == bytes::TITLE => {
                        if stack.iter().any(|open| open == bytes::HEAD) {
                            has_title = true;
                        }
                    }
                    name if name == bytes::BODY => has_body = true,
                    _ => {}
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

                if !el.is_self_closing() {
                    stack.push(el.local_name().to_owned());
                }
            }
            Some(Ok(XmlEvent::End(_))) => {
                stack.pop();
            }
            Some(Ok(_)) => {}
        }
    }

    let location = || Some(EpubLocation::path(&item.path));
    if !has_head {
        ctx.report(
            MessageId::Htm002,
            location(),
            "document is missing its `<head>` element".to_owned(),
        );
    }
    if !has_body {
        ctx.report(
            MessageId::Htm002,
            location(),
            "document is missing its `<body>` element".to_owned(),
        );
    }
    if has_head && !has_title {
        ctx.report(
            MessageId::Htm003,
            location(),
            "document head is missing its `<title>` element".to_owned(),
        );
    }

    ctx.ids_by_path.insert(item.path.clone(), ids);
    ctx.references.extend(refs);
}

/// Pre-parse scan for ampersands that do not start a valid entity
/// reference (named, decimal numeric, or hex numeric).
fn scan_ampersands(ctx: &mut ValidationContext<'_>, path: &str, data: &[u8]) {
    let mut position = 0;

    while let Some(found) = data[position..].iter().position(|&b| b == b'&') {
        let offset = position + found;
        position = offset + 1;

        if !is_entity_reference(&data[offset + 1..]) {
            let (line, column) = parser::line_col(data, offset);
            let context = snippet(data, offset);
            ctx.report(
                MessageId::Htm012,
                Some(EpubLocation::at(path, line, column).with_context(context)),
                "unescaped `&`; not a valid entity reference".to_owned(),
            );
        }
    }
}

/// `true` when `rest` (the bytes after an `&`) begins a well-formed entity
/// reference.
fn is_entity_reference(rest: &[u8]) -> bool {
    let end = match rest.iter().position(|&b| b == b';') {
        // An entity reference cannot span lines; a missing `;` nearby means
        // the ampersand stands alone.
        Some(end) if end > 0 => end,
        _ => return false,
    };
    let body = &rest[..end];

    match body {
        [b'#', b'x' | b'X', hex @ ..] => {
            !hex.is_empty() && hex.iter().all(u8::is_ascii_hexdigit)
        }
        [b'#', digits @ ..] => !digits.is_empty() && digits.iter().all(u8::is_ascii_digit),
        [first, rest @ ..] => {
            first.is_ascii_alphabetic()
                && rest
                    .iter()
                    .all(|&b| b.is_ascii_alphanumeric() || matches!(b, b'.' | b'-' | b'_'))
        }
        [] => false,
    }
}

fn snippet(data: &[u8], offset: usize) -> String {
    let end = data[offset..]
        .iter()
        .position(|&b| b == b'\n' || b == b'\r')
        .map_or(data.len(), |i| offset + i);
    ellipsize(&String::from_utf8_lossy(&data[offset..end]), 40)
}
