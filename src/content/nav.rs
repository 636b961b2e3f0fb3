//! EPUB 3 navigation document checks.
//!
//! Runs on top of the regular XHTML pass for the manifest item carrying
//! the `nav` property: a `toc` nav must exist and every structural nav
//! (`toc`, `page-list`, `landmarks`) must directly contain an `<ol>`.

use crate::consts::{xhtml, xhtml::bytes};
use crate::context::ValidationContext;
use crate::messages::{EpubLocation, MessageId};
use crate::package::ManifestItem;
use crate::parser;
use crate::parser::xml::{XmlEvent, XmlReader};

/// Nav kinds with required `<ol>` structure.
const STRUCTURAL_TYPES: &[&str] = &[
    xhtml::TOC_TYPE,
    xhtml::PAGE_LIST_TYPE,
    xhtml::LANDMARKS_TYPE,
];

struct NavFrame {
    /// Structural `epub:type` tokens carried by this `<nav>`.
    kinds: Vec<String>,
    /// Element depth at the `<nav>` start tag.
    depth: usize,
    has_direct_ol: bool,
    offset: usize,
}

pub(crate) fn check(ctx: &mut ValidationContext<'_>, item: &ManifestItem, data: &[u8]) {
    let mut reader = XmlReader::from_bytes(data);
    let mut open_navs: Vec<NavFrame> = Vec::new();
    let mut depth = 0usize;
    let mut found_toc = false;

    loop {
        match reader.next() {
            None => break,
            // The XHTML pass already reported the parse failure.
            Some(Err(_)) => break,
            Some(Ok(XmlEvent::Start(el))) => {
                if el.is_local_name(bytes::NAV) {
                    let kinds: Vec<String> = el
                        .get_attribute(xhtml::EPUB_TYPE)
                        .map(|types| {
                            types
                                .split_ascii_whitespace()
                                .filter(|token| STRUCTURAL_TYPES.contains(token))
                                .map(str::to_owned)
                                .collect()
                        })
                        .unwrap_or_default();

                    if kinds.iter().any(|kind| kind == xhtml::TOC_TYPE) {
                        found_toc = true;
                    }
                    let frame = NavFrame {
                        kinds,
                        depth,
                        has_direct_ol: false,
                        offset: el.offset(),
                    };
                    if el.is_self_closing() {
                        report_missing_ol(ctx, item, data, &frame);
                    } else {
                        open_navs.push(frame);
                    }
                } else if el.is_local_name(bytes::OL)
                    && let Some(frame) = open_navs.last_mut()
                    && depth == frame.depth + 1
                {
                    frame.has_direct_ol = true;
                }

                if !el.is_self_closing() {
                    depth += 1;
                }
            }
            Some(Ok(XmlEvent::End(el))) => {
                depth = depth.saturating_sub(1);
                if el.local_name().as_ref() == bytes::NAV
                    && let Some(frame) = open_navs.pop()
                {
                    report_missing_ol(ctx, item, data, &frame);
                }
            }
            Some(Ok(_)) => {}
        }
    }

    if !found_toc {
        ctx.report(
            MessageId::Nav001,
            Some(EpubLocation::path(&item.path)),
            "navigation document has no `<nav epub:type=\"toc\">`".to_owned(),
        );
    }
}

fn report_missing_ol(
    ctx: &mut ValidationContext<'_>,
    item: &ManifestItem,
    data: &[u8],
    frame: &NavFrame,
) {
    for kind in &frame.kinds {
        if !frame.has_direct_ol {
            let (line, column) = parser::line_col(data, frame.offset);
            ctx.report(
                MessageId::Nav002,
                Some(EpubLocation::at(&item.path, line, column)),
                format!("`<nav epub:type=\"{kind}\">` must directly contain an `<ol>`"),
            );
        }
    }
}
