//! Stage 6: per-resource content validation.
//!
//! Dispatches manifest items to format-specific validators in manifest
//! order, polling the error cap between resources. Validators append
//! messages and feed the cross-reference stage: collected `id` values and
//! outbound references land on the context.

mod css;
mod media;
mod nav;
mod ncx;
mod svg;
mod xhtml;

use crate::consts::mime;
use crate::context::{ContentRef, ValidationContext};
use crate::messages::{EpubLocation, MessageId, Severity};
use crate::util::uri;
use log::trace;

pub(crate) fn run(ctx: &mut ValidationContext<'_>) {
    let Some(package) = ctx.package.take() else {
        return;
    };
    let Some(archive) = ctx.archive.take() else {
        ctx.package = Some(package);
        return;
    };

    for item in package.manifest.values() {
        if ctx.sink.is_capped() {
            break;
        }
        if item.remote {
            continue;
        }
        let data = match archive.read(&item.path) {
            Ok(data) => data,
            Err(error) if error.is_not_found() => {
                let location = item
                    .position
                    .map(|(line, column)| {
                        EpubLocation::at(ctx.opf_path.clone().unwrap_or_default(), line, column)
                    });
                ctx.report(
                    MessageId::Rsc001,
                    location,
                    format!(
                        "manifest item `{}` references `{}`, which is not in the container",
                        item.id, item.path
                    ),
                );
                continue;
            }
            Err(error) => {
                ctx.report_as(
                    MessageId::Rsc004,
                    Severity::Error,
                    Some(EpubLocation::path(&item.path)),
                    error.to_string(),
                );
                continue;
            }
        };
        trace!("checking {} as {}", item.path, item.media_type);

        match item.media_type.as_str() {
            mime::XHTML => {
                xhtml::check(ctx, item, &data);
                if item.properties.has(crate::consts::opf::NAV_PROPERTY)
                    && package.version.is_epub3()
                {
                    nav::check(ctx, item, &data);
                }
            }
            mime::NCX => ncx::check(ctx, item, &data),
            mime::CSS => css::check(ctx, item, &data),
            mime::SVG => svg::check(ctx, item, &data),
            _ => {}
        }
    }

    media::check(ctx, &package);

    ctx.archive = Some(archive);
    ctx.package = Some(package);
}

/// Queues one outbound reference for the cross-reference stage, resolving
/// it against the referring document's directory.
pub(super) fn collect_ref(
    refs: &mut Vec<ContentRef>,
    source: &str,
    line: u32,
    column: u32,
    raw: &str,
) {
    if raw.is_empty() {
        return;
    }
    if uri::has_scheme(raw) {
        refs.push(ContentRef {
            source: source.to_owned(),
            line,
            column,
            target: raw.to_owned(),
            fragment: None,
            remote: true,
        });
        return;
    }
    let fragment = uri::fragment(raw).map(|f| uri::decode(f).into_owned());
    let path_part = uri::path(raw);

    let target = if path_part.is_empty() {
        // Same-document fragment reference.
        source.to_owned()
    } else {
        let decoded = uri::decode(path_part);
        uri::resolve(uri::parent(source), &decoded)
    };

    refs.push(ContentRef {
        source: source.to_owned(),
        line,
        column,
        target,
        fragment,
        remote: false,
    });
}
