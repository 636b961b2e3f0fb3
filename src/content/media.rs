//! Media type and fallback-chain checks across the manifest.

use crate::consts::mime;
use crate::context::ValidationContext;
use crate::messages::{EpubLocation, MessageId};
use crate::package::PackageDocument;
use std::collections::BTreeSet;

pub(crate) fn check(ctx: &mut ValidationContext<'_>, package: &PackageDocument) {
    let opf_path = ctx.opf_path.clone().unwrap_or_default();
    let location = |position: Option<(u32, u32)>| {
        position
            .map(|(line, column)| EpubLocation::at(&opf_path, line, column))
            .or_else(|| Some(EpubLocation::path(&opf_path)))
    };

    let spine_ids: BTreeSet<&str> = package
        .spine
        .iter()
        .map(|itemref| itemref.idref.as_str())
        .collect();

    // Spine items must be (or fall back to) a spine-allowed core type.
    for itemref in &package.spine {
        let Some(item) = package.manifest.get(&itemref.idref) else {
            continue;
        };
        let chain = package.fallback_chain(&item.id);
        if !chain.iter().any(|link| mime::is_spine(&link.media_type)) {
            ctx.report(
                MessageId::Med003,
                location(item.position),
                format!(
                    "spine item `{}` has media type `{}` and no fallback chain \
                     reaching a content document type",
                    item.id, item.media_type
                ),
            );
        }
    }

    // Foreign resources outside the spine; an absent fallback is worth an
    // informational note, not an error.
    for item in package.manifest.values() {
        if spine_ids.contains(item.id.as_str())
            || item.remote
            || item.media_type.is_empty()
            || mime::is_core(&item.media_type)
            || item.fallback.is_some()
        {
            continue;
        }
        ctx.report(
            MessageId::Med001,
            location(item.position),
            format!(
                "manifest item `{}` has foreign media type `{}` and no fallback",
                item.id, item.media_type
            ),
        );
    }
}
