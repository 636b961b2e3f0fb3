//! Stage 7: cross-reference resolution.
//!
//! Works entirely on string keys: manifest ids, normalized container
//! paths, and the reference lists collected by the content validators.
//! No pointers cross document boundaries.

use crate::consts::{ocf, opf};
use crate::context::{ContentRef, ValidationContext};
use crate::messages::{EpubLocation, MessageId};
use crate::package::PackageDocument;
use crate::util::uri;
use log::debug;
use std::collections::{BTreeMap, BTreeSet, VecDeque};

pub(crate) fn run(ctx: &mut ValidationContext<'_>) {
    let Some(package) = ctx.package.take() else {
        return;
    };
    let references = std::mem::take(&mut ctx.references);
    debug!("resolving {} collected references", references.len());

    check_references(ctx, &package, &references);
    check_reachability(ctx, &package, &references);
    check_undeclared_entries(ctx, &package);
    check_ncx_uid(ctx, &package);

    ctx.references = references;
    ctx.package = Some(package);
}

fn check_references(
    ctx: &mut ValidationContext<'_>,
    package: &PackageDocument,
    references: &[ContentRef],
) {
    for reference in references {
        let location = Some(EpubLocation::at(
            &reference.source,
            reference.line,
            reference.column,
        ));

        if reference.remote {
            // Remote references are fine when the referring document
            // declares them.
            let missing_property = package
                .item_by_path(&reference.source)
                .is_some_and(|item| !item.properties.has(opf::REMOTE_RESOURCES_PROPERTY));
            if missing_property {
                ctx.report(
                    MessageId::Rsc006,
                    location,
                    format!(
                        "remote resource `{}` referenced without the \
                         `remote-resources` property",
                        reference.target
                    ),
                );
            }
            continue;
        }

        let Some(target_item) = package.item_by_path(&reference.target) else {
            ctx.report(
                MessageId::Rsc007,
                location,
                format!(
                    "referenced resource `{}` is not declared in the manifest",
                    reference.target
                ),
            );
            continue;
        };

        if let Some(fragment) = reference.fragment.as_deref() {
            if fragment.is_empty() {
                continue;
            }
            // Only documents that were parsed contribute an id index.
            let unresolved = ctx
                .ids_by_path
                .get(&target_item.path)
                .is_some_and(|ids| !ids.contains(fragment));
            if unresolved {
                ctx.report(
                    MessageId::Rsc012,
                    location,
                    format!(
                        "fragment `#{fragment}` does not resolve to an id in `{}`",
                        reference.target
                    ),
                );
            }
        }
    }
}

/// Flags manifest items unreachable from the spine, navigation, guide,
/// cover image, or any fallback chain of a reached item.
fn check_reachability(
    ctx: &mut ValidationContext<'_>,
    package: &PackageDocument,
    references: &[ContentRef],
) {
    let path_to_id: BTreeMap<&str, &str> = package
        .manifest
        .values()
        .filter(|item| !item.remote)
        .map(|item| (item.path.as_str(), item.id.as_str()))
        .collect();

    let mut outgoing: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for reference in references {
        if !reference.remote {
            outgoing
                .entry(reference.source.as_str())
                .or_default()
                .push(reference.target.as_str());
        }
    }

    let mut queue: VecDeque<String> = VecDeque::new();
    let mut reached: BTreeSet<String> = BTreeSet::new();
    let reach = |id: &str, queue: &mut VecDeque<String>, reached: &mut BTreeSet<String>| {
        if package.manifest.contains_key(id) && reached.insert(id.to_owned()) {
            queue.push_back(id.to_owned());
        }
    };

    for itemref in &package.spine {
        reach(&itemref.idref, &mut queue, &mut reached);
    }
    if let Some(nav) = package.nav_item() {
        reach(&nav.id, &mut queue, &mut reached);
    }
    if let Some(toc_id) = &package.spine_toc {
        reach(toc_id, &mut queue, &mut reached);
    }
    if let Some(cover) = package
        .manifest
        .values()
        .find(|item| item.properties.has(opf::COVER_IMAGE_PROPERTY))
    {
        reach(&cover.id, &mut queue, &mut reached);
    }
    // EPUB 2 guide references are entry points too.
    let opf_dir = ctx
        .opf_path
        .as_deref()
        .map(uri::parent)
        .unwrap_or_default()
        .to_owned();
    for guide_ref in &package.guide {
        if let Some(href) = &guide_ref.href {
            let resolved = uri::resolve(&opf_dir, &uri::decode(uri::path(href)));
            if let Some(id) = path_to_id.get(resolved.as_str()) {
                reach(id, &mut queue, &mut reached);
            }
        }
    }

    while let Some(id) = queue.pop_front() {
        let Some(item) = package.manifest.get(&id) else {
            continue;
        };
        if let Some(fallback) = &item.fallback {
            reach(fallback, &mut queue, &mut reached);
        }
        if let Some(targets) = outgoing.get(item.path.as_str()) {
            for target in targets {
                if let Some(target_id) = path_to_id.get(target) {
                    reach(target_id, &mut queue, &mut reached);
                }
            }
        }
    }

    let opf_path = ctx.opf_path.clone().unwrap_or_default();
    for item in package.manifest.values() {
        if item.remote || reached.contains(&item.id) {
            continue;
        }
        let location = item
            .position
            .map(|(line, column)| EpubLocation::at(&opf_path, line, column))
            .or_else(|| Some(EpubLocation::path(&opf_path)));
        ctx.report(
            MessageId::Opf032,
            location,
            format!(
                "manifest item `{}` (`{}`) is not reachable from the spine or navigation",
                item.id, item.path
            ),
        );
    }
}

/// Archive entries outside the OCF envelope that no manifest item claims.
fn check_undeclared_entries(ctx: &mut ValidationContext<'_>, package: &PackageDocument) {
    let Some(archive) = ctx.archive.take() else {
        return;
    };
    let declared: BTreeSet<&str> = package
        .manifest
        .values()
        .map(|item| item.path.as_str())
        .collect();

    let undeclared: Vec<String> = archive
        .entries()
        .iter()
        .filter(|entry| {
            !entry.is_dir
                && entry.path != ocf::MIMETYPE_PATH
                && !entry.path.starts_with(ocf::META_INF_DIR)
                && !ctx.rootfiles.iter().any(|rootfile| *rootfile == entry.path)
                && !declared.contains(entry.path.as_str())
        })
        .map(|entry| entry.path.clone())
        .collect();

    ctx.archive = Some(archive);

    for path in undeclared {
        ctx.report(
            MessageId::Opf003,
            Some(EpubLocation::path(&path)),
            format!("container entry `{path}` is not declared in the manifest"),
        );
    }
}

/// EPUB 2: the NCX `dtb:uid` should match the package unique identifier.
fn check_ncx_uid(ctx: &mut ValidationContext<'_>, package: &PackageDocument) {
    if !ctx.version.is_epub2() {
        return;
    }
    let Some(ncx_uid) = ctx.ncx_uid.clone() else {
        return;
    };
    let Some(identifier) = package.unique_identifier() else {
        return;
    };
    if ncx_uid.trim() != identifier.value.trim() {
        let location = package
            .spine_toc
            .as_ref()
            .and_then(|toc_id| package.manifest.get(toc_id))
            .map(|item| EpubLocation::path(&item.path));
        ctx.report(
            MessageId::Opf034,
            location,
            format!(
                "NCX `dtb:uid` value `{ncx_uid}` does not match the package \
                 unique identifier `{}`",
                identifier.value
            ),
        );
    }
}
