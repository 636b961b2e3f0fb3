//! The typed package document (OPF) model.
//!
//! Built once by the package parser stage and read-only afterwards. Lookup
//! happens through string keys (manifest ids, normalized container paths)
//! rather than pointers between documents.

pub(crate) mod parser;

use crate::consts::opf;
use crate::options::EpubVersion;
use indexmap::IndexMap;

/// A parsed package document: metadata, manifest, spine, guide, and
/// collections.
#[derive(Clone, Debug)]
pub struct PackageDocument {
    /// The effective version driving rule selection.
    pub version: EpubVersion,
    /// The literal `package/@version` value.
    pub raw_version: String,
    /// The `package/@unique-identifier` attribute.
    pub unique_identifier_id: Option<String>,
    pub metadata: Metadata,
    /// Manifest items keyed by id, in document order.
    pub manifest: IndexMap<String, ManifestItem>,
    /// Spine itemrefs in reading order.
    pub spine: Vec<SpineItemRef>,
    /// The `spine/@toc` NCX reference (EPUB 2, legacy in EPUB 3).
    pub spine_toc: Option<String>,
    pub page_progression: Option<String>,
    pub guide: Vec<GuideReference>,
    pub collections: Vec<Collection>,
}

impl PackageDocument {
    /// The `dc:identifier` selected by `unique-identifier`, falling back to
    /// the first identifier when the attribute does not resolve.
    pub fn unique_identifier(&self) -> Option<&MetaEntry> {
        let identifiers = || {
            self.metadata
                .entries
                .iter()
                .filter(|entry| entry.name == opf::IDENTIFIER)
        };

        self.unique_identifier_id
            .as_deref()
            .and_then(|id| identifiers().find(|entry| entry.id.as_deref() == Some(id)))
            .or_else(|| identifiers().next())
    }

    /// The manifest item carrying the `nav` property, if any.
    pub fn nav_item(&self) -> Option<&ManifestItem> {
        self.manifest
            .values()
            .find(|item| item.properties.has(opf::NAV_PROPERTY))
    }

    /// Looks up a manifest item by its normalized container path.
    pub(crate) fn item_by_path(&self, path: &str) -> Option<&ManifestItem> {
        self.manifest.values().find(|item| item.path == path)
    }

    /// Follows the fallback chain from `id`, including the starting item.
    ///
    /// Stops on the first repeated id, so cyclic chains terminate.
    pub(crate) fn fallback_chain<'a>(&'a self, id: &str) -> Vec<&'a ManifestItem> {
        let mut chain = Vec::new();
        let mut seen = std::collections::BTreeSet::new();
        let mut cursor = Some(id.to_owned());

        while let Some(current) = cursor {
            if !seen.insert(current.clone()) {
                break;
            }
            match self.manifest.get(&current) {
                Some(item) => {
                    cursor = item.fallback.clone();
                    chain.push(item);
                }
                None => break,
            }
        }
        chain
    }
}

/// Package metadata: Dublin Core entries plus EPUB 3 `<meta>` properties.
#[derive(Clone, Debug, Default)]
pub struct Metadata {
    /// All entries in document order.
    pub entries: Vec<MetaEntry>,
}

impl Metadata {
    /// Entries by element name (`dc:title`) or property (`dcterms:modified`).
    pub fn by_name<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a MetaEntry> {
        self.entries.iter().filter(move |entry| entry.name == name)
    }

    pub fn has(&self, name: &str) -> bool {
        self.by_name(name).next().is_some()
    }
}

/// One metadata element.
///
/// For Dublin Core elements `name` is the prefixed element name; for EPUB 3
/// `<meta>` elements it is the `property` value; for EPUB 2 `<meta>`
/// elements it is the `name` attribute.
#[derive(Clone, Debug)]
pub struct MetaEntry {
    pub name: String,
    pub value: String,
    pub id: Option<String>,
    /// The raw `refines` target (`#id`), for refining entries.
    pub refines: Option<String>,
    /// Refinements attached to this entry by `refines` resolution.
    pub refinements: Vec<Refinement>,
    pub(crate) position: Option<(u32, u32)>,
}

/// A resolved `<meta refines="#id">` property attached to its target.
#[derive(Clone, Debug)]
pub struct Refinement {
    pub property: String,
    pub value: String,
}

/// A space-separated property token set, e.g. `properties="nav scripted"`.
///
/// Known tokens are validated against the version vocabulary at parse time;
/// unknown tokens are carried through for forward compatibility.
#[derive(Clone, Debug, Default)]
pub struct Properties(Vec<String>);

impl Properties {
    pub(crate) fn parse(raw: Option<String>) -> Self {
        Self(
            raw.map(|raw| {
                raw.split_ascii_whitespace()
                    .map(str::to_owned)
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default(),
        )
    }

    pub fn has(&self, property: &str) -> bool {
        self.0.iter().any(|p| p == property)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// One manifest `<item>`.
#[derive(Clone, Debug)]
pub struct ManifestItem {
    pub id: String,
    /// The literal `href` attribute.
    pub href_raw: String,
    /// `href` resolved against the package document directory.
    pub href: String,
    /// Percent-decoded, query/fragment-stripped container path; the key
    /// used for archive lookups and cross-referencing.
    pub(crate) path: String,
    pub media_type: String,
    pub properties: Properties,
    pub fallback: Option<String>,
    pub media_overlay: Option<String>,
    pub refinements: Vec<Refinement>,
    /// `true` when `href` carries a scheme and lives outside the container.
    pub(crate) remote: bool,
    pub(crate) position: Option<(u32, u32)>,
}

/// One spine `<itemref>`.
#[derive(Clone, Debug)]
pub struct SpineItemRef {
    pub idref: String,
    pub linear: bool,
    pub properties: Properties,
    pub(crate) position: Option<(u32, u32)>,
}

/// One guide `<reference>` (EPUB 2).
#[derive(Clone, Debug)]
pub struct GuideReference {
    pub ref_type: Option<String>,
    pub title: Option<String>,
    pub href: Option<String>,
}

/// One package `<collection>` (EPUB 3).
#[derive(Clone, Debug)]
pub struct Collection {
    pub role: String,
}
