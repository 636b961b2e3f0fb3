//! Name constants shared by the pipeline stages.

/// OCF container layer.
pub(crate) mod ocf {
    pub(crate) const MIMETYPE_PATH: &str = "mimetype";
    pub(crate) const MIMETYPE_CONTENT: &[u8] = b"application/epub+zip";
    pub(crate) const META_INF_DIR: &str = "META-INF/";
    pub(crate) const CONTAINER_PATH: &str = "META-INF/container.xml";

    /// Optional `META-INF` entries defined by the OCF specification.
    pub(crate) const OPTIONAL_META_INF: &[&str] = &[
        "META-INF/encryption.xml",
        "META-INF/signatures.xml",
        "META-INF/metadata.xml",
        "META-INF/rights.xml",
        "META-INF/manifest.xml",
    ];

    pub(crate) const ROOT_FILE: &[u8] = b"rootfile";
    pub(crate) const FULL_PATH: &str = "full-path";
    pub(crate) const MEDIA_TYPE: &str = "media-type";
}

/// Package document (OPF) layer.
pub(crate) mod opf {
    pub(crate) const ID: &str = "id";
    pub(crate) const HREF: &str = "href";
    pub(crate) const VERSION: &str = "version";
    pub(crate) const UNIQUE_ID: &str = "unique-identifier";
    pub(crate) const MEDIA_TYPE: &str = "media-type";
    pub(crate) const PROPERTIES: &str = "properties";
    pub(crate) const FALLBACK: &str = "fallback";
    pub(crate) const MEDIA_OVERLAY: &str = "media-overlay";
    pub(crate) const IDREF: &str = "idref";
    pub(crate) const LINEAR: &str = "linear";
    pub(crate) const TOC: &str = "toc";
    pub(crate) const PROPERTY: &str = "property";
    pub(crate) const REFINES: &str = "refines";
    pub(crate) const NAME: &str = "name";
    pub(crate) const CONTENT: &str = "content";
    pub(crate) const ROLE: &str = "role";
    pub(crate) const GUIDE_TYPE: &str = "type";
    pub(crate) const GUIDE_TITLE: &str = "title";
    pub(crate) const PAGE_PROGRESSION_DIRECTION: &str = "page-progression-direction";

    pub(crate) const IDENTIFIER: &str = "dc:identifier";
    pub(crate) const MODIFIED: &str = "dcterms:modified";

    pub(crate) const NAV_PROPERTY: &str = "nav";
    pub(crate) const COVER_IMAGE_PROPERTY: &str = "cover-image";
    pub(crate) const REMOTE_RESOURCES_PROPERTY: &str = "remote-resources";

    /// Manifest item property vocabulary (EPUB 3).
    pub(crate) const ITEM_PROPERTIES: &[&str] = &[
        "cover-image",
        "mathml",
        "nav",
        "remote-resources",
        "scripted",
        "svg",
        "switch",
        "data-nav",
        "dictionary",
        "glossary",
        "index",
    ];

    /// Spine itemref property vocabulary (EPUB 3).
    pub(crate) const ITEMREF_PROPERTIES: &[&str] = &[
        "page-spread-left",
        "page-spread-right",
    ];

    pub(crate) mod bytes {
        pub(crate) const PACKAGE: &[u8] = b"package";
        pub(crate) const METADATA: &[u8] = b"metadata";
        pub(crate) const MANIFEST: &[u8] = b"manifest";
        pub(crate) const SPINE: &[u8] = b"spine";
        pub(crate) const GUIDE: &[u8] = b"guide";
        pub(crate) const COLLECTION: &[u8] = b"collection";
        pub(crate) const ITEM: &[u8] = b"item";
        pub(crate) const ITEMREF: &[u8] = b"itemref";
        pub(crate) const REFERENCE: &[u8] = b"reference";
        pub(crate) const META: &[u8] = b"meta";
    }
}

/// XHTML and navigation documents.
pub(crate) mod xhtml {
    pub(crate) const XMLNS: &str = "xmlns";
    pub(crate) const ID: &str = "id";
    pub(crate) const XML_ID: &str = "xml:id";
    pub(crate) const EPUB_TYPE: &str = "epub:type";

    pub(crate) const TOC_TYPE: &str = "toc";
    pub(crate) const PAGE_LIST_TYPE: &str = "page-list";
    pub(crate) const LANDMARKS_TYPE: &str = "landmarks";

    /// Attributes that carry outbound references, per element.
    pub(crate) const REF_ATTRIBUTES: &[&str] = &["href", "src", "data", "poster", "xlink:href"];

    pub(crate) mod bytes {
        pub(crate) const HTML: &[u8] = b"html";
        pub(crate) const HEAD: &[u8] = b"head";
        pub(crate) const TITLE: &[u8] = b"title";
        pub(crate) const BODY: &[u8] = b"body";
        pub(crate) const NAV: &[u8] = b"nav";
        pub(crate) const OL: &[u8] = b"ol";
        pub(crate) const SVG: &[u8] = b"svg";
    }
}

/// NCX documents (EPUB 2 navigation).
pub(crate) mod ncx {
    pub(crate) const UID_META: &str = "dtb:uid";
    pub(crate) const SRC: &str = "src";

    pub(crate) mod bytes {
        pub(crate) const NCX: &[u8] = b"ncx";
        pub(crate) const NAV_MAP: &[u8] = b"navMap";
        pub(crate) const META: &[u8] = b"meta";
        pub(crate) const CONTENT: &[u8] = b"content";
    }
}

/// XML namespaces.
pub(crate) mod ns {
    pub(crate) const XHTML: &str = "http://www.w3.org/1999/xhtml";
    pub(crate) const NCX: &str = "http://www.daisy.org/z3986/2005/ncx/";
    pub(crate) const SVG: &str = "http://www.w3.org/2000/svg";
}

/// Media types.
pub(crate) mod mime {
    pub(crate) const XHTML: &str = "application/xhtml+xml";
    pub(crate) const NCX: &str = "application/x-dtbncx+xml";
    pub(crate) const CSS: &str = "text/css";
    pub(crate) const SVG: &str = "image/svg+xml";
    pub(crate) const OEBPS_PACKAGE: &str = "application/oebps-package+xml";

    /// Core media types; foreign resources need a fallback chain reaching
    /// one of these.
    pub(crate) const CORE: &[&str] = &[
        XHTML,
        NCX,
        CSS,
        SVG,
        "application/javascript",
        "application/smil+xml",
        "application/pls+xml",
        "application/vnd.ms-opentype",
        "audio/mpeg",
        "audio/mp4",
        "audio/ogg;codecs=opus",
        "font/otf",
        "font/ttf",
        "font/woff",
        "font/woff2",
        "image/gif",
        "image/jpeg",
        "image/png",
        "image/webp",
        "text/javascript",
        "video/mp4",
    ];

    /// Media types allowed in the spine without a fallback.
    pub(crate) const SPINE: &[&str] = &[XHTML, SVG];

    pub(crate) fn is_core(media_type: &str) -> bool {
        CORE.contains(&media_type)
    }

    pub(crate) fn is_spine(media_type: &str) -> bool {
        SPINE.contains(&media_type)
    }
}
