use epublint::{MessageId, ValidateOptions, ValidationReport};
use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

pub const CONTAINER_XML: &[u8] = br#"<?xml version="1.0"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
  <rootfiles>
    <rootfile full-path="EPUB/package.opf" media-type="application/oebps-package+xml"/>
  </rootfiles>
</container>"#;

pub const OPF3_MINIMAL: &[u8] = br#"<?xml version="1.0" encoding="UTF-8"?>
<package xmlns="http://www.idpf.org/2007/opf" version="3.0" unique-identifier="uid">
  <metadata xmlns:dc="http://purl.org/dc/elements/1.1/">
    <dc:identifier id="uid">urn:uuid:aa1aa0f3-0b34-4b5c-83e7-d0d4f2cf0dd7</dc:identifier>
    <dc:title>Minimal Publication</dc:title>
    <dc:language>en</dc:language>
    <meta property="dcterms:modified">2024-03-05T12:00:00Z</meta>
  </metadata>
  <manifest>
    <item id="nav" href="nav.xhtml" media-type="application/xhtml+xml" properties="nav"/>
    <item id="c1" href="c1.xhtml" media-type="application/xhtml+xml"/>
  </manifest>
  <spine>
    <itemref idref="c1"/>
  </spine>
</package>"#;

pub const NAV_XHTML: &[u8] = br#"<?xml version="1.0" encoding="utf-8"?>
<html xmlns="http://www.w3.org/1999/xhtml" xmlns:epub="http://www.idpf.org/2007/ops">
  <head>
    <title>Navigation</title>
  </head>
  <body>
    <nav epub:type="toc">
      <ol>
        <li><a href="c1.xhtml">Chapter 1</a></li>
      </ol>
    </nav>
  </body>
</html>"#;

pub const C1_XHTML: &[u8] = br#"<?xml version="1.0" encoding="utf-8"?>
<html xmlns="http://www.w3.org/1999/xhtml">
  <head>
    <title>Chapter 1</title>
  </head>
  <body>
    <p id="start">Hello there.</p>
  </body>
</html>"#;

pub const OPF2_MINIMAL: &[u8] = br#"<?xml version="1.0"?>
<package xmlns="http://www.idpf.org/2007/opf" version="2.0" unique-identifier="uid">
  <metadata xmlns:dc="http://purl.org/dc/elements/1.1/">
    <dc:identifier id="uid">urn:uuid:0a1b2c3d-4e5f-6071-8293-0123456789ab</dc:identifier>
    <dc:title>Minimal EPUB 2</dc:title>
    <dc:language>en</dc:language>
  </metadata>
  <manifest>
    <item id="ncx" href="toc.ncx" media-type="application/x-dtbncx+xml"/>
    <item id="c1" href="c1.xhtml" media-type="application/xhtml+xml"/>
  </manifest>
  <spine toc="ncx">
    <itemref idref="c1"/>
  </spine>
</package>"#;

/// Builds a ZIP image; `mimetype` entries are stored, everything else is
/// deflated.
pub fn build_zip(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));

    for (path, content) in entries {
        let method = if *path == "mimetype" {
            CompressionMethod::Stored
        } else {
            CompressionMethod::Deflated
        };
        writer
            .start_file(*path, SimpleFileOptions::default().compression_method(method))
            .unwrap();
        writer.write_all(content).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

/// A complete, conformant EPUB 3 publication.
pub fn minimal_epub3() -> Vec<u8> {
    build_zip(&[
        ("mimetype", b"application/epub+zip"),
        ("META-INF/container.xml", CONTAINER_XML),
        ("EPUB/package.opf", OPF3_MINIMAL),
        ("EPUB/nav.xhtml", NAV_XHTML),
        ("EPUB/c1.xhtml", C1_XHTML),
    ])
}

/// The minimal EPUB 3 with a substituted package document.
pub fn epub3_with_opf(opf: &[u8]) -> Vec<u8> {
    build_zip(&[
        ("mimetype", b"application/epub+zip"),
        ("META-INF/container.xml", CONTAINER_XML),
        ("EPUB/package.opf", opf),
        ("EPUB/nav.xhtml", NAV_XHTML),
        ("EPUB/c1.xhtml", C1_XHTML),
    ])
}

/// The minimal EPUB 3 with a substituted chapter document.
pub fn epub3_with_content(c1: &[u8]) -> Vec<u8> {
    build_zip(&[
        ("mimetype", b"application/epub+zip"),
        ("META-INF/container.xml", CONTAINER_XML),
        ("EPUB/package.opf", OPF3_MINIMAL),
        ("EPUB/nav.xhtml", NAV_XHTML),
        ("EPUB/c1.xhtml", c1),
    ])
}

/// The minimal EPUB 3 with a substituted navigation document.
pub fn epub3_with_nav(nav: &[u8]) -> Vec<u8> {
    build_zip(&[
        ("mimetype", b"application/epub+zip"),
        ("META-INF/container.xml", CONTAINER_XML),
        ("EPUB/package.opf", OPF3_MINIMAL),
        ("EPUB/nav.xhtml", nav),
        ("EPUB/c1.xhtml", C1_XHTML),
    ])
}

/// A complete, conformant EPUB 2 publication with the given NCX
/// `dtb:uid` value.
pub fn epub2_with_ncx_uid(uid: &str) -> Vec<u8> {
    let ncx = format!(
        r#"<?xml version="1.0"?>
<ncx xmlns="http://www.daisy.org/z3986/2005/ncx/" version="2005-1">
  <head>
    <meta name="dtb:uid" content="{uid}"/>
  </head>
  <docTitle><text>Minimal EPUB 2</text></docTitle>
  <navMap>
    <navPoint id="np1" playOrder="1">
      <navLabel><text>Chapter 1</text></navLabel>
      <content src="c1.xhtml"/>
    </navPoint>
  </navMap>
</ncx>"#
    );

    build_zip(&[
        ("mimetype", b"application/epub+zip"),
        ("META-INF/container.xml", CONTAINER_XML),
        ("EPUB/package.opf", OPF2_MINIMAL),
        ("EPUB/toc.ncx", ncx.as_bytes()),
        ("EPUB/c1.xhtml", C1_XHTML),
    ])
}

pub fn validate(bytes: &[u8]) -> ValidationReport {
    epublint::validate(bytes, &ValidateOptions::new())
}

pub fn has_id(report: &ValidationReport, id: MessageId) -> bool {
    report.messages.iter().any(|message| message.id == id)
}

pub fn ids(report: &ValidationReport) -> Vec<&'static str> {
    report
        .messages
        .iter()
        .map(|message| message.id.as_str())
        .collect()
}
