use crate::pipeline::util::{self, build_zip, epub3_with_content, epub3_with_nav, has_id, validate};
use epublint::{MessageId, Severity};

#[test]
fn test_xhtml_missing_title() {
    let c1 = br#"<?xml version="1.0" encoding="utf-8"?>
<html xmlns="http://www.w3.org/1999/xhtml">
  <head></head>
  <body><p>text</p></body>
</html>"#;
    let report = validate(&epub3_with_content(c1));

    assert!(!report.valid);
    let message = report
        .messages
        .iter()
        .find(|m| m.id == MessageId::Htm003)
        .expect("expected an HTM-003 message");
    assert_eq!(
        Some("EPUB/c1.xhtml"),
        message.location.as_ref().map(|l| l.path.as_str())
    );
}

#[test]
fn test_xhtml_wrong_root_namespace() {
    let c1 = br#"<?xml version="1.0"?>
<html>
  <head><title>t</title></head>
  <body><p>text</p></body>
</html>"#;
    let report = validate(&epub3_with_content(c1));

    assert!(has_id(&report, MessageId::Htm001));
}

#[test]
fn test_xhtml_missing_body() {
    let c1 = br#"<?xml version="1.0"?>
<html xmlns="http://www.w3.org/1999/xhtml">
  <head><title>t</title></head>
</html>"#;
    let report = validate(&epub3_with_content(c1));

    assert!(has_id(&report, MessageId::Htm002));
}

#[test]
fn test_xhtml_parse_error_carries_position() {
    let c1 = br#"<?xml version="1.0"?>
<html xmlns="http://www.w3.org/1999/xhtml">
  <head><title>t</title></head>
  <body><p>text</div></body>
</html>"#;
    let report = validate(&epub3_with_content(c1));

    assert!(!report.valid);
    let message = report
        .messages
        .iter()
        .find(|m| m.id == MessageId::Htm004)
        .expect("expected an HTM-004 message");
    let location = message.location.as_ref().unwrap();
    assert_eq!("EPUB/c1.xhtml", location.path);
    assert_eq!(Some(4), location.line);
}

#[test]
fn test_unescaped_ampersand() {
    let c1 = br#"<?xml version="1.0"?>
<html xmlns="http://www.w3.org/1999/xhtml">
  <head><title>Fish &amp; Chips &#38; Peas &#x26; Gravy</title></head>
  <body><p>Fish & Chips</p></body>
</html>"#;
    let report = validate(&epub3_with_content(c1));

    let ampersands: Vec<_> = report
        .messages
        .iter()
        .filter(|m| m.id == MessageId::Htm012)
        .collect();
    // Only the bare `&` in the body is flagged.
    assert_eq!(1, ampersands.len(), "{ampersands:?}");
    assert_eq!(Some(4), ampersands[0].location.as_ref().unwrap().line);
}

#[test]
fn test_nav_toc_without_ol() {
    let nav = br#"<?xml version="1.0" encoding="utf-8"?>
<html xmlns="http://www.w3.org/1999/xhtml" xmlns:epub="http://www.idpf.org/2007/ops">
  <head><title>Navigation</title></head>
  <body>
    <nav epub:type="toc">
      <p><a href="c1.xhtml">Chapter 1</a></p>
    </nav>
  </body>
</html>"#;
    let report = validate(&epub3_with_nav(nav));

    assert!(!report.valid);
    assert!(has_id(&report, MessageId::Nav002));
}

#[test]
fn test_nav_without_toc_nav() {
    let nav = br#"<?xml version="1.0" encoding="utf-8"?>
<html xmlns="http://www.w3.org/1999/xhtml" xmlns:epub="http://www.idpf.org/2007/ops">
  <head><title>Navigation</title></head>
  <body>
    <nav epub:type="landmarks">
      <ol><li><a epub:type="bodymatter" href="c1.xhtml">Start</a></li></ol>
    </nav>
  </body>
</html>"#;
    let report = validate(&epub3_with_nav(nav));

    assert!(!report.valid);
    assert!(has_id(&report, MessageId::Nav001));
}

#[test]
fn test_nested_ol_is_not_direct() {
    let nav = br#"<?xml version="1.0" encoding="utf-8"?>
<html xmlns="http://www.w3.org/1999/xhtml" xmlns:epub="http://www.idpf.org/2007/ops">
  <head><title>Navigation</title></head>
  <body>
    <nav epub:type="toc">
      <div><ol><li><a href="c1.xhtml">Chapter 1</a></li></ol></div>
    </nav>
  </body>
</html>"#;
    let report = validate(&epub3_with_nav(nav));

    assert!(has_id(&report, MessageId::Nav002));
}

#[test]
fn test_ncx_wrong_root() {
    let report = validate(&epub2_with_ncx(
        br#"<?xml version="1.0"?>
<toc xmlns="http://www.daisy.org/z3986/2005/ncx/">
  <navMap/>
</toc>"#,
    ));

    assert!(!report.valid);
    assert!(has_id(&report, MessageId::Ncx001));
}

#[test]
fn test_ncx_missing_nav_map() {
    let report = validate(&epub2_with_ncx(
        br#"<?xml version="1.0"?>
<ncx xmlns="http://www.daisy.org/z3986/2005/ncx/" version="2005-1">
  <head><meta name="dtb:uid" content="urn:uuid:0a1b2c3d-4e5f-6071-8293-0123456789ab"/></head>
  <docTitle><text>t</text></docTitle>
</ncx>"#,
    ));

    assert!(has_id(&report, MessageId::Ncx001));
}

#[test]
fn test_ncx_parse_failure() {
    let report = validate(&epub2_with_ncx(b"<ncx><navMap></ncx>"));

    assert!(!report.valid);
    assert!(has_id(&report, MessageId::Ncx002));
}

#[test]
fn test_ncx_empty_uid_is_a_warning() {
    let report = validate(&epub2_with_ncx(
        br#"<?xml version="1.0"?>
<ncx xmlns="http://www.daisy.org/z3986/2005/ncx/" version="2005-1">
  <head><meta name="dtb:uid" content=""/></head>
  <docTitle><text>t</text></docTitle>
  <navMap>
    <navPoint id="np1"><navLabel><text>c</text></navLabel><content src="c1.xhtml"/></navPoint>
  </navMap>
</ncx>"#,
    ));

    let message = report
        .messages
        .iter()
        .find(|m| m.id == MessageId::Ncx003)
        .expect("expected an NCX-003 message");
    assert_eq!(Severity::Warning, message.severity);
}

#[test]
fn test_css_parse_error() {
    let opf = String::from_utf8_lossy(util::OPF3_MINIMAL).replace(
        r#"<item id="c1" href="c1.xhtml" media-type="application/xhtml+xml"/>"#,
        r#"<item id="c1" href="c1.xhtml" media-type="application/xhtml+xml"/>
    <item id="css" href="style.css" media-type="text/css"/>"#,
    );
    let bytes = build_zip(&[
        ("mimetype", b"application/epub+zip"),
        ("META-INF/container.xml", util::CONTAINER_XML),
        ("EPUB/package.opf", opf.as_bytes()),
        ("EPUB/nav.xhtml", util::NAV_XHTML),
        ("EPUB/c1.xhtml", util::C1_XHTML),
        ("EPUB/style.css", b"p { content: \"unterminated\n}"),
    ]);
    let report = validate(&bytes);

    assert!(!report.valid);
    let message = report
        .messages
        .iter()
        .find(|m| m.id == MessageId::Css001)
        .expect("expected a CSS-001 message");
    assert_eq!(
        Some("EPUB/style.css"),
        message.location.as_ref().map(|l| l.path.as_str())
    );
}

#[test]
fn test_spine_foreign_media_without_fallback() {
    let opf = String::from_utf8_lossy(util::OPF3_MINIMAL)
        .replace(
            r#"<item id="c1" href="c1.xhtml" media-type="application/xhtml+xml"/>"#,
            r#"<item id="c1" href="c1.xhtml" media-type="application/xhtml+xml"/>
    <item id="raw" href="data.bin" media-type="application/x-demo"/>"#,
        )
        .replace(
            r#"<itemref idref="c1"/>"#,
            r#"<itemref idref="c1"/><itemref idref="raw"/>"#,
        );
    let bytes = build_zip(&[
        ("mimetype", b"application/epub+zip"),
        ("META-INF/container.xml", util::CONTAINER_XML),
        ("EPUB/package.opf", opf.as_bytes()),
        ("EPUB/nav.xhtml", util::NAV_XHTML),
        ("EPUB/c1.xhtml", util::C1_XHTML),
        ("EPUB/data.bin", b"x"),
    ]);
    let report = validate(&bytes);

    assert!(!report.valid);
    assert!(has_id(&report, MessageId::Med003));
}

#[test]
fn test_spine_foreign_media_with_xhtml_fallback_is_accepted() {
    let opf = String::from_utf8_lossy(util::OPF3_MINIMAL)
        .replace(
            r#"<item id="c1" href="c1.xhtml" media-type="application/xhtml+xml"/>"#,
            r#"<item id="c1" href="c1.xhtml" media-type="application/xhtml+xml"/>
    <item id="raw" href="data.bin" media-type="application/x-demo" fallback="c1"/>"#,
        )
        .replace(
            r#"<itemref idref="c1"/>"#,
            r#"<itemref idref="c1"/><itemref idref="raw"/>"#,
        );
    let bytes = build_zip(&[
        ("mimetype", b"application/epub+zip"),
        ("META-INF/container.xml", util::CONTAINER_XML),
        ("EPUB/package.opf", opf.as_bytes()),
        ("EPUB/nav.xhtml", util::NAV_XHTML),
        ("EPUB/c1.xhtml", util::C1_XHTML),
        ("EPUB/data.bin", b"x"),
    ]);
    let report = validate(&bytes);

    assert!(!has_id(&report, MessageId::Med003), "{:?}", report.messages);
}

/// The minimal EPUB 2 with a substituted NCX document.
fn epub2_with_ncx(ncx: &[u8]) -> Vec<u8> {
    build_zip(&[
        ("mimetype", b"application/epub+zip"),
        ("META-INF/container.xml", util::CONTAINER_XML),
        ("EPUB/package.opf", util::OPF2_MINIMAL),
        ("EPUB/toc.ncx", ncx),
        ("EPUB/c1.xhtml", util::C1_XHTML),
    ])
}
