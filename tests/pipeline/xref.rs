use crate::pipeline::util::{self, build_zip, epub3_with_content, has_id, validate};
use epublint::{MessageId, Severity, ValidateOptions};

#[test]
fn test_reference_to_undeclared_resource() {
    let c1 = br#"<?xml version="1.0"?>
<html xmlns="http://www.w3.org/1999/xhtml">
  <head><title>t</title></head>
  <body><p><a href="missing.xhtml">go</a></p></body>
</html>"#;
    let report = validate(&epub3_with_content(c1));

    assert!(!report.valid);
    let message = report
        .messages
        .iter()
        .find(|m| m.id == MessageId::Rsc007)
        .expect("expected an RSC-007 message");
    // The failure is local to the referring document.
    assert_eq!(
        Some("EPUB/c1.xhtml"),
        message.location.as_ref().map(|l| l.path.as_str())
    );
}

#[test]
fn test_unresolved_fragment() {
    let c1 = br##"<?xml version="1.0"?>
<html xmlns="http://www.w3.org/1999/xhtml">
  <head><title>t</title></head>
  <body>
    <p id="here"><a href="#nowhere">go</a></p>
  </body>
</html>"##;
    let report = validate(&epub3_with_content(c1));

    assert!(!report.valid);
    assert!(has_id(&report, MessageId::Rsc012));
}

#[test]
fn test_resolved_fragment_across_documents() {
    let nav = br#"<?xml version="1.0" encoding="utf-8"?>
<html xmlns="http://www.w3.org/1999/xhtml" xmlns:epub="http://www.idpf.org/2007/ops">
  <head><title>Navigation</title></head>
  <body>
    <nav epub:type="toc">
      <ol><li><a href="c1.xhtml#start">Chapter 1</a></li></ol>
    </nav>
  </body>
</html>"#;
    let report = validate(&crate::pipeline::util::epub3_with_nav(nav));

    // `start` exists in c1.xhtml.
    assert!(!has_id(&report, MessageId::Rsc012), "{:?}", report.messages);
    assert!(report.valid);
}

#[test]
fn test_unused_manifest_item_is_reported_as_info() {
    let opf = String::from_utf8_lossy(util::OPF3_MINIMAL).replace(
        r#"<item id="c1" href="c1.xhtml" media-type="application/xhtml+xml"/>"#,
        r#"<item id="c1" href="c1.xhtml" media-type="application/xhtml+xml"/>
    <item id="orphan" href="orphan.xhtml" media-type="application/xhtml+xml"/>"#,
    );
    let bytes = build_zip(&[
        ("mimetype", b"application/epub+zip"),
        ("META-INF/container.xml", util::CONTAINER_XML),
        ("EPUB/package.opf", opf.as_bytes()),
        ("EPUB/nav.xhtml", util::NAV_XHTML),
        ("EPUB/c1.xhtml", util::C1_XHTML),
        ("EPUB/orphan.xhtml", util::C1_XHTML),
    ]);
    let options = ValidateOptions::new().include_info(true);
    let report = epublint::validate(&bytes, &options);

    let message = report
        .messages
        .iter()
        .find(|m| m.id == MessageId::Opf032)
        .expect("expected an OPF-032 message");
    assert_eq!(Severity::Info, message.severity);
    assert!(message.message.contains("orphan"));
    // Informational only; the publication stays valid.
    assert!(report.valid);
}

#[test]
fn test_item_reachable_only_as_fallback_is_not_unused() {
    let opf = String::from_utf8_lossy(util::OPF3_MINIMAL).replace(
        r#"<item id="c1" href="c1.xhtml" media-type="application/xhtml+xml"/>"#,
        r#"<item id="c1" href="c1.xhtml" media-type="application/xhtml+xml" fallback="plain"/>
    <item id="plain" href="plain.xhtml" media-type="application/xhtml+xml"/>"#,
    );
    let bytes = build_zip(&[
        ("mimetype", b"application/epub+zip"),
        ("META-INF/container.xml", util::CONTAINER_XML),
        ("EPUB/package.opf", opf.as_bytes()),
        ("EPUB/nav.xhtml", util::NAV_XHTML),
        ("EPUB/c1.xhtml", util::C1_XHTML),
        ("EPUB/plain.xhtml", util::C1_XHTML),
    ]);
    let options = ValidateOptions::new().include_info(true);
    let report = epublint::validate(&bytes, &options);

    assert!(!has_id(&report, MessageId::Opf032), "{:?}", report.messages);
}

#[test]
fn test_undeclared_archive_entry() {
    let bytes = build_zip(&[
        ("mimetype", b"application/epub+zip"),
        ("META-INF/container.xml", util::CONTAINER_XML),
        ("EPUB/package.opf", util::OPF3_MINIMAL),
        ("EPUB/nav.xhtml", util::NAV_XHTML),
        ("EPUB/c1.xhtml", util::C1_XHTML),
        ("EPUB/leftover.txt", b"forgotten"),
    ]);
    let report = validate(&bytes);

    let message = report
        .messages
        .iter()
        .find(|m| m.id == MessageId::Opf003)
        .expect("expected an OPF-003 message");
    assert_eq!(Severity::Warning, message.severity);
    assert_eq!(
        Some("EPUB/leftover.txt"),
        message.location.as_ref().map(|l| l.path.as_str())
    );
    assert!(report.valid);
}

#[test]
fn test_ncx_uid_mismatch_is_a_warning_citing_both_values() {
    let report = validate(&util::epub2_with_ncx_uid("urn:uuid:different-value"));

    assert!(report.valid, "a uid mismatch must not invalidate: {:?}", report.messages);
    let message = report
        .messages
        .iter()
        .find(|m| m.id == MessageId::Opf034)
        .expect("expected an OPF-034 message");
    assert_eq!(Severity::Warning, message.severity);
    assert!(message.message.contains("urn:uuid:different-value"));
    assert!(message.message.contains("urn:uuid:0a1b2c3d-4e5f-6071-8293-0123456789ab"));
}

#[test]
fn test_ncx_uid_match_stays_silent() {
    let report = validate(&util::epub2_with_ncx_uid(
        "urn:uuid:0a1b2c3d-4e5f-6071-8293-0123456789ab",
    ));

    assert!(report.valid, "{:?}", report.messages);
    assert!(!has_id(&report, MessageId::Opf034));
}

#[test]
fn test_remote_reference_without_property() {
    let c1 = br#"<?xml version="1.0"?>
<html xmlns="http://www.w3.org/1999/xhtml">
  <head><title>t</title></head>
  <body><audio src="https://example.com/theme.mp3"></audio></body>
</html>"#;
    let report = validate(&epub3_with_content(c1));

    let message = report
        .messages
        .iter()
        .find(|m| m.id == MessageId::Rsc006)
        .expect("expected an RSC-006 message");
    assert_eq!(Severity::Warning, message.severity);
}

#[test]
fn test_remote_reference_with_property_is_accepted() {
    let opf = String::from_utf8_lossy(util::OPF3_MINIMAL).replace(
        r#"<item id="c1" href="c1.xhtml" media-type="application/xhtml+xml"/>"#,
        r#"<item id="c1" href="c1.xhtml" media-type="application/xhtml+xml" properties="remote-resources"/>"#,
    );
    let c1 = br#"<?xml version="1.0"?>
<html xmlns="http://www.w3.org/1999/xhtml">
  <head><title>t</title></head>
  <body><audio src="https://example.com/theme.mp3"></audio></body>
</html>"#;
    let bytes = build_zip(&[
        ("mimetype", b"application/epub+zip"),
        ("META-INF/container.xml", util::CONTAINER_XML),
        ("EPUB/package.opf", opf.as_bytes()),
        ("EPUB/nav.xhtml", util::NAV_XHTML),
        ("EPUB/c1.xhtml", c1),
    ]);
    let report = validate(&bytes);

    assert!(!has_id(&report, MessageId::Rsc006), "{:?}", report.messages);
}
