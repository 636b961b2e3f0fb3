use crate::pipeline::util::{self, CONTAINER_XML, OPF3_MINIMAL, build_zip, has_id, validate};
use epublint::MessageId;

#[test]
fn test_minimal_epub3_is_valid() {
    let report = validate(&util::minimal_epub3());

    assert!(report.valid, "unexpected messages: {:?}", report.messages);
    assert_eq!(0, report.error_count);
    assert_eq!(0, report.fatal_count);
    assert_eq!(Some("3.0"), report.version.map(|v| v.as_str()));
}

#[test]
fn test_garbage_bytes_are_fatal() {
    let report = validate(b"definitely not a zip archive");

    assert!(!report.valid);
    assert!(has_id(&report, MessageId::Pkg008));
    assert_eq!(1, report.fatal_count);
}

#[test]
fn test_missing_mimetype() {
    let report = validate(&build_zip(&[
        ("META-INF/container.xml", CONTAINER_XML),
        ("EPUB/package.opf", OPF3_MINIMAL),
        ("EPUB/nav.xhtml", util::NAV_XHTML),
        ("EPUB/c1.xhtml", util::C1_XHTML),
    ]));

    assert!(!report.valid);
    assert!(has_id(&report, MessageId::Pkg006));
}

#[test]
fn test_mimetype_with_wrong_content() {
    let report = validate(&build_zip(&[
        ("mimetype", b"application/epub+zip\n"),
        ("META-INF/container.xml", CONTAINER_XML),
        ("EPUB/package.opf", OPF3_MINIMAL),
        ("EPUB/nav.xhtml", util::NAV_XHTML),
        ("EPUB/c1.xhtml", util::C1_XHTML),
    ]));

    assert!(!report.valid);
    assert!(has_id(&report, MessageId::Pkg007));
}

#[test]
fn test_mimetype_not_first() {
    let report = validate(&build_zip(&[
        ("META-INF/container.xml", CONTAINER_XML),
        ("mimetype", b"application/epub+zip"),
        ("EPUB/package.opf", OPF3_MINIMAL),
        ("EPUB/nav.xhtml", util::NAV_XHTML),
        ("EPUB/c1.xhtml", util::C1_XHTML),
    ]));

    assert!(has_id(&report, MessageId::Pkg007));
}

#[test]
fn test_forbidden_character_in_entry_path() {
    let report = validate(&build_zip(&[
        ("mimetype", b"application/epub+zip"),
        ("META-INF/container.xml", CONTAINER_XML),
        ("EPUB/package.opf", OPF3_MINIMAL),
        ("EPUB/nav.xhtml", util::NAV_XHTML),
        ("EPUB/c1.xhtml", util::C1_XHTML),
        ("bad:name.xhtml", b"whatever"),
    ]));

    assert!(!report.valid);
    let message = report
        .messages
        .iter()
        .find(|m| m.id == MessageId::Ocf004)
        .expect("expected an OCF-004 message");
    assert_eq!(
        Some("bad:name.xhtml"),
        message.location.as_ref().map(|l| l.path.as_str())
    );
}

#[test]
fn test_missing_container_is_fatal() {
    let report = validate(&build_zip(&[("mimetype", b"application/epub+zip")]));

    assert!(!report.valid);
    assert!(has_id(&report, MessageId::Opf002));
    assert!(report.fatal_count >= 1);
}

#[test]
fn test_malformed_container_is_fatal() {
    let report = validate(&build_zip(&[
        ("mimetype", b"application/epub+zip"),
        ("META-INF/container.xml", b"<container><rootfiles></container>"),
    ]));

    assert!(has_id(&report, MessageId::Opf002));
    assert!(report.fatal_count >= 1);
}

#[test]
fn test_dangling_rootfile_path() {
    let report = validate(&build_zip(&[
        ("mimetype", b"application/epub+zip"),
        ("META-INF/container.xml", CONTAINER_XML),
    ]));

    // The declared package document does not exist in the archive.
    assert!(!report.valid);
    assert!(has_id(&report, MessageId::Opf002));
}

#[test]
fn test_unknown_meta_inf_entry_is_a_warning() {
    let report = validate(&build_zip(&[
        ("mimetype", b"application/epub+zip"),
        ("META-INF/container.xml", CONTAINER_XML),
        ("META-INF/notes.txt", b"scratch"),
        ("EPUB/package.opf", OPF3_MINIMAL),
        ("EPUB/nav.xhtml", util::NAV_XHTML),
        ("EPUB/c1.xhtml", util::C1_XHTML),
    ]));

    assert!(report.valid, "warnings must not invalidate: {:?}", report.messages);
    assert!(has_id(&report, MessageId::Opf003));
    assert!(report.warning_count >= 1);
}

#[test]
fn test_malformed_optional_sidecar() {
    let report = validate(&build_zip(&[
        ("mimetype", b"application/epub+zip"),
        ("META-INF/container.xml", CONTAINER_XML),
        ("META-INF/rights.xml", b"<rights><broken></rights>"),
        ("EPUB/package.opf", OPF3_MINIMAL),
        ("EPUB/nav.xhtml", util::NAV_XHTML),
        ("EPUB/c1.xhtml", util::C1_XHTML),
    ]));

    assert!(!report.valid);
    assert!(has_id(&report, MessageId::Rsc005));
}
