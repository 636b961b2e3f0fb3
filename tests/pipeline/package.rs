use crate::pipeline::util::{self, epub3_with_opf, has_id, ids, validate};
use epublint::{EpubVersion, MessageId, Severity, ValidateOptions};

#[test]
fn test_unknown_version_is_fatal() {
    let opf = String::from_utf8_lossy(util::OPF3_MINIMAL).replace("version=\"3.0\"", "version=\"4.0\"");
    let report = validate(&epub3_with_opf(opf.as_bytes()));

    assert!(!report.valid);
    assert!(has_id(&report, MessageId::Opf001));
    assert!(report.fatal_count >= 1);
}

#[test]
fn test_forced_version_mismatch_is_a_warning() {
    let options = ValidateOptions::new().version(EpubVersion::Epub33);
    let report = epublint::validate(&util::minimal_epub3(), &options);

    let message = report
        .messages
        .iter()
        .find(|m| m.id == MessageId::Opf001)
        .expect("expected an OPF-001 message");
    assert_eq!(Severity::Warning, message.severity);
    // The forced version wins for rule selection and reporting.
    assert_eq!(Some(EpubVersion::Epub33), report.version);
    assert!(report.valid);
}

#[test]
fn test_missing_dcterms_modified() {
    let opf = String::from_utf8_lossy(util::OPF3_MINIMAL)
        .replace("<meta property=\"dcterms:modified\">2024-03-05T12:00:00Z</meta>", "");
    let report = validate(&epub3_with_opf(opf.as_bytes()));

    assert!(!report.valid);
    assert!(has_id(&report, MessageId::Opf053));
}

#[test]
fn test_missing_required_dc_element() {
    let opf = String::from_utf8_lossy(util::OPF3_MINIMAL).replace("<dc:language>en</dc:language>", "");
    let report = validate(&epub3_with_opf(opf.as_bytes()));

    assert!(!report.valid);
    let message = report
        .messages
        .iter()
        .find(|m| m.id == MessageId::Rsc005)
        .expect("expected an RSC-005 message");
    assert!(message.message.contains("dc:language"));
}

#[test]
fn test_duplicate_manifest_id() {
    let opf = String::from_utf8_lossy(util::OPF3_MINIMAL).replace(
        r#"<item id="c1" href="c1.xhtml" media-type="application/xhtml+xml"/>"#,
        r#"<item id="c1" href="c1.xhtml" media-type="application/xhtml+xml"/>
    <item id="c1" href="other.xhtml" media-type="application/xhtml+xml"/>"#,
    );
    let report = validate(&epub3_with_opf(opf.as_bytes()));

    assert!(!report.valid);
    let message = report
        .messages
        .iter()
        .find(|m| m.id == MessageId::Rsc005)
        .expect("expected an RSC-005 message");
    assert!(message.message.contains("duplicate"), "{}", message.message);
}

#[test]
fn test_duplicate_manifest_href_after_normalization() {
    let opf = String::from_utf8_lossy(util::OPF3_MINIMAL).replace(
        r#"<item id="c1" href="c1.xhtml" media-type="application/xhtml+xml"/>"#,
        r#"<item id="c1" href="c1.xhtml" media-type="application/xhtml+xml"/>
    <item id="c1bis" href="./c1.xhtml" media-type="application/xhtml+xml"/>"#,
    );
    let report = validate(&epub3_with_opf(opf.as_bytes()));

    assert!(has_id(&report, MessageId::Opf074));
}

#[test]
fn test_dangling_spine_idref() {
    let opf = String::from_utf8_lossy(util::OPF3_MINIMAL)
        .replace(r#"<itemref idref="c1"/>"#, r#"<itemref idref="c1"/><itemref idref="ghost"/>"#);
    let report = validate(&epub3_with_opf(opf.as_bytes()));

    assert!(!report.valid);
    let message = report
        .messages
        .iter()
        .find(|m| m.id == MessageId::Rsc005)
        .expect("expected an RSC-005 message");
    assert!(message.message.contains("ghost"));
}

#[test]
fn test_missing_nav_property() {
    let opf = String::from_utf8_lossy(util::OPF3_MINIMAL).replace(" properties=\"nav\"", "");
    let report = validate(&epub3_with_opf(opf.as_bytes()));

    assert!(!report.valid);
    assert!(has_id(&report, MessageId::Opf030));
}

#[test]
fn test_unknown_item_property() {
    let opf = String::from_utf8_lossy(util::OPF3_MINIMAL)
        .replace("properties=\"nav\"", "properties=\"nav shiny\"");
    let report = validate(&epub3_with_opf(opf.as_bytes()));

    assert!(has_id(&report, MessageId::Opf027));
    // A vocabulary warning alone does not invalidate.
    assert!(report.valid);
}

#[test]
fn test_fallback_cycle() {
    let opf = String::from_utf8_lossy(util::OPF3_MINIMAL).replace(
        r#"<item id="c1" href="c1.xhtml" media-type="application/xhtml+xml"/>"#,
        r#"<item id="c1" href="c1.xhtml" media-type="application/xhtml+xml"/>
    <item id="f1" href="f1.bin" media-type="application/x-demo" fallback="f2"/>
    <item id="f2" href="f2.bin" media-type="application/x-demo" fallback="f1"/>"#,
    );
    let bytes = crate::pipeline::util::build_zip(&[
        ("mimetype", b"application/epub+zip"),
        ("META-INF/container.xml", util::CONTAINER_XML),
        ("EPUB/package.opf", opf.as_bytes()),
        ("EPUB/nav.xhtml", util::NAV_XHTML),
        ("EPUB/c1.xhtml", util::C1_XHTML),
        ("EPUB/f1.bin", b"a"),
        ("EPUB/f2.bin", b"b"),
    ]);
    let report = validate(&bytes);

    assert!(!report.valid);
    assert!(has_id(&report, MessageId::Opf045));
    // The two-item cycle is reported once.
    assert_eq!(1, ids(&report).iter().filter(|id| **id == "OPF-045").count());
}

#[test]
fn test_dangling_fallback() {
    let opf = String::from_utf8_lossy(util::OPF3_MINIMAL).replace(
        r#"<item id="c1" href="c1.xhtml" media-type="application/xhtml+xml"/>"#,
        r#"<item id="c1" href="c1.xhtml" media-type="application/xhtml+xml" fallback="nope"/>"#,
    );
    let report = validate(&epub3_with_opf(opf.as_bytes()));

    assert!(!report.valid);
    assert!(has_id(&report, MessageId::Rsc005));
}

#[test]
fn test_max_errors_caps_invalidating_messages() {
    // Ten dangling idrefs; the cap tolerates n + 1.
    let mut extra = String::new();
    for i in 0..10 {
        extra.push_str(&format!(r#"<itemref idref="ghost{i}"/>"#));
    }
    let opf = String::from_utf8_lossy(util::OPF3_MINIMAL)
        .replace(r#"<itemref idref="c1"/>"#, &format!(r#"<itemref idref="c1"/>{extra}"#));

    let options = ValidateOptions::new().max_errors(2);
    let report = epublint::validate(&epub3_with_opf(opf.as_bytes()), &options);

    assert!(!report.valid);
    assert!(report.fatal_count + report.error_count <= 3);
}

#[test]
fn test_validation_is_idempotent() {
    let bytes = epub3_with_opf(
        String::from_utf8_lossy(util::OPF3_MINIMAL)
            .replace("<dc:language>en</dc:language>", "")
            .as_bytes(),
    );
    let options = ValidateOptions::new().include_info(true).include_usage(true);

    let first = epublint::validate(&bytes, &options);
    let second = epublint::validate(&bytes, &options);

    let key = |report: &epublint::ValidationReport| -> Vec<(String, String, Option<String>)> {
        report
            .messages
            .iter()
            .map(|m| {
                (
                    m.id.as_str().to_owned(),
                    m.message.clone(),
                    m.location.as_ref().map(|l| l.path.clone()),
                )
            })
            .collect()
    };
    assert_eq!(key(&first), key(&second));
    assert_eq!(first.valid, second.valid);
}
