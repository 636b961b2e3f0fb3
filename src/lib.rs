//! # epublint
//! - Repository: <https://github.com/epublint/epublint>
//! - Documentation: <https://docs.rs/epublint>
//!
//! A conformance checker for EPUB 2 and 3 publications.
//!
//! `epublint` takes a publication as an opaque byte sequence and runs it
//! through a staged validation pipeline: the OCF ZIP container, the
//! package document (OPF), every declared content resource, and finally
//! the cross-reference graph between them. Findings come back as a
//! [`ValidationReport`] of [`ValidationMessage`]s with stable identifiers
//! (`PKG-006`, `HTM-001`, ...) that tooling can pin on.
//!
//! # Validating a publication
//! ```
//! use epublint::{ValidateOptions, validate};
//!
//! let report = validate(b"not an epub", &ValidateOptions::new());
//!
//! assert!(!report.valid);
//! assert!(report.messages.iter().any(|m| m.id.as_str() == "PKG-008"));
//! ```
//!
//! Options control rule selection and reporting:
//! ```
//! use epublint::{EpubVersion, Profile, ValidateOptions, validate};
//!
//! let options = ValidateOptions::new()
//!     .version(EpubVersion::Epub33)
//!     .profile(Profile::Default)
//!     .include_info(true)
//!     .max_errors(500);
//! # let bytes: &[u8] = b"";
//! let report = validate(bytes, &options);
//! ```
//!
//! # Pipeline
//! Stages run in dependency order over one shared context; each stage
//! writes its own fields and appends messages, never revisiting earlier
//! facts:
//!
//! | Stage | Concern |
//! |-------|---------|
//! | Archive | ZIP central directory, entry naming rules |
//! | OCF | `mimetype` contract, `container.xml`, `META-INF` sidecars |
//! | Package | OPF parsing into the typed model, version detection |
//! | Schema | grammar skeletons of `container.xml` and the OPF |
//! | Content | XHTML, navigation, NCX, CSS, SVG, media fallbacks |
//! | Cross-reference | hrefs, fragments, reachability, stray entries |
//!
//! A fatal finding in the early stages (unreadable archive, missing
//! package document) short-circuits straight to the report; everything
//! else degrades and keeps collecting.
//!
//! `valid` is exactly "no fatal and no error messages"; warnings, infos,
//! and usage notes are advisory.

mod archive;
mod consts;
mod content;
mod context;
mod ocf;
mod parser;
mod schema;
mod util;
mod xref;

pub mod messages;
pub mod options;
pub mod package;
pub mod report;

pub use crate::messages::{EpubLocation, MessageId, Severity, ValidationMessage};
pub use crate::options::{EpubVersion, Profile, ValidateOptions};
pub use crate::report::ValidationReport;

use crate::context::ValidationContext;
use std::time::Instant;

/// Validates one publication image and returns the aggregated report.
///
/// The same bytes and options always produce the same message list, in
/// the same order: archive discovery order for container checks, manifest
/// order for content checks, package-document order for metadata checks.
pub fn validate(bytes: &[u8], options: &ValidateOptions) -> ValidationReport {
    let started = Instant::now();
    let mut ctx = ValidationContext::new(bytes, options);

    run_pipeline(&mut ctx);
    report::build(ctx, started.elapsed())
}

fn run_pipeline(ctx: &mut ValidationContext<'_>) {
    archive::run(ctx);
    if ctx.halted() {
        return;
    }
    ocf::run(ctx);
    if ctx.halted() {
        return;
    }
    package::parser::run(ctx);
    if ctx.halted() {
        return;
    }
    schema::run(ctx);
    if ctx.halted() {
        return;
    }
    content::run(ctx);
    if ctx.halted() {
        return;
    }
    xref::run(ctx);
}
