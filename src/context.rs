//! The shared state threaded through every pipeline stage.

use crate::archive::OcfArchive;
use crate::messages::{EpubLocation, MessageId, Severity, ValidationMessage};
use crate::options::{EpubVersion, Profile, ValidateOptions};
use crate::package::PackageDocument;
use crate::report;
use std::collections::{BTreeMap, BTreeSet};

/// Collects messages under the profile re-severity table and the
/// `maxErrors` cap.
///
/// Appended messages are never mutated or reordered; once the cap trips,
/// further appends are ignored and stages skip remaining work between
/// resources.
pub(crate) struct MessageSink {
    profile: Profile,
    max_errors: u32,
    messages: Vec<ValidationMessage>,
    invalidating: u32,
    capped: bool,
    fatal: bool,
}

impl MessageSink {
    fn new(options: &ValidateOptions) -> Self {
        Self {
            profile: options.profile,
            max_errors: options.max_errors,
            messages: Vec::new(),
            invalidating: 0,
            capped: false,
            fatal: false,
        }
    }

    pub(crate) fn report(
        &mut self,
        id: MessageId,
        location: Option<EpubLocation>,
        message: String,
    ) {
        self.report_as(id, id.default_severity(), location, message);
    }

    pub(crate) fn report_as(
        &mut self,
        id: MessageId,
        severity: Severity,
        location: Option<EpubLocation>,
        message: String,
    ) {
        if self.capped {
            return;
        }
        // The profile may drop the message or change its severity.
        let Some(severity) = report::profile_severity(self.profile, id, severity) else {
            return;
        };

        if severity.is_invalidating() {
            self.invalidating += 1;
            // The triggering message is retained; the cap allows n + 1.
            if self.max_errors > 0 && self.invalidating > self.max_errors {
                self.capped = true;
            }
        }
        if severity == Severity::Fatal {
            self.fatal = true;
        }
        self.messages
            .push(ValidationMessage::new(id, severity, location, message));
    }

    /// `true` once the `maxErrors` cap has tripped.
    pub(crate) fn is_capped(&self) -> bool {
        self.capped
    }

    pub(crate) fn has_fatal(&self) -> bool {
        self.fatal
    }

    pub(crate) fn into_messages(self) -> Vec<ValidationMessage> {
        self.messages
    }
}

/// An outbound reference collected from a content document, resolved to a
/// container path and queued for the cross-reference stage.
#[derive(Debug)]
pub(crate) struct ContentRef {
    /// Container path of the referring document.
    pub(crate) source: String,
    pub(crate) line: u32,
    pub(crate) column: u32,
    /// Resolved container path of the target; empty for same-document
    /// fragment references.
    pub(crate) target: String,
    pub(crate) fragment: Option<String>,
    pub(crate) remote: bool,
}

/// Per-`validate` state; created once, mutated by each stage in turn.
///
/// Apart from the sink, every field is written by exactly one stage and
/// read-only afterwards.
pub(crate) struct ValidationContext<'a> {
    pub(crate) bytes: &'a [u8],
    pub(crate) options: &'a ValidateOptions,
    pub(crate) sink: MessageSink,
    pub(crate) archive: Option<OcfArchive<'a>>,
    /// `full-path` values of all package rootfiles, discovery order.
    pub(crate) rootfiles: Vec<String>,
    /// Container path of the primary package document.
    pub(crate) opf_path: Option<String>,
    /// The version driving rule selection (forced option wins).
    pub(crate) version: EpubVersion,
    pub(crate) package: Option<PackageDocument>,
    /// `dtb:uid` captured from the NCX, when present.
    pub(crate) ncx_uid: Option<String>,
    /// `id`/`xml:id` values per parsed content document.
    pub(crate) ids_by_path: BTreeMap<String, BTreeSet<String>>,
    pub(crate) references: Vec<ContentRef>,
}

impl<'a> ValidationContext<'a> {
    pub(crate) fn new(bytes: &'a [u8], options: &'a ValidateOptions) -> Self {
        Self {
            bytes,
            options,
            sink: MessageSink::new(options),
            archive: None,
            rootfiles: Vec::new(),
            opf_path: None,
            version: options.version.unwrap_or_default(),
            package: None,
            ncx_uid: None,
            ids_by_path: BTreeMap::new(),
            references: Vec::new(),
        }
    }

    pub(crate) fn report(
        &mut self,
        id: MessageId,
        location: Option<EpubLocation>,
        message: impl Into<String>,
    ) {
        self.sink.report(id, location, message.into());
    }

    pub(crate) fn report_as(
        &mut self,
        id: MessageId,
        severity: Severity,
        location: Option<EpubLocation>,
        message: impl Into<String>,
    ) {
        self.sink.report_as(id, severity, location, message.into());
    }

    /// `true` when the pipeline must jump straight to the report stage.
    pub(crate) fn halted(&self) -> bool {
        self.sink.has_fatal() || self.sink.is_capped()
    }
}
