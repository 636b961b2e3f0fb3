//! Validation findings: stable identifiers, severities, and locations.
//!
//! Every rule violation discovered by the pipeline is represented as a
//! [`ValidationMessage`] carrying a [`MessageId`] drawn from a closed,
//! read-only registry. Test suites pin on the identifiers, never on the
//! human-readable text.

use serde::{Serialize, Serializer};
use std::fmt;

/// Severity classification of a [`ValidationMessage`].
///
/// Ordered from least to most severe so that severities can be compared
/// directly; only [`Error`](Severity::Error) and [`Fatal`](Severity::Fatal)
/// invalidate a publication.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    /// Tool or API misuse signal; not a publication defect.
    Usage,
    /// Informational diagnostic, such as an unused manifest item.
    Info,
    /// Rule violation that does not invalidate the publication.
    Warning,
    /// Rule violation; the publication is invalid.
    Error,
    /// The pipeline cannot continue meaningfully.
    Fatal,
}

impl Severity {
    /// Returns `true` for the severities that make a publication invalid.
    pub fn is_invalidating(self) -> bool {
        matches!(self, Severity::Error | Severity::Fatal)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Usage => "USAGE",
            Severity::Info => "INFO",
            Severity::Warning => "WARNING",
            Severity::Error => "ERROR",
            Severity::Fatal => "FATAL",
        }
    }
}

impl Serialize for Severity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

macro_rules! message_ids {
    ($($variant:ident => $id:literal, $severity:ident, $suggestion:expr;)+) => {
        /// Stable message identifier, grouped by subsystem prefix:
        /// `PKG`, `OCF`, `OPF`, `HTM`, `NAV`, `NCX`, `CSS`, `RSC`, `MED`, `SCH`.
        #[non_exhaustive]
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
        pub enum MessageId {
            $($variant,)+
        }

        impl MessageId {
            /// All registered identifiers, in registry order.
            pub const ALL: &'static [MessageId] = &[$(MessageId::$variant,)+];

            /// The stable identifier string, e.g. `"PKG-006"`.
            pub fn as_str(self) -> &'static str {
                match self {
                    $(MessageId::$variant => $id,)+
                }
            }

            /// The registry severity; profiles may re-map it per run.
            pub fn default_severity(self) -> Severity {
                match self {
                    $(MessageId::$variant => Severity::$severity,)+
                }
            }

            /// Optional remediation hint attached to every message with
            /// this identifier.
            pub fn suggestion(self) -> Option<&'static str> {
                match self {
                    $(MessageId::$variant => $suggestion,)+
                }
            }
        }
    };
}

message_ids! {
    // OCF container / ZIP envelope
    Pkg006 => "PKG-006", Error,
        Some("Add a `mimetype` entry containing `application/epub+zip` as the first archive entry.");
    Pkg007 => "PKG-007", Error,
        Some("Store `mimetype` first, uncompressed, containing exactly `application/epub+zip`.");
    Pkg008 => "PKG-008", Fatal, None;
    Ocf004 => "OCF-004", Error, None;

    // Package document
    Opf001 => "OPF-001", Fatal, None;
    Opf002 => "OPF-002", Fatal, None;
    Opf003 => "OPF-003", Warning,
        Some("Declare the resource in the package manifest or remove it from the container.");
    Opf027 => "OPF-027", Warning, None;
    Opf030 => "OPF-030", Error,
        Some("Declare exactly one manifest item with `properties=\"nav\"` in an EPUB 3 publication.");
    Opf032 => "OPF-032", Info, None;
    Opf034 => "OPF-034", Warning, None;
    Opf045 => "OPF-045", Error, None;
    Opf053 => "OPF-053", Error,
        Some("Add a `<meta property=\"dcterms:modified\">` element with a valid timestamp.");
    Opf070 => "OPF-070", Usage, None;
    Opf074 => "OPF-074", Warning, None;

    // XHTML content documents
    Htm001 => "HTM-001", Error,
        Some("Use `<html xmlns=\"http://www.w3.org/1999/xhtml\">` as the document root.");
    Htm002 => "HTM-002", Error, None;
    Htm003 => "HTM-003", Error, Some("Add a non-empty `<title>` to the document head.");
    Htm004 => "HTM-004", Error, None;
    Htm012 => "HTM-012", Error,
        Some("Escape the ampersand as `&amp;` or use a numeric character reference.");

    // EPUB 3 navigation document
    Nav001 => "NAV-001", Error,
        Some("Add a `<nav epub:type=\"toc\">` element to the navigation document.");
    Nav002 => "NAV-002", Error, None;

    // EPUB 2 NCX
    Ncx001 => "NCX-001", Error, None;
    Ncx002 => "NCX-002", Error, None;
    Ncx003 => "NCX-003", Warning, None;

    // CSS
    Css001 => "CSS-001", Error, None;

    // Resources and cross-references
    Rsc001 => "RSC-001", Error, None;
    Rsc004 => "RSC-004", Fatal, None;
    Rsc005 => "RSC-005", Error, None;
    Rsc006 => "RSC-006", Warning,
        Some("Add the `remote-resources` property to the referencing manifest item.");
    Rsc007 => "RSC-007", Error, None;
    Rsc012 => "RSC-012", Error, None;
    Rsc016 => "RSC-016", Error, None;

    // Media and fallbacks
    Med001 => "MED-001", Info, None;
    Med003 => "MED-003", Error,
        Some("Provide a fallback chain terminating at a core media type for every foreign spine item.");

    // Schema layer infrastructure
    Sch001 => "SCH-001", Fatal, None;
}

impl Serialize for MessageId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A location within the publication, relative to the container root.
///
/// `line` and `column` are 1-based when present.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct EpubLocation {
    /// Container-relative entry path, e.g. `EPUB/chapter1.xhtml`.
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<u32>,
    /// A short snippet of the offending source, when available.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

impl EpubLocation {
    pub fn path(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            line: None,
            column: None,
            context: None,
        }
    }

    pub fn at(path: impl Into<String>, line: u32, column: u32) -> Self {
        Self {
            path: path.into(),
            line: Some(line),
            column: Some(column),
            context: None,
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }
}

/// A single finding, immutable once appended to the report.
#[derive(Clone, Debug, Serialize)]
pub struct ValidationMessage {
    pub id: MessageId,
    pub severity: Severity,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<EpubLocation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl ValidationMessage {
    pub(crate) fn new(
        id: MessageId,
        severity: Severity,
        location: Option<EpubLocation>,
        message: String,
    ) -> Self {
        Self {
            id,
            severity,
            message,
            location,
            suggestion: id.suggestion().map(str::to_owned),
        }
    }
}

impl fmt::Display for ValidationMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({}): {}", self.severity, self.id, self.message)?;
        if let Some(location) = &self.location {
            write!(f, " [{}", location.path)?;
            if let (Some(line), Some(column)) = (location.line, location.column) {
                write!(f, ":{line}:{column}")?;
            }
            write!(f, "]")?;
        }
        Ok(())
    }
}
