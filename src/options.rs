//! Validation run configuration.

use serde::Serialize;
use std::fmt;

/// EPUB specification version of a publication.
///
/// Parsed from `package/@version`, or forced through
/// [`ValidateOptions::version`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum EpubVersion {
    Epub2,
    Epub30,
    Epub31,
    Epub32,
    /// The current revision; also the default rule set until detection runs.
    #[default]
    Epub33,
}

impl EpubVersion {
    /// Parses the values accepted by `package/@version`.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "2.0" => Some(Self::Epub2),
            "3.0" => Some(Self::Epub30),
            "3.1" => Some(Self::Epub31),
            "3.2" => Some(Self::Epub32),
            "3.3" => Some(Self::Epub33),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Epub2 => "2.0",
            Self::Epub30 => "3.0",
            Self::Epub31 => "3.1",
            Self::Epub32 => "3.2",
            Self::Epub33 => "3.3",
        }
    }

    pub fn is_epub2(self) -> bool {
        matches!(self, Self::Epub2)
    }

    pub fn is_epub3(self) -> bool {
        !self.is_epub2()
    }
}

impl Serialize for EpubVersion {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl fmt::Display for EpubVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validation profile; selects a re-severity table for specific messages.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Profile {
    #[default]
    Default,
    /// Educational publications.
    Edupub,
    /// Index publications.
    Idx,
    /// Dictionary publications.
    Dict,
    /// Preview publications.
    Preview,
}

impl Profile {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "default" => Some(Self::Default),
            "edupub" => Some(Self::Edupub),
            "idx" => Some(Self::Idx),
            "dict" => Some(Self::Dict),
            "preview" => Some(Self::Preview),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Edupub => "edupub",
            Self::Idx => "idx",
            Self::Dict => "dict",
            Self::Preview => "preview",
        }
    }
}

/// Options recognized by [`validate`](crate::validate).
///
/// # Examples
/// ```
/// use epublint::{Profile, ValidateOptions};
///
/// let options = ValidateOptions::new()
///     .profile(Profile::Default)
///     .include_info(true)
///     .max_errors(100);
/// ```
#[derive(Clone, Debug, Default)]
pub struct ValidateOptions {
    pub(crate) version: Option<EpubVersion>,
    pub(crate) profile: Profile,
    pub(crate) include_usage: bool,
    pub(crate) include_info: bool,
    pub(crate) max_errors: u32,
    pub(crate) locale: Option<String>,
}

impl ValidateOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forces the rule set for the given EPUB version.
    ///
    /// Autodetection still runs; a disagreement between the detected and the
    /// forced version is reported as `OPF-001`, and the forced version wins
    /// for rule selection.
    pub fn version(mut self, version: EpubVersion) -> Self {
        self.version = Some(version);
        self
    }

    pub fn profile(mut self, profile: Profile) -> Self {
        self.profile = profile;
        self
    }

    /// Includes `usage`-severity messages in the report. Disabled by default.
    pub fn include_usage(mut self, include: bool) -> Self {
        self.include_usage = include;
        self
    }

    /// Includes `info`-severity messages in the report. Disabled by default.
    pub fn include_info(mut self, include: bool) -> Self {
        self.include_info = include;
        self
    }

    /// Caps the number of `error`/`fatal` messages; `0` means unlimited.
    ///
    /// The pipeline stops between resources once the cap is exceeded, so at
    /// most `n + 1` invalidating messages appear in the report.
    pub fn max_errors(mut self, max_errors: u32) -> Self {
        self.max_errors = max_errors;
        self
    }

    /// BCP-47 tag selecting the human-message language.
    ///
    /// Only `en` messages are built in; the tag is echoed in the report for
    /// downstream formatters.
    pub fn locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = Some(locale.into());
        self
    }
}
