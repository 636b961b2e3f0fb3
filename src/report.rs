//! Report aggregation: profile filtering, severity gates, counts.

use crate::context::ValidationContext;
use crate::messages::{MessageId, Severity, ValidationMessage};
use crate::options::{EpubVersion, Profile};
use serde::Serialize;
use std::time::Duration;

/// The outcome of a [`validate`](crate::validate) run.
///
/// `valid` is exactly `fatal_count == 0 && error_count == 0`; warnings,
/// infos, and usage messages are advisory.
#[derive(Clone, Debug, Serialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub messages: Vec<ValidationMessage>,
    pub fatal_count: u32,
    pub error_count: u32,
    pub warning_count: u32,
    pub info_count: u32,
    pub usage_count: u32,
    /// Detected (or forced) EPUB version; absent when detection never ran.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<EpubVersion>,
    pub elapsed_ms: u64,
}

/// Applies the profile re-severity table to one message.
///
/// Returns the effective severity, or [`None`] when the profile drops the
/// message entirely. The tables are deliberately small; everything not
/// listed passes through unchanged.
pub(crate) fn profile_severity(
    profile: Profile,
    id: MessageId,
    default: Severity,
) -> Option<Severity> {
    match (profile, id) {
        // Preview publications routinely ship without EPUB 2 navigation.
        (Profile::Preview, MessageId::Ncx001 | MessageId::Ncx002 | MessageId::Ncx003) => None,
        // Educational publications treat unreachable content as a real
        // conformance concern rather than a curiosity.
        (Profile::Edupub, MessageId::Opf032) => Some(Severity::Warning),
        _ => Some(default),
    }
}

pub(crate) fn build(mut ctx: ValidationContext<'_>, elapsed: Duration) -> ValidationReport {
    // Profile expectations checked against the finished model.
    let expected_role = match ctx.options.profile {
        Profile::Idx => Some("index"),
        Profile::Dict => Some("dictionary"),
        _ => None,
    };
    if let Some(role) = expected_role {
        let found = ctx
            .package
            .as_ref()
            .is_some_and(|package| package.collections.iter().any(|c| c.role == role));
        if !found {
            ctx.report(
                MessageId::Opf070,
                None,
                format!(
                    "validating under the '{}' profile, but no collection with role '{role}' was found",
                    ctx.options.profile.as_str(),
                ),
            );
        }
    }

    let version = (ctx.package.is_some() || ctx.options.version.is_some()).then_some(ctx.version);
    let include_info = ctx.options.include_info;
    let include_usage = ctx.options.include_usage;

    let messages: Vec<ValidationMessage> = ctx
        .sink
        .into_messages()
        .into_iter()
        .filter(|message| match message.severity {
            Severity::Info => include_info,
            Severity::Usage => include_usage,
            _ => true,
        })
        .collect();

    let count = |severity: Severity| -> u32 {
        messages
            .iter()
            .filter(|message| message.severity == severity)
            .count() as u32
    };
    let fatal_count = count(Severity::Fatal);
    let error_count = count(Severity::Error);

    ValidationReport {
        valid: fatal_count == 0 && error_count == 0,
        fatal_count,
        error_count,
        warning_count: count(Severity::Warning),
        info_count: count(Severity::Info),
        usage_count: count(Severity::Usage),
        version,
        elapsed_ms: elapsed.as_millis() as u64,
        messages,
    }
}

impl ValidationReport {
    /// Messages with the given severity.
    pub fn messages_with_severity(
        &self,
        severity: Severity,
    ) -> impl Iterator<Item = &ValidationMessage> {
        self.messages
            .iter()
            .filter(move |message| message.severity == severity)
    }

    /// Messages with the given identifier.
    pub fn messages_with_id(&self, id: MessageId) -> impl Iterator<Item = &ValidationMessage> {
        self.messages.iter().filter(move |message| message.id == id)
    }
}
