//! The stable JSON report format.
//!
//! Mirrors the reference EPUBCheck schema: a `checker` block, a
//! `publication` block, the message list, and top-level severity counts.
//! Absent line/column values serialize as `-1`.

use crate::Cli;
use epublint::{ValidationMessage, ValidationReport};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct JsonReport {
    pub checker: Checker,
    pub publication: Publication,
    pub messages: Vec<JsonMessage>,
    pub fatals: u32,
    pub errors: u32,
    pub warnings: u32,
    pub infos: u32,
    pub usages: u32,
    #[serde(rename = "elapsedTime")]
    pub elapsed_time: u64,
}

#[derive(Debug, Serialize)]
pub struct Checker {
    pub name: &'static str,
    pub version: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct Publication {
    pub path: String,
    #[serde(rename = "epubVersion", skip_serializing_if = "Option::is_none")]
    pub epub_version: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct JsonMessage {
    #[serde(rename = "ID")]
    pub id: String,
    pub severity: String,
    pub message: String,
    pub locations: Vec<JsonLocation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct JsonLocation {
    pub path: String,
    pub line: i64,
    pub column: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

impl JsonReport {
    pub fn new(report: &ValidationReport, path: &str, cli: &Cli) -> Self {
        Self {
            checker: Checker {
                name: "epubcheck",
                version: env!("CARGO_PKG_VERSION"),
                locale: cli.locale.clone(),
            },
            publication: Publication {
                path: path.to_owned(),
                epub_version: report.version.map(|version| version.as_str().to_owned()),
            },
            messages: report.messages.iter().map(JsonMessage::new).collect(),
            fatals: report.fatal_count,
            errors: report.error_count,
            warnings: report.warning_count,
            infos: report.info_count,
            usages: report.usage_count,
            elapsed_time: report.elapsed_ms,
        }
    }
}

impl JsonMessage {
    pub(crate) fn new(message: &ValidationMessage) -> Self {
        let locations = message
            .location
            .iter()
            .map(|location| JsonLocation {
                path: location.path.clone(),
                line: location.line.map_or(-1, i64::from),
                column: location.column.map_or(-1, i64::from),
                context: location.context.clone(),
            })
            .collect();

        Self {
            id: message.id.as_str().to_owned(),
            severity: message.severity.as_str().to_owned(),
            message: message.message.clone(),
            locations,
            suggestion: message.suggestion.clone(),
        }
    }
}
