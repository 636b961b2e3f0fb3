use clap::Parser;
use epublint::{EpubVersion, Profile, ValidateOptions, ValidationReport};
use std::fs;
use std::path::PathBuf;

pub mod json;

/// Exit code for a valid publication.
pub const EXIT_VALID: i32 = 0;
/// Exit code when error-severity messages were reported.
pub const EXIT_ERRORS: i32 = 1;
/// Exit code for fatal findings or tool misuse.
pub const EXIT_FATAL: i32 = 2;

#[derive(Debug, Parser)]
#[command(name = "epubcheck", about = "Validate EPUB 2 and 3 publications.")]
pub struct Cli {
    /// The EPUB file to validate.
    pub file: PathBuf,

    /// Emit the report as JSON instead of text.
    #[arg(long)]
    pub json: bool,

    /// Validate against a specific EPUB version: 2.0, 3.0, 3.1, 3.2, 3.3.
    #[arg(long = "version", value_name = "VERSION")]
    pub version: Option<String>,

    /// Validation profile: default, edupub, idx, dict, preview.
    #[arg(long, value_name = "PROFILE")]
    pub profile: Option<String>,

    /// BCP-47 tag selecting the report message language.
    #[arg(long, value_name = "LOCALE")]
    pub locale: Option<String>,

    /// Include info-severity messages in the report.
    #[arg(long)]
    pub include_info: bool,

    /// Include usage-severity messages in the report.
    #[arg(long)]
    pub include_usage: bool,

    /// Stop reporting after this many errors; 0 means unlimited.
    #[arg(long, value_name = "N", default_value_t = 0)]
    pub max_errors: u32,
}

impl Cli {
    fn options(&self) -> Result<ValidateOptions, String> {
        let mut options = ValidateOptions::new()
            .include_info(self.include_info)
            .include_usage(self.include_usage)
            .max_errors(self.max_errors);

        if let Some(raw) = &self.version {
            let version = EpubVersion::parse(raw)
                .ok_or_else(|| format!("unsupported EPUB version `{raw}`"))?;
            options = options.version(version);
        }
        if let Some(raw) = &self.profile {
            let profile =
                Profile::parse(raw).ok_or_else(|| format!("unknown profile `{raw}`"))?;
            options = options.profile(profile);
        }
        if let Some(locale) = &self.locale {
            options = options.locale(locale.clone());
        }
        Ok(options)
    }
}

/// Runs a validation and returns the process exit code.
pub fn run(cli: &Cli) -> i32 {
    let options = match cli.options() {
        Ok(options) => options,
        Err(message) => {
            eprintln!("epubcheck: {message}");
            return EXIT_FATAL;
        }
    };
    let bytes = match fs::read(&cli.file) {
        Ok(bytes) => bytes,
        Err(error) => {
            eprintln!("epubcheck: cannot read {}: {error}", cli.file.display());
            return EXIT_FATAL;
        }
    };

    let report = epublint::validate(&bytes, &options);

    if cli.json {
        let json = json::JsonReport::new(&report, &cli.file.display().to_string(), cli);
        match serde_json::to_string_pretty(&json) {
            Ok(out) => println!("{out}"),
            Err(error) => {
                eprintln!("epubcheck: cannot serialize report: {error}");
                return EXIT_FATAL;
            }
        }
    } else {
        print_text(&report, cli);
    }
    exit_code(&report)
}

fn print_text(report: &ValidationReport, cli: &Cli) {
    for message in &report.messages {
        println!("{message}");
        if let Some(suggestion) = &message.suggestion {
            println!("    hint: {suggestion}");
        }
    }

    let verdict = if report.valid { "no errors" } else { "invalid" };
    println!(
        "\nCheck finished for {} ({verdict}): {} fatal / {} errors / {} warnings in {} ms",
        cli.file.display(),
        report.fatal_count,
        report.error_count,
        report.warning_count,
        report.elapsed_ms,
    );
}

fn exit_code(report: &ValidationReport) -> i32 {
    if report.fatal_count > 0 {
        EXIT_FATAL
    } else if report.error_count > 0 {
        EXIT_ERRORS
    } else {
        EXIT_VALID
    }
}
