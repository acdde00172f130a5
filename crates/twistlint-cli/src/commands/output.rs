//! Shared output formatting for lint results.

use anyhow::Result;
use std::collections::HashMap;
use std::path::Path;
use twistlint_core::{LintResult, Severity, Violation, ViolationDiagnostic};

use crate::OutputFormat;

/// Print lint results in the specified format.
///
/// With `rich_base`, text output renders each violation against the
/// source file found under that directory.
pub fn print(result: &LintResult, format: OutputFormat, rich_base: Option<&Path>) -> Result<()> {
    match format {
        OutputFormat::Text => print_text(result, rich_base),
        OutputFormat::Json => return print_json(result),
        OutputFormat::Compact => print_compact(result),
    }
    Ok(())
}

fn print_text(result: &LintResult, rich_base: Option<&Path>) {
    let (errors, warnings, infos) = result.count_by_severity();
    let mut sources: HashMap<&Path, Option<String>> = HashMap::new();

    for violation in &result.violations {
        if let Some(base) = rich_base {
            let source = sources
                .entry(violation.location.file.as_path())
                .or_insert_with(|| std::fs::read_to_string(base.join(&violation.location.file)).ok());
            if let Some(source) = source {
                println!("{}", render_rich(violation, source));
                continue;
            }
        }

        let severity_indicator = match violation.severity {
            Severity::Error => "\x1b[31merror\x1b[0m",
            Severity::Warning => "\x1b[33mwarning\x1b[0m",
            Severity::Info => "\x1b[34minfo\x1b[0m",
        };

        println!(
            "{} {} at {}:{}:{}",
            violation.code,
            violation.symbol,
            violation.location.file.display(),
            violation.location.line,
            violation.location.column,
        );
        println!("  {}: {}", severity_indicator, violation.message);
        println!();
    }

    let summary_color = if errors > 0 {
        "\x1b[31m"
    } else if warnings > 0 {
        "\x1b[33m"
    } else {
        "\x1b[32m"
    };

    println!(
        "{}Found {} error(s), {} warning(s), {} info(s) in {} file(s)\x1b[0m",
        summary_color, errors, warnings, infos, result.files_checked
    );
    if result.files_failed > 0 {
        println!(
            "\x1b[31m{} file(s) could not be fully checked\x1b[0m",
            result.files_failed
        );
    }
}

fn render_rich(violation: &Violation, source: &str) -> String {
    let name = violation.location.file.display().to_string();
    let report = miette::Report::new(ViolationDiagnostic::from(violation))
        .with_source_code(miette::NamedSource::new(name, source.to_string()));
    format!("{report:?}")
}

fn print_json(result: &LintResult) -> Result<()> {
    let json = serde_json::to_string_pretty(result)?;
    println!("{json}");
    Ok(())
}

fn print_compact(result: &LintResult) {
    for violation in &result.violations {
        println!("{violation}");
    }
}
