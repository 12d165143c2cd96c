//! Output formatting for CLI

use clap::ValueEnum;
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};

use attacomm::fallback;
use attacomm::reporter::CaseResult;
use attacomm::{RunSummary, SessionEvent};

/// Output format
#[derive(Debug, Clone, Copy, ValueEnum, Default)]
pub enum OutputFormat {
    /// Human-readable table format
    #[default]
    Table,
    /// JSON format
    Json,
    /// Plain text format
    Plain,
}

/// Print the reported test cases
pub fn print_cases(cases: &[CaseResult], format: OutputFormat) {
    if cases.is_empty() {
        println!("No test cases reported.");
        return;
    }

    match format {
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic);

            table.set_header(vec!["Case", "Result", "Assertions", "Failures"]);
            for case in cases {
                let failures: Vec<&str> = case
                    .failures()
                    .filter_map(|a| a.message.as_deref())
                    .collect();
                let result = if case.passed { "PASS" } else { "FAIL" };
                table.add_row(vec![
                    case.name.clone(),
                    result.to_string(),
                    case.assertions.len().to_string(),
                    failures.join("\n"),
                ]);
            }

            println!("{table}");
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(cases).unwrap_or_default());
        }
        OutputFormat::Plain => {
            for case in cases {
                let mark = if case.passed { "✓".green() } else { "✗".red() };
                println!("{} {}", mark, case.name);
                for failure in case.failures() {
                    println!("    {}", failure.message.as_deref().unwrap_or_default());
                }
            }
        }
    }
}

/// Print the counts for a completed run
pub fn print_summary(summary: &RunSummary) {
    let line = format!(
        "{}: {} passed, {} failed, {} adapter errors ({} assertions)",
        summary.api, summary.passed, summary.failed, summary.errors, summary.total
    );
    if summary.success() {
        print_success(&line);
    } else {
        print_error(&line);
    }
}

/// Surface an operator event
pub fn print_event(event: &SessionEvent) {
    match event {
        SessionEvent::NotReady => {
            print_warning("Loading did not finish before init was called")
        }
        SessionEvent::LoadFailed { message } => print_error(message),
        SessionEvent::ManualFallback { reason } => {
            eprintln!("{}", "MANUAL TEST REQUIRED".yellow().bold());
            print_warning(&fallback::notice(reason));
        }
        SessionEvent::AdapterError { index, message } => {
            print_error(&format!("Something bad happened on assertion {}: {}", index, message))
        }
    }
}

/// Print success message
pub fn print_success(message: &str) {
    println!("✅ {}", message);
}

/// Print error message
pub fn print_error(message: &str) {
    eprintln!("❌ {}", message);
}

/// Print warning message
pub fn print_warning(message: &str) {
    eprintln!("⚠️  {}", message);
}
