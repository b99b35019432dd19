//! Report rendering for the CLI

use crate::cli::error::CliError;
use crate::models::IngestionReport;

/// Output format for command results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human-readable summary
    #[default]
    Text,
    /// Pretty-printed JSON
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown output format: {}. Use 'text' or 'json'.", s)),
        }
    }
}

/// Render an ingestion report
pub fn format_report(report: &IngestionReport, format: OutputFormat) -> Result<String, CliError> {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(report)
            .map_err(|e| CliError::IoError(format!("Failed to serialize report: {}", e))),
        OutputFormat::Text => Ok(format_text(report)),
    }
}

fn format_text(report: &IngestionReport) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n\n", report.message));
    out.push_str(&format!("  Run:        {}\n", report.run_id));
    out.push_str(&format!("  Tag:        {}\n", report.tag));
    out.push_str(&format!("  Records:    {}\n", report.total_records));
    out.push_str(&format!("  Inserted:   {}\n", report.inserted_count));
    out.push_str(&format!("  Duplicates: {}\n", report.skipped_duplicates));
    out.push_str(&format!("  Malformed:  {}\n", report.malformed_count));
    out.push_str(&format!("  Failed:     {}\n", report.failed_count));
    out.push_str(&format!("  Batches:    {}\n", report.batches));
    out.push_str(&format!("  Duration:   {}\n", report.duration_string()));

    if !report.duplicate_entries.is_empty() {
        out.push_str("\nSkipped duplicates:\n");
        for entry in &report.duplicate_entries {
            if entry.display_name.is_empty() {
                out.push_str(&format!("  - {}\n", entry.natural_key));
            } else {
                out.push_str(&format!("  - {} ({})\n", entry.natural_key, entry.display_name));
            }
        }
    }

    if !report.write_failures.is_empty() {
        out.push_str("\nWrite failures:\n");
        for failure in &report.write_failures {
            out.push_str(&format!(
                "  - {} [{:?}]: {}\n",
                failure.natural_key, failure.kind, failure.message
            ));
        }
        if report.failed_count > report.write_failures.len() {
            out.push_str(&format!(
                "  ... and {} more\n",
                report.failed_count - report.write_failures.len()
            ));
        }
    }

    out
}
