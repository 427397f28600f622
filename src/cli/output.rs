//! Output formatting for CLI commands.
//!
//! Supports text and JSON output formats.

use crate::core::{QueueJob, SeparationResult};
use crate::error::Error;
use crate::io::preview;
use crate::queue::WorkerReport;
use crate::separation::PatternPreset;
use crate::storage::StorageStats;
use serde::Serialize;
use std::fmt::Write;

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable text output.
    Text,
    /// JSON output.
    Json,
}

impl OutputFormat {
    /// Parses format from string.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => Self::Json,
            _ => Self::Text,
        }
    }
}

/// Summary of a `mask` run.
#[derive(Debug, Clone, Serialize)]
pub struct MaskReport {
    /// Bucket holding the document.
    pub bucket: String,
    /// Key of the masked text.
    pub key: String,
    /// Key of the variable manifest.
    pub manifest_key: String,
    /// Variable occurrences masked.
    pub variables: usize,
    /// Distinct variables.
    pub distinct: usize,
    /// Jobs enqueued.
    pub enqueued: usize,
}

/// Formats a status response.
#[must_use]
pub fn format_status(stats: &StorageStats, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => format_status_text(stats),
        OutputFormat::Json => format_json(stats),
    }
}

fn format_status_text(stats: &StorageStats) -> String {
    let mut output = String::new();
    output.push_str("varsep Status\n");
    output.push_str("=============\n\n");
    let _ = writeln!(output, "  Buckets:       {}", stats.bucket_count);
    let _ = writeln!(output, "  Objects:       {}", stats.object_count);
    let _ = writeln!(
        output,
        "  Object size:   {}",
        format_size(stats.total_object_size)
    );
    let _ = writeln!(output, "  Jobs pending:  {}", stats.jobs.pending);
    let _ = writeln!(output, "  Jobs running:  {}", stats.jobs.running);
    let _ = writeln!(output, "  Jobs failed:   {}", stats.jobs.failed);
    let _ = writeln!(output, "  Schema:        v{}", stats.schema_version);
    if let Some(size) = stats.db_size {
        let _ = writeln!(output, "  DB size:       {size} bytes");
    }
    output
}

/// Formats a separation result whose masked text went to a file.
#[must_use]
pub fn format_separation(result: &SeparationResult, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => format_separation_text(result),
        OutputFormat::Json => format_json(result),
    }
}

fn format_separation_text(result: &SeparationResult) -> String {
    let distinct = result.distinct_variables();
    let mut output = String::new();
    let _ = writeln!(
        output,
        "Separated {} variables ({} distinct)",
        result.len(),
        distinct.len()
    );
    for var in distinct {
        let _ = writeln!(output, "  {:<16} {}", var.hash, preview(&var.value, 50));
    }
    output
}

/// Formats a `mask` summary.
#[must_use]
pub fn format_mask(report: &MaskReport, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => {
            let mut output = String::new();
            let _ = writeln!(output, "Masked {}/{}", report.bucket, report.key);
            let _ = writeln!(
                output,
                "  Variables:     {} ({} distinct)",
                report.variables, report.distinct
            );
            let _ = writeln!(output, "  Manifest:      {}", report.manifest_key);
            let _ = writeln!(output, "  Enqueued:      {}", report.enqueued);
            output
        }
        OutputFormat::Json => format_json(report),
    }
}

/// Formats a job list.
#[must_use]
pub fn format_jobs(jobs: &[QueueJob], format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => format_jobs_text(jobs),
        OutputFormat::Json => format_json(&jobs),
    }
}

fn format_jobs_text(jobs: &[QueueJob]) -> String {
    if jobs.is_empty() {
        return "No jobs queued.\n".to_string();
    }

    let mut output = String::new();
    let _ = writeln!(
        output,
        "{:<6} {:<9} {:<9} {:<16} Variable",
        "ID", "Status", "Progress", "Hash"
    );
    output.push_str(&"-".repeat(70));
    output.push('\n');

    for job in jobs {
        let progress = job
            .progress
            .as_ref()
            .map_or_else(|| "-".to_string(), ToString::to_string);
        let _ = writeln!(
            output,
            "{:<6} {:<9} {:<9} {:<16} {}",
            job.id,
            job.status,
            preview(&progress, 9),
            job.item.hash,
            preview(&job.item.variable, 30)
        );
        if let Some(error) = &job.error {
            let _ = writeln!(output, "       error: {}", preview(error, 60));
        }
    }

    output
}

/// Formats a worker run summary.
#[must_use]
pub fn format_worker_report(report: &WorkerReport, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => {
            let mut output = String::new();
            if report.requeued > 0 {
                let _ = writeln!(output, "Requeued {} stale jobs", report.requeued);
            }
            let _ = writeln!(
                output,
                "Processed {} jobs ({} failed)",
                report.processed + report.failed,
                report.failed
            );
            output
        }
        OutputFormat::Json => format_json(report),
    }
}

/// Formats the pattern preset list.
#[must_use]
pub fn format_patterns(presets: &[PatternPreset], default: &str, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => {
            let mut output = String::new();
            output.push_str("Variable patterns:\n\n");
            for preset in presets {
                let marker = if preset.name == default { " (default)" } else { "" };
                let _ = writeln!(output, "  {}{marker}", preset.name);
                let _ = writeln!(output, "    {}", preset.description);
                let _ = writeln!(output, "    example: {}", preset.example);
                let _ = writeln!(output, "    regex:   {}", preset.regex);
            }
            output
        }
        OutputFormat::Json => {
            #[derive(Serialize)]
            struct PresetJson<'a> {
                name: &'a str,
                regex: &'a str,
                example: &'a str,
                description: &'a str,
                default: bool,
            }
            let list: Vec<PresetJson<'_>> = presets
                .iter()
                .map(|p| PresetJson {
                    name: p.name,
                    regex: p.regex,
                    example: p.example,
                    description: p.description,
                    default: p.name == default,
                })
                .collect();
            format_json(&list)
        }
    }
}

/// Formats a hash lookup.
#[must_use]
pub fn format_hash(text: &str, hash: &str, placeholder: &str, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => format!("{hash}  {placeholder}\n"),
        OutputFormat::Json => {
            #[derive(Serialize)]
            struct HashJson<'a> {
                text: &'a str,
                hash: &'a str,
                placeholder: &'a str,
            }
            format_json(&HashJson {
                text,
                hash,
                placeholder,
            })
        }
    }
}

/// Formats an error for output.
#[must_use]
pub fn format_error(error: &Error, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => error.to_string(),
        OutputFormat::Json => {
            #[derive(Serialize)]
            struct ErrorJson {
                error: String,
            }
            format_json(&ErrorJson {
                error: error.to_string(),
            })
        }
    }
}

/// Formats a value as JSON.
pub(crate) fn format_json<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
}

/// Formats a byte size as human-readable.
#[allow(clippy::cast_precision_loss)]
fn format_size(bytes: usize) -> String {
    if bytes < 1024 {
        format!("{bytes} B")
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}
