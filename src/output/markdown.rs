//! Markdown summary generation
//!
//! This module generates human-readable markdown summaries of crawl results,
//! including request totals, record counts and per-entity error ratios.

use crate::output::traits::{CrawlSummary, OutputResult};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Generates a markdown summary from crawl statistics
///
/// # Arguments
///
/// * `summary` - The crawl summary data
/// * `output_path` - Path where the markdown file should be written
///
/// # Returns
///
/// * `Ok(())` - Successfully wrote markdown summary
/// * `Err(OutputError)` - Failed to write summary
pub fn generate_markdown_summary(summary: &CrawlSummary, output_path: &Path) -> OutputResult<()> {
    let markdown = format_markdown_summary(summary);

    let mut file = File::create(output_path)?;
    file.write_all(markdown.as_bytes())?;

    Ok(())
}

/// Formats a crawl summary as markdown
pub fn format_markdown_summary(summary: &CrawlSummary) -> String {
    let mut md = String::new();

    md.push_str("# Catalog Crawl Summary\n\n");

    // Run metadata
    md.push_str("## Run Information\n\n");
    md.push_str(&format!("- **Run ID**: {}\n", summary.run_id));
    md.push_str(&format!("- **Target Year**: {}\n", summary.target_year));
    md.push_str(&format!("- **Started**: {}\n", summary.started_at));
    if let Some(finished) = &summary.finished_at {
        md.push_str(&format!("- **Finished**: {}\n", finished));
    }
    if let Some(duration) = summary.duration_seconds {
        md.push_str(&format!(
            "- **Duration**: {} seconds ({:.2} minutes)\n",
            duration,
            duration as f64 / 60.0
        ));
    }
    md.push_str(&format!("- **Status**: {}\n", summary.status));
    md.push_str(&format!("- **Config Hash**: {}\n\n", summary.config_hash));

    // Requests
    md.push_str("## Requests\n\n");
    md.push_str(&format!(
        "- **Dispatched**: {}\n",
        summary.requests_dispatched
    ));
    md.push_str(&format!("- **Failed**: {}\n", summary.requests_failed));
    md.push_str(&format!(
        "- **Success Rate**: {:.2}%\n\n",
        summary.request_success_rate()
    ));

    // Records
    md.push_str("## Emitted Records\n\n");
    md.push_str("| Item Type | Count |\n");
    md.push_str("|-----------|-------|\n");
    for (item_type, count) in &summary.records_by_type {
        md.push_str(&format!("| {} | {} |\n", item_type, count));
    }
    md.push_str(&format!("| **Total** | {} |\n\n", summary.total_records()));

    // Error ratios
    if !summary.error_ratios.is_empty() {
        md.push_str("## Extraction Errors\n\n");
        md.push_str("| Entity | Errors | Total | Ratio |\n");
        md.push_str("|--------|--------|-------|-------|\n");
        for (kind, ratio) in &summary.error_ratios {
            md.push_str(&format!(
                "| {} | {} | {} | {:.4} |\n",
                kind, ratio.error_count, ratio.total_count, ratio.error_ratio
            ));
        }
        md.push('\n');
        md.push_str(&format!(
            "Units skipped in total: {}\n",
            summary.total_extraction_errors()
        ));
    }

    md
}
