//! JSON output generation for the API.
//!
//! Serializes a finished crawl to JSON for consumption by external clients.
//!
//! # Output Structure
//!
//! Files are organized by crawl date, named after the archive host:
//! ```text
//! json_output_dir/
//! └── 2025-05-06/
//!     └── example.json
//! ```
//!
//! A host that can't be derived from the archive URL falls back to
//! `archive.json`.

use crate::models::CrawlReport;
use std::error::Error;
use tokio::fs;
use tracing::{error, info, instrument};

/// Write a [`CrawlReport`] to a JSON file with a date-based directory
/// structure.
///
/// Creates the necessary directories and writes the serialized report. The
/// file path is `{json_output_dir}/{local_date}/{host_tag}.json`.
#[instrument(level = "info", skip_all, fields(json_output_dir = %json_output_dir))]
pub async fn write_report(
    report: &CrawlReport,
    json_output_dir: &str,
) -> Result<(), Box<dyn Error>> {
    let json = serde_json::to_string(report)?;

    let full_json_dir = format!("{}/{}", json_output_dir, report.local_date);
    info!(%full_json_dir, "Ensuring JSON directory exists");
    if let Err(e) = fs::create_dir_all(&full_json_dir).await {
        error!(%full_json_dir, error = %e, "Failed to create JSON dir");
        return Err(e.into());
    }

    let host = report.host_tag().unwrap_or_else(|| "archive".to_string());
    let output_json_filename = format!("{full_json_dir}/{host}.json");

    info!(path = %output_json_filename, "Writing JSON");
    fs::write(&output_json_filename, json).await?;
    info!(path = %output_json_filename, "Wrote JSON API file");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ArticleSummary, StopReason};

    #[tokio::test]
    async fn test_write_report_creates_dated_file() {
        let dir = std::env::temp_dir().join("news_archive_scraper_json_test");
        let _ = std::fs::remove_dir_all(&dir);
        let out = dir.to_str().unwrap().to_string();

        let report = CrawlReport {
            local_date: "2025-05-06".to_string(),
            local_time: "10:00:00".to_string(),
            archive_url: "https://news.example.com/archive".to_string(),
            pages_crawled: 1,
            stop_reason: StopReason::Exhausted,
            articles: vec![ArticleSummary {
                date: None,
                title: "A".to_string(),
                link: "https://news.example.com/a".to_string(),
                tags: vec![],
                categories: vec![],
            }],
        };

        write_report(&report, &out).await.unwrap();

        let written = std::fs::read_to_string(dir.join("2025-05-06").join("example.json")).unwrap();
        assert!(written.contains("\"pages_crawled\":1"));
        assert!(written.contains("exhausted"));

        let _ = std::fs::remove_dir_all(&dir);
    }
}
