//! # News Archive Scraper
//!
//! A command-line crawler for paginated news-site archives. It walks the
//! listing pages of an archive sequentially, extracts a summary record per
//! listed article, and writes the collected records out as JSON and a
//! Markdown digest.
//!
//! ## Features
//!
//! - Browser-profile HTTP client (user-agent headers, cookie store, timeout,
//!   optional http/https proxies)
//! - Recognizes bot-protection challenge pages and reports them as such
//!   instead of retrying into a wall; carries an external CAPTCHA-provider
//!   descriptor as pass-through configuration
//! - Configurable CSS selectors for the article container, title anchor,
//!   date node, and tag/category labels
//! - Sequential pagination with jittered politeness delays, stopping on the
//!   first failed or empty page
//!
//! ## Usage
//!
//! ```sh
//! news_archive_scraper https://news.example.com/archive -p 5 -j ./json -m ./markdown
//! ```
//!
//! ## Architecture
//!
//! The application follows a pipeline architecture:
//! 1. **Configuration**: Load and validate the YAML config, compile selectors
//! 2. **Crawling**: Fetch listing pages one at a time, from page 1 upward
//! 3. **Extraction**: Parse each page into article records
//! 4. **Output**: Write the JSON report and Markdown digest (or stdout JSON)

use chrono::Local;
use clap::Parser;
use std::error::Error;
use tracing::{debug, error, info, instrument, warn};
use tracing_subscriber::{fmt as tfmt, EnvFilter};
use url::Url;

mod cli;
mod client;
mod config;
mod models;
mod outputs;
mod scrapers;
mod utils;

use cli::Cli;
use client::ArchiveClient;
use models::CrawlReport;
use outputs::{digest, json};
use scrapers::archive::{self, CrawlPlan};
use utils::ensure_writable_dir;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("archive crawl starting up");

    // Parse CLI
    let args = Cli::parse();
    debug!(?args.archive_url, ?args.pages, ?args.config, "Parsed CLI arguments");

    // --- Load and validate configuration ---
    let mut config = config::load_config(args.config.as_deref())?;
    if let Some(key) = &args.captcha_api_key {
        match config.captcha.as_mut() {
            Some(captcha) => {
                captcha.api_key = key.clone();
                captcha.validate()?;
                info!(provider = %captcha.provider, "CAPTCHA api key taken from flag/environment");
            }
            None => {
                warn!("--captcha-api-key given but no captcha provider is configured; ignoring");
            }
        }
    }
    let selectors = config.selectors.compile()?;
    let archive_url = Url::parse(&args.archive_url)?;

    // Early check: ensure output dirs are writable before any network traffic
    for dir in [&args.json_output_dir, &args.markdown_output_dir]
        .into_iter()
        .flatten()
    {
        if let Err(e) = ensure_writable_dir(dir).await {
            error!(
                path = %dir,
                error = %e,
                "Output directory is not writable (fix perms or choose a different path)"
            );
            return Err(e);
        }
    }

    // --- Build the client and crawl ---
    let client = ArchiveClient::from_config(&config)?;
    let plan = CrawlPlan {
        archive_url: archive_url.clone(),
        page_path: config.page_path.clone(),
        max_pages: args.pages,
        timing: config.timing.clone(),
    };
    let crawl = archive::crawl(&client, &selectors, &plan).await;

    // --- Assemble the report ---
    let local_date = Local::now().date_naive().to_string();
    let local_time = Local::now().time().to_string();
    let report = CrawlReport {
        local_date,
        local_time,
        archive_url: archive_url.to_string(),
        pages_crawled: crawl.pages_crawled,
        stop_reason: crawl.stop_reason,
        articles: crawl.articles,
    };
    info!(
        articles = report.articles.len(),
        dated = report.dated_count(),
        pages = report.pages_crawled,
        stop = %report.stop_reason,
        "Crawl report assembled"
    );

    for (i, article) in report.articles.iter().enumerate() {
        debug!(
            index = i,
            title = %article.title,
            link = %article.link,
            date = ?article.date,
            tags = article.tags.len(),
            categories = article.categories.len(),
            "Collected article"
        );
    }

    // --- Outputs ---
    if args.json_output_dir.is_none() && args.markdown_output_dir.is_none() {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }

    if let Some(dir) = &args.json_output_dir {
        if let Err(e) = json::write_report(&report, dir).await {
            error!(error = %e, "Failed to write JSON report");
        }
    }

    if let Some(dir) = &args.markdown_output_dir {
        let md = digest::report_to_markdown(&report);
        let host = report.host_tag().unwrap_or_else(|| "archive".to_string());
        let output_markdown_filename = format!("{}/{}_{}.md", dir, report.local_date, host);

        info!(path = %output_markdown_filename, "Writing Markdown");
        if let Err(e) = tokio::fs::write(&output_markdown_filename, md).await {
            error!(path = %output_markdown_filename, error = %e, "Failed writing Markdown");
        } else {
            info!(path = %output_markdown_filename, "Wrote Markdown digest");
        }
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Execution complete"
    );

    Ok(())
}
