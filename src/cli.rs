//! Command-line interface definitions for the archive scraper.
//!
//! This module defines the CLI arguments and options using the `clap` crate.
//! Options can be provided via command-line flags or environment variables.

use clap::Parser;

/// Command-line arguments for the archive scraper.
///
/// The only required argument is the archive URL. Without output
/// directories the collected records are printed to stdout as JSON.
///
/// # Examples
///
/// ```sh
/// # Print the first three pages of an archive to stdout
/// news_archive_scraper https://news.example.com/archive -p 3
///
/// # Crawl until the archive is exhausted, writing JSON and Markdown
/// news_archive_scraper https://news.example.com/archive -j ./json -m ./markdown
///
/// # With a config file and a CAPTCHA-provider key from the environment
/// CAPTCHA_API_KEY=... news_archive_scraper https://news.example.com/archive -c scraper.yaml
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Archive URL to start crawling from (page 1)
    #[arg(value_name = "ARCHIVE_URL")]
    pub archive_url: String,

    /// Maximum number of listing pages to crawl (unbounded when omitted)
    #[arg(short, long)]
    pub pages: Option<u32>,

    /// Output directory for the JSON report
    #[arg(short, long)]
    pub json_output_dir: Option<String>,

    /// Output directory for the Markdown digest
    #[arg(short, long)]
    pub markdown_output_dir: Option<String>,

    /// Optional path to a YAML config file
    #[arg(short, long)]
    pub config: Option<String>,

    /// CAPTCHA-provider API key; overrides the key from the config file
    #[arg(long, env = "CAPTCHA_API_KEY")]
    pub captcha_api_key: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::parse_from(&[
            "news_archive_scraper",
            "https://news.example.com/archive",
            "--pages",
            "5",
            "--json-output-dir",
            "./json",
        ]);

        assert_eq!(cli.archive_url, "https://news.example.com/archive");
        assert_eq!(cli.pages, Some(5));
        assert_eq!(cli.json_output_dir.as_deref(), Some("./json"));
        assert!(cli.markdown_output_dir.is_none());
    }

    #[test]
    fn test_cli_short_flags() {
        let cli = Cli::parse_from(&[
            "news_archive_scraper",
            "https://news.example.com/archive",
            "-p",
            "2",
            "-j",
            "/tmp/json",
            "-m",
            "/tmp/markdown",
        ]);

        assert_eq!(cli.pages, Some(2));
        assert_eq!(cli.json_output_dir.as_deref(), Some("/tmp/json"));
        assert_eq!(cli.markdown_output_dir.as_deref(), Some("/tmp/markdown"));
    }

    #[test]
    fn test_cli_defaults_to_unbounded_stdout_run() {
        let cli = Cli::parse_from(&["news_archive_scraper", "https://news.example.com/archive"]);
        assert!(cli.pages.is_none());
        assert!(cli.json_output_dir.is_none());
        assert!(cli.markdown_output_dir.is_none());
        assert!(cli.config.is_none());
    }
}
