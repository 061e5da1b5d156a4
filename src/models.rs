//! Data models for scraped archive listings.
//!
//! This module defines the core data structures used throughout the application:
//! - [`ArticleSummary`]: One record per article listed on an archive page
//! - [`CrawlReport`]: Everything collected during a single run
//! - [`StopReason`]: Why the sequential page crawl ended
//!
//! Records are accumulated in memory for the duration of a run and then
//! written out; there is no persistence layer and no identity beyond the
//! record's position in the list.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A single article as listed on an archive page.
///
/// Every field is read straight off the listing markup; nothing here comes
/// from fetching the article itself.
///
/// # Fields
///
/// * `date` - Publication date, when the listing carries a parsable one
/// * `title` - The headline text of the title anchor
/// * `link` - Absolute URL of the article (relative hrefs are resolved
///   against the page they were found on)
/// * `tags` - Tag labels in document order, possibly empty
/// * `categories` - Category labels in document order, possibly empty
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ArticleSummary {
    /// Publication date of the article, if one could be parsed.
    pub date: Option<NaiveDate>,
    /// The article headline.
    pub title: String,
    /// Absolute URL of the article.
    pub link: String,
    /// Tag labels attached to the listing.
    pub tags: Vec<String>,
    /// Category labels attached to the listing.
    pub categories: Vec<String>,
}

/// The terminal condition of a sequential page crawl.
///
/// The crawler walks page numbers upward from 1 and stops at exactly one of
/// these conditions. The reason is carried into the [`CrawlReport`] so a
/// reader of the output can tell a clean exhaustion apart from a mid-crawl
/// failure.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// A page listed no articles; the archive is exhausted.
    Exhausted,
    /// A page failed to fetch (transport error, bad status, or a
    /// bot-protection challenge).
    FetchFailed,
    /// The configured page cap was reached.
    PageLimit,
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            StopReason::Exhausted => "exhausted",
            StopReason::FetchFailed => "fetch_failed",
            StopReason::PageLimit => "page_limit",
        };
        write!(f, "{s}")
    }
}

/// Everything collected during a single crawl of an archive.
///
/// Each execution of the application produces one `CrawlReport`, which is
/// serialized to JSON (for API consumption) and rendered to Markdown
/// (for reading).
#[derive(Debug, Deserialize, Serialize)]
pub struct CrawlReport {
    /// The date the crawl ran, in `YYYY-MM-DD` format.
    pub local_date: String,
    /// The exact local time the crawl ran.
    pub local_time: String,
    /// The archive URL the crawl started from.
    pub archive_url: String,
    /// Number of listing pages that were fetched and parsed.
    pub pages_crawled: u32,
    /// Why the crawl stopped.
    pub stop_reason: StopReason,
    /// The collected article records, in crawl order.
    pub articles: Vec<ArticleSummary>,
}

impl CrawlReport {
    /// Extract the registrable name from the archive URL's host.
    /// For example: "https://news.example.com/archive" -> "example"
    pub fn host_tag(&self) -> Option<String> {
        if let Ok(parsed) = url::Url::parse(&self.archive_url) {
            if let Some(host) = parsed.host_str() {
                let parts: Vec<&str> = host.split('.').collect();
                // "news.example.com" -> "example", "example.com" -> "example"
                if parts.len() >= 2 {
                    return Some(parts[parts.len() - 2].to_string());
                }
            }
        }
        None
    }

    /// Count of articles that carried a parsable publication date.
    pub fn dated_count(&self) -> usize {
        self.articles.iter().filter(|a| a.date.is_some()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_article() -> ArticleSummary {
        ArticleSummary {
            date: NaiveDate::from_ymd_opt(2025, 5, 6),
            title: "Test Article".to_string(),
            link: "https://news.example.com/test-article".to_string(),
            tags: vec!["politics".to_string(), "elections".to_string()],
            categories: vec!["World".to_string()],
        }
    }

    fn sample_report(archive_url: &str) -> CrawlReport {
        CrawlReport {
            local_date: "2025-05-06".to_string(),
            local_time: "20:30:00".to_string(),
            archive_url: archive_url.to_string(),
            pages_crawled: 3,
            stop_reason: StopReason::Exhausted,
            articles: vec![sample_article()],
        }
    }

    #[test]
    fn test_article_summary_fields() {
        let article = sample_article();
        assert_eq!(article.title, "Test Article");
        assert_eq!(article.tags.len(), 2);
        assert_eq!(article.categories, vec!["World".to_string()]);
        assert_eq!(article.date, NaiveDate::from_ymd_opt(2025, 5, 6));
    }

    #[test]
    fn test_article_summary_serialization() {
        let article = sample_article();
        let json = serde_json::to_string(&article).unwrap();
        assert!(json.contains("2025-05-06"));
        assert!(json.contains("Test Article"));

        let back: ArticleSummary = serde_json::from_str(&json).unwrap();
        assert_eq!(back.link, article.link);
        assert_eq!(back.date, article.date);
    }

    #[test]
    fn test_article_without_date_serializes_null() {
        let mut article = sample_article();
        article.date = None;
        let json = serde_json::to_string(&article).unwrap();
        assert!(json.contains("\"date\":null"));
    }

    #[test]
    fn test_report_deserialization() {
        let json = r#"{
            "local_date": "2025-05-06",
            "local_time": "08:00:00",
            "archive_url": "https://news.example.com/archive",
            "pages_crawled": 0,
            "stop_reason": "fetch_failed",
            "articles": []
        }"#;

        let report: CrawlReport = serde_json::from_str(json).unwrap();
        assert_eq!(report.local_date, "2025-05-06");
        assert_eq!(report.stop_reason, StopReason::FetchFailed);
        assert_eq!(report.articles.len(), 0);
    }

    #[test]
    fn test_stop_reason_display() {
        assert_eq!(StopReason::Exhausted.to_string(), "exhausted");
        assert_eq!(StopReason::FetchFailed.to_string(), "fetch_failed");
        assert_eq!(StopReason::PageLimit.to_string(), "page_limit");
    }

    #[test]
    fn test_host_tag_subdomain() {
        let report = sample_report("https://news.example.com/archive");
        assert_eq!(report.host_tag(), Some("example".to_string()));
    }

    #[test]
    fn test_host_tag_bare_domain() {
        let report = sample_report("https://example.com/archive");
        assert_eq!(report.host_tag(), Some("example".to_string()));
    }

    #[test]
    fn test_host_tag_invalid_url() {
        let report = sample_report("not a url");
        assert_eq!(report.host_tag(), None);
    }

    #[test]
    fn test_dated_count() {
        let mut report = sample_report("https://example.com");
        let mut undated = sample_article();
        undated.date = None;
        report.articles.push(undated);
        assert_eq!(report.articles.len(), 2);
        assert_eq!(report.dated_count(), 1);
    }
}
