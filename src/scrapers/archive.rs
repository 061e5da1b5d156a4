//! Sequential archive crawler and listing-page extractor.
//!
//! An archive is a paginated listing (`/news/`, `/news/page/2/`, ...) where
//! each page lists article cards. [`crawl`] walks the page numbers upward
//! from 1 and [`parse_listing`] turns one page into
//! [`ArticleSummary`](crate::models::ArticleSummary) records.
//!
//! # URL Pattern
//!
//! Page URLs are built by substituting `{page}` into the configured path
//! template and joining the result onto the archive URL, so both
//! path-style (`page/2/`) and query-style (`?page=2`) archives work.

use crate::client::{ArchiveClient, FetchError};
use crate::config::{CompiledSelectors, TimingSettings};
use crate::models::{ArticleSummary, StopReason};
use chrono::NaiveDate;
use futures::stream::{self, StreamExt};
use once_cell::sync::Lazy;
use rand::{rng, Rng};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, error, info, instrument, warn};
use url::Url;

/// Everything the crawler needs to know about one archive.
#[derive(Debug, Clone)]
pub struct CrawlPlan {
    /// The first listing page; also the base every page URL is joined onto.
    pub archive_url: Url,
    /// Pagination template with a `{page}` placeholder.
    pub page_path: String,
    /// Optional cap on the number of pages to walk.
    pub max_pages: Option<u32>,
    /// Pacing between successive page fetches.
    pub timing: TimingSettings,
}

/// Result of walking one archive.
#[derive(Debug)]
pub struct ArchiveCrawl {
    /// Collected records, in crawl order.
    pub articles: Vec<ArticleSummary>,
    /// Pages that were fetched and parsed (failed fetches don't count).
    pub pages_crawled: u32,
    /// Why the walk ended.
    pub stop_reason: StopReason,
}

/// What happened on one page of the walk.
enum PageOutcome {
    Listed { items: Vec<ArticleSummary> },
    Empty { page: u32 },
    Failed { page: u32, message: String },
    CapReached { cap: u32 },
}

/// Walk an archive page by page and collect every listed article.
///
/// Pages are fetched one at a time, in order, with a jittered politeness
/// pause between them. The walk ends at the first fetch failure, the first
/// page that lists nothing, or the configured page cap, whichever comes
/// first. Records collected before a failure are kept.
#[instrument(level = "info", skip_all, fields(archive = %plan.archive_url))]
pub async fn crawl(
    client: &ArchiveClient,
    selectors: &CompiledSelectors,
    plan: &CrawlPlan,
) -> ArchiveCrawl {
    let pages = stream::unfold((1u32, false), move |(page, done)| async move {
        if done {
            return None;
        }
        if let Some(max) = plan.max_pages {
            if page > max {
                return Some((PageOutcome::CapReached { cap: max }, (page, true)));
            }
        }

        let url = match page_url(&plan.archive_url, &plan.page_path, page) {
            Ok(url) => url,
            Err(e) => {
                error!(page, error = %e, "Could not build page URL");
                return Some((
                    PageOutcome::Failed {
                        page,
                        message: e.to_string(),
                    },
                    (page, true),
                ));
            }
        };

        if page > 1 {
            polite_pause(&plan.timing).await;
        }

        match client.fetch_page(url.as_str()).await {
            Ok(body) => {
                let items = parse_listing(&body, selectors, &url);
                if items.is_empty() {
                    Some((PageOutcome::Empty { page }, (page, true)))
                } else {
                    info!(page, count = items.len(), "Listed page");
                    Some((PageOutcome::Listed { items }, (page + 1, false)))
                }
            }
            Err(e) => {
                log_fetch_failure(page, &url, &e);
                Some((
                    PageOutcome::Failed {
                        page,
                        message: e.to_string(),
                    },
                    (page, true),
                ))
            }
        }
    });
    futures::pin_mut!(pages);

    let mut articles: Vec<ArticleSummary> = Vec::new();
    let mut pages_crawled = 0u32;
    let mut stop_reason = StopReason::Exhausted;

    while let Some(outcome) = pages.next().await {
        match outcome {
            PageOutcome::Listed { items } => {
                pages_crawled += 1;
                articles.extend(items);
            }
            PageOutcome::Empty { page } => {
                pages_crawled += 1;
                info!(page, "Page listed no articles; archive exhausted");
                stop_reason = StopReason::Exhausted;
            }
            PageOutcome::Failed { page, message } => {
                warn!(page, %message, "Stopping crawl after failed page");
                stop_reason = StopReason::FetchFailed;
            }
            PageOutcome::CapReached { cap } => {
                info!(cap, "Page cap reached");
                stop_reason = StopReason::PageLimit;
            }
        }
    }

    info!(
        pages = pages_crawled,
        articles = articles.len(),
        stop = %stop_reason,
        "Crawl finished"
    );

    ArchiveCrawl {
        articles,
        pages_crawled,
        stop_reason,
    }
}

fn log_fetch_failure(page: u32, url: &Url, error: &FetchError) {
    match error {
        FetchError::Challenge { .. } => {
            error!(page, url = %url, error = %error, "Bot protection blocked the crawl");
        }
        _ => {
            error!(page, url = %url, error = %error, "Page fetch failed");
        }
    }
}

/// Build the URL for a 1-based page number.
pub fn page_url(base: &Url, template: &str, page: u32) -> Result<Url, url::ParseError> {
    let suffix = template.replace("{page}", &page.to_string());
    let mut base = base.clone();
    // Join semantics drop the last path segment unless it ends in a slash.
    if !suffix.starts_with('?') && !base.path().ends_with('/') {
        base.set_path(&format!("{}/", base.path()));
    }
    base.join(&suffix)
}

/// Extract every article record from one listing page.
///
/// One record per container matched by the article selector. A container
/// whose title anchor is missing (or carries no usable href) yields no
/// record; the card is skipped without failing the page. Relative hrefs are
/// resolved against the page URL.
pub fn parse_listing(
    html: &str,
    selectors: &CompiledSelectors,
    page_url: &Url,
) -> Vec<ArticleSummary> {
    let document = Html::parse_document(html);
    let mut articles = Vec::new();

    for container in document.select(&selectors.article) {
        let Some(anchor) = container.select(&selectors.title).next() else {
            debug!("Listing container without a title anchor; skipping");
            continue;
        };
        let title = element_text(anchor);
        if title.is_empty() {
            debug!("Title anchor carries no text; skipping");
            continue;
        }
        let Some(href) = anchor.value().attr("href") else {
            debug!(%title, "Title anchor without href; skipping");
            continue;
        };
        let link = match page_url.join(href) {
            Ok(resolved) => resolved.to_string(),
            Err(e) => {
                debug!(%title, href, error = %e, "Unresolvable article href; skipping");
                continue;
            }
        };

        let date = container
            .select(&selectors.date)
            .next()
            .and_then(parse_article_date);
        let tags = collect_labels(container, &selectors.tags);
        let categories = collect_labels(container, &selectors.categories);

        articles.push(ArticleSummary {
            date,
            title,
            link,
            tags,
            categories,
        });
    }

    debug!(count = articles.len(), "Parsed listing page");
    articles
}

/// Matches an ISO calendar date anywhere inside an attribute or text node.
static ISO_DATE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d{4}-\d{2}-\d{2}").unwrap());

/// Text date formats accepted as a fallback when there is no `datetime`
/// attribute.
const TEXT_DATE_FORMATS: &[&str] = &["%B %d, %Y", "%b %d, %Y", "%d %B %Y", "%m/%d/%Y"];

/// Pull a calendar date out of a date node.
///
/// Prefers the `datetime` attribute (any ISO date inside it, so full
/// RFC 3339 timestamps work too), then falls back to the node's text.
fn parse_article_date(node: ElementRef) -> Option<NaiveDate> {
    if let Some(datetime) = node.value().attr("datetime") {
        if let Some(date) = extract_iso_date(datetime) {
            return Some(date);
        }
    }
    parse_date_text(&element_text(node))
}

fn extract_iso_date(value: &str) -> Option<NaiveDate> {
    ISO_DATE_RE
        .find(value)
        .and_then(|m| NaiveDate::parse_from_str(m.as_str(), "%Y-%m-%d").ok())
}

/// Parse a free-form date string from listing text.
fn parse_date_text(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    if let Some(date) = extract_iso_date(text) {
        return Some(date);
    }
    TEXT_DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
}

/// Collect the normalized text of every element matching `selector` inside
/// `container`, in document order.
fn collect_labels(container: ElementRef, selector: &Selector) -> Vec<String> {
    container
        .select(selector)
        .map(element_text)
        .filter(|label| !label.is_empty())
        .collect()
}

/// Whitespace-normalized text content of an element.
fn element_text(element: ElementRef) -> String {
    element
        .text()
        .collect::<Vec<_>>()
        .join(" ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Jittered pause between successive page fetches.
async fn polite_pause(timing: &TimingSettings) {
    if timing.delay_ms == 0 && timing.jitter_ms == 0 {
        return;
    }
    let jitter_ms: u64 = if timing.jitter_ms > 0 {
        rng().random_range(0..=timing.jitter_ms)
    } else {
        0
    };
    let pause = Duration::from_millis(timing.delay_ms + jitter_ms);
    debug!(?pause, "Pausing before next page");
    sleep(pause).await;
}
