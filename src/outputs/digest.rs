//! Markdown digest rendering.
//!
//! Renders a [`CrawlReport`] as a human-readable Markdown document: a short
//! run summary, a table of contents, and the article listings grouped by
//! category (alphabetically). An article that carries several categories is
//! listed under each of them; articles without any land in an
//! "Uncategorized" section.

use crate::models::{ArticleSummary, CrawlReport};
use crate::utils::slugify_title;
use itertools::Itertools;
use std::collections::BTreeMap;
use std::fmt::Write;

/// Section name for articles without category labels.
const UNCATEGORIZED: &str = "Uncategorized";

/// Render a full crawl report to Markdown.
pub fn report_to_markdown(report: &CrawlReport) -> String {
    let mut md = String::new();

    let host = report
        .host_tag()
        .unwrap_or_else(|| report.archive_url.clone());
    writeln!(md, "# {} archive — {}\n", host, report.local_date).unwrap();
    writeln!(
        md,
        "_Crawled {} page(s) of <{}> at {}; stopped: {}._\n",
        report.pages_crawled, report.archive_url, report.local_time, report.stop_reason
    )
    .unwrap();

    let distinct_tags = report
        .articles
        .iter()
        .flat_map(|a| a.tags.iter())
        .unique()
        .count();
    let by_category = group_by_category(&report.articles);
    writeln!(
        md,
        "{} article(s) across {} categories; {} distinct tags; {} carry a publication date.\n",
        report.articles.len(),
        by_category.len(),
        distinct_tags,
        report.dated_count()
    )
    .unwrap();

    if by_category.is_empty() {
        return md;
    }

    writeln!(md, "## Contents\n").unwrap();
    for category in by_category.keys() {
        writeln!(md, "- [{}](#{})", category, slugify_title(category)).unwrap();
    }
    writeln!(md).unwrap();

    for (category, articles) in &by_category {
        writeln!(md, "## {category}\n").unwrap();
        for article in articles {
            writeln!(md, "{}", article_line(article)).unwrap();
        }
        writeln!(md).unwrap();
    }

    md
}

/// Group article references by category name, alphabetically.
fn group_by_category<'a>(
    articles: &'a [ArticleSummary],
) -> BTreeMap<String, Vec<&'a ArticleSummary>> {
    let mut by_category: BTreeMap<String, Vec<&ArticleSummary>> = BTreeMap::new();
    for article in articles {
        if article.categories.is_empty() {
            by_category
                .entry(UNCATEGORIZED.to_string())
                .or_default()
                .push(article);
        } else {
            for category in &article.categories {
                by_category.entry(category.clone()).or_default().push(article);
            }
        }
    }
    by_category
}

/// One bullet line for an article: date, linked title, inline tags.
fn article_line(article: &ArticleSummary) -> String {
    let mut line = String::from("- ");
    if let Some(date) = article.date {
        write!(line, "{date} — ").unwrap();
    }
    write!(line, "[{}]({})", article.title, article.link).unwrap();
    for tag in &article.tags {
        write!(line, " `{tag}`").unwrap();
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::StopReason;
    use chrono::NaiveDate;

    fn article(title: &str, categories: &[&str], tags: &[&str]) -> ArticleSummary {
        ArticleSummary {
            date: NaiveDate::from_ymd_opt(2025, 5, 6),
            title: title.to_string(),
            link: format!("https://news.example.com/{}", slugify_title(title)),
            tags: tags.iter().map(|s| s.to_string()).collect(),
            categories: categories.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn report(articles: Vec<ArticleSummary>) -> CrawlReport {
        CrawlReport {
            local_date: "2025-05-06".to_string(),
            local_time: "10:00:00".to_string(),
            archive_url: "https://news.example.com/archive".to_string(),
            pages_crawled: 2,
            stop_reason: StopReason::Exhausted,
            articles,
        }
    }

    #[test]
    fn test_digest_groups_by_category() {
        let md = report_to_markdown(&report(vec![
            article("Alpha", &["World"], &["a"]),
            article("Beta", &["Tech"], &[]),
            article("Gamma", &["World"], &[]),
        ]));

        assert!(md.contains("## Tech"));
        assert!(md.contains("## World"));
        // Alphabetical: Tech before World.
        assert!(md.find("## Tech").unwrap() < md.find("## World").unwrap());
        assert!(md.contains("[Alpha](https://news.example.com/alpha)"));
        assert!(md.contains("`a`"));
    }

    #[test]
    fn test_digest_contents_links_use_slugs() {
        let md = report_to_markdown(&report(vec![article("X", &["Science & Nature"], &[])]));
        assert!(md.contains("- [Science & Nature](#science--nature)"));
    }

    #[test]
    fn test_uncategorized_bucket() {
        let md = report_to_markdown(&report(vec![article("Loose", &[], &[])]));
        assert!(md.contains("## Uncategorized"));
        assert!(md.contains("[Loose]"));
    }

    #[test]
    fn test_multi_category_article_listed_twice() {
        let md = report_to_markdown(&report(vec![article("Both", &["A", "B"], &[])]));
        assert_eq!(md.matches("[Both]").count(), 2);
    }

    #[test]
    fn test_empty_report_has_summary_only() {
        let md = report_to_markdown(&report(vec![]));
        assert!(md.contains("0 article(s)"));
        assert!(!md.contains("## Contents"));
    }

    #[test]
    fn test_undated_article_line_has_no_dash_prefix_date() {
        let mut a = article("NoDate", &["C"], &[]);
        a.date = None;
        let line = article_line(&a);
        assert!(line.starts_with("- [NoDate]"));
    }
}
