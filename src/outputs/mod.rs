//! Output generation modules for JSON and Markdown.
//!
//! This module contains submodules responsible for writing a finished
//! [`CrawlReport`](crate::models::CrawlReport) to disk:
//!
//! # Submodules
//!
//! - [`json`]: Writes the report as a JSON file for API consumption
//! - [`digest`]: Renders the report as a category-grouped Markdown digest
//!
//! # Output Structure
//!
//! ```text
//! json_output_dir/
//! └── 2025-05-06/
//!     └── example.json        # named after the archive host
//!
//! markdown_output_dir/
//! └── 2025-05-06_example.md   # digest for reading
//! ```
//!
//! When neither directory is configured the report is printed to stdout
//! instead.

pub mod digest;
pub mod json;
