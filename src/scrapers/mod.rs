//! Archive crawling and listing extraction.
//!
//! This module holds the crawl side of the application. The flow is a
//! consistent two-phase pattern per page:
//!
//! 1. **Fetching**: Download one listing page through the configured
//!    [`ArchiveClient`](crate::client::ArchiveClient)
//! 2. **Extraction**: Pull the article records out of the page with the
//!    compiled selector set
//!
//! Pages are walked strictly sequentially from page 1; the crawl stops at
//! the first failed fetch, the first page without listings, or the optional
//! page cap. Failed pages end the crawl but never discard what was already
//! collected.

pub mod archive;
