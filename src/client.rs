//! Browser-profile HTTP client used for all archive fetches.
//!
//! [`ArchiveClient`] wraps a configured `reqwest` client: default headers
//! derived from the browser-emulation descriptor, a cookie store, a request
//! timeout, and optional per-scheme proxies.
//!
//! The client also recognizes the common bot-protection interstitials
//! (Cloudflare-style challenge pages served on 403/503) and reports them as
//! a distinct [`FetchError::Challenge`] instead of a generic status error.
//! It never attempts to pass a challenge; that is the job of external
//! services, for which this crate only carries configuration.

use crate::config::{BrowserKind, CaptchaSettings, Platform, ScrapeConfig};
use crate::utils::truncate_for_log;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, USER_AGENT};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

/// Errors raised while constructing the client.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid proxy url `{url}`: {source}")]
    InvalidProxy {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("failed to build http client: {0}")]
    Build(#[source] reqwest::Error),
}

/// Errors raised by a single page fetch.
///
/// The crawler treats every variant as a stop signal; the variants exist so
/// logs and the final report can say *why* the crawl ended.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },
    #[error(
        "{url} served a bot-protection challenge (HTTP {status}); \
         solving is delegated to external tooling"
    )]
    Challenge { url: String, status: u16 },
}

/// Request headers presented for one browser/platform combination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderProfile {
    pub user_agent: &'static str,
    pub accept: &'static str,
    pub accept_language: &'static str,
}

const CHROME_ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,image/apng,*/*;q=0.8,application/signed-exchange;v=b3;q=0.7";
const FIREFOX_ACCEPT: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8";

/// Select the header profile for a browser-emulation descriptor.
///
/// Desktop platforms with `desktop: false` fall back to the browser's
/// Android profile, so the flag always has an effect.
pub fn header_profile(browser: BrowserKind, platform: Platform, desktop: bool) -> HeaderProfile {
    let platform = match platform {
        Platform::Windows | Platform::Macos | Platform::Linux if !desktop => Platform::Android,
        other => other,
    };

    let user_agent = match (browser, platform) {
        (BrowserKind::Chrome, Platform::Windows) => {
            "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36"
        }
        (BrowserKind::Chrome, Platform::Macos) => {
            "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36"
        }
        (BrowserKind::Chrome, Platform::Linux) => {
            "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36"
        }
        (BrowserKind::Chrome, Platform::Android) => {
            "Mozilla/5.0 (Linux; Android 14; Pixel 8) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0.0.0 Mobile Safari/537.36"
        }
        (BrowserKind::Chrome, Platform::Ios) => {
            "Mozilla/5.0 (iPhone; CPU iPhone OS 17_5 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) CriOS/126.0.0.0 Mobile/15E148 Safari/604.1"
        }
        (BrowserKind::Firefox, Platform::Windows) => {
            "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:127.0) Gecko/20100101 Firefox/127.0"
        }
        (BrowserKind::Firefox, Platform::Macos) => {
            "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.15; rv:127.0) Gecko/20100101 Firefox/127.0"
        }
        (BrowserKind::Firefox, Platform::Linux) => {
            "Mozilla/5.0 (X11; Linux x86_64; rv:127.0) Gecko/20100101 Firefox/127.0"
        }
        (BrowserKind::Firefox, Platform::Android) => {
            "Mozilla/5.0 (Android 14; Mobile; rv:127.0) Gecko/127.0 Firefox/127.0"
        }
        (BrowserKind::Firefox, Platform::Ios) => {
            "Mozilla/5.0 (iPhone; CPU iPhone OS 17_5 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) FxiOS/127.0 Mobile/15E148 Safari/605.1.15"
        }
    };

    let (accept, accept_language) = match browser {
        BrowserKind::Chrome => (CHROME_ACCEPT, "en-US,en;q=0.9"),
        BrowserKind::Firefox => (FIREFOX_ACCEPT, "en-US,en;q=0.5"),
    };

    HeaderProfile {
        user_agent,
        accept,
        accept_language,
    }
}

/// Markers that identify a bot-protection interstitial body.
static CHALLENGE_MARKERS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)cf-browser-verification|cf_chl_|challenge-platform|cf-turnstile|just a moment")
        .unwrap()
});

/// Decide whether a failed response is a bot-protection challenge.
///
/// Challenge interstitials ship on 403 or 503 with recognizable markup, and
/// usually a `server: cloudflare` header.
pub fn is_challenge(status: u16, server: Option<&str>, body: &str) -> bool {
    if status != 403 && status != 503 {
        return false;
    }
    if CHALLENGE_MARKERS.is_match(body) {
        return true;
    }
    // A 503 straight from a cloudflare edge reads as a challenge even when
    // the body carries no recognizable markup.
    status == 503
        && server
            .map(|s| s.to_ascii_lowercase().starts_with("cloudflare"))
            .unwrap_or(false)
}

/// The configured scraper object all page fetches go through.
pub struct ArchiveClient {
    http: reqwest::Client,
    captcha: Option<CaptchaSettings>,
}

impl ArchiveClient {
    /// Build a client from validated configuration.
    ///
    /// Applies the header profile, cookie store, timeout, and proxies, and
    /// carries the CAPTCHA descriptor along untouched.
    #[instrument(level = "info", skip_all)]
    pub fn from_config(config: &ScrapeConfig) -> Result<Self, ClientError> {
        let profile = header_profile(
            config.browser.browser,
            config.browser.platform,
            config.browser.desktop,
        );

        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(profile.user_agent));
        headers.insert(ACCEPT, HeaderValue::from_static(profile.accept));
        headers.insert(
            ACCEPT_LANGUAGE,
            HeaderValue::from_static(profile.accept_language),
        );

        let mut builder = reqwest::Client::builder()
            .default_headers(headers)
            .cookie_store(true)
            .timeout(Duration::from_secs(config.timing.timeout_secs));

        if let Some(http_proxy) = &config.proxy.http {
            let proxy =
                reqwest::Proxy::http(http_proxy).map_err(|source| ClientError::InvalidProxy {
                    url: http_proxy.clone(),
                    source,
                })?;
            builder = builder.proxy(proxy);
            info!(proxy = %http_proxy, scheme = "http", "Proxy configured");
        }
        if let Some(https_proxy) = &config.proxy.https {
            let proxy =
                reqwest::Proxy::https(https_proxy).map_err(|source| ClientError::InvalidProxy {
                    url: https_proxy.clone(),
                    source,
                })?;
            builder = builder.proxy(proxy);
            info!(proxy = %https_proxy, scheme = "https", "Proxy configured");
        }

        let http = builder.build().map_err(ClientError::Build)?;

        info!(
            browser = %config.browser.browser,
            platform = %config.browser.platform,
            desktop = config.browser.desktop,
            captcha_provider = config.captcha.as_ref().map(|c| c.provider.as_str()),
            "Archive client ready"
        );

        Ok(Self {
            http,
            captcha: config.captcha.clone(),
        })
    }

    /// The pass-through CAPTCHA-provider descriptor, if one was configured.
    pub fn captcha(&self) -> Option<&CaptchaSettings> {
        self.captcha.as_ref()
    }

    /// Fetch one page and return its body.
    ///
    /// A 200 yields the body text. Anything else is an error: transport
    /// failures, plain bad statuses, and recognized challenge interstitials
    /// each get their own variant. There is no retry; the caller decides
    /// what a failure means.
    #[instrument(level = "info", skip_all, fields(%url))]
    pub async fn fetch_page(&self, url: &str) -> Result<String, FetchError> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|source| FetchError::Transport {
                url: url.to_string(),
                source,
            })?;

        let status = response.status().as_u16();
        let server = response
            .headers()
            .get(reqwest::header::SERVER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let body = response
            .text()
            .await
            .map_err(|source| FetchError::Transport {
                url: url.to_string(),
                source,
            })?;

        if (200..300).contains(&status) {
            debug!(status, bytes = body.len(), "Fetched page");
            return Ok(body);
        }

        if is_challenge(status, server.as_deref(), &body) {
            warn!(
                status,
                server = server.as_deref(),
                captcha_provider = self.captcha.as_ref().map(|c| c.provider.as_str()),
                body_preview = %truncate_for_log(&body, 200),
                "Bot-protection challenge served; not attempting to solve"
            );
            return Err(FetchError::Challenge {
                url: url.to_string(),
                status,
            });
        }

        warn!(status, "Non-success status");
        Err(FetchError::Status {
            url: url.to_string(),
            status,
        })
    }
}
