//! Runtime configuration for the archive client and the extractor.
//!
//! Configuration is loaded from an optional YAML file. Every section has a
//! default, so a bare invocation needs no file at all:
//!
//! ```yaml
//! proxy:
//!   http: "http://127.0.0.1:8080"
//!   https: "http://127.0.0.1:8080"
//! browser:
//!   browser: chrome
//!   platform: windows
//!   desktop: true
//! captcha:
//!   provider: 2captcha
//!   api_key: "YOUR_KEY"
//! selectors:
//!   article: "article"
//!   title: "h2 a"
//! timing:
//!   delay_ms: 500
//!   jitter_ms: 250
//!   timeout_secs: 30
//! page_path: "page/{page}/"
//! ```
//!
//! The proxy map and the CAPTCHA-provider descriptor are pass-through
//! settings for the HTTP client: the crawler validates them and hands them
//! on, it never talks to a solving service itself.

use scraper::Selector;
use serde::{Deserialize, Serialize};
use std::fs;
use thiserror::Error;
use tracing::{debug, info, instrument};

/// CAPTCHA services the descriptor is allowed to name.
///
/// The list mirrors the vendors commonly wired into challenge-aware HTTP
/// clients. Anything else is rejected at startup rather than silently
/// carried along.
pub const KNOWN_CAPTCHA_PROVIDERS: &[&str] = &["2captcha", "anticaptcha", "capsolver"];

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config file: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid CSS selector `{selector}`: {message}")]
    Selector { selector: String, message: String },
    #[error("unknown captcha provider `{0}` (expected one of: 2captcha, anticaptcha, capsolver)")]
    UnknownCaptchaProvider(String),
    #[error("captcha provider `{0}` configured without an api key")]
    MissingCaptchaKey(String),
}

/// Browser family to present in request headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BrowserKind {
    Chrome,
    Firefox,
}

impl std::fmt::Display for BrowserKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BrowserKind::Chrome => write!(f, "chrome"),
            BrowserKind::Firefox => write!(f, "firefox"),
        }
    }
}

/// Operating system to present in request headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Windows,
    Macos,
    Linux,
    Android,
    Ios,
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Platform::Windows => "windows",
            Platform::Macos => "macos",
            Platform::Linux => "linux",
            Platform::Android => "android",
            Platform::Ios => "ios",
        };
        write!(f, "{s}")
    }
}

/// Browser-emulation descriptor for the client's default headers.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BrowserSettings {
    /// Browser family to emulate.
    pub browser: BrowserKind,
    /// Platform the emulated browser claims to run on.
    pub platform: Platform,
    /// Present a desktop profile; when false, the browser's mobile
    /// profile is used instead.
    pub desktop: bool,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            browser: BrowserKind::Chrome,
            platform: Platform::Windows,
            desktop: true,
        }
    }
}

/// Proxy map with per-scheme endpoints, matching the conventional
/// `http`/`https` keyed layout.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ProxySettings {
    /// Proxy for plain-HTTP requests.
    pub http: Option<String>,
    /// Proxy for HTTPS requests.
    pub https: Option<String>,
}

impl ProxySettings {
    pub fn is_empty(&self) -> bool {
        self.http.is_none() && self.https.is_none()
    }
}

/// Pass-through descriptor for an external CAPTCHA-solving service.
///
/// The crawler never calls the provider; the descriptor exists so a
/// challenge-capable client (or the operator's tooling) can be handed a
/// validated provider name and key.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CaptchaSettings {
    /// Provider name, one of [`KNOWN_CAPTCHA_PROVIDERS`].
    pub provider: String,
    /// Account API key for the provider.
    pub api_key: String,
}

impl CaptchaSettings {
    /// Reject unknown provider names and empty keys.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !KNOWN_CAPTCHA_PROVIDERS.contains(&self.provider.as_str()) {
            return Err(ConfigError::UnknownCaptchaProvider(self.provider.clone()));
        }
        if self.api_key.trim().is_empty() {
            return Err(ConfigError::MissingCaptchaKey(self.provider.clone()));
        }
        Ok(())
    }
}

/// CSS selectors used to pull article fields out of a listing page.
///
/// The defaults fit the common blog-archive markup (article containers with
/// a linked heading, a `<time>` node, and tag/category link lists). Sites
/// with different markup override them in the config file.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Selectors {
    /// Container holding one article listing.
    pub article: String,
    /// Anchor carrying the headline text and the article href.
    pub title: String,
    /// Node carrying the publication date (attribute or text).
    pub date: String,
    /// Anchors carrying tag labels.
    pub tags: String,
    /// Anchors carrying category labels.
    pub categories: String,
}

impl Default for Selectors {
    fn default() -> Self {
        Self {
            article: "article".to_string(),
            title: "h2 a".to_string(),
            date: "time".to_string(),
            tags: ".tags a".to_string(),
            categories: ".categories a".to_string(),
        }
    }
}

impl Selectors {
    /// Compile all five selectors, failing on the first invalid one.
    pub fn compile(&self) -> Result<CompiledSelectors, ConfigError> {
        Ok(CompiledSelectors {
            article: compile_one(&self.article)?,
            title: compile_one(&self.title)?,
            date: compile_one(&self.date)?,
            tags: compile_one(&self.tags)?,
            categories: compile_one(&self.categories)?,
        })
    }
}

fn compile_one(selector: &str) -> Result<Selector, ConfigError> {
    Selector::parse(selector).map_err(|e| ConfigError::Selector {
        selector: selector.to_string(),
        message: e.to_string(),
    })
}

/// Parsed, ready-to-use selector set.
#[derive(Debug, Clone)]
pub struct CompiledSelectors {
    pub article: Selector,
    pub title: Selector,
    pub date: Selector,
    pub tags: Selector,
    pub categories: Selector,
}

/// Request pacing and timeout knobs.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimingSettings {
    /// Base pause between successive page fetches, in milliseconds.
    pub delay_ms: u64,
    /// Upper bound of the random jitter added to each pause.
    pub jitter_ms: u64,
    /// Per-request timeout handed to the HTTP client.
    pub timeout_secs: u64,
}

impl Default for TimingSettings {
    fn default() -> Self {
        Self {
            delay_ms: 500,
            jitter_ms: 250,
            timeout_secs: 30,
        }
    }
}

/// Top-level configuration file contents.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ScrapeConfig {
    /// Optional per-scheme proxy endpoints.
    pub proxy: ProxySettings,
    /// Browser-emulation descriptor.
    pub browser: BrowserSettings,
    /// Optional external CAPTCHA-provider descriptor (pass-through).
    pub captcha: Option<CaptchaSettings>,
    /// Field-extraction selectors.
    pub selectors: Selectors,
    /// Pacing and timeout settings.
    pub timing: TimingSettings,
    /// Pagination path template joined to the archive URL; `{page}` is
    /// replaced by the 1-based page number.
    pub page_path: String,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            proxy: ProxySettings::default(),
            browser: BrowserSettings::default(),
            captcha: None,
            selectors: Selectors::default(),
            timing: TimingSettings::default(),
            page_path: "page/{page}/".to_string(),
        }
    }
}

impl ScrapeConfig {
    /// Cross-field validation that cannot be expressed in serde alone.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(captcha) = &self.captcha {
            captcha.validate()?;
        }
        // Surfaces selector typos at startup instead of mid-crawl.
        self.selectors.compile()?;
        Ok(())
    }
}

/// Load configuration from a YAML file, or fall back to defaults when no
/// path is given.
#[instrument(level = "info", skip_all, fields(path = path.unwrap_or("<defaults>")))]
pub fn load_config(path: Option<&str>) -> Result<ScrapeConfig, ConfigError> {
    let config = match path {
        Some(p) => {
            let contents = fs::read_to_string(p)?;
            let config: ScrapeConfig = serde_yaml::from_str(&contents)?;
            info!(path = p, "Loaded configuration file");
            config
        }
        None => {
            debug!("No config file given; using defaults");
            ScrapeConfig::default()
        }
    };
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_validates() {
        let config = ScrapeConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.proxy.is_empty());
        assert!(config.captcha.is_none());
        assert_eq!(config.page_path, "page/{page}/");
    }

    #[test]
    fn test_full_yaml_roundtrip() {
        let yaml = r#"
proxy:
  http: "http://127.0.0.1:8080"
  https: "http://127.0.0.1:8080"
browser:
  browser: firefox
  platform: linux
  desktop: true
captcha:
  provider: 2captcha
  api_key: "abc123"
selectors:
  article: "div.post"
  title: "h3 a"
timing:
  delay_ms: 1000
  jitter_ms: 0
  timeout_secs: 10
page_path: "?page={page}"
"#;
        let config: ScrapeConfig = serde_yaml::from_str(yaml).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.browser.browser, BrowserKind::Firefox);
        assert_eq!(config.browser.platform, Platform::Linux);
        assert_eq!(config.proxy.http.as_deref(), Some("http://127.0.0.1:8080"));
        assert_eq!(config.captcha.as_ref().unwrap().provider, "2captcha");
        assert_eq!(config.selectors.article, "div.post");
        // Sections that were omitted keep their defaults.
        assert_eq!(config.selectors.date, "time");
        assert_eq!(config.timing.delay_ms, 1000);
        assert_eq!(config.page_path, "?page={page}");
    }

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let yaml = "browser:\n  browser: firefox\n";
        let config: ScrapeConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.browser.browser, BrowserKind::Firefox);
        // Unset sub-keys default too.
        assert_eq!(config.browser.platform, Platform::Windows);
        assert!(config.browser.desktop);
        assert_eq!(config.timing.timeout_secs, 30);
    }

    #[test]
    fn test_unknown_captcha_provider_rejected() {
        let config = ScrapeConfig {
            captcha: Some(CaptchaSettings {
                provider: "deathbycaptcha".to_string(),
                api_key: "k".to_string(),
            }),
            ..ScrapeConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::UnknownCaptchaProvider(p)) if p == "deathbycaptcha"
        ));
    }

    #[test]
    fn test_empty_captcha_key_rejected() {
        let config = ScrapeConfig {
            captcha: Some(CaptchaSettings {
                provider: "capsolver".to_string(),
                api_key: "   ".to_string(),
            }),
            ..ScrapeConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingCaptchaKey(_))
        ));
    }

    #[test]
    fn test_invalid_selector_rejected() {
        let config = ScrapeConfig {
            selectors: Selectors {
                article: "article[".to_string(),
                ..Selectors::default()
            },
            ..ScrapeConfig::default()
        };
        match config.validate() {
            Err(ConfigError::Selector { selector, .. }) => assert_eq!(selector, "article["),
            other => panic!("expected selector error, got {other:?}"),
        }
    }

    #[test]
    fn test_selectors_compile() {
        let compiled = Selectors::default().compile();
        assert!(compiled.is_ok());
    }

    #[test]
    fn test_load_config_without_path_uses_defaults() {
        let config = load_config(None).unwrap();
        assert_eq!(config.timing.delay_ms, 500);
    }
}
