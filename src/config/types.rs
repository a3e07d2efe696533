use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Registry search page the crawl starts from
pub const DEFAULT_ENTRY_URL: &str = "https://www.foodsafetykorea.go.kr/portal/specialinfo/searchInfoProduct.do?menu_grp=MENU_NEW04&menu_no=2815";

/// Main configuration structure for Registry-Harvester
///
/// Every section falls back to its defaults, so an empty file (or no file at
/// all) is a valid configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub browser: BrowserConfig,
}

/// Attempt budgets for every retried step
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Attempts per item envelope (item page, company page, persistence)
    #[serde(rename = "item-attempts")]
    pub item_attempts: u32,

    /// Retries of an item that wait the short fail delay before switching to the long one
    #[serde(rename = "item-short-delay-threshold")]
    pub item_short_delay_threshold: u32,

    /// Attempts to read the listing of the current page
    #[serde(rename = "listing-attempts")]
    pub listing_attempts: u32,

    /// Attempts to switch the listing to its largest page size
    #[serde(rename = "expand-attempts")]
    pub expand_attempts: u32,

    /// Attempts to move to the next listing page
    #[serde(rename = "pagination-attempts")]
    pub pagination_attempts: u32,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            item_attempts: 20,
            item_short_delay_threshold: 5,
            listing_attempts: 5,
            expand_attempts: 5,
            pagination_attempts: 3,
        }
    }
}

/// Settle and backoff delays, in seconds
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Wait after opening an item or company page
    #[serde(rename = "short-settle")]
    pub short_settle: u64,

    /// Wait after a listing re-render (query, page size, pagination)
    #[serde(rename = "long-settle")]
    pub long_settle: u64,

    /// Backoff after an early failure
    #[serde(rename = "fail-delay")]
    pub fail_delay: u64,

    /// Backoff once failures keep piling up
    #[serde(rename = "long-fail-delay")]
    pub long_fail_delay: u64,

    /// Pause between opening the page-size menu and picking the largest size
    #[serde(rename = "expand-click-gap")]
    pub expand_click_gap: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            short_settle: 3,
            long_settle: 20,
            fail_delay: 5,
            long_fail_delay: 20,
            expand_click_gap: 1,
        }
    }
}

impl TimingConfig {
    pub fn short_settle(&self) -> Duration {
        Duration::from_secs(self.short_settle)
    }

    pub fn long_settle(&self) -> Duration {
        Duration::from_secs(self.long_settle)
    }

    pub fn fail_delay(&self) -> Duration {
        Duration::from_secs(self.fail_delay)
    }

    pub fn long_fail_delay(&self) -> Duration {
        Duration::from_secs(self.long_fail_delay)
    }

    pub fn expand_click_gap(&self) -> Duration {
        Duration::from_secs(self.expand_click_gap)
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Root of the per-record directory tree
    #[serde(rename = "collect-path")]
    pub collect_path: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            collect_path: PathBuf::from("./foodsafetykorea_crawl"),
        }
    }
}

/// Browser session configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// Search page opened before the query is submitted
    #[serde(rename = "entry-url")]
    pub entry_url: String,

    /// Run Chrome without a window
    pub headless: bool,

    /// CDP request timeout in seconds
    #[serde(rename = "request-timeout")]
    pub request_timeout: u64,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            entry_url: DEFAULT_ENTRY_URL.to_string(),
            headless: false,
            request_timeout: 30,
        }
    }
}
