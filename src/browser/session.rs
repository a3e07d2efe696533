//! The live browser session on the registry site

use crate::browser::setup::launch_browser;
use crate::config::{BrowserConfig, TimingConfig};
use crate::crawler::traits::{ItemRef, Navigator, PageSnapshot, PageTarget};
use crate::query::Query;
use crate::{HarvestError, StepError, StepResult};
use chromiumoxide::browser::Browser;
use chromiumoxide::element::Element;
use chromiumoxide::page::Page;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

const QUERY_INPUT: &str = "#prd_cd_nm";
const SEARCH_BUTTON: &str = "#srchBtn";
const PAGE_SIZE_TOGGLE: &str = r#"//*[@id="a_list_cnt"]"#;
const LARGEST_PAGE_SIZE: &str =
    r#"//*[@id="contents"]/main/section/div[2]/div[2]/div[2]/div[5]/ul/li[5]/a"#;
/// Hovering the listing reveals the item links
const LISTING_HOVER_TARGET: &str = r#"//*[@id="tbody"]/tr[1]/td[6]/span[2]"#;
const COMPANY_LINK: &str = "/html/body/div[4]/div/div/div/div[2]/div[2]/table[1]/tbody/tr/td[1]/a";
const CLOSE_BUTTON: &str = r#"//*[@id="close"]"#;

/// XPath of an item's link in the listing
fn item_link_xpath(item: &ItemRef) -> String {
    format!(r#"//*[@id="{}"]"#, item.handle)
}

/// XPath of a control of the page-link widget
fn page_link_xpath(target: PageTarget) -> String {
    format!(
        r#"//*[@id="contents"]/main/section/div[2]/div[3]/div/ul/li[{}]/a"#,
        target.slot()
    )
}

fn navigation_error(what: &str) -> impl FnOnce(chromiumoxide::error::CdpError) -> StepError + '_ {
    move |e| StepError::navigation(format!("{}: {}", what, e))
}

/// One Chrome page driven over CDP
pub struct BrowserSession {
    browser: Browser,
    page: Page,
    handler: JoinHandle<()>,
    entry_url: String,
    expand_click_gap: Duration,
}

impl BrowserSession {
    /// Launches Chrome and opens a blank page
    ///
    /// # Errors
    ///
    /// Returns `HarvestError::Browser` if no executable is found or Chrome
    /// fails to start.
    pub async fn launch(config: &BrowserConfig, timing: &TimingConfig) -> Result<Self, HarvestError> {
        let (browser, handler) = launch_browser(config).await?;
        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                handler.abort();
                return Err(HarvestError::Browser(format!("Failed to open page: {}", e)));
            }
        };

        Ok(Self {
            browser,
            page,
            handler,
            entry_url: config.entry_url.clone(),
            expand_click_gap: timing.expand_click_gap(),
        })
    }

    /// Closes Chrome and stops the event handler
    pub async fn close(mut self) {
        if let Err(e) = self.browser.close().await {
            warn!("Failed to close browser: {}", e);
        }
        if let Err(e) = self.browser.wait().await {
            warn!("Failed to wait for browser exit: {}", e);
        }
        self.handler.abort();
        info!("Browser closed");
    }

    async fn xpath(&self, xpath: &str) -> StepResult<Element> {
        self.page
            .find_xpath(xpath)
            .await
            .map_err(navigation_error(xpath))
    }

    async fn click_xpath(&self, xpath: &str) -> StepResult<()> {
        self.xpath(xpath)
            .await?
            .click()
            .await
            .map_err(navigation_error(xpath))?;
        Ok(())
    }

    async fn click_css(&self, css: &str) -> StepResult<Element> {
        let element = self
            .page
            .find_element(css)
            .await
            .map_err(navigation_error(css))?;
        element.click().await.map_err(navigation_error(css))?;
        Ok(element)
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        self.handler.abort();
    }
}

impl Navigator for BrowserSession {
    async fn open_entry(&mut self) -> StepResult<()> {
        debug!("Opening {}", self.entry_url);
        self.page
            .goto(self.entry_url.as_str())
            .await
            .map_err(navigation_error("entry page"))?;
        Ok(())
    }

    async fn submit_query(&mut self, query: &Query) -> StepResult<()> {
        self.click_css(QUERY_INPUT)
            .await?
            .type_str(query.text())
            .await
            .map_err(navigation_error(QUERY_INPUT))?;
        self.click_css(SEARCH_BUTTON).await?;
        Ok(())
    }

    async fn expand_page_size(&mut self) -> StepResult<()> {
        self.click_xpath(PAGE_SIZE_TOGGLE).await?;
        tokio::time::sleep(self.expand_click_gap).await;
        self.click_xpath(LARGEST_PAGE_SIZE).await
    }

    async fn open_item(&mut self, item: &ItemRef) -> StepResult<()> {
        self.xpath(LISTING_HOVER_TARGET)
            .await?
            .hover()
            .await
            .map_err(navigation_error(LISTING_HOVER_TARGET))?;
        self.click_xpath(&item_link_xpath(item)).await
    }

    async fn open_company(&mut self) -> StepResult<()> {
        self.click_xpath(COMPANY_LINK).await
    }

    async fn return_to_listing(&mut self) -> StepResult<()> {
        self.click_xpath(CLOSE_BUTTON).await
    }

    async fn go_to_page(&mut self, target: PageTarget) -> StepResult<()> {
        self.click_xpath(&page_link_xpath(target)).await
    }

    async fn snapshot(&mut self) -> StepResult<PageSnapshot> {
        let url = self
            .page
            .url()
            .await
            .map_err(navigation_error("page url"))?
            .unwrap_or_else(|| "about:blank".to_string());
        let html = self
            .page
            .content()
            .await
            .map_err(navigation_error("page content"))?;
        Ok(PageSnapshot { url, html })
    }
}
