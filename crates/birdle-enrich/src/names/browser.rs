use super::parser::{DIALOG_SELECTOR, find_names_toggle, parse_name_rows};
use crate::pipeline::NameTableSource;
use crate::types::CommonNames;

use headless_chrome::{Browser, LaunchOptions, Tab};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

#[derive(Debug, thiserror::Error)]
pub enum BrowserError {
    #[error("Failed to launch browser: {0}")]
    Launch(String),
    #[error("Browser error: {0}")]
    Chrome(String),
    #[error("Timed out after {0:?} waiting for the 'Names (N)' toggle")]
    ToggleTimeout(Duration),
    #[error("Timed out after {0:?} waiting for the common names dialog")]
    DialogTimeout(Duration),
    #[error("Record has no Doi URL")]
    MissingDoi,
}

impl From<anyhow::Error> for BrowserError {
    fn from(e: anyhow::Error) -> Self {
        BrowserError::Chrome(format!("{e:#}"))
    }
}

#[derive(Debug, Clone)]
pub struct NamesOptions {
    pub headless: bool,
    pub navigation_timeout: Duration,
    pub toggle_timeout: Duration,
    pub dialog_timeout: Duration,
    /// Upper bound on waiting for the dialog's rows to stop changing.
    pub settle_budget: Duration,
    pub poll_interval: Duration,
}

impl Default for NamesOptions {
    fn default() -> Self {
        Self {
            headless: true,
            navigation_timeout: Duration::from_secs(30),
            toggle_timeout: Duration::from_secs(60),
            dialog_timeout: Duration::from_secs(60),
            settle_budget: Duration::from_secs(10),
            poll_interval: Duration::from_millis(250),
        }
    }
}

/// Polls `read` until it returns the same non-zero number of items twice in
/// a row, or until `budget` runs out, in which case the last read is returned.
pub(crate) fn poll_until_stable<T, E, F>(
    budget: Duration,
    interval: Duration,
    mut read: F,
) -> Result<Vec<T>, E>
where
    F: FnMut() -> Result<Vec<T>, E>,
{
    let deadline = Instant::now() + budget;
    let mut last_len = None;

    loop {
        let items = read()?;
        if !items.is_empty() && last_len == Some(items.len()) {
            return Ok(items);
        }
        if Instant::now() >= deadline {
            log::debug!("Row count still changing after {:?}, using {}", budget, items.len());
            return Ok(items);
        }
        last_len = Some(items.len());
        thread::sleep(interval);
    }
}

/// A single headless Chrome tab reused for every detail page.
///
/// The browser process is shut down when this value is dropped.
pub struct NamesBrowser {
    _browser: Browser,
    tab: Arc<Tab>,
    options: NamesOptions,
}

impl NamesBrowser {
    pub fn launch(options: NamesOptions) -> Result<Self, BrowserError> {
        let launch_options = LaunchOptions::default_builder()
            .headless(options.headless)
            .idle_browser_timeout(options.toggle_timeout + options.dialog_timeout)
            .build()
            .map_err(|e| BrowserError::Launch(e.to_string()))?;

        let browser =
            Browser::new(launch_options).map_err(|e| BrowserError::Launch(format!("{e:#}")))?;
        let tab = browser.new_tab()?;
        tab.set_default_timeout(options.navigation_timeout);

        log::info!("Launched browser (headless: {})", options.headless);

        Ok(Self {
            _browser: browser,
            tab,
            options,
        })
    }

    pub fn open(&self, url: &str) -> Result<(), BrowserError> {
        log::info!("🔎 Loading: {}", url);
        self.tab.navigate_to(url)?;
        self.tab.wait_until_navigated()?;
        Ok(())
    }

    /// Opens the "Names (N)" dialog on the current page and reads its table.
    pub fn extract_names(&self) -> Result<CommonNames, BrowserError> {
        self.click_names_toggle()?;

        self.tab
            .wait_for_element_with_custom_timeout(DIALOG_SELECTOR, self.options.dialog_timeout)
            .map_err(|e| {
                log::debug!("Dialog wait failed: {e:#}");
                BrowserError::DialogTimeout(self.options.dialog_timeout)
            })?;

        let rows = poll_until_stable(self.options.settle_budget, self.options.poll_interval, || {
            self.dialog_html().map(|html| parse_name_rows(&html))
        })?;

        Ok(rows.into_iter().collect())
    }

    fn click_names_toggle(&self) -> Result<(), BrowserError> {
        let deadline = Instant::now() + self.options.toggle_timeout;

        loop {
            let html = self.tab.get_content().unwrap_or_default();

            // the page may re-render between snapshot and lookup, so a miss means "not yet"
            if let Some(toggle) = find_names_toggle(&html)
                && let Ok(element) = self.tab.find_element_by_xpath(&toggle.xpath)
            {
                log::debug!("Clicking toggle '{}' at {}", toggle.text, toggle.xpath);
                element.click()?;
                return Ok(());
            }

            if Instant::now() >= deadline {
                return Err(BrowserError::ToggleTimeout(self.options.toggle_timeout));
            }
            thread::sleep(self.options.poll_interval);
        }
    }

    fn dialog_html(&self) -> Result<String, BrowserError> {
        let dialog = self.tab.find_element(DIALOG_SELECTOR)?;
        let outer_html = dialog.call_js_fn("function() { return this.outerHTML; }", vec![], false)?;

        Ok(outer_html
            .value
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default())
    }
}

impl NameTableSource for NamesBrowser {
    fn common_names(&mut self, url: &str) -> Result<CommonNames, BrowserError> {
        self.open(url)?;
        self.extract_names()
    }
}
