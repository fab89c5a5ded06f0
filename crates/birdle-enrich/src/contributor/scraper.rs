use super::parser::parse_contributor;

use reqwest::Client;
use std::time::Duration;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

#[derive(Debug, thiserror::Error)]
pub enum ScraperError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),
}

/// Fetches Macaulay Library asset pages and reads the contributor off them.
#[derive(Debug, Clone)]
pub struct ContributorScraper {
    client: Client,
    base_url: String,
}

impl ContributorScraper {
    pub fn new() -> Result<Self, ScraperError> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, ScraperError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(format!(
                "{}/{}",
                env!("CARGO_PKG_NAME"),
                env!("CARGO_PKG_VERSION")
            ))
            .build()?;

        Ok(Self {
            client,
            base_url: super::BASE_URL.to_string(),
        })
    }

    /// Points the scraper at another host, e.g. a local test server.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn asset_url(&self, asset_id: &str) -> String {
        format!("{}/asset/{}", self.base_url, asset_id)
    }

    pub async fn fetch_asset_page(&self, asset_id: &str) -> Result<String, ScraperError> {
        let url = self.asset_url(asset_id);
        Ok(self
            .client
            .get(&url)
            .send()
            .await
            .inspect_err(|e| log::error!("HTTP error: {e:?}"))?
            .error_for_status()?
            .text()
            .await
            .inspect_err(|e| log::error!("Decode error: {e:?}"))?)
    }

    /// One attempt, no retry: any HTTP failure is logged and reported as `None`.
    pub async fn fetch_contributor(&self, asset_id: &str) -> Option<String> {
        log::info!("Fetching contributor for asset {} ...", asset_id);

        match self.fetch_asset_page(asset_id).await {
            Ok(html) => parse_contributor(&html),
            Err(e) => {
                log::warn!("  ! HTTP error for {}: {}", asset_id, e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_asset_url() {
        let scraper = ContributorScraper::new().expect("client");
        assert_eq!(
            scraper.asset_url("12345"),
            "https://macaulaylibrary.org/asset/12345"
        );

        let local = scraper.with_base_url("http://127.0.0.1:8080/");
        assert_eq!(local.asset_url("7"), "http://127.0.0.1:8080/asset/7");
    }

    #[tokio::test]
    async fn test_connection_refused_is_none() {
        // nothing listens on port 1
        let scraper = ContributorScraper::with_timeout(Duration::from_secs(2))
            .expect("client")
            .with_base_url("http://127.0.0.1:1");

        assert!(scraper.fetch_asset_page("1").await.is_err());
        assert_eq!(scraper.fetch_contributor("1").await, None);
    }
}
