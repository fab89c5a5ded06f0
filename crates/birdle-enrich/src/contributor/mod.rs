mod parser;
pub mod scraper;

pub use parser::{extract_asset_id, parse_contributor};
pub use scraper::{ContributorScraper, ScraperError};

pub(crate) const BASE_URL: &str = "https://macaulaylibrary.org";
