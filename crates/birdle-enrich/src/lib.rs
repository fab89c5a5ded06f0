pub mod contributor;
pub mod dataset;
pub mod names;
pub mod pipeline;
pub mod types;
pub mod utils;

pub use contributor::ContributorScraper;
pub use names::NamesBrowser;
pub use types::BirdRecord;

pub const DEFAULT_INPUT: &str = "birds.json";
pub const CONTRIBUTORS_OUTPUT: &str = "birds_with_contributors.json";
pub const NAMES_OUTPUT: &str = "birds_with_contributors_and_names.json";
