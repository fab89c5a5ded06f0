use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use serde::Serialize;

use crate::contributor::{ContributorScraper, extract_asset_id};
use crate::names::BrowserError;
use crate::types::{BirdRecord, CONTRIBUTOR, CommonNames};
use crate::utils::retain_shared_languages;

/// Delay after every contributor lookup, to stay polite with the server.
pub const DEFAULT_DELAY: Duration = Duration::from_secs(1);

/// Resolves an asset id to its contributor's display name.
pub trait ContributorLookup {
    fn lookup(&self, asset_id: &str) -> impl Future<Output = Option<String>>;
}

impl ContributorLookup for ContributorScraper {
    async fn lookup(&self, asset_id: &str) -> Option<String> {
        self.fetch_contributor(asset_id).await
    }
}

/// Produces the language -> common name table of a detail page.
pub trait NameTableSource {
    fn common_names(&mut self, url: &str) -> Result<CommonNames, BrowserError>;
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct ContributorReport {
    pub skipped: usize,
    pub missing_asset_id: usize,
    pub resolved: usize,
    pub unresolved: usize,
}

impl Display for ContributorReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "\nContributors:")?;
        writeln!(f, "  Already set:      {}", self.skipped)?;
        writeln!(f, "  No asset id:      {}", self.missing_asset_id)?;
        writeln!(f, "  Resolved:         {}", self.resolved)?;
        writeln!(f, "  Not found:        {}", self.unresolved)
    }
}

/// Fills in `Contributor` for every record that does not have one yet.
///
/// Records keep their order. Unresolvable records get an empty string so a
/// rerun only revisits records without a name.
pub async fn enrich_contributors<L: ContributorLookup>(
    records: &mut [BirdRecord],
    lookup: &L,
    delay: Duration,
) -> ContributorReport {
    let mut report = ContributorReport::default();

    for (idx, bird) in records.iter_mut().enumerate() {
        let idx = idx + 1;

        if bird.has_contributor() {
            log::info!(
                "[{}] {}: already has Contributor = {}",
                idx,
                bird.name(),
                bird.fields()
                    .get(CONTRIBUTOR)
                    .map(ToString::to_string)
                    .unwrap_or_default()
            );
            report.skipped += 1;
            continue;
        }

        let Some(asset_id) = extract_asset_id(bird.picture()) else {
            log::info!("[{}] {}: no asset id found, skipping.", idx, bird.name());
            bird.set_contributor("");
            report.missing_asset_id += 1;
            continue;
        };

        log::info!("[{}] {}: asset {}", idx, bird.name(), asset_id);
        match lookup.lookup(&asset_id).await {
            Some(name) => {
                bird.set_contributor(name);
                report.resolved += 1;
            }
            None => {
                bird.set_contributor("");
                report.unresolved += 1;
            }
        }

        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }

    report
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct NamesReport {
    pub extracted: usize,
    pub failed: usize,
    pub shared_languages: Vec<String>,
}

impl Display for NamesReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "\n🌍 Languages shared by ALL birds:")?;
        for lang in &self.shared_languages {
            writeln!(f, "  • {}", lang)?;
        }
        writeln!(f, "\nCommon names:")?;
        writeln!(f, "  Extracted:        {}", self.extracted)?;
        writeln!(f, "  Failed:           {}", self.failed)
    }
}

/// Stores every record's common-name table, then narrows all tables down to
/// the languages every record has.
///
/// A failing page leaves that record with an empty table; the run goes on.
pub fn enrich_common_names<S: NameTableSource>(
    records: &mut [BirdRecord],
    source: &mut S,
) -> NamesReport {
    let mut report = NamesReport::default();

    for (idx, bird) in records.iter_mut().enumerate() {
        let result = match bird.doi() {
            Some(doi) => source.common_names(doi),
            None => Err(BrowserError::MissingDoi),
        };

        let names = match result {
            Ok(names) => {
                log::info!("[{}] {}: ✔ Extracted {} names", idx + 1, bird.name(), names.len());
                report.extracted += 1;
                names
            }
            Err(e) => {
                log::warn!("[{}] {}: ❌ Error: {}", idx + 1, bird.name(), e);
                report.failed += 1;
                CommonNames::new()
            }
        };
        bird.set_common_names(names);
    }

    report.shared_languages = retain_shared_languages(records);
    report
}
