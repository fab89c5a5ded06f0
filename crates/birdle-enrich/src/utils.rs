use indexmap::IndexMap;
use serde::Serialize;

use crate::types::{BirdRecord, CommonNames};

/// Labels that appear in the `commonNames` of every record, in the order they
/// were first seen.
pub fn shared_languages(records: &[BirdRecord]) -> Vec<String> {
    let mut counts: IndexMap<String, usize> = IndexMap::new();
    for record in records {
        for lang in record.common_names().into_keys() {
            *counts.entry(lang).or_default() += 1;
        }
    }

    counts
        .into_iter()
        .filter(|(_, count)| *count == records.len())
        .map(|(lang, _)| lang)
        .collect()
}

/// Drops every label that is not present in all records and returns the
/// labels that were kept. Afterwards every record carries the same key set.
pub fn retain_shared_languages(records: &mut [BirdRecord]) -> Vec<String> {
    let shared = shared_languages(records);

    for record in records.iter_mut() {
        let names: CommonNames = record
            .common_names()
            .into_iter()
            .filter(|(lang, _)| shared.contains(lang))
            .collect();
        record.set_common_names(names);
    }

    shared
}

#[derive(Debug, Serialize)]
pub struct DatasetStats {
    pub total: usize,
    pub with_picture: usize,
    pub with_contributor: usize,
    pub with_common_names: usize,
    pub shared_languages: Vec<String>,
}

impl DatasetStats {
    pub fn from_records(records: &[BirdRecord]) -> DatasetStats {
        DatasetStats {
            total: records.len(),
            with_picture: records.iter().filter(|r| r.picture().is_some()).count(),
            with_contributor: records.iter().filter(|r| r.has_contributor()).count(),
            with_common_names: records
                .iter()
                .filter(|r| !r.common_names().is_empty())
                .count(),
            shared_languages: shared_languages(records),
        }
    }
}

impl std::fmt::Display for DatasetStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "\nStatistics:")?;
        writeln!(f, "  Records:                {}", self.total)?;
        writeln!(f, "  With picture:           {}", self.with_picture)?;
        writeln!(f, "  With contributor:       {}", self.with_contributor)?;
        writeln!(f, "  With common names:      {}", self.with_common_names)?;
        writeln!(
            f,
            "  Languages shared by all: {}",
            self.shared_languages.len()
        )?;
        for lang in &self.shared_languages {
            writeln!(f, "    • {}", lang)?;
        }
        Ok(())
    }
}
