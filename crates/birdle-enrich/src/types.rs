use std::fmt::Display;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const NAME: &str = "Name";
pub const PICTURE: &str = "Picture";
pub const DOI: &str = "Doi";
pub const CONTRIBUTOR: &str = "Contributor";
pub const COMMON_NAMES: &str = "commonNames";

/// Language label -> localized common name, in the order the labels were
/// first seen. Re-inserting a label updates its name in place.
pub type CommonNames = IndexMap<String, String>;

/// A single entry of the Birdle dataset.
///
/// Only the fields the pipelines read or write get accessors; everything else
/// (`Order`, `Family`, `Mass`, ...) is kept verbatim and in its input key
/// order so that a load/save cycle touches nothing but `Contributor` and
/// `commonNames`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BirdRecord(Map<String, Value>);

impl BirdRecord {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    fn str_field(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    pub fn name(&self) -> &str {
        self.str_field(NAME).unwrap_or("<unnamed>")
    }

    pub fn picture(&self) -> Option<&str> {
        self.str_field(PICTURE)
    }

    pub fn doi(&self) -> Option<&str> {
        self.str_field(DOI).filter(|doi| !doi.trim().is_empty())
    }

    pub fn contributor(&self) -> Option<&str> {
        self.str_field(CONTRIBUTOR)
    }

    /// True when `Contributor` holds anything truthy: a non-empty string,
    /// `true`, a non-zero number or a non-empty array/object. Such records
    /// are left alone by the contributor pipeline.
    pub fn has_contributor(&self) -> bool {
        match self.0.get(CONTRIBUTOR) {
            None | Some(Value::Null) => false,
            Some(Value::Bool(set)) => *set,
            Some(Value::Number(n)) => n.as_f64().is_some_and(|n| n != 0.0),
            Some(Value::String(s)) => !s.is_empty(),
            Some(Value::Array(items)) => !items.is_empty(),
            Some(Value::Object(fields)) => !fields.is_empty(),
        }
    }

    pub fn set_contributor(&mut self, contributor: impl Into<String>) {
        self.0
            .insert(CONTRIBUTOR.to_string(), Value::String(contributor.into()));
    }

    /// Reads `commonNames`, skipping any value that is not a string.
    pub fn common_names(&self) -> CommonNames {
        self.0
            .get(COMMON_NAMES)
            .and_then(Value::as_object)
            .map(|names| {
                names
                    .iter()
                    .filter_map(|(lang, name)| Some((lang.clone(), name.as_str()?.to_string())))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn set_common_names(&mut self, names: CommonNames) {
        let object = names
            .into_iter()
            .map(|(lang, name)| (lang, Value::String(name)))
            .collect::<Map<_, _>>();
        self.0.insert(COMMON_NAMES.to_string(), Value::Object(object));
    }
}

impl From<Map<String, Value>> for BirdRecord {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}

impl Display for BirdRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())?;
        match self.contributor() {
            Some(c) if !c.is_empty() => write!(f, " (© {})", c)?,
            _ => {}
        }
        let names = self.common_names();
        if !names.is_empty() {
            write!(f, " [{} common name(s)]", names.len())?;
        }
        Ok(())
    }
}
