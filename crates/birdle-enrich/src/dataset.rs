use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::types::BirdRecord;

#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("Expected a JSON array of objects in {0}")]
    NotAnArray(PathBuf),
}

/// Loads the whole dataset; the top level must be an array of objects.
pub fn load_records(path: impl AsRef<Path>) -> Result<Vec<BirdRecord>, DatasetError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| DatasetError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let value: Value =
        serde_json::from_reader(BufReader::new(file)).map_err(|source| DatasetError::Json {
            path: path.to_path_buf(),
            source,
        })?;

    let Value::Array(items) = value else {
        return Err(DatasetError::NotAnArray(path.to_path_buf()));
    };

    items
        .into_iter()
        .map(|item| match item {
            Value::Object(fields) => Ok(BirdRecord::new(fields)),
            _ => Err(DatasetError::NotAnArray(path.to_path_buf())),
        })
        .collect()
}

/// Writes the whole dataset as pretty-printed UTF-8 JSON.
pub fn save_records(path: impl AsRef<Path>, records: &[BirdRecord]) -> Result<(), DatasetError> {
    let path = path.as_ref();
    let write_err = |source| DatasetError::Write {
        path: path.to_path_buf(),
        source,
    };

    let mut writer = BufWriter::new(File::create(path).map_err(write_err)?);
    serde_json::to_writer_pretty(&mut writer, records).map_err(|source| DatasetError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    writer.write_all(b"\n").map_err(write_err)?;
    writer.flush().map_err(write_err)?;

    log::debug!("Wrote {} record(s) to {}", records.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_round_trip_keeps_fields_and_order() {
        let dir = tempfile::tempdir().expect("tempdir");
        let input = dir.path().join("birds.json");
        let output = dir.path().join("out.json");
        fs::write(
            &input,
            r#"[
  {"Name": "Kākāpō", "Order": "Psittaciformes", "Picture": "<iframe src=\"https://macaulaylibrary.org/asset/123/embed\"></iframe>"},
  {"Name": "Kea", "Contributor": "X"}
]"#,
        )
        .expect("write input");

        let mut records = load_records(&input).expect("load");
        assert_eq!(records.len(), 2);
        records[0].set_contributor("");
        save_records(&output, &records).expect("save");

        let written = fs::read_to_string(&output).expect("read output");
        assert!(written.contains("Kākāpō"), "non-ASCII must not be escaped");
        assert!(written.contains("\n  {\n    \"Name\""), "two-space indent");

        let reloaded = load_records(&output).expect("reload");
        assert_eq!(reloaded, records);
        let keys: Vec<&str> = reloaded[0].fields().keys().map(String::as_str).collect();
        assert_eq!(keys, ["Name", "Order", "Picture", "Contributor"]);
    }

    #[test]
    fn test_rejects_non_array() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("birds.json");
        fs::write(&path, r#"{"Name": "Kea"}"#).expect("write");

        assert!(matches!(
            load_records(&path),
            Err(DatasetError::NotAnArray(_))
        ));
    }

    #[test]
    fn test_rejects_non_object_items() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("birds.json");
        fs::write(&path, r#"[{"Name": "Kea"}, 4]"#).expect("write");

        assert!(matches!(
            load_records(&path),
            Err(DatasetError::NotAnArray(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        let err = load_records("/nonexistent/birds.json").unwrap_err();
        assert!(matches!(err, DatasetError::Read { .. }));
        assert!(err.to_string().contains("/nonexistent/birds.json"));
    }

    #[test]
    fn test_invalid_json() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("birds.json");
        fs::write(&path, "[{").expect("write");

        assert!(matches!(load_records(&path), Err(DatasetError::Json { .. })));
    }
}
