//! Column manifests returned by the backend after an upload.

use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;

/// A column, qualified by its source file when the dataset spans several files.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ColumnRef {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

impl ColumnRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            file: None,
        }
    }

    pub fn in_file(name: impl Into<String>, file: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            file: Some(file.into()),
        }
    }

    /// Stable identifier used for form field names and query keys.
    pub fn key(&self) -> String {
        match &self.file {
            Some(file) => format!("{}:{}", file, self.name),
            None => self.name.clone(),
        }
    }
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.file {
            Some(file) => write!(f, "{} ({})", self.name, file),
            None => f.write_str(&self.name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnManifest {
    /// Single-file dataset: column names only.
    Flat(Vec<String>),
    /// Multi-file dataset: file name to its column names.
    PerFile(BTreeMap<String, Vec<String>>),
}

impl Default for ColumnManifest {
    fn default() -> Self {
        ColumnManifest::Flat(Vec::new())
    }
}

impl ColumnManifest {
    pub fn flat<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        ColumnManifest::Flat(normalize_names(names))
    }

    pub fn per_file<I, F, N, S>(files: I) -> Self
    where
        I: IntoIterator<Item = (F, N)>,
        F: Into<String>,
        N: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let files = files
            .into_iter()
            .map(|(file, names)| (file.into(), normalize_names(names)))
            .collect();
        ColumnManifest::PerFile(files)
    }

    pub fn columns(&self) -> Vec<ColumnRef> {
        match self {
            ColumnManifest::Flat(names) => names.iter().map(ColumnRef::new).collect(),
            ColumnManifest::PerFile(files) => files
                .iter()
                .flat_map(|(file, names)| {
                    names.iter().map(move |name| ColumnRef::in_file(name, file))
                })
                .collect(),
        }
    }

    pub fn contains(&self, column: &ColumnRef) -> bool {
        match (self, &column.file) {
            (ColumnManifest::Flat(names), None) => names.contains(&column.name),
            (ColumnManifest::PerFile(files), Some(file)) => files
                .get(file)
                .is_some_and(|names| names.contains(&column.name)),
            _ => false,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ColumnManifest::Flat(names) => names.len(),
            ColumnManifest::PerFile(files) => files.values().map(Vec::len).sum(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_multi_file(&self) -> bool {
        matches!(self, ColumnManifest::PerFile(_))
    }
}

/// Trims names, drops blanks, keeps the first of any duplicate.
fn normalize_names<I, S>(names: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for name in names {
        let name = name.as_ref().trim();
        if name.is_empty() {
            continue;
        }
        if !seen.insert(name.to_string()) {
            debug!("Dropping duplicate column '{}'", name);
            continue;
        }
        out.push(name.to_string());
    }
    out
}

/// Best-effort header row of a CSV file, shown while the upload is in flight.
/// The backend's column list always replaces it.
pub fn preview_headers(bytes: &[u8]) -> Vec<String> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(bytes);
    match reader.headers() {
        Ok(record) => normalize_names(record.iter()),
        Err(e) => {
            debug!("Header preview unavailable: {}", e);
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_manifest_normalizes_names() {
        let manifest = ColumnManifest::flat([" age", "income ", "", "age", "label"]);
        assert_eq!(
            manifest,
            ColumnManifest::Flat(vec!["age".into(), "income".into(), "label".into()])
        );
        assert_eq!(manifest.len(), 3);
        assert!(manifest.contains(&ColumnRef::new("income")));
        assert!(!manifest.contains(&ColumnRef::in_file("income", "a.csv")));
    }

    #[test]
    fn per_file_manifest_disambiguates_by_file() {
        let manifest = ColumnManifest::per_file([
            ("movies.csv", vec!["movieId", "title"]),
            ("ratings.csv", vec!["userId", "movieId", "rating"]),
        ]);
        let columns = manifest.columns();
        assert_eq!(columns.len(), 5);
        assert!(columns.contains(&ColumnRef::in_file("movieId", "movies.csv")));
        assert!(columns.contains(&ColumnRef::in_file("movieId", "ratings.csv")));
        assert_ne!(
            ColumnRef::in_file("movieId", "movies.csv").key(),
            ColumnRef::in_file("movieId", "ratings.csv").key()
        );
        assert!(!manifest.contains(&ColumnRef::new("movieId")));
    }

    #[test]
    fn preview_reads_quoted_header_fields() {
        let csv = b"\"name, full\",age,\"score\"\nAda,36,9.5\n";
        assert_eq!(preview_headers(csv), vec!["name, full", "age", "score"]);
    }

    #[test]
    fn preview_of_empty_file_is_empty() {
        assert!(preview_headers(b"").is_empty());
    }
}
