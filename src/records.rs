//! Input records for the layout pipeline
//!
//! Two JSON documents feed the builder: a list of tag statistics and a list of
//! tag-pair co-occurrence statistics. Both are plain arrays of objects:
//!
//! ```json
//! [{ "tag": "rust", "count": 41230, "cluster": 3 }]
//! [{ "tag1": "rust", "tag2": "cargo", "pairCount": 812, "pairCountNormalized": 0.42 }]
//! ```
//!
//! Pair objects may carry extra fields; they are kept verbatim and passed
//! through to the edge attributes of the output document.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Errors that can occur while loading input documents
#[derive(Error, Debug)]
pub enum InputError {
    #[error("Failed to read input file {path}: {source}")]
    IoError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse input file {path}: {source}")]
    ParseError {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Frequency statistics for a single tag
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagRecord {
    /// Unique tag identifier, becomes the node id
    pub tag: String,
    /// Number of occurrences, drives node size
    pub count: u64,
    /// Category assigned by upstream clustering (absent in older exports)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster: Option<i64>,
}

impl TagRecord {
    pub fn new(tag: impl Into<String>, count: u64) -> Self {
        Self {
            tag: tag.into(),
            count,
            cluster: None,
        }
    }

    pub fn with_cluster(mut self, cluster: i64) -> Self {
        self.cluster = Some(cluster);
        self
    }
}

/// Co-occurrence statistics for an unordered pair of tags
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PairRecord {
    pub tag1: String,
    pub tag2: String,
    /// Raw number of co-occurrences
    pub pair_count: u64,
    /// Upstream score in [0, 1], normalized again against the maximum at build time
    pub pair_count_normalized: f64,
    /// Any other fields, forwarded to the edge
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PairRecord {
    pub fn new(
        tag1: impl Into<String>,
        tag2: impl Into<String>,
        pair_count: u64,
        pair_count_normalized: f64,
    ) -> Self {
        Self {
            tag1: tag1.into(),
            tag2: tag2.into(),
            pair_count,
            pair_count_normalized,
            extra: Map::new(),
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }
}

/// Load the tag statistics document
pub fn load_tags(path: &Path) -> Result<Vec<TagRecord>, InputError> {
    load_json(path)
}

/// Load the tag-pair statistics document
pub fn load_pairs(path: &Path) -> Result<Vec<PairRecord>, InputError> {
    load_json(path)
}

fn load_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<Vec<T>, InputError> {
    let content = fs::read_to_string(path).map_err(|source| InputError::IoError {
        path: path.display().to_string(),
        source,
    })?;

    serde_json::from_str(&content).map_err(|source| InputError::ParseError {
        path: path.display().to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    #[test]
    fn test_parse_tag_without_cluster() {
        let tags: Vec<TagRecord> =
            serde_json::from_str(r#"[{"tag": "rust", "count": 12}]"#).unwrap();
        assert_eq!(tags, vec![TagRecord::new("rust", 12)]);
    }

    #[test]
    fn test_parse_tag_with_cluster() {
        let tags: Vec<TagRecord> =
            serde_json::from_str(r#"[{"tag": "rust", "count": 12, "cluster": 4}]"#).unwrap();
        assert_eq!(tags[0].cluster, Some(4));
    }

    #[test]
    fn test_parse_pair_keeps_extra_fields() {
        let pairs: Vec<PairRecord> = serde_json::from_str(
            r#"[{"tag1": "a", "tag2": "b", "pairCount": 3, "pairCountNormalized": 0.5, "source": "so"}]"#,
        )
        .unwrap();

        assert_eq!(pairs[0].pair_count, 3);
        assert_eq!(pairs[0].pair_count_normalized, 0.5);
        assert_eq!(pairs[0].extra.get("source"), Some(&json!("so")));
        assert!(!pairs[0].extra.contains_key("pairCount"));
    }

    #[test]
    fn test_negative_count_rejected() {
        let result: Result<Vec<TagRecord>, _> =
            serde_json::from_str(r#"[{"tag": "rust", "count": -1}]"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_load_tags_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"[{{"tag": "a", "count": 1}}, {{"tag": "b", "count": 2}}]"#).unwrap();

        let tags = load_tags(file.path()).unwrap();
        assert_eq!(tags.len(), 2);
        assert_eq!(tags[1].tag, "b");
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_pairs(Path::new("/nonexistent/tag-pairs.json")).unwrap_err();
        assert!(matches!(err, InputError::IoError { .. }));
    }

    #[test]
    fn test_load_malformed_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{not json").unwrap();

        let err = load_tags(file.path()).unwrap_err();
        assert!(matches!(err, InputError::ParseError { .. }));
    }
}
