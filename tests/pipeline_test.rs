//! End-to-end runs over input files on disk

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{Value, json};
use tag_graph_layout::{
    BuildError, ConstructionError, PipelineError, PipelineSettings, SerializedGraph, Stages,
    load_config, run_files, serialize,
};

const TAGS: &str = r#"[
    {"tag": "a", "count": 100, "cluster": 0},
    {"tag": "b", "count": 50, "cluster": 0},
    {"tag": "c", "count": 25, "cluster": 0}
]"#;

const PAIRS: &str = r#"[
    {"tag1": "a", "tag2": "b", "pairCount": 40, "pairCountNormalized": 0.8},
    {"tag1": "b", "tag2": "c", "pairCount": 10, "pairCountNormalized": 0.1, "source": "so"},
    {"tag1": "a", "tag2": "c", "pairCount": 1, "pairCountNormalized": 0.005}
]"#;

fn write_inputs(dir: &Path, tags: &str, pairs: &str) -> (PathBuf, PathBuf) {
    let tags_path = dir.join("tags.json");
    let pairs_path = dir.join("tag-pairs.json");
    fs::write(&tags_path, tags).unwrap();
    fs::write(&pairs_path, pairs).unwrap();
    (tags_path, pairs_path)
}

fn layout_document(tags: &str, pairs: &str) -> SerializedGraph {
    let dir = tempfile::tempdir().unwrap();
    let (tags_path, pairs_path) = write_inputs(dir.path(), tags, pairs);
    let outcome = run_files(
        &tags_path,
        &pairs_path,
        &PipelineSettings::default(),
        Stages::Full,
    )
    .unwrap();
    serde_json::from_slice(&serialize(&outcome.graph).unwrap()).unwrap()
}

#[test]
fn test_end_to_end_scenario() {
    let document = layout_document(TAGS, PAIRS);

    let keys: Vec<&str> = document.nodes.iter().map(|n| n.key.as_str()).collect();
    assert_eq!(keys, vec!["a", "b", "c"]);

    let sizes: Vec<f64> = document.nodes.iter().map(|n| n.attributes.size).collect();
    for (size, count) in sizes.iter().zip([100.0f64, 50.0, 25.0]) {
        assert!((size - (count / 100.0).sqrt() * 30.0).abs() < 1e-9);
    }

    assert_eq!(document.edges.len(), 2);
    let ab = &document.edges[0];
    assert_eq!((ab.source.as_str(), ab.target.as_str()), ("a", "b"));
    assert_eq!(ab.attributes.weight, 1.0);

    let bc = &document.edges[1];
    assert_eq!((bc.source.as_str(), bc.target.as_str()), ("b", "c"));
    assert!((bc.attributes.weight - 0.125).abs() < 1e-12);
    assert_eq!(bc.attributes.extra.get("source"), Some(&json!("so")));

    assert!(
        !document
            .edges
            .iter()
            .any(|e| (e.source == "a" && e.target == "c") || (e.source == "c" && e.target == "a"))
    );

    for node in &document.nodes {
        assert!(node.attributes.x.is_finite());
        assert!(node.attributes.y.is_finite());
    }
}

#[test]
fn test_runs_are_byte_identical() {
    let first = layout_document(TAGS, PAIRS);
    let second = layout_document(TAGS, PAIRS);
    assert_eq!(first, second);
}

#[test]
fn test_no_dangling_edges() {
    let document = layout_document(TAGS, PAIRS);
    for edge in &document.edges {
        assert!(document.nodes.iter().any(|n| n.key == edge.source));
        assert!(document.nodes.iter().any(|n| n.key == edge.target));
    }
}

#[test]
fn test_reserved_tag_never_reaches_output() {
    let tags = r#"[
        {"tag": "a", "count": 100},
        {"tag": "constructor", "count": 70},
        {"tag": "b", "count": 50}
    ]"#;
    let pairs = r#"[
        {"tag1": "a", "tag2": "b", "pairCount": 40, "pairCountNormalized": 0.8},
        {"tag1": "constructor", "tag2": "b", "pairCount": 30, "pairCountNormalized": 0.6}
    ]"#;

    let document = layout_document(tags, pairs);
    let text = serde_json::to_value(&document).unwrap();

    assert_eq!(document.nodes.len(), 2);
    assert!(document.nodes.iter().all(|n| n.key != "constructor"));
    assert!(
        document
            .edges
            .iter()
            .all(|e| e.source != "constructor" && e.target != "constructor")
    );
    assert_eq!(text["edges"].as_array().map(Vec::len), Some(1));
}

#[test]
fn test_unknown_tag_fails_the_run() {
    let dir = tempfile::tempdir().unwrap();
    let pairs = r#"[{"tag1": "a", "tag2": "zig", "pairCount": 1, "pairCountNormalized": 0.9}]"#;
    let (tags_path, pairs_path) = write_inputs(dir.path(), TAGS, pairs);

    let err = run_files(
        &tags_path,
        &pairs_path,
        &PipelineSettings::default(),
        Stages::Full,
    )
    .unwrap_err();

    assert!(matches!(
        err,
        PipelineError::Build(BuildError::Construction(ConstructionError::UnknownNode { .. }))
    ));
}

#[test]
fn test_config_next_to_inputs_is_applied() {
    let dir = tempfile::tempdir().unwrap();
    let (tags_path, pairs_path) = write_inputs(dir.path(), TAGS, PAIRS);
    fs::write(
        dir.path().join(".taglayout.toml"),
        "[graph]\nweight_threshold = 0.2\n\n[layout.global]\niterations = 100\n",
    )
    .unwrap();

    let settings = load_config(&tags_path).unwrap().resolve().unwrap();
    assert_eq!(settings.layout.global.iterations, 100);

    let outcome = run_files(&tags_path, &pairs_path, &settings, Stages::Full).unwrap();
    // b -- c normalizes to 0.125, now below the threshold
    assert_eq!(outcome.graph.edge_count(), 1);
    assert_eq!(outcome.stats.pairs_below_threshold, 2);
}

#[test]
fn test_output_is_valid_json_for_placement_only() {
    let dir = tempfile::tempdir().unwrap();
    let (tags_path, pairs_path) = write_inputs(dir.path(), TAGS, PAIRS);
    let outcome = run_files(
        &tags_path,
        &pairs_path,
        &PipelineSettings::default(),
        Stages::PlacementOnly,
    )
    .unwrap();

    let value: Value = serde_json::from_slice(&serialize(&outcome.graph).unwrap()).unwrap();
    for node in value["nodes"].as_array().unwrap() {
        let x = node["attributes"]["x"].as_f64().unwrap();
        let y = node["attributes"]["y"].as_f64().unwrap();
        assert!((0.0..1.0).contains(&x));
        assert!((0.0..1.0).contains(&y));
    }
}
