use callframe_studio::aggregator::Combine;
use callframe_studio::graph::{Frame, TraversalOrder};
use callframe_studio::output::{read_document, write_literal, LiteralOptions};
use callframe_studio::parser::{read_folded, read_literal};
use callframe_studio::table::{AggFn, RowKey};
use callframe_studio::utils::config::{load_config, EngineConfig};
use callframe_studio::utils::error::ParseError;
use callframe_studio::CallGraphFrame;
use pretty_assertions::assert_eq;
use std::fs;
use tempfile::TempDir;

const FOLDED: &str = "\
# sampled run
main;solve;mpi_wait 30
main;solve 50
main;io 20
main;solve;mpi_wait 10
";

/// Preorder (name, exclusive, inclusive) for one metric
fn shape(frame: &CallGraphFrame, metric: &str) -> Vec<(String, f64, f64)> {
    let inclusive = format!("{} (inc)", metric);
    frame
        .graph()
        .traverse(TraversalOrder::Pre)
        .map(|id| {
            let key = RowKey::node(id);
            (
                frame.graph().frame(id).and_then(Frame::name).unwrap_or_default(),
                frame.table().number(&key, metric).unwrap_or(0.0),
                frame.table().number(&key, &inclusive).unwrap_or(0.0),
            )
        })
        .collect()
}

#[test]
fn test_read_folded_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("run.folded");
    fs::write(&path, FOLDED).unwrap();

    let frame = read_folded(&path, "samples").unwrap();
    assert!(frame.is_consistent());
    assert_eq!(
        shape(&frame, "samples"),
        vec![
            ("main".to_string(), 0.0, 110.0),
            ("solve".to_string(), 50.0, 90.0),
            ("mpi_wait".to_string(), 40.0, 40.0),
            ("io".to_string(), 20.0, 20.0),
        ]
    );
}

#[test]
fn test_read_folded_reports_line() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad.folded");
    fs::write(&path, "main;solve 5\nmain;;io 3\n").unwrap();

    match read_folded(&path, "samples") {
        Err(ParseError::InvalidFormat(msg)) => assert!(msg.contains("line 2"), "{}", msg),
        other => panic!("expected InvalidFormat, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_literal_file_round_trip() {
    let dir = TempDir::new().unwrap();
    let folded = dir.path().join("run.folded");
    fs::write(&folded, FOLDED).unwrap();
    let frame = read_folded(&folded, "samples").unwrap();

    let out = dir.path().join("nested").join("run.json");
    write_literal(&frame, &LiteralOptions::default(), &out).unwrap();
    assert!(out.exists());

    let document = read_document(&out).unwrap();
    assert_eq!(document.graph.len(), 1);
    assert_eq!(document.graph[0].name, "main");
    assert_eq!(document.graph[0].children.len(), 2);

    let reloaded = read_literal(&out).unwrap();
    assert!(reloaded.is_consistent());
    assert_eq!(reloaded.graph().len(), frame.graph().len());

    let mut expected = shape(&frame, "samples");
    let mut actual = shape(&reloaded, "samples");
    expected.sort_by(|a, b| a.0.cmp(&b.0));
    actual.sort_by(|a, b| a.0.cmp(&b.0));
    assert_eq!(actual, expected);
}

#[test]
fn test_write_literal_rejects_directory() {
    let dir = TempDir::new().unwrap();
    let frame = callframe_studio::parser::from_paths(&[&["main"][..]]).unwrap();
    assert!(write_literal(&frame, &LiteralOptions::default(), dir.path()).is_err());
}

#[test]
fn test_load_config_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("callframe.toml");
    fs::write(
        &path,
        r#"
combine = "min"

[groupby]
metric_default = "max"
"#,
    )
    .unwrap();

    let config = load_config(&path).unwrap();
    assert_eq!(config.combine, Combine::Min);
    assert_eq!(config.groupby.metric_default, AggFn::Max);
    assert_eq!(config.folded_metric, EngineConfig::default().folded_metric);

    assert!(load_config(dir.path().join("missing.toml")).is_err());
}
