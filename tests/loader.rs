use mongodb_workload::loader::json_files;
use mongodb_workload::{load_definitions, load_queries, DefinitionError};
use std::fs;
use std::path::PathBuf;
use workload_types::OperationKind;

const FLIGHTS: &str = r#"{
    "databaseName": "airline",
    "collectionName": "flights",
    "fieldName": {"flight_id": {"type": "int"}, "gate": {"type": "string", "provider": "gate"}},
    "shardConfig": {"key": {"flight_id": 1}}
}"#;

const CREW: &str = r#"[
    {"databaseName": "airline", "collectionName": "crew", "fieldName": {"name": {"type": "string"}}},
    {"databaseName": "airline", "collectionName": "pilots", "fieldName": {"name": {"type": "string"}}}
]"#;

fn demos() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("demos")
}

#[test]
fn test_load_single_definition_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("flights.json");
    fs::write(&path, FLIGHTS).unwrap();

    let defs = load_definitions(&path).unwrap();
    assert_eq!(defs.len(), 1);
    assert_eq!(defs[0].primary_key(), "flight_id");
}

#[test]
fn test_load_definition_directory_in_name_order() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("b_flights.json"), FLIGHTS).unwrap();
    fs::write(dir.path().join("a_crew.json"), CREW).unwrap();
    fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

    let files = json_files(dir.path()).unwrap();
    assert_eq!(files.len(), 2);

    let defs = load_definitions(dir.path()).unwrap();
    let names: Vec<&str> = defs.iter().map(|d| d.collection_name.as_str()).collect();
    assert_eq!(names, ["crew", "pilots", "flights"]);
}

#[test]
fn test_definition_errors() {
    let dir = tempfile::tempdir().unwrap();

    let missing = dir.path().join("missing.json");
    assert!(matches!(
        load_definitions(&missing),
        Err(DefinitionError::NotFound(_))
    ));

    let text = dir.path().join("flights.txt");
    fs::write(&text, FLIGHTS).unwrap();
    assert!(matches!(
        load_definitions(&text),
        Err(DefinitionError::NotJson(_))
    ));

    let invalid = dir.path().join("invalid.json");
    fs::write(&invalid, r#"{"databaseName": "", "collectionName": "x"}"#).unwrap();
    assert!(matches!(
        load_definitions(&invalid),
        Err(DefinitionError::Schema { .. })
    ));

    let empty = tempfile::tempdir().unwrap();
    assert!(matches!(
        load_definitions(empty.path()),
        Err(DefinitionError::Empty(_))
    ));
}

#[test]
fn test_load_queries_skips_broken_files() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("good.json"),
        r#"[{"database": "airline", "collection": "flights", "operation": "find",
             "filter": {"gate": "<gate>"}}]"#,
    )
    .unwrap();
    fs::write(dir.path().join("broken.json"), "[{").unwrap();
    fs::write(dir.path().join("object.json"), r#"{"operation": "find"}"#).unwrap();

    let templates = load_queries(dir.path()).unwrap();
    assert_eq!(templates.len(), 1);
    assert_eq!(templates[0].bucket(), Some(OperationKind::Select));
}

#[test]
fn test_load_queries_missing_path_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    assert!(load_queries(&dir.path().join("nope")).is_err());
}

#[test]
fn test_demo_inputs_load() {
    let defs = load_definitions(&demos().join("collections")).unwrap();
    assert!(defs.iter().any(|d| d.collection_name == "flights"));

    let templates = load_queries(&demos().join("queries")).unwrap();
    let kinds: Vec<_> = templates.iter().filter_map(|t| t.bucket()).collect();
    for kind in OperationKind::ALL {
        assert!(kinds.contains(&kind), "demo queries lack {kind}");
    }
}
