//! ---
//! rg_section: "06-topology"
//! rg_subsection: "tests"
//! rg_type: "source"
//! rg_scope: "code"
//! rg_description: "Replica file loading and variant application tests."
//! rg_version: "v0.0.0-prealpha"
//! rg_owner: "tbd"
//! ---
use std::fs;

use relgate_graph::DependencyGraph;
use relgate_topology::{
    apply, load_replica_file, load_topology_file, ReplicaBase, TopologyError, TopologyVariant,
};

fn graph() -> DependencyGraph {
    r#"[
        {"parent": "compose-post-service", "child": "text-service"},
        {"parent": "text-service", "child": "url-shorten-service"}
    ]"#
    .parse()
    .unwrap()
}

#[test]
fn replica_file_names_variant_after_stem() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("REPL.yaml");
    fs::write(
        &path,
        "# scaled deployment\ncompose-post-service: 2\ntext-service: 3\n",
    )
    .unwrap();

    let variant = load_replica_file(&path).unwrap();
    assert_eq!(variant.name, "repl");
    assert_eq!(variant.base, ReplicaBase::Inherit);
    assert_eq!(
        variant.replicas.keys().collect::<Vec<_>>(),
        vec!["compose-post-service", "text-service"]
    );

    let derived = apply(&graph(), &variant).unwrap();
    assert_eq!(derived.replica_count("text-service"), Some(3));
    assert_eq!(derived.replica_count("url-shorten-service"), Some(1));
}

#[test]
fn replica_file_stems_are_not_folded_onto_norepl() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("NoRepl-v2.yaml");
    fs::write(&path, "").unwrap();

    let variant = load_replica_file(&path).unwrap();
    assert_eq!(variant.name, "norepl-v2");
    assert!(variant.replicas.is_empty());
}

#[test]
fn comment_only_replica_file_has_no_overrides() {
    let variant = TopologyVariant::from_replica_yaml("norepl", "# nothing scaled\n").unwrap();
    assert!(variant.replicas.is_empty());
    let derived = variant.apply(&graph()).unwrap();
    assert_eq!(derived.replica_counts(), graph().replica_counts());
}

#[test]
fn malformed_replica_file_is_a_yaml_error() {
    let err = TopologyVariant::from_replica_yaml("bad", "text-service: many\n").unwrap_err();
    assert!(matches!(err, TopologyError::YamlSerializationFailed(_)));
}

#[test]
fn topology_document_loads_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("topology.yaml");
    fs::write(
        &path,
        "variants:\n  - name: norepl\n    base: single\n  - name: repl\n    replicas:\n      text-service: 2\n",
    )
    .unwrap();

    let document = load_topology_file(&path).unwrap();
    let names = document
        .variants
        .iter()
        .map(|v| v.name.as_str())
        .collect::<Vec<_>>();
    assert_eq!(names, vec!["norepl", "repl"]);

    let base = graph();
    let applied = document
        .variants
        .iter()
        .map(|v| v.apply(&base).unwrap())
        .collect::<Vec<_>>();
    assert_eq!(applied[0].replica_count("text-service"), Some(1));
    assert_eq!(applied[1].replica_count("text-service"), Some(2));
    assert_eq!(base.replica_count("text-service"), Some(1));
}

#[test]
fn unknown_service_names_the_variant() {
    let variant = TopologyVariant::inherit("repl").with_replicas("ghost-service", 2);
    let err = apply(&graph(), &variant).unwrap_err();
    assert_eq!(
        err.to_string(),
        "variant repl names unknown service ghost-service"
    );
}
