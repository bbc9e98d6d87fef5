//! ---
//! rg_section: "05-graph-model"
//! rg_subsection: "tests"
//! rg_type: "source"
//! rg_scope: "code"
//! rg_description: "Dependency graph loading and traversal tests."
//! rg_version: "v0.0.0-prealpha"
//! rg_owner: "tbd"
//! ---
use std::collections::HashMap;
use std::fs;

use relgate_graph::{
    load_graph_from_file, BrokenEdge, CyclePolicy, DependencyGraph, GraphError,
    MalformedGraphError,
};
use serde_json::json;

fn social_graph() -> DependencyGraph {
    json!({
        "dependencies": [
            {"parent": "compose-post", "child": "text"},
            {"parent": "compose-post", "child": "media"},
            {"parent": "compose-post", "child": "user"},
            {"parent": "text", "child": "url-shorten"},
            {"parent": "home-timeline", "child": "post-storage"},
            {"parent": "home-timeline", "child": "social-graph", "fatal": false}
        ],
        "entrypoints": {
            "/compose": "compose-post",
            "/timeline": ["home-timeline", "post-storage"]
        },
        "source": "jaeger"
    })
    .to_string()
    .parse()
    .unwrap()
}

fn malformed(result: Result<DependencyGraph, GraphError>) -> MalformedGraphError {
    match result {
        Err(GraphError::Malformed(err)) => err,
        other => panic!("expected malformed graph error, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn reachable_nodes_come_callees_first() {
    let graph = social_graph();
    let nodes = graph.reachable_from("/compose").unwrap();
    let names = nodes.iter().map(|n| n.name()).collect::<Vec<_>>();

    assert_eq!(names.len(), 5);
    assert_eq!(names.last(), Some(&"compose-post"));
    let position = names
        .iter()
        .enumerate()
        .map(|(i, n)| (*n, i))
        .collect::<HashMap<_, _>>();
    for node in &nodes {
        for (callee, _) in node.callees() {
            assert!(
                position[callee] < position[node.name()],
                "{callee} must precede {}",
                node.name()
            );
        }
    }
}

#[test]
fn traversal_is_deterministic() {
    let first = social_graph();
    let second = social_graph();
    let a = first
        .reachable_from("/timeline")
        .unwrap()
        .iter()
        .map(|n| n.name().to_owned())
        .collect::<Vec<_>>();
    let b = second
        .reachable_from("/timeline")
        .unwrap()
        .iter()
        .map(|n| n.name().to_owned())
        .collect::<Vec<_>>();
    assert_eq!(a, b);
}

#[test]
fn endpoints_metadata_and_edges_are_loaded() {
    let graph = social_graph();
    let endpoints = graph.endpoints().map(|e| e.name.as_str()).collect::<Vec<_>>();
    assert_eq!(endpoints, vec!["/compose", "/timeline"]);
    assert_eq!(graph.endpoint("/timeline").unwrap().declared_path, vec!["post-storage"]);
    assert_eq!(graph.metadata()["source"], "jaeger");
    assert_eq!(graph.service_count(), 8);

    let timeline = graph.node("home-timeline").unwrap();
    let callees = timeline.callees();
    assert_eq!(callees[0].0, "post-storage");
    assert!(callees[0].1.fatal);
    assert_eq!(callees[1].0, "social-graph");
    assert!(!callees[1].1.fatal);
}

#[test]
fn unknown_endpoint_is_reported() {
    let graph = social_graph();
    assert!(matches!(
        graph.reachable_from("/missing"),
        Err(GraphError::UnknownEndpoint(name)) if name == "/missing"
    ));
}

#[test]
fn entrypoints_are_derived_from_callers_when_absent() {
    let graph: DependencyGraph = r#"[
        {"parent": "a", "child": "b"},
        {"parent": "b", "child": "c"}
    ]"#
    .parse()
    .unwrap();
    let names = graph.endpoints().map(|e| e.name.clone()).collect::<Vec<_>>();
    assert_eq!(names, vec!["/a", "/b"]);
    assert_eq!(graph.endpoint("/b").unwrap().root, "b");
}

#[test]
fn duplicate_links_are_merged() {
    let graph: DependencyGraph = r#"[
        {"parent": "a", "child": "b", "callCount": 4, "fatal": false},
        {"parent": "a", "child": "b", "callCount": 6}
    ]"#
    .parse()
    .unwrap();
    assert_eq!(graph.edge_count(), 1);
    let (_, edge) = graph.node("a").unwrap().callees()[0];
    assert_eq!(edge.call_count, Some(10));
    assert!(edge.fatal);
}

#[test]
fn declared_services_make_links_strict() {
    let err = malformed(DependencyGraph::from_source(
        r#"{
            "services": [{"name": "a"}],
            "dependencies": [{"parent": "a", "child": "ghost"}],
            "entrypoints": {"/a": "a"}
        }"#,
        CyclePolicy::Break,
    ));
    assert_eq!(
        err,
        MalformedGraphError::UnknownService {
            service: "ghost".into(),
            referenced_by: "call a -> ghost".into(),
        }
    );
}

#[test]
fn endpoint_root_must_exist() {
    let err = malformed(
        r#"{"dependencies": [{"parent": "a", "child": "b"}], "entrypoints": {"/x": "nope"}}"#
            .parse::<DependencyGraph>(),
    );
    assert!(matches!(err, MalformedGraphError::UnknownService { service, .. } if service == "nope"));
}

#[test]
fn incomplete_links_fail_fast() {
    let err = malformed(r#"[{"parent": "a"}]"#.parse::<DependencyGraph>());
    assert_eq!(
        err,
        MalformedGraphError::IncompleteDependency {
            index: 0,
            field: "child"
        }
    );
}

#[test]
fn invalid_service_overrides_are_rejected() {
    let zero = malformed(
        r#"{"services": [{"name": "a", "replicas": 0}], "entrypoints": {"/a": "a"}}"#
            .parse::<DependencyGraph>(),
    );
    assert!(matches!(zero, MalformedGraphError::InvalidReplicaCount { .. }));

    let pfail = malformed(
        r#"{"services": [{"name": "a", "failure_probability": 1.5}], "entrypoints": {"/a": "a"}}"#
            .parse::<DependencyGraph>(),
    );
    assert!(matches!(
        pfail,
        MalformedGraphError::InvalidFailureProbability { .. }
    ));

    let duplicate = malformed(
        r#"{"services": [{"name": "a"}, {"name": "a"}], "entrypoints": {"/a": "a"}}"#
            .parse::<DependencyGraph>(),
    );
    assert_eq!(duplicate, MalformedGraphError::DuplicateService("a".into()));
}

#[test]
fn cycles_are_broken_at_the_back_edge() {
    let source = r#"{
        "dependencies": [
            {"parent": "a", "child": "b"},
            {"parent": "b", "child": "c"},
            {"parent": "c", "child": "a"}
        ],
        "entrypoints": {"/a": "a"}
    }"#;
    let graph = DependencyGraph::from_source(source, CyclePolicy::Break).unwrap();
    assert_eq!(
        graph.broken_edges(),
        [BrokenEdge {
            caller: "c".into(),
            callee: "a".into()
        }]
    );
    assert_eq!(graph.edge_count(), 2);
    let names = graph
        .reachable_from("/a")
        .unwrap()
        .iter()
        .map(|n| n.name().to_owned())
        .collect::<Vec<_>>();
    assert_eq!(names, vec!["c", "b", "a"]);
}

#[test]
fn cycles_can_be_rejected() {
    let source = r#"[{"parent": "a", "child": "b"}, {"parent": "b", "child": "a"}]"#;
    let err = malformed(DependencyGraph::from_source(source, CyclePolicy::Reject));
    assert_eq!(
        err,
        MalformedGraphError::Cycle {
            caller: "b".into(),
            callee: "a".into()
        }
    );
}

#[test]
fn self_calls_are_cycles() {
    let source = r#"[{"parent": "a", "child": "a"}]"#;
    let graph = DependencyGraph::from_source(source, CyclePolicy::Break).unwrap();
    assert_eq!(graph.broken_edges().len(), 1);
    assert_eq!(graph.edge_count(), 0);
}

#[test]
fn dependency_order_covers_every_service() {
    let graph = social_graph();
    let order = graph.dependency_order();
    assert_eq!(order.len(), graph.service_count());
    let compose = graph.index_of("compose-post").unwrap();
    let text = graph.index_of("text").unwrap();
    let url = graph.index_of("url-shorten").unwrap();
    let pos = |idx| order.iter().position(|n| *n == idx).unwrap();
    assert!(pos(url) < pos(text));
    assert!(pos(text) < pos(compose));
}

#[test]
fn replica_variants_share_structure() {
    let graph = social_graph();
    let mut counts = graph.replica_counts().to_vec();
    let text = graph.index_of("text").unwrap();
    counts[text.index()] = 3;
    let scaled = graph.with_replica_counts(counts).unwrap();

    assert!(scaled.shares_structure_with(&graph));
    assert_eq!(scaled.replica_count("text"), Some(3));
    assert_eq!(graph.replica_count("text"), Some(1));

    assert!(matches!(
        graph.with_replica_counts(vec![1]),
        Err(MalformedGraphError::ReplicaVectorMismatch { .. })
    ));
}

#[test]
fn loads_yaml_snapshot_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("deps.yaml");
    fs::write(
        &path,
        "dependencies:\n  - parent: a\n    child: b\nentrypoints:\n  /a: a\n",
    )
    .unwrap();
    let graph = load_graph_from_file(&path, CyclePolicy::Break).unwrap();
    assert_eq!(graph.service_count(), 2);
    assert!(graph.contains_service("b"));
}

#[test]
fn declared_path_members_extend_the_reachable_set() {
    let graph: DependencyGraph = r#"{
        "dependencies": [{"parent": "a", "child": "b"}, {"parent": "c", "child": "d"}],
        "entrypoints": {"/x": ["a", "c", "a"]}
    }"#
    .parse()
    .unwrap();
    let endpoint = graph.endpoint("/x").unwrap();
    let members = graph
        .endpoint_members(endpoint)
        .into_iter()
        .map(|index| graph.name_of(index).to_owned())
        .collect::<Vec<_>>();
    assert_eq!(members, vec!["a", "c"]);

    let names = graph
        .reachable_from("/x")
        .unwrap()
        .iter()
        .map(|n| n.name().to_owned())
        .collect::<Vec<_>>();
    assert_eq!(names, vec!["b", "a", "d", "c"]);
}
