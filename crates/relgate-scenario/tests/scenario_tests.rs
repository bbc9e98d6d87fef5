//! ---
//! rg_section: "08-scenario"
//! rg_subsection: "tests"
//! rg_type: "source"
//! rg_scope: "code"
//! rg_description: "Scenario runner ordering, failure isolation and persistence tests."
//! rg_version: "v0.0.0-prealpha"
//! rg_owner: "tbd"
//! ---
use std::fs;

use relgate_graph::DependencyGraph;
use relgate_metrics::{encode_text, new_registry, ScenarioMetrics};
use relgate_scenario::{
    load_results, run, write_results, ResultRecord, ScenarioError, ScenarioRunner,
};
use relgate_sim::{Estimate, Simulator};
use relgate_topology::TopologyVariant;

fn graph() -> DependencyGraph {
    r#"{
        "dependencies": [
            {"parent": "compose-post", "child": "text"},
            {"parent": "home-timeline", "child": "post-storage"}
        ],
        "entrypoints": {"/compose": "compose-post", "/timeline": "home-timeline"},
        "source": "fixture"
    }"#
    .parse()
    .unwrap()
}

fn variants() -> Vec<TopologyVariant> {
    vec![
        TopologyVariant::no_replicas("norepl"),
        TopologyVariant::inherit("repl")
            .with_replicas("text", 2)
            .with_replicas("post-storage", 2),
    ]
}

fn keys(records: &[ResultRecord]) -> Vec<(String, f64, String)> {
    records
        .iter()
        .map(|r| (r.variant.clone(), r.prior.value(), r.endpoint.clone()))
        .collect()
}

#[test]
fn records_cover_every_triple_in_deterministic_order() {
    let scenario = run(&graph(), &variants(), &[0.1, 0.01, 0.1]).unwrap();
    let records = scenario.records();
    assert_eq!(
        keys(&records),
        vec![
            ("norepl".into(), 0.01, "/compose".into()),
            ("norepl".into(), 0.01, "/timeline".into()),
            ("norepl".into(), 0.1, "/compose".into()),
            ("norepl".into(), 0.1, "/timeline".into()),
            ("repl".into(), 0.01, "/compose".into()),
            ("repl".into(), 0.01, "/timeline".into()),
            ("repl".into(), 0.1, "/compose".into()),
            ("repl".into(), 0.1, "/timeline".into()),
        ]
    );
    assert!(records.iter().all(|r| (0.0..=1.0).contains(&r.probability)));
    assert!(scenario.is_complete());
    assert_eq!(scenario.metadata["source"], "fixture");
}

#[test]
fn analytic_runs_are_idempotent() {
    let first = run(&graph(), &variants(), &[0.05, 0.2]).unwrap().records();
    let second = run(&graph(), &variants(), &[0.05, 0.2]).unwrap().records();
    assert_eq!(first, second);
}

#[test]
fn sampled_runs_are_reproducible_for_a_seed() {
    let runner = ScenarioRunner::new(Simulator::monte_carlo(5_000, 11).unwrap());
    let first = runner.run(&graph(), &variants(), &[0.1]).unwrap().records();
    let second = runner.run(&graph(), &variants(), &[0.1]).unwrap().records();
    assert_eq!(first, second);
    assert!(matches!(first[0].estimate, Estimate::Sampled { trials: 5_000, .. }));
}

#[test]
fn invalid_priors_abort_before_any_work() {
    let err = run(&graph(), &variants(), &[0.1, 1.5]).unwrap_err();
    assert!(matches!(err, ScenarioError::InvalidPrior(prior) if prior.0 == 1.5));
    assert!(run(&graph(), &variants(), &[f64::NAN]).is_err());
}

#[test]
fn duplicate_variant_names_are_rejected() {
    let twice = vec![
        TopologyVariant::no_replicas("norepl"),
        TopologyVariant::inherit("norepl"),
    ];
    assert!(matches!(
        run(&graph(), &twice, &[0.1]),
        Err(ScenarioError::DuplicateVariant(name)) if name == "norepl"
    ));
}

#[test]
fn unknown_service_fails_only_its_variant() {
    let registry = new_registry();
    let runner =
        ScenarioRunner::default().with_metrics(ScenarioMetrics::new(&registry).unwrap());
    let mixed = vec![
        TopologyVariant::inherit("broken").with_replicas("ghost", 2),
        TopologyVariant::no_replicas("norepl"),
    ];
    let scenario = runner.run(&graph(), &mixed, &[0.1]).unwrap();

    assert_eq!(scenario.failures.len(), 1);
    assert_eq!(scenario.failures[0].variant, "broken");
    assert!(scenario.failures[0].reason.contains("ghost"));
    assert!(scenario.records().iter().all(|r| r.variant == "norepl"));
    assert_eq!(scenario.records().len(), 2);

    let text = encode_text(&registry).unwrap();
    assert!(text.contains("relgate_scenario_variant_failures_total{variant=\"broken\"} 1"));
    assert!(text.contains("relgate_scenario_records_total{variant=\"norepl\"} 2"));
}

#[test]
fn result_sets_round_trip_through_a_directory() {
    let dir = tempfile::tempdir().unwrap();
    let scenario = run(&graph(), &variants(), &[0.01, 0.1]).unwrap();
    let written = write_results(dir.path(), &scenario).unwrap();
    assert_eq!(written.len(), 4);
    assert!(dir.path().join("repl-pfail-0.1.json").exists());

    fs::write(dir.path().join("notes.json"), r#"{"comment": "not a result"}"#).unwrap();

    let loaded = load_results(dir.path()).unwrap();
    assert_eq!(keys(&loaded), keys(&scenario.records()));
    for (read, original) in loaded.iter().zip(scenario.records()) {
        assert!((read.probability - original.probability).abs() < 1e-12);
        assert_eq!(read.root, original.root);
        assert_eq!(read.services.len(), original.services.len());
        for (a, b) in read.services.iter().zip(&original.services) {
            assert_eq!(a.service, b.service);
            assert_eq!(a.replicas, b.replicas);
            assert!((a.availability - b.availability).abs() < 1e-12);
            assert!((a.success - b.success).abs() < 1e-12);
        }
    }

    let document: serde_json::Value = serde_json::from_str(
        &fs::read_to_string(dir.path().join("norepl-pfail-0.1.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(document["summary"]["mode"], "norepl");
    assert_eq!(document["summary"]["entrypoint_count"], 2);
    assert_eq!(document["summary"]["estimator"], "analytic");
    assert_eq!(document["metadata"]["source"], "fixture");
    let compose = &document["endpoints"]["/compose"];
    assert!((compose["reliability"].as_f64().unwrap() - 0.81).abs() < 1e-9);
    assert_eq!(compose["services"], serde_json::json!(["text", "compose-post"]));
}

#[test]
fn legacy_documents_without_mode_use_the_replicas_file() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("sim-0.json"),
        r#"{
            "summary": {"pfail": 0.1, "replicas_file": "replicas/REPL.yaml"},
            "endpoints": {"/compose": {"reliability": 0.891, "services": ["compose-post", "text"]}}
        }"#,
    )
    .unwrap();
    let loaded = load_results(dir.path()).unwrap();
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded[0].variant, "repl");
    assert_eq!(loaded[0].root, "compose-post");
    assert_eq!(loaded[0].estimate, Estimate::Exact);
}

#[test]
fn duplicate_units_in_a_directory_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let body = r#"{"summary": {"pfail": 0.1, "mode": "repl"}, "endpoints": {}}"#;
    fs::write(dir.path().join("a.json"), body).unwrap();
    fs::write(dir.path().join("b.json"), body).unwrap();
    assert!(matches!(
        load_results(dir.path()),
        Err(ScenarioError::DuplicateResult { variant, .. }) if variant == "repl"
    ));
}

#[test]
fn signed_zero_priors_count_as_one_unit() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("a.json"),
        r#"{"summary": {"pfail": 0.0, "mode": "repl"}, "endpoints": {}}"#,
    )
    .unwrap();
    fs::write(
        dir.path().join("b.json"),
        r#"{"summary": {"pfail": -0.0, "mode": "repl"}, "endpoints": {}}"#,
    )
    .unwrap();
    assert!(matches!(
        load_results(dir.path()),
        Err(ScenarioError::DuplicateResult { variant, prior, .. })
            if variant == "repl" && prior == 0.0
    ));
}

#[test]
fn out_of_range_reliability_is_rejected_on_load() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("repl-pfail-0.1.json"),
        r#"{
            "summary": {"pfail": 0.1, "mode": "repl"},
            "endpoints": {
                "/a": {"reliability": 1.5, "services": ["a"]},
                "/b": {"reliability": 0.5, "services": ["b"]}
            }
        }"#,
    )
    .unwrap();
    let err = load_results(dir.path()).unwrap_err();
    assert!(matches!(
        &err,
        ScenarioError::InvalidResultFile { reason, .. } if reason.contains("endpoints./a.reliability")
    ));
}

#[test]
fn out_of_range_service_reliability_is_rejected_on_load() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("repl-pfail-0.1.json"),
        r#"{
            "summary": {"pfail": 0.1, "mode": "repl"},
            "service_reliability": {"a": -0.2},
            "endpoints": {"/a": {"reliability": 0.9, "services": ["a"]}}
        }"#,
    )
    .unwrap();
    assert!(matches!(
        load_results(dir.path()),
        Err(ScenarioError::InvalidResultFile { reason, .. }) if reason.contains("service_reliability.a")
    ));

    fs::write(
        dir.path().join("repl-pfail-0.1.json"),
        r#"{
            "summary": {"pfail": 0.1, "mode": "repl"},
            "endpoints": {
                "/a": {"reliability": 0.9, "services": ["a"], "service_reliability": {"a": 2.0}}
            }
        }"#,
    )
    .unwrap();
    assert!(matches!(
        load_results(dir.path()),
        Err(ScenarioError::InvalidResultFile { .. })
    ));
}

#[test]
fn variants_sharing_a_result_file_name_are_rejected() {
    for (first, second) in [("a/b", "a_b"), ("Repl", "repl"), ("repl ", "repl")] {
        let colliding = vec![
            TopologyVariant::no_replicas(first),
            TopologyVariant::inherit(second).with_replicas("text", 3),
        ];
        assert!(
            matches!(
                run(&graph(), &colliding, &[0.1]),
                Err(ScenarioError::DuplicateVariant(ref name)) if name == second
            ),
            "{first} / {second}"
        );
    }
}

#[test]
fn writer_refuses_to_overwrite_a_unit_from_the_same_run() {
    let dir = tempfile::tempdir().unwrap();
    let mut scenario = run(&graph(), &variants(), &[0.1]).unwrap();
    let mut copy = scenario.units[0].clone();
    copy.variant = "NoRepl".into();
    scenario.units.push(copy);

    assert!(matches!(
        write_results(dir.path(), &scenario),
        Err(ScenarioError::DuplicateResult { variant, .. }) if variant == "NoRepl"
    ));
}
