//! Integration tests for evaluating constraints against property sets.

use bundle_constraints_lib::constraints::{
    Candidate, Constraint, ConstraintParser, ErrorKind, FailureCause, PredicateKind, VersionRange, evaluate, matching_candidates,
};
use bundle_constraints_lib::expr::Environment;
use bundle_constraints_lib::properties::Property;
use serde_json::json;
use std::thread;

fn foo_api() -> Property {
    Property::gvk("example.com", "v1", "Foo")
}

fn leaf(truth: bool) -> Constraint {
    if truth {
        Constraint::gvk("example.com", "v1", "Foo")
    } else {
        Constraint::gvk("example.com", "v1", "Missing")
    }
}

fn leaves(truths: [bool; 3]) -> Vec<Constraint> {
    truths.into_iter().map(leaf).collect()
}

fn outcomes(truths: [bool; 3]) -> (bool, bool, bool) {
    let properties = [foo_api()];
    (
        evaluate(&Constraint::all(leaves(truths)), &properties).satisfied,
        evaluate(&Constraint::any(leaves(truths)), &properties).satisfied,
        evaluate(&Constraint::not(leaves(truths)), &properties).satisfied,
    )
}

#[test]
fn test_combinator_truth_table() {
    assert_eq!(outcomes([true, false, false]), (false, true, false));
    assert_eq!(outcomes([true, true, true]), (true, true, false));
    assert_eq!(outcomes([false, false, false]), (false, false, true));
}

#[test]
fn test_vacuous_cases() {
    let properties = [foo_api()];
    assert!(evaluate(&Constraint::all(vec![]), &properties).satisfied);
    assert!(!evaluate(&Constraint::any(vec![]), &properties).satisfied);
    assert!(evaluate(&Constraint::not(vec![]), &properties).satisfied);

    assert!(evaluate(&Constraint::all(vec![]), &[]).satisfied);
    assert!(!evaluate(&Constraint::any(vec![]), &[]).satisfied);
    assert!(evaluate(&Constraint::not(vec![]), &[]).satisfied);
}

#[test]
fn test_empty_any_reports_itself() {
    let evaluation = evaluate(&Constraint::any(vec![]).with_message("pick one"), &[foo_api()]);
    assert_eq!(evaluation.failures.len(), 1);
    assert_eq!(evaluation.failures[0].message, "pick one");
    assert_eq!(evaluation.failures[0].predicate, PredicateKind::Any);
}

#[test]
fn test_gvk_match() {
    let property = Property::new("olm.gvk", json!({"group": "example.com", "version": "v1", "kind": "Foo"})).unwrap();

    assert!(evaluate(&Constraint::gvk("example.com", "v1", "Foo"), &[property.clone()]).satisfied);
    for (group, version, kind) in [("example.org", "v1", "Foo"), ("example.com", "v2", "Foo"), ("example.com", "v1", "Bar")] {
        assert!(!evaluate(&Constraint::gvk(group, version, kind), &[property.clone()]).satisfied);
    }
}

#[test]
fn test_package_range() {
    let property = Property::new("olm.package", json!({"packageName": "foo", "version": "1.2.0"})).unwrap();

    let within = Constraint::package("foo", VersionRange::parse(">=1.0.0").unwrap());
    let above = Constraint::package("foo", VersionRange::parse(">=2.0.0").unwrap());
    assert!(evaluate(&within, &[property.clone()]).satisfied);
    assert!(!evaluate(&above, &[property]).satisfied);
}

#[test]
fn test_duplicate_and_unordered_properties() {
    let constraint = Constraint::all(vec![
        Constraint::gvk("example.com", "v1", "Foo"),
        Constraint::package("foo", VersionRange::parse(">=1.0.0").unwrap()),
    ]);

    let forward = [foo_api(), Property::package("foo", "1.0.0"), foo_api()];
    let backward = [Property::package("foo", "1.0.0"), foo_api()];
    assert!(evaluate(&constraint, &forward).satisfied);
    assert!(evaluate(&constraint, &backward).satisfied);
}

#[test]
fn test_failure_trace_collects_every_missing_requirement() {
    let constraint = ConstraintParser::default()
        .parse(
            br#"{"message": "bundle requirements", "all": {"constraints": [
                {"message": "needs Foo", "gvk": {"group": "example.com", "version": "v1", "kind": "Foo"}},
                {"message": "needs Bar", "gvk": {"group": "example.com", "version": "v1", "kind": "Bar"}},
                {"message": "needs baz", "package": {"packageName": "baz", "versionRange": ">=1.0.0"}}
            ]}}"#,
        )
        .unwrap();

    let evaluation = evaluate(&constraint, &[foo_api()]);
    assert!(!evaluation.satisfied);

    let messages: Vec<_> = evaluation.failures.iter().map(|f| f.message.as_str()).collect();
    assert_eq!(messages, vec!["needs Bar", "needs baz", "bundle requirements"]);
    assert_eq!(evaluation.failures[0].path, "$.all.constraints[1]");
    assert_eq!(evaluation.failures[1].path, "$.all.constraints[2]");
}

#[test]
fn test_errored_leaf_is_reported_distinctly() {
    let constraint = ConstraintParser::default()
        .parse(
            br#"{"any": {"constraints": [
                {"cel": {"rule": "properties.exists(p, p.type == 'olm.test' && semver_compare(p.value, '1.0.0') == 0)"}},
                {"gvk": {"group": "example.com", "version": "v1", "kind": "Missing"}}
            ]}}"#,
        )
        .unwrap();

    let properties = [Property::new("olm.test", json!("not-a-version")).unwrap()];
    let evaluation = evaluate(&constraint, &properties);

    assert!(!evaluation.satisfied);
    assert_eq!(evaluation.errors.len(), 1);
    assert_eq!(evaluation.errors[0].path, "$.any.constraints[0]");
    assert_eq!(evaluation.errors[0].error.kind(), ErrorKind::Evaluation);

    assert!(matches!(evaluation.failures[0].cause, FailureCause::Errored(_)));
    assert_eq!(evaluation.failures[1].cause, FailureCause::Unsatisfied);
}

#[test]
fn test_failing_arithmetic_does_not_stop_siblings() {
    let constraint = ConstraintParser::default()
        .parse(
            br#"{"any": {"constraints": [
                {"cel": {"rule": "properties.exists(p, p.type == 'count' && 10 / p.value == 1)"}},
                {"gvk": {"group": "example.com", "version": "v1", "kind": "Foo"}}
            ]}}"#,
        )
        .unwrap();

    let properties = [Property::new("count", json!(0)).unwrap(), foo_api()];
    let evaluation = evaluate(&constraint, &properties);

    assert!(evaluation.satisfied);
    assert!(evaluation.failures.is_empty());
    assert_eq!(evaluation.errors.len(), 1);
    assert_eq!(evaluation.errors[0].path, "$.any.constraints[0]");
    assert_eq!(evaluation.errors[0].error.kind(), ErrorKind::Evaluation);
}

#[test]
fn test_hostile_rules_fail_cleanly_at_evaluation() {
    let parser = ConstraintParser::default();
    let properties = [Property::new("count", json!(0)).unwrap(), Property::new("big", json!(i64::MAX)).unwrap()];

    for rule in [
        "properties.exists(p, p.type == 'count' && 1 / p.value == 1)",
        "properties.exists(p, p.type == 'count' && 1 % p.value == 1)",
        "properties.exists(p, p.type == 'big' && p.value + 1 > 0)",
        "properties.exists(p, p.type == 'big' && p.value * 2 > 0)",
        "properties.exists(p, p.type == 'big' && 0 - p.value - 2 < 0)",
    ] {
        let document = json!({"all": {"constraints": [
            {"cel": {"rule": rule}},
            {"gvk": {"group": "example.com", "version": "v1", "kind": "Missing"}}
        ]}});
        let constraint = parser.parse(document.to_string().as_bytes()).unwrap();

        let evaluation = evaluate(&constraint, &properties);
        assert!(!evaluation.satisfied, "{rule}");
        assert_eq!(evaluation.errors.len(), 1, "{rule}");
        assert_eq!(evaluation.errors[0].error.kind(), ErrorKind::Evaluation, "{rule}");

        // both children are still reported, followed by the parent
        assert_eq!(evaluation.failures.len(), 3, "{rule}");
    }
}

#[test]
fn test_matching_candidates() {
    let constraint = ConstraintParser::default()
        .parse(br#"{"package": {"packageName": "etcd", "versionRange": ">=0.9.0 <1.0.0"}}"#)
        .unwrap();

    let candidates: Vec<Candidate> = serde_json::from_value(json!([
        {"name": "etcd.v0.6.1", "properties": [{"type": "olm.package", "value": {"packageName": "etcd", "version": "0.6.1"}}]},
        {"name": "etcd.v0.9.2", "properties": [{"type": "olm.package", "value": {"packageName": "etcd", "version": "0.9.2"}}]},
        {"name": "etcd.v0.9.4", "properties": [{"type": "olm.package", "value": {"packageName": "etcd", "version": "0.9.4"}}]},
        {"name": "etcd.v1.0.0", "properties": [{"type": "olm.package", "value": {"packageName": "etcd", "version": "1.0.0"}}]}
    ]))
    .unwrap();

    let names: Vec<_> = matching_candidates(&constraint, &candidates)
        .into_iter()
        .map(|c| c.name.as_str())
        .collect();
    assert_eq!(names, vec!["etcd.v0.9.2", "etcd.v0.9.4"]);
}

#[test]
fn test_concurrent_evaluation_matches_sequential() {
    let program = Environment::shared()
        .compile("properties.exists(p, p.type == 'olm.package' && semver_compare(p.value.version, '1.5.0') >= 0)")
        .unwrap();
    let constraint = Constraint::all(vec![
        Constraint::cel(program.clone()),
        Constraint::not(vec![Constraint::gvk("example.com", "v1", "Forbidden")]),
    ]);

    let inputs: Vec<Vec<Property>> = (0..64)
        .map(|i| {
            let mut properties = vec![Property::package("foo", format!("1.{}.0", i % 10))];
            if i % 7 == 0 {
                properties.push(Property::gvk("example.com", "v1", "Forbidden"));
            }
            properties
        })
        .collect();

    let sequential: Vec<_> = inputs.iter().map(|p| evaluate(&constraint, p)).collect();
    let direct: Vec<_> = inputs.iter().map(|p| program.evaluate(p).unwrap()).collect();

    thread::scope(|scope| {
        let handles: Vec<_> = inputs
            .iter()
            .map(|properties| {
                let constraint = &constraint;
                let program = &program;
                scope.spawn(move || (evaluate(constraint, properties), program.evaluate(properties).unwrap()))
            })
            .collect();

        for (index, handle) in handles.into_iter().enumerate() {
            let (evaluation, result) = handle.join().unwrap();
            assert_eq!(evaluation, sequential[index]);
            assert_eq!(result, direct[index]);
        }
    });

    assert!(sequential.iter().any(|e| e.satisfied));
    assert!(sequential.iter().any(|e| !e.satisfied));
}

#[test]
fn test_concurrent_compilation() {
    thread::scope(|scope| {
        for i in 0..16 {
            let _ = scope.spawn(move || {
                let rule = format!("size(properties) >= {i}");
                let program = Environment::shared().compile(&rule).unwrap();
                assert_eq!(program.evaluate(&[]).unwrap(), i == 0);
            });
        }
    });
}
