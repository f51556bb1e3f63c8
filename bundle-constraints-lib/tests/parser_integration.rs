//! Integration tests for parsing constraint documents.

use bundle_constraints_lib::constraints::{
    Constraint, ConstraintError, ConstraintParser, DEFAULT_MAX_CONSTRAINT_SIZE, ErrorKind, ParserConfig, VersionRange,
};

const BASIC_GVK: &str = r#"{
    "failureMessage": "blah",
    "gvk": {
        "group": "example.com",
        "version": "v1",
        "kind": "Foo"
    }
}"#;

const BASIC_PACKAGE: &str = r#"{
    "failureMessage": "blah",
    "package": {
        "packageName": "foo",
        "versionRange": ">=1.0.0"
    }
}"#;

const COMPLEX: &str = r#"{
"message": "blah",
"all": {
    "constraints": [
        {"package": {"packageName": "fuz", "versionRange": ">=1.0.0"}},
        {"gvk": {"group": "fals.example.com", "version": "v1", "kind": "Fal"}},
        {
            "message": "foo and buf must be stable versions",
            "all": {"constraints": [
                {"package": {"packageName": "foo", "versionRange": ">=1.0.0"}},
                {"package": {"packageName": "buf", "versionRange": ">=1.0.0"}},
                {"gvk": {"group": "foos.example.com", "version": "v1", "kind": "Foo"}}
            ]}
        },
        {
            "message": "blah blah",
            "any": {"constraints": [
                {"gvk": {"group": "foos.example.com", "version": "v1beta1", "kind": "Foo"}},
                {"gvk": {"group": "foos.example.com", "version": "v1beta2", "kind": "Foo"}},
                {"gvk": {"group": "foos.example.com", "version": "v1", "kind": "Foo"}}
            ]}
        },
        {
            "none": {"constraints": [
                {"gvk": {"group": "bazs.example.com", "version": "v1alpha1", "kind": "Baz"}}
            ]}
        },
        {"cel": {"rule": "properties.exists(p, p.type == 'olm.test' && semver_compare(p.value, '1.0.0') == 0)"}}
    ]
}}"#;

fn parse(input: &str) -> Result<Constraint, ConstraintError> {
    ConstraintParser::default().parse(input.as_bytes())
}

fn range(source: &str) -> VersionRange {
    VersionRange::parse(source).unwrap()
}

fn compound_template(key: &str) -> String {
    format!(
        r#"{{"failureMessage": "blah", "{key}": {{"constraints": [
            {{"failureMessage": "blah blah", "package": {{"packageName": "fuz", "versionRange": ">=1.0.0"}}}}
        ]}}}}"#
    )
}

#[test]
fn test_basic_gvk() {
    assert_eq!(
        parse(BASIC_GVK).unwrap(),
        Constraint::gvk("example.com", "v1", "Foo").with_message("blah")
    );
}

#[test]
fn test_basic_package() {
    assert_eq!(
        parse(BASIC_PACKAGE).unwrap(),
        Constraint::package("foo", range(">=1.0.0")).with_message("blah")
    );
}

#[test]
fn test_basic_compounds() {
    let child = || vec![Constraint::package("fuz", range(">=1.0.0")).with_message("blah blah")];

    assert_eq!(parse(&compound_template("all")).unwrap(), Constraint::all(child()).with_message("blah"));
    assert_eq!(parse(&compound_template("any")).unwrap(), Constraint::any(child()).with_message("blah"));
    assert_eq!(parse(&compound_template("not")).unwrap(), Constraint::not(child()).with_message("blah"));
    assert_eq!(parse(&compound_template("none")).unwrap(), Constraint::not(child()).with_message("blah"));
}

#[test]
fn test_complex() {
    let constraint = parse(COMPLEX).unwrap();
    let bundle_constraints_lib::constraints::Predicate::All(all) = &constraint.predicate else {
        panic!("expected an all constraint, got {constraint:?}");
    };

    assert_eq!(constraint.message.as_deref(), Some("blah"));
    assert_eq!(all.constraints.len(), 6);
    assert_eq!(all.constraints[0], Constraint::package("fuz", range(">=1.0.0")));
    assert_eq!(all.constraints[1], Constraint::gvk("fals.example.com", "v1", "Fal"));
    assert_eq!(
        all.constraints[4],
        Constraint::not(vec![Constraint::gvk("bazs.example.com", "v1alpha1", "Baz")])
    );
}

#[test]
fn test_round_trip() {
    for input in [
        BASIC_GVK.to_string(),
        BASIC_PACKAGE.to_string(),
        COMPLEX.to_string(),
        compound_template("all"),
        compound_template("any"),
        compound_template("none"),
        r#"{"any": {"constraints": []}}"#.to_string(),
        r#"{"package": {"packageName": "foo", "versionRange": ">=1.0.0 <2.0.0 || 3.1.4"}}"#.to_string(),
    ] {
        let parsed = parse(&input).unwrap();
        let serialized = serde_json::to_vec(&parsed).unwrap();
        let reparsed = ConstraintParser::default().parse(&serialized).unwrap();
        assert_eq!(parsed, reparsed, "{input}");
        assert_eq!(parsed.to_json(), reparsed.to_json());
    }
}

#[test]
fn test_serialized_form_uses_canonical_keys() {
    let json = parse(&compound_template("none")).unwrap().to_json();
    assert!(json.get("not").is_some());
    assert!(json.get("none").is_none());
    assert_eq!(json["message"], "blah");
}

#[test]
fn test_too_large() {
    let input = vec![b'x'; DEFAULT_MAX_CONSTRAINT_SIZE + 1];
    let err = ConstraintParser::default().parse(&input).unwrap_err();
    assert_eq!(
        err,
        ConstraintError::SizeExceeded {
            size: DEFAULT_MAX_CONSTRAINT_SIZE + 1,
            max: DEFAULT_MAX_CONSTRAINT_SIZE,
        }
    );
}

#[test]
fn test_exactly_max_size_is_accepted() {
    let mut input = BASIC_GVK.as_bytes().to_vec();
    input.resize(DEFAULT_MAX_CONSTRAINT_SIZE, b' ');
    assert_eq!(input.len(), DEFAULT_MAX_CONSTRAINT_SIZE);
    let _ = ConstraintParser::default().parse(&input).unwrap();

    input.push(b' ');
    assert_eq!(
        ConstraintParser::default().parse(&input).unwrap_err().kind(),
        ErrorKind::SizeExceeded
    );
}

#[test]
fn test_custom_max_size() {
    let parser = ConstraintParser::new(ParserConfig { max_size: 32 });
    assert_eq!(parser.parse(BASIC_GVK.as_bytes()).unwrap_err().kind(), ErrorKind::SizeExceeded);
    let _ = parser.parse(br#"{"all": {"constraints": []}}"#).unwrap();
}

#[test]
fn test_unknown_field() {
    match parse(r#"{"message":"x","unexpected":1}"#).unwrap_err() {
        ConstraintError::UnknownField { field, .. } => assert_eq!(field, "unexpected"),
        other => panic!("unexpected error {other:?}"),
    }

    match parse(r#"{"failureMessage": "something", "arbitrary": {"key": "value"}}"#).unwrap_err() {
        ConstraintError::UnknownField { field, .. } => assert_eq!(field, "arbitrary"),
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn test_unknown_nested_field() {
    let input = r#"{"all": {"constraints": [{"gvk": {"group": "g", "version": "v", "kind": "k", "plural": "ks"}}]}}"#;
    match parse(input).unwrap_err() {
        ConstraintError::UnknownField { field, .. } => assert_eq!(field, "plural"),
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn test_malformed_documents() {
    for input in ["", "not json", "[]", "null", r#"{"gvk": "example.com/v1/Foo"}"#, r#"{"all": {"constraints": {}}}"#] {
        assert_eq!(parse(input).unwrap_err().kind(), ErrorKind::MalformedDocument, "{input}");
    }
}

#[test]
fn test_ambiguous_and_empty_nodes() {
    for input in [
        "{}",
        r#"{"message": "only a message"}"#,
        r#"{"all": {"constraints": [{}]}}"#,
        r#"{"gvk": {"group": "g", "version": "v", "kind": "k"}, "package": {"packageName": "p", "versionRange": "1.0.0"}}"#,
        r#"{"any": {"constraints": []}, "not": {"constraints": []}}"#,
        r#"{"gvk": {"group": "g", "version": "v"}}"#,
    ] {
        assert_eq!(parse(input).unwrap_err().kind(), ErrorKind::MalformedPredicate, "{input}");
    }
}

#[test]
fn test_invalid_range_and_rule() {
    assert_eq!(
        parse(r#"{"package": {"packageName": "foo", "versionRange": ">= banana"}}"#).unwrap_err().kind(),
        ErrorKind::InvalidRange
    );
    assert_eq!(
        parse(r#"{"cel": {"rule": "properties.exists(p, doesnt_exist(p.value, '1.0.0') == 0)"}}"#)
            .unwrap_err()
            .kind(),
        ErrorKind::Compile
    );
    assert_eq!(parse(r#"{"cel": {"rule": "1"}}"#).unwrap_err().kind(), ErrorKind::Compile);
}

#[test]
fn test_deep_nesting_is_rejected_cleanly() {
    let depth = 1000;
    let mut input = String::new();
    for _ in 0..depth {
        input.push_str(r#"{"all": {"constraints": ["#);
    }
    input.push_str(r#"{"gvk": {"group": "g", "version": "v", "kind": "k"}}"#);
    for _ in 0..depth {
        input.push_str("]}}");
    }

    assert_eq!(parse(&input).unwrap_err().kind(), ErrorKind::MalformedDocument);
}

#[test]
fn test_hostile_rules_are_rejected_cleanly() {
    let deep_parens = format!("{}true{}", "(".repeat(10_000), ")".repeat(10_000));
    let deep_lists = format!("{}1{} == []", "[".repeat(200), "]".repeat(200));
    let long_chain = ["true"; 5_000].join(" || ");

    let rules = [
        "99999999999999999999 == 1",
        "-99999999999999999999 == 1",
        "0xFFFFFFFFFFFFFFFFFF == 1",
        "18446744073709551616u == 0u",
        "0xFFFFFFFFFFFFFFFFFFu == 0u",
        r"'\q' == 'a'",
        r"'\x' == 'a'",
        r#""\u12" == "a""#,
        r"b'\q' == b'a'",
        r"b'\xZZ' == b'a'",
        deep_parens.as_str(),
        deep_lists.as_str(),
        long_chain.as_str(),
    ];

    for rule in rules {
        let document = serde_json::json!({"cel": {"rule": rule}}).to_string();
        let err = ConstraintParser::default().parse(document.as_bytes()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Compile, "{rule}");
    }
}
