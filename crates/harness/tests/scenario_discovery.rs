//! Scenario discovery and validation against on-disk spec files

use std::path::Path;

use gatecheck_harness::{Error, Scenario, TestIdentity};

fn write_spec(dir: &Path, file: &str, name: &str, tags: &[&str]) {
    let tags_yaml = tags
        .iter()
        .map(|t| format!("  - {}", t))
        .collect::<Vec<_>>()
        .join("\n");
    let yaml = format!(
        r#"
name: {}
tags:
{}
steps:
  - action: navigate
    url: /login
  - action: assert_url
    expected: /login
"#,
        name, tags_yaml
    );
    std::fs::write(dir.join(file), yaml).unwrap();
}

#[test]
fn test_load_all_discovers_and_sorts() {
    let dir = tempfile::tempdir().unwrap();
    write_spec(dir.path(), "b.yaml", "beta", &["auth"]);
    write_spec(dir.path(), "a.yml", "alpha", &["smoke"]);

    // Nested directories are discovered too
    let nested = dir.path().join("nested");
    std::fs::create_dir(&nested).unwrap();
    write_spec(&nested, "c.yaml", "gamma", &["auth"]);

    // Non-YAML files are ignored
    std::fs::write(dir.path().join("notes.txt"), "not a scenario").unwrap();

    let scenarios = Scenario::load_all(dir.path()).unwrap();
    let names: Vec<_> = scenarios.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["alpha", "beta", "gamma"]);
}

#[test]
fn test_duplicate_names_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    write_spec(dir.path(), "one.yaml", "same", &["auth"]);
    write_spec(dir.path(), "two.yaml", "same", &["auth"]);

    let err = Scenario::load_all(dir.path()).unwrap_err();
    assert!(matches!(err, Error::SpecParse(_)));
}

#[test]
fn test_filter_by_tag() {
    let dir = tempfile::tempdir().unwrap();
    write_spec(dir.path(), "a.yaml", "alpha", &["smoke"]);
    write_spec(dir.path(), "b.yaml", "beta", &["auth"]);
    write_spec(dir.path(), "c.yaml", "gamma", &["auth", "smoke"]);

    let scenarios = Scenario::load_all(dir.path()).unwrap();
    let smoke = Scenario::filter_by_tag(scenarios, "smoke");
    let names: Vec<_> = smoke.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["alpha", "gamma"]);
}

#[test]
fn test_malformed_file_reports_path() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("bad.yaml"), "name: [unclosed").unwrap();

    let err = Scenario::load_all(dir.path()).unwrap_err();
    match err {
        Error::SpecParse(message) => assert!(message.contains("bad.yaml")),
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn test_shipped_suite_is_well_formed() {
    let specs_dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../specs");
    let scenarios = Scenario::load_all(&specs_dir).unwrap();

    assert_eq!(scenarios.len(), 11);
    for scenario in &scenarios {
        scenario.validate().unwrap_or_else(|e| {
            panic!("scenario {} failed validation: {}", scenario.name, e)
        });
        assert!(!scenario.steps.is_empty());
    }

    // Placeholder expansion leaves no braces behind in fill values
    let identity = TestIdentity::fresh("check");
    for scenario in &scenarios {
        for step in &scenario.with_identity(&identity).steps {
            if let gatecheck_harness::Step::Fill { value, .. } = step {
                assert!(
                    !value.contains("{"),
                    "unexpanded placeholder in {}: {}",
                    scenario.name,
                    value
                );
            }
        }
    }

    // The smoke subset covers registration and login
    let smoke = Scenario::filter_by_tag(scenarios, "smoke");
    let names: Vec<_> = smoke.iter().map(|s| s.name.as_str()).collect();
    assert!(names.contains(&"registration-new-account"));
    assert!(names.contains(&"login-with-username"));
}
