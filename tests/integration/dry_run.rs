use super::{generated, options, snapshot, spec, BASE};
use fedgen::{FileAction, Orchestrator};
use std::path::PathBuf;

/// Every component differs from [`BASE`]: shell fields, alpha removed, beta
/// added, orders modified, billing added.
const EVERYTHING_CHANGED: &str = r#"
name: shop
shell: { name: portal, port: 3100, theme: dark }
remotes:
  - { name: beta, port: 3003, exposedUnits: [Cart] }
apis:
  - { name: orders, port: 4100, database: mysql, spec: ./orders.yaml }
  - { name: billing, port: 4200, database: postgres }
"#;

#[test]
fn update_dry_run_touches_nothing() {
    let dir = generated();
    let before = snapshot(dir.path());

    let mut opts = options(dir.path());
    opts.dry_run = true;
    let report = Orchestrator::new(opts)
        .update(&spec(EVERYTHING_CHANGED))
        .unwrap();

    assert!(report.dry_run);
    assert_eq!(snapshot(dir.path()), before);

    assert_eq!(report.change_set.remotes.added, vec!["beta".to_string()]);
    assert_eq!(report.change_set.remotes.removed, vec!["alpha".to_string()]);
    assert_eq!(report.removed, vec![PathBuf::from("remotes/alpha")]);
    assert_eq!(
        report.generated,
        vec![PathBuf::from("remotes/beta"), PathBuf::from("apis/billing")]
    );

    let paths: Vec<_> = report.changes.iter().map(|c| c.path.clone()).collect();
    assert!(paths.contains(&PathBuf::from("apis/orders/src/config.ts")));
    assert!(paths.contains(&PathBuf::from("shell/module-federation.config.js")));
    assert!(paths.contains(&PathBuf::from(".fedgen/baseline.yaml")));
}

#[test]
fn dry_run_previews_patched_text() {
    let dir = generated();
    let mut opts = options(dir.path());
    opts.dry_run = true;

    let report = Orchestrator::new(opts)
        .update(&spec(EVERYTHING_CHANGED))
        .unwrap();

    let config = report
        .changes
        .iter()
        .find(|c| c.path == PathBuf::from("apis/orders/src/config.ts"))
        .unwrap();
    assert_eq!(config.action, FileAction::Modify);
    let added: Vec<_> = config
        .lines()
        .into_iter()
        .filter(|l| l.kind == fedgen::LineKind::Add)
        .map(|l| l.text)
        .collect();
    assert!(added.contains(&"  port: 4100,".to_string()));
    assert!(added.contains(&"  database: \"mysql\",".to_string()));
}

#[test]
fn generate_dry_run_creates_no_output_root() {
    let temp = tempfile::tempdir().unwrap();
    let root = temp.path().join("out");
    let mut opts = options(&root);
    opts.dry_run = true;

    let report = Orchestrator::new(opts).generate(&spec(BASE)).unwrap();

    assert!(!root.exists());
    assert_eq!(report.generated.len(), 3);
    assert!(report
        .changes
        .iter()
        .all(|c| c.action == FileAction::Create));
}
