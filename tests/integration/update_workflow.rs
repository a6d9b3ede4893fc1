use super::{evolved, generated, options, read, snapshot, spec, BASE};
use fedgen::{FileAction, Orchestrator};
use pretty_assertions::assert_eq;
use std::fs;
use std::path::PathBuf;

#[test]
fn port_change_and_new_remote() {
    let dir = generated();
    let orchestrator = Orchestrator::new(options(dir.path()));

    let report = orchestrator.update(&evolved()).unwrap();

    assert_eq!(report.change_set.remotes.modified_names(), vec!["alpha"]);
    assert_eq!(report.change_set.remotes.added, vec!["beta".to_string()]);
    assert!(report.change_set.remotes.removed.is_empty());
    assert_eq!(report.generated, vec![PathBuf::from("remotes/beta")]);
    assert!(report.warnings.is_empty(), "{:?}", report.warnings);

    let rspack = read(dir.path(), "remotes/alpha/rspack.config.js");
    assert!(rspack.contains("    port: 3002,\n"));
    assert!(!rspack.contains("3001"));

    let beta = read(dir.path(), "remotes/beta/rspack.config.js");
    assert!(beta.contains("    port: 3003,\n"));

    let federation = read(dir.path(), "shell/module-federation.config.js");
    assert!(federation.contains("\"alpha\": \"alpha@http://localhost:3002/remoteEntry.js\""));
    assert!(federation.contains("\"beta\": \"beta@http://localhost:3003/remoteEntry.js\""));
    let alpha_at = federation.find("\"alpha\"").unwrap();
    let beta_at = federation.find("\"beta\"").unwrap();
    assert!(alpha_at < beta_at);

    let baseline = read(dir.path(), ".fedgen/baseline.yaml");
    assert!(baseline.contains("beta"));
}

#[test]
fn unchanged_rerun_writes_nothing() {
    let dir = generated();
    let orchestrator = Orchestrator::new(options(dir.path()));
    orchestrator.update(&evolved()).unwrap();
    let before = snapshot(dir.path());

    let report = orchestrator.update(&evolved()).unwrap();

    assert!(report.change_set.is_empty());
    assert!(report.changes.is_empty());
    assert!(report.patched.is_empty());
    assert_eq!(snapshot(dir.path()), before);
}

#[test]
fn removed_remote_is_deleted_and_unregistered() {
    let dir = generated();
    let orchestrator = Orchestrator::new(options(dir.path()));
    orchestrator.update(&evolved()).unwrap();

    let without_alpha = spec(
        r#"
name: shop
shell: { name: host, port: 3000 }
remotes:
  - { name: beta, port: 3003 }
apis:
  - { name: orders, port: 4000, database: postgres }
"#,
    );
    let report = orchestrator.update(&without_alpha).unwrap();

    assert_eq!(report.removed, vec![PathBuf::from("remotes/alpha")]);
    assert!(!dir.path().join("remotes/alpha").exists());
    assert!(report
        .changes
        .iter()
        .any(|c| c.path == PathBuf::from("remotes/alpha/package.json")
            && c.action == FileAction::Delete));

    let federation = read(dir.path(), "shell/module-federation.config.js");
    assert!(!federation.contains("alpha@"));
    assert!(federation.contains("beta@"));
}

#[test]
fn removed_api_is_deleted() {
    let dir = generated();
    let report = Orchestrator::new(options(dir.path()))
        .update(&spec(&BASE.replace(
            "apis:\n  - { name: orders, port: 4000, database: postgres }\n",
            "",
        )))
        .unwrap();

    assert_eq!(report.change_set.apis.removed, vec!["orders".to_string()]);
    assert!(!dir.path().join("apis/orders").exists());
    // the registry only follows remotes
    assert!(!report
        .patched
        .contains(&PathBuf::from("shell/module-federation.config.js")));
}

#[test]
fn developer_edits_outside_regions_survive() {
    let dir = generated();
    let path = dir.path().join("shell/module-federation.config.js");
    let edited = read(dir.path(), "shell/module-federation.config.js")
        .replace("  shared: {", "  // team note: keep react a singleton\n  shared: {");
    fs::write(&path, &edited).unwrap();

    Orchestrator::new(options(dir.path()))
        .update(&evolved())
        .unwrap();

    let federation = fs::read_to_string(&path).unwrap();
    assert!(federation.contains("  // team note: keep react a singleton\n  shared: {"));
    assert!(federation.contains("beta@"));
}

#[test]
fn shell_scalars_are_patched() {
    let dir = generated();
    let renamed = BASE.replace(
        "shell: { name: host, port: 3000 }",
        "shell: { name: portal, port: 3100, theme: dark }",
    );

    let report = Orchestrator::new(options(dir.path()))
        .update(&spec(&renamed))
        .unwrap();

    assert_eq!(report.change_set.shell.len(), 3);
    let federation = read(dir.path(), "shell/module-federation.config.js");
    assert!(federation.contains("  name: \"portal\",\n"));
    assert!(read(dir.path(), "shell/rspack.config.js").contains("    port: 3100,\n"));
    assert!(read(dir.path(), "shell/src/theme.ts").contains("export const theme = \"dark\";\n"));
}

#[test]
fn remote_fields_are_patched() {
    let dir = generated();
    let changed = BASE
        .replace("exposedUnits: [Header]", "exposedUnits: [Header, Footer]")
        .replace("dependencies: [react]", "dependencies: [react, zustand]");

    let report = Orchestrator::new(options(dir.path()))
        .update(&spec(&changed))
        .unwrap();

    assert!(report.warnings.is_empty());
    let federation = read(dir.path(), "remotes/alpha/module-federation.config.js");
    assert!(federation.contains("\"./Footer\": \"./src/components/Footer.tsx\""));
    assert!(federation.contains("\"zustand\""));

    assert!(dir.path().join("remotes/alpha/src/components/Footer.tsx").exists());
    assert!(report
        .changes
        .iter()
        .any(|c| c.path == PathBuf::from("remotes/alpha/src/components/Footer.tsx")
            && c.action == FileAction::Create));
}

#[test]
fn json_baseline_replaces_yaml() {
    let dir = generated();
    let mut json = options(dir.path());
    json.format = fedgen::SpecFormat::Json;

    Orchestrator::new(json).update(&evolved()).unwrap();

    assert!(dir.path().join(".fedgen/baseline.json").exists());
    assert!(!dir.path().join(".fedgen/baseline.yaml").exists());
    let plan = Orchestrator::new(options(dir.path()))
        .plan(&evolved())
        .unwrap();
    assert!(plan.is_empty());
}
