use super::{evolved, generated, options, read, spec, BASE};
use fedgen::region::{END_TOKEN, START_TOKEN};
use fedgen::{FallbackChain, Orchestrator};
use std::fs;
use std::path::Path;

/// Drop every marker line, leaving region bodies in place.
fn strip_markers(root: &Path, rel: &str) {
    let text = read(root, rel);
    let stripped: String = text
        .split_inclusive('\n')
        .filter(|line| !line.contains(START_TOKEN) && !line.contains(END_TOKEN))
        .collect();
    fs::write(root.join(rel), stripped).unwrap();
}

#[test]
fn unmarked_port_is_patched_structurally() {
    let dir = generated();
    strip_markers(dir.path(), "remotes/alpha/rspack.config.js");

    let report = Orchestrator::new(options(dir.path()))
        .update(&evolved())
        .unwrap();

    assert!(report.warnings.is_empty(), "{:?}", report.warnings);
    let rspack = read(dir.path(), "remotes/alpha/rspack.config.js");
    assert!(rspack.contains("  devServer: {\n    port: 3002,\n    historyApiFallback: true,\n"));
    assert!(!rspack.contains(START_TOKEN));
}

#[test]
fn unmarked_registry_is_rewritten_as_object() {
    let dir = generated();
    strip_markers(dir.path(), "shell/module-federation.config.js");

    let report = Orchestrator::new(options(dir.path()))
        .update(&evolved())
        .unwrap();

    assert!(report.warnings.is_empty(), "{:?}", report.warnings);
    let federation = read(dir.path(), "shell/module-federation.config.js");
    assert!(federation.contains(
        "  remotes: {\n    \"alpha\": \"alpha@http://localhost:3002/remoteEntry.js\",\n    \"beta\": \"beta@http://localhost:3003/remoteEntry.js\"\n  },\n"
    ));
}

#[test]
fn missing_target_leaves_file_and_warns() {
    let dir = generated();
    let path = "apis/orders/src/config.ts";
    let text = read(dir.path(), path);
    // Drops the database property and its start marker; the orphaned end
    // marker is ignored by the indexer.
    let without_database: String = text
        .split_inclusive('\n')
        .filter(|line| !line.contains("database"))
        .collect();
    fs::write(dir.path().join(path), &without_database).unwrap();

    let report = Orchestrator::new(options(dir.path()))
        .update(&spec(&BASE.replace("database: postgres", "database: mysql")))
        .unwrap();

    assert_eq!(report.warnings.len(), 1);
    let warning = &report.warnings[0];
    assert_eq!(warning.target, "defineServiceConfig(...).database");
    assert!(warning.reason.contains("syntax-tree"));
    assert!(warning.reason.contains("regex"));
    assert!(report.patched.is_empty());
}

#[test]
fn region_without_fallback_warns_with_suggestion() {
    let dir = generated();
    let path = "remotes/alpha/src/routes.ts";
    let renamed = read(dir.path(), path).replace("id:routes", "id:route");
    fs::write(dir.path().join(path), &renamed).unwrap();

    let report = Orchestrator::new(options(dir.path()))
        .update(&spec(&BASE.replace(
            "dependencies: [react]",
            "dependencies: [react]\n    routes: [{ path: /alpha }]",
        )))
        .unwrap();

    assert_eq!(report.warnings.len(), 1);
    assert_eq!(report.warnings[0].target, "routes");
    assert_eq!(report.warnings[0].suggestion.as_deref(), Some("route"));
    assert_eq!(read(dir.path(), path), renamed);
}

#[test]
fn empty_chain_only_warns() {
    let dir = generated();
    strip_markers(dir.path(), "remotes/alpha/rspack.config.js");
    let before = read(dir.path(), "remotes/alpha/rspack.config.js");

    let report = Orchestrator::new(options(dir.path()))
        .with_fallback(FallbackChain::new(Vec::new()))
        .update(&evolved())
        .unwrap();

    assert_eq!(report.warnings.len(), 1);
    assert_eq!(read(dir.path(), "remotes/alpha/rspack.config.js"), before);
    // the rest of the run still went through
    assert!(dir.path().join("remotes/beta").exists());
}
