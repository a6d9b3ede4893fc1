//! Workflow tests driving the orchestrator against scratch output roots.

mod dry_run;
mod failures;
mod fallback_patching;
mod update_workflow;

use fedgen::spec::{load_from_str, Spec, SpecFormat};
use fedgen::{Orchestrator, RunOptions};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use walkdir::WalkDir;

pub const BASE: &str = r#"
name: shop
shell: { name: host, port: 3000 }
remotes:
  - name: alpha
    port: 3001
    exposedUnits: [Header]
    dependencies: [react]
apis:
  - { name: orders, port: 4000, database: postgres }
"#;

pub fn spec(yaml: &str) -> Spec {
    load_from_str(yaml, SpecFormat::Yaml).expect("valid spec")
}

/// Base spec with alpha moved to 3002 and beta added on 3003.
pub fn evolved() -> Spec {
    spec(
        r#"
name: shop
shell: { name: host, port: 3000 }
remotes:
  - name: alpha
    port: 3002
    exposedUnits: [Header]
    dependencies: [react]
  - { name: beta, port: 3003 }
apis:
  - { name: orders, port: 4000, database: postgres }
"#,
    )
}

pub fn options(root: &Path) -> RunOptions {
    RunOptions::new(root)
}

/// Output root generated from [`BASE`].
pub fn generated() -> TempDir {
    let dir = TempDir::new().expect("tempdir");
    Orchestrator::new(options(dir.path()))
        .generate(&spec(BASE))
        .expect("generate");
    dir
}

/// Every file under `root` with its content.
pub fn snapshot(root: &Path) -> BTreeMap<PathBuf, String> {
    WalkDir::new(root)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .map(|e| {
            let rel = e.path().strip_prefix(root).expect("under root").to_path_buf();
            (rel, fs::read_to_string(e.path()).expect("utf-8 file"))
        })
        .collect()
}

pub fn read(root: &Path, rel: &str) -> String {
    fs::read_to_string(root.join(rel)).unwrap_or_else(|e| panic!("{rel}: {e}"))
}
