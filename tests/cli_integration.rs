//! Command-line interface: generate, update, plan and regions.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

const SPEC: &str = r#"
name: shop
shell: { name: host, port: 3000 }
remotes:
  - { name: alpha, port: 3001 }
"#;

fn command(dir: &Path) -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_fedgen"));
    command
        .current_dir(dir)
        .env_remove("FEDGEN_OUTPUT")
        .env_remove("FEDGEN_LOG")
        .env("NO_COLOR", "1")
        .env("CLICOLOR", "0");
    command
}

fn fedgen(dir: &Path, args: &[&str]) -> Output {
    command(dir).args(args).output().unwrap()
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn setup() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("app.yaml"), SPEC).unwrap();
    dir
}

#[test]
fn help_lists_commands() {
    let dir = setup();
    let output = fedgen(dir.path(), &["--help"]);

    assert!(output.status.success());
    let text = stdout(&output);
    for command in ["generate", "update", "plan", "regions"] {
        assert!(text.contains(command), "missing {command}");
    }
}

#[test]
fn generate_then_update() {
    let dir = setup();

    let output = fedgen(dir.path(), &["generate", "app.yaml", "--output", "out"]);
    assert!(output.status.success(), "{}", stderr(&output));
    assert!(dir.path().join("out/remotes/alpha/package.json").exists());
    assert!(dir.path().join("out/.fedgen/baseline.yaml").exists());

    fs::write(
        dir.path().join("app.yaml"),
        SPEC.replace("port: 3001", "port: 3002"),
    )
    .unwrap();
    let output = fedgen(dir.path(), &["update", "app.yaml", "--output", "out", "--diff"]);
    assert!(output.status.success(), "{}", stderr(&output));

    let text = stdout(&output);
    assert!(text.contains("alpha"));
    assert!(text.contains("+    port: 3002,"));
    let rspack = fs::read_to_string(dir.path().join("out/remotes/alpha/rspack.config.js")).unwrap();
    assert!(rspack.contains("port: 3002"));
}

#[test]
fn dry_run_prints_preview_and_writes_nothing() {
    let dir = setup();

    let output = fedgen(dir.path(), &["generate", "app.yaml", "--output", "out", "--dry-run"]);

    assert!(output.status.success(), "{}", stderr(&output));
    assert!(!dir.path().join("out").exists());
    let text = stdout(&output);
    assert!(text.contains("DRY RUN"));
    assert!(text.contains("shell/package.json"));
}

#[test]
fn invalid_spec_exits_with_one() {
    let dir = setup();
    fs::write(dir.path().join("bad.yaml"), "name: shop\nshell: { name: host }\n").unwrap();

    let output = fedgen(dir.path(), &["generate", "bad.yaml", "--output", "out"]);

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("error:"));
    assert!(!dir.path().join("out/shell").exists());
}

#[test]
fn update_without_baseline_fails() {
    let dir = setup();
    let output = fedgen(dir.path(), &["update", "app.yaml", "--output", "out"]);

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("generate"));
}

#[test]
fn plan_prints_change_set() {
    let dir = setup();
    assert!(fedgen(dir.path(), &["generate", "app.yaml", "-o", "out"]).status.success());

    fs::write(
        dir.path().join("app.yaml"),
        format!("{SPEC}  - {{ name: beta, port: 3003 }}\n"),
    )
    .unwrap();
    let output = fedgen(dir.path(), &["plan", "app.yaml", "-o", "out"]);

    assert!(output.status.success(), "{}", stderr(&output));
    let text = stdout(&output);
    assert!(text.contains("remotes:"));
    assert!(text.contains("beta"));
    assert!(!dir.path().join("out/remotes/beta").exists());
}

#[test]
fn output_from_environment_and_config() {
    let dir = setup();
    fs::write(dir.path().join("fedgen.toml"), "output = \"from-config\"\n").unwrap();

    let output = fedgen(dir.path(), &["generate", "app.yaml"]);
    assert!(output.status.success(), "{}", stderr(&output));
    assert!(dir.path().join("from-config/shell").exists());

    let output = command(dir.path())
        .args(["generate", "app.yaml"])
        .env("FEDGEN_OUTPUT", "from-env")
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", stderr(&output));
    assert!(dir.path().join("from-env/shell").exists());
}

#[test]
fn invalid_config_is_reported() {
    let dir = setup();
    fs::write(dir.path().join("fedgen.toml"), "remote_host = \"localhost\"\n").unwrap();

    let output = fedgen(dir.path(), &["generate", "app.yaml", "-o", "out"]);

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("remote_host"));
}

#[test]
fn regions_lists_managed_regions() {
    let dir = setup();
    fs::write(
        dir.path().join("config.js"),
        "a\n// fedgen:begin id:port\nport: 1,\n// fedgen:end\nb\n",
    )
    .unwrap();

    let output = fedgen(dir.path(), &["regions", "config.js"]);

    assert!(output.status.success());
    let text = stdout(&output);
    assert!(text.contains("port"));
    assert!(text.contains("lines 2-4"));
}
