use super::{evolved, generated, options, read, spec, BASE};
use fedgen::generator::{ComponentGenerator, FileTree, GenerationContext, GenerationError};
use fedgen::spec::{Component, ComponentKind};
use fedgen::{Error, GeneratorSet, Orchestrator};

struct Broken;

impl ComponentGenerator for Broken {
    fn name(&self) -> &str {
        "broken"
    }

    fn render(
        &self,
        component: Component<'_>,
        _ctx: &GenerationContext<'_>,
    ) -> Result<FileTree, GenerationError> {
        Err(GenerationError::CommandFailed {
            component: component.name().to_string(),
            command: "broken".to_string(),
            status: "exit status: 1".to_string(),
            stderr: "boom".to_string(),
        })
    }
}

#[test]
fn generation_failure_keeps_previous_baseline() {
    let dir = generated();
    let baseline = read(dir.path(), ".fedgen/baseline.yaml");
    let registry = read(dir.path(), "shell/module-federation.config.js");

    let orchestrator = Orchestrator::new(options(dir.path()))
        .with_generators(GeneratorSet::default().with(ComponentKind::Remote, Box::new(Broken)));
    let err = orchestrator.update(&evolved()).unwrap_err();

    assert!(matches!(err, Error::Generation(_)));
    assert!(err.to_string().contains("boom"));
    assert_eq!(read(dir.path(), ".fedgen/baseline.yaml"), baseline);
    assert_eq!(read(dir.path(), "shell/module-federation.config.js"), registry);
    assert!(!dir.path().join("remotes/beta").exists());

    // Same inputs, working generator: the run completes.
    let report = Orchestrator::new(options(dir.path()))
        .update(&evolved())
        .unwrap();
    assert_eq!(report.change_set.remotes.added, vec!["beta".to_string()]);
}

#[test]
fn generate_failure_writes_no_baseline() {
    let dir = tempfile::tempdir().unwrap();
    let orchestrator = Orchestrator::new(options(dir.path()))
        .with_generators(GeneratorSet::default().with(ComponentKind::Api, Box::new(Broken)));

    assert!(orchestrator.generate(&spec(BASE)).is_err());
    assert!(dir.path().join("shell").exists());
    assert!(!dir.path().join("apis/orders").exists());
    assert!(!dir.path().join(".fedgen").exists());
}

#[test]
fn update_requires_baseline() {
    let dir = tempfile::tempdir().unwrap();
    let err = Orchestrator::new(options(dir.path()))
        .update(&spec(BASE))
        .unwrap_err();
    assert!(matches!(err, Error::MissingBaseline(_)));
    assert!(err.to_string().contains("run `generate` first"));
}

#[test]
fn corrupt_baseline_is_a_spec_error() {
    let dir = generated();
    std::fs::write(dir.path().join(".fedgen/baseline.yaml"), "name: [\n").unwrap();

    let err = Orchestrator::new(options(dir.path()))
        .update(&spec(BASE))
        .unwrap_err();
    assert!(matches!(err, Error::Spec(_)));
    assert!(err.to_string().contains("baseline.yaml"));
}
