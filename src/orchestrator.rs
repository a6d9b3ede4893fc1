//! The `generate` and `update` workflows.
//!
//! Generation is fail-fast: a collaborator failure aborts the run before the
//! baseline is written, so re-running with the same inputs is safe. Patching
//! tolerates partial failure: a field that cannot be located becomes a
//! [`PatchWarning`] and the run continues.

use crate::changes::{self, ChangeSet, TrackedField};
use crate::error::{Error, PatchWarning};
use crate::fallback::{FallbackChain, PatchRequest};
use crate::generator::{GenerationContext, GeneratorSet};
use crate::region::{update_regions, RegionError, RegionIndex};
use crate::report::FileChange;
use crate::spec::{component_dir, Component, ComponentKind, Spec, SpecFormat};
use crate::wiring::{
    api_patches, registry_value, remote_patches, shell_patches, FieldPatch, DEFAULT_REMOTE_HOST,
    REGISTRY, UNITS_DIR,
};
use crate::workspace::Workspace;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Settings of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    pub output: PathBuf,
    pub dry_run: bool,
    /// Replace existing component directories on `generate`
    pub force: bool,
    pub remote_host: String,
    /// Format of the persisted baseline
    pub format: SpecFormat,
}

impl RunOptions {
    pub fn new(output: impl Into<PathBuf>) -> Self {
        Self {
            output: output.into(),
            dry_run: false,
            force: false,
            remote_host: DEFAULT_REMOTE_HOST.to_string(),
            format: SpecFormat::default(),
        }
    }
}

/// What a run did (or, in dry-run, would do).
#[derive(Debug, Default)]
pub struct RunReport {
    pub dry_run: bool,
    /// Empty for `generate`
    pub change_set: ChangeSet,
    /// Component directories written
    pub generated: Vec<PathBuf>,
    /// Component directories whose generator cannot run in dry-run
    pub pending: Vec<PathBuf>,
    /// Wiring files rewritten by patches
    pub patched: Vec<PathBuf>,
    /// Component directories deleted
    pub removed: Vec<PathBuf>,
    pub warnings: Vec<PatchWarning>,
    /// Every file write and delete, in order
    pub changes: Vec<FileChange>,
}

impl RunReport {
    fn warn(&mut self, warning: PatchWarning) {
        tracing::warn!("{warning}");
        self.warnings.push(warning);
    }
}

pub struct Orchestrator {
    options: RunOptions,
    generators: GeneratorSet,
    fallback: FallbackChain,
}

impl Orchestrator {
    pub fn new(options: RunOptions) -> Self {
        Self {
            options,
            generators: GeneratorSet::default(),
            fallback: FallbackChain::default(),
        }
    }

    pub fn with_generators(mut self, generators: GeneratorSet) -> Self {
        self.generators = generators;
        self
    }

    pub fn with_fallback(mut self, fallback: FallbackChain) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn options(&self) -> &RunOptions {
        &self.options
    }

    fn open(&self) -> Result<Workspace, Error> {
        Workspace::open(&self.options.output, self.options.dry_run)
    }

    fn context<'a>(&'a self, spec: &'a Spec) -> GenerationContext<'a> {
        GenerationContext {
            spec,
            remote_host: &self.options.remote_host,
        }
    }

    /// Generate every component of `spec` and persist it as the baseline.
    pub fn generate(&self, spec: &Spec) -> Result<RunReport, Error> {
        let mut ws = self.open()?;
        let mut report = RunReport {
            dry_run: ws.is_dry_run(),
            ..RunReport::default()
        };
        tracing::info!(
            output = %ws.root().display(),
            dry_run = ws.is_dry_run(),
            components = spec.components().count(),
            "generating project"
        );

        let ctx = self.context(spec);
        for component in spec.components() {
            self.generate_component(&mut ws, component, &ctx, self.options.force, &mut report)?;
        }

        ws.save_baseline(spec, self.options.format)?;
        report.changes = ws.into_changes();
        Ok(report)
    }

    /// Bring the output in line with `spec`, diffing against the persisted
    /// baseline.
    pub fn update(&self, spec: &Spec) -> Result<RunReport, Error> {
        let ws = self.open()?;
        let baseline = ws
            .load_baseline()?
            .ok_or_else(|| Error::MissingBaseline(ws.root().to_path_buf()))?;
        self.run_update(ws, &baseline, spec)
    }

    /// Like [`Orchestrator::update`], with an explicit previous spec.
    pub fn update_from(&self, old: &Spec, new: &Spec) -> Result<RunReport, Error> {
        let ws = self.open()?;
        self.run_update(ws, old, new)
    }

    /// Change set between the persisted baseline and `spec`. Never writes.
    pub fn plan(&self, spec: &Spec) -> Result<ChangeSet, Error> {
        let ws = Workspace::open(&self.options.output, true)?;
        let baseline = ws
            .load_baseline()?
            .ok_or_else(|| Error::MissingBaseline(ws.root().to_path_buf()))?;
        Ok(changes::diff(&baseline, spec))
    }

    fn run_update(&self, mut ws: Workspace, old: &Spec, new: &Spec) -> Result<RunReport, Error> {
        let change_set = changes::diff(old, new);
        let mut report = RunReport {
            dry_run: ws.is_dry_run(),
            ..RunReport::default()
        };
        tracing::info!(
            output = %ws.root().display(),
            dry_run = ws.is_dry_run(),
            unchanged = change_set.is_empty(),
            "updating project"
        );

        let ctx = self.context(new);

        // A re-run after a failed update may find added components already
        // on disk, so they are replaced rather than refused.
        let added = change_set
            .remotes
            .added
            .iter()
            .filter_map(|name| new.remote(name).map(Component::Remote))
            .chain(
                change_set
                    .apis
                    .added
                    .iter()
                    .filter_map(|name| new.api(name).map(Component::Api)),
            );
        for component in added {
            self.generate_component(&mut ws, component, &ctx, true, &mut report)?;
        }

        for delta in &change_set.remotes.modified {
            if let Some(remote) = new.remote(&delta.name) {
                let dir = component_dir(ComponentKind::Remote, &remote.name);
                let patches = remote_patches(remote, &delta.fields);
                self.patch_component(&mut ws, &dir, patches, &mut report)?;
                if delta.fields.contains(&TrackedField::ExposedUnits) {
                    self.add_missing_units(&mut ws, Component::Remote(remote), &ctx, &mut report)?;
                }
            }
        }
        for delta in &change_set.apis.modified {
            if let Some(api) = new.api(&delta.name) {
                let dir = component_dir(ComponentKind::Api, &api.name);
                let patches = api_patches(api, &delta.fields);
                self.patch_component(&mut ws, &dir, patches, &mut report)?;
            }
        }

        let mut shell = shell_patches(&new.shell, &change_set.shell);
        if !change_set.remotes.is_empty() {
            shell.push(FieldPatch {
                binding: REGISTRY,
                value: registry_value(&new.remotes, &self.options.remote_host),
            });
        }
        let shell_dir = component_dir(ComponentKind::Shell, &new.shell.name);
        self.patch_component(&mut ws, &shell_dir, shell, &mut report)?;

        let removed = change_set
            .remotes
            .removed
            .iter()
            .map(|name| component_dir(ComponentKind::Remote, name))
            .chain(
                change_set
                    .apis
                    .removed
                    .iter()
                    .map(|name| component_dir(ComponentKind::Api, name)),
            );
        for dir in removed {
            if ws.delete_dir(&dir)? {
                tracing::info!(component = %dir.display(), "removed component");
                report.removed.push(dir);
            }
        }

        ws.save_baseline(new, self.options.format)?;
        report.change_set = change_set;
        report.changes = ws.into_changes();
        Ok(report)
    }

    fn generate_component(
        &self,
        ws: &mut Workspace,
        component: Component<'_>,
        ctx: &GenerationContext<'_>,
        replace: bool,
        report: &mut RunReport,
    ) -> Result<(), Error> {
        let dir = component.output_dir();
        let generator = self.generators.for_kind(component.kind());

        if ws.is_dry_run() && !generator.supports_preview() {
            tracing::info!(
                component = component.name(),
                generator = generator.name(),
                "generator cannot preview; skipped in dry-run"
            );
            report.pending.push(dir);
            return Ok(());
        }

        tracing::info!(
            kind = %component.kind(),
            component = component.name(),
            generator = generator.name(),
            "generating component"
        );
        let tree = generator.render(component, ctx)?;
        tree.validate(component.name())?;
        ws.flush_component(&dir, &tree, replace)?;
        report.generated.push(dir);
        Ok(())
    }

    /// Newly exposed units need their module files. Existing files, and
    /// files of units no longer exposed, are left alone.
    fn add_missing_units(
        &self,
        ws: &mut Workspace,
        component: Component<'_>,
        ctx: &GenerationContext<'_>,
        report: &mut RunReport,
    ) -> Result<(), Error> {
        let dir = component.output_dir();
        let generator = self.generators.for_kind(component.kind());
        if ws.is_dry_run() && !generator.supports_preview() {
            report.pending.push(dir);
            return Ok(());
        }

        let tree = generator.render(component, ctx)?;
        for (file, content) in tree.iter().filter(|(p, _)| p.starts_with(UNITS_DIR)) {
            let path = dir.join(file);
            if ws.read(&path)?.is_none() {
                ws.write(&path, content)?;
                tracing::info!(file = %path.display(), "added exposed unit");
            }
        }
        Ok(())
    }

    /// Apply field patches to the wiring files of one component, one write
    /// per file.
    fn patch_component(
        &self,
        ws: &mut Workspace,
        dir: &Path,
        patches: Vec<FieldPatch>,
        report: &mut RunReport,
    ) -> Result<(), Error> {
        let mut by_file: BTreeMap<&'static str, Vec<FieldPatch>> = BTreeMap::new();
        for patch in patches {
            by_file.entry(patch.binding.file).or_default().push(patch);
        }

        for (file, patches) in by_file {
            let path = dir.join(file);
            let Some(original) = ws.read(&path)? else {
                for patch in &patches {
                    report.warn(PatchWarning::new(
                        &path,
                        patch.binding.region,
                        "file does not exist",
                    ));
                }
                continue;
            };

            let text = self.patch_text(&path, &original, &patches, report);
            if ws.write(&path, &text)? {
                tracing::info!(file = %path.display(), "patched");
                report.patched.push(path);
            }
        }
        Ok(())
    }

    /// Managed regions first; fields without a region go through the
    /// fallback chain.
    fn patch_text(
        &self,
        path: &Path,
        original: &str,
        patches: &[FieldPatch],
        report: &mut RunReport,
    ) -> String {
        let mut updates: BTreeMap<String, String> = patches
            .iter()
            .map(|p| (p.binding.region.to_string(), p.binding.body(&p.value)))
            .collect();

        let update = loop {
            match update_regions(original, &updates) {
                Ok(update) => break update,
                Err(RegionError::AmbiguousId { id, count }) => {
                    report.warn(PatchWarning::new(
                        path,
                        id.as_str(),
                        format!("region id appears {count} times"),
                    ));
                    updates.remove(&id);
                }
                Err(error) => {
                    for id in updates.keys() {
                        report.warn(PatchWarning::new(path, id.as_str(), error.to_string()));
                    }
                    return original.to_string();
                }
            }
        };

        let mut text = update.text;
        for patch in patches
            .iter()
            .filter(|p| update.missing.iter().any(|id| id == p.binding.region))
        {
            text = self.fallback_patch(path, text, patch, report);
        }
        text
    }

    fn fallback_patch(
        &self,
        path: &Path,
        text: String,
        patch: &FieldPatch,
        report: &mut RunReport,
    ) -> String {
        let binding = &patch.binding;
        let Some(target) = binding.target() else {
            let warning = PatchWarning::new(path, binding.region, "no managed region with this id")
                .suggest_from(binding.region, RegionIndex::new(&text).ids());
            report.warn(warning);
            return text;
        };

        tracing::debug!(
            file = %path.display(),
            region = binding.region,
            %target,
            "managed region missing; trying structural patch"
        );
        let value = binding.expression(&patch.value);
        let outcome = self.fallback.patch(
            &text,
            &PatchRequest {
                file: path,
                target: &target,
                value: &value,
            },
        );
        if let Some(warning) = outcome.warning {
            report.warn(warning);
        }
        outcome.text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::load_from_str;
    use std::fs;

    fn spec(yaml: &str) -> Spec {
        load_from_str(yaml, SpecFormat::Yaml).unwrap()
    }

    const BASE: &str = r#"
name: shop
shell: { name: host, port: 3000 }
remotes:
  - { name: alpha, port: 3001, exposedUnits: [Header] }
apis:
  - { name: orders, port: 4000, database: postgres }
"#;

    #[test]
    fn generate_writes_components_and_baseline() {
        let dir = tempfile::tempdir().unwrap();
        let orchestrator = Orchestrator::new(RunOptions::new(dir.path()));

        let report = orchestrator.generate(&spec(BASE)).unwrap();
        assert_eq!(
            report.generated,
            vec![
                PathBuf::from("shell"),
                PathBuf::from("remotes/alpha"),
                PathBuf::from("apis/orders"),
            ]
        );
        assert!(dir.path().join("remotes/alpha/src/components/Header.tsx").exists());
        assert!(dir.path().join(".fedgen/baseline.yaml").exists());
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn generate_refuses_existing_output_without_force() {
        let dir = tempfile::tempdir().unwrap();
        let spec = spec(BASE);
        Orchestrator::new(RunOptions::new(dir.path()))
            .generate(&spec)
            .unwrap();

        let err = Orchestrator::new(RunOptions::new(dir.path()))
            .generate(&spec)
            .unwrap_err();
        assert!(matches!(err, Error::ComponentExists(_)));

        let mut options = RunOptions::new(dir.path());
        options.force = true;
        let report = Orchestrator::new(options).generate(&spec).unwrap();
        assert!(report.changes.is_empty());
    }

    #[test]
    fn update_patches_api_fields_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let orchestrator = Orchestrator::new(RunOptions::new(dir.path()));
        orchestrator.generate(&spec(BASE)).unwrap();

        let config = dir.path().join("apis/orders/src/config.ts");
        let edited = fs::read_to_string(&config).unwrap() + "// hand-written\n";
        fs::write(&config, &edited).unwrap();

        let new = spec(&BASE.replace("database: postgres", "database: mysql"));
        let report = orchestrator.update(&new).unwrap();

        assert_eq!(report.patched, vec![PathBuf::from("apis/orders/src/config.ts")]);
        let text = fs::read_to_string(&config).unwrap();
        assert!(text.contains("  database: \"mysql\",\n"));
        assert!(text.ends_with("// hand-written\n"));
    }

    #[test]
    fn update_without_baseline_fails() {
        let dir = tempfile::tempdir().unwrap();
        let orchestrator = Orchestrator::new(RunOptions::new(dir.path()));
        assert!(matches!(
            orchestrator.update(&spec(BASE)),
            Err(Error::MissingBaseline(_))
        ));
        assert!(matches!(
            orchestrator.plan(&spec(BASE)),
            Err(Error::MissingBaseline(_))
        ));
    }

    #[test]
    fn plan_reports_changes_without_writing() {
        let dir = tempfile::tempdir().unwrap();
        let orchestrator = Orchestrator::new(RunOptions::new(dir.path()));
        orchestrator.generate(&spec(BASE)).unwrap();
        let before = fs::read_to_string(dir.path().join(".fedgen/baseline.yaml")).unwrap();

        let plan = orchestrator
            .plan(&spec(&BASE.replace("port: 3001", "port: 3005")))
            .unwrap();
        assert_eq!(plan.remotes.modified_names(), vec!["alpha"]);
        assert_eq!(
            fs::read_to_string(dir.path().join(".fedgen/baseline.yaml")).unwrap(),
            before
        );
    }

    #[test]
    fn duplicate_region_ids_become_warnings() {
        let dir = tempfile::tempdir().unwrap();
        let orchestrator = Orchestrator::new(RunOptions::new(dir.path()));
        orchestrator.generate(&spec(BASE)).unwrap();

        let theme = dir.path().join("shell/src/theme.ts");
        let text = fs::read_to_string(&theme).unwrap();
        let duplicated = format!("{text}// fedgen:begin id:theme\n// fedgen:end\n");
        fs::write(&theme, &duplicated).unwrap();

        let new = spec(&BASE.replace("port: 3000 }", "port: 3000, theme: dark }"));
        let report = orchestrator.update(&new).unwrap();

        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.warnings[0].target, "theme");
        assert_eq!(fs::read_to_string(&theme).unwrap(), duplicated);
    }
}
