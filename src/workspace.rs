//! Explicit run context for one invocation: the output root, its safety
//! guard, the dry-run overlay and the record of every file change.

use crate::edit::{atomic_write, EditError};
use crate::error::Error;
use crate::generator::FileTree;
use crate::report::{FileAction, FileChange};
use crate::spec::{self, Spec, SpecFormat};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

/// Directory under the output root holding engine state.
pub const STATE_DIR: &str = ".fedgen";

const STAGING_PREFIX: &str = ".fedgen-staging-";

#[derive(Error, Debug)]
pub enum SafetyError {
    #[error("path is outside the output root: {path} (root: {root})")]
    OutsideOutput { path: PathBuf, root: PathBuf },

    #[error("failed to canonicalize path: {0}")]
    Canonicalize(#[from] io::Error),
}

/// Keeps every write and delete inside the output root.
#[derive(Debug, Clone)]
pub struct OutputGuard {
    root: PathBuf,
}

impl OutputGuard {
    /// The root is canonicalized so symlinked roots compare correctly.
    pub fn new(root: impl AsRef<Path>) -> Result<Self, SafetyError> {
        Ok(Self {
            root: root.as_ref().canonicalize()?,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve `relative` against the root and check it stays inside.
    ///
    /// The path itself may not exist yet; its deepest existing ancestor is
    /// canonicalized so symlinks cannot lead outside the root.
    pub fn validate_path(&self, relative: &Path) -> Result<PathBuf, SafetyError> {
        check_relative(relative, &self.root)?;
        let absolute = self.root.join(relative);

        let mut existing = absolute.as_path();
        while !existing.exists() {
            match existing.parent() {
                Some(parent) => existing = parent,
                None => break,
            }
        }
        let canonical = existing.canonicalize()?;
        if !canonical.starts_with(&self.root) {
            return Err(SafetyError::OutsideOutput {
                path: canonical,
                root: self.root.clone(),
            });
        }
        Ok(absolute)
    }
}

fn check_relative(relative: &Path, root: &Path) -> Result<(), SafetyError> {
    let contained = !relative.as_os_str().is_empty()
        && relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
    if contained {
        Ok(())
    } else {
        Err(SafetyError::OutsideOutput {
            path: relative.to_path_buf(),
            root: root.to_path_buf(),
        })
    }
}

/// Output directory of one run.
///
/// In dry-run mode nothing touches the disk: writes and deletes land in an
/// in-memory overlay that later reads observe.
#[derive(Debug)]
pub struct Workspace {
    root: PathBuf,
    guard: Option<OutputGuard>,
    dry_run: bool,
    overlay: BTreeMap<PathBuf, String>,
    deleted: BTreeSet<PathBuf>,
    changes: Vec<FileChange>,
}

impl Workspace {
    pub fn open(root: impl Into<PathBuf>, dry_run: bool) -> Result<Self, Error> {
        let root = root.into();
        if !dry_run {
            fs::create_dir_all(&root).map_err(|e| Error::io(&root, e))?;
        }
        let guard = if root.is_dir() {
            Some(OutputGuard::new(&root)?)
        } else {
            None
        };
        Ok(Self {
            root,
            guard,
            dry_run,
            overlay: BTreeMap::new(),
            deleted: BTreeSet::new(),
            changes: Vec::new(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    pub fn changes(&self) -> &[FileChange] {
        &self.changes
    }

    pub fn into_changes(self) -> Vec<FileChange> {
        self.changes
    }

    fn resolve(&self, relative: &Path) -> Result<PathBuf, Error> {
        match &self.guard {
            Some(guard) => Ok(guard.validate_path(relative)?),
            None => {
                check_relative(relative, &self.root)?;
                Ok(self.root.join(relative))
            }
        }
    }

    fn is_deleted(&self, relative: &Path) -> bool {
        self.deleted.iter().any(|dir| relative.starts_with(dir))
    }

    /// Current content of a file, including pending dry-run edits.
    pub fn read(&self, relative: &Path) -> Result<Option<String>, Error> {
        if let Some(content) = self.overlay.get(relative) {
            return Ok(Some(content.clone()));
        }
        if self.is_deleted(relative) {
            return Ok(None);
        }
        let path = self.resolve(relative)?;
        match fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::io(path, e)),
        }
    }

    pub fn dir_exists(&self, relative: &Path) -> bool {
        if self.overlay.keys().any(|p| p.starts_with(relative)) {
            return true;
        }
        !self.is_deleted(relative) && self.root.join(relative).is_dir()
    }

    /// Files below `relative`, as paths relative to the root.
    fn files_under(&self, relative: &Path) -> Vec<PathBuf> {
        let mut files: BTreeSet<PathBuf> = BTreeSet::new();
        if !self.is_deleted(relative) {
            let dir = self.root.join(relative);
            if dir.is_dir() {
                for entry in WalkDir::new(&dir).into_iter().filter_map(Result::ok) {
                    if entry.file_type().is_file() {
                        if let Ok(rel) = entry.path().strip_prefix(&self.root) {
                            files.insert(rel.to_path_buf());
                        }
                    }
                }
            }
        }
        files.extend(
            self.overlay
                .keys()
                .filter(|p| p.starts_with(relative))
                .cloned(),
        );
        files.into_iter().collect()
    }

    fn record(&mut self, path: &Path, old: Option<String>, new: Option<&str>) {
        let action = match (&old, new) {
            (None, _) => FileAction::Create,
            (Some(_), Some(_)) => FileAction::Modify,
            (Some(_), None) => FileAction::Delete,
        };
        self.changes.push(FileChange {
            path: path.to_path_buf(),
            action,
            old: old.unwrap_or_default(),
            new: new.unwrap_or_default().to_string(),
        });
    }

    /// Write one file. Byte-identical content is skipped; returns whether
    /// anything was (or, in dry-run, would be) written.
    pub fn write(&mut self, relative: &Path, content: &str) -> Result<bool, Error> {
        let old = self.read(relative)?;
        if old.as_deref() == Some(content) {
            return Ok(false);
        }

        let path = self.resolve(relative)?;
        if self.dry_run {
            self.overlay
                .insert(relative.to_path_buf(), content.to_string());
        } else {
            atomic_write(&path, content.as_bytes()).map_err(|e| edit_io(&path, e))?;
        }
        tracing::debug!(path = %relative.display(), dry_run = self.dry_run, "write");
        self.record(relative, old, Some(content));
        Ok(true)
    }

    /// Delete a single file if present.
    pub fn delete_file(&mut self, relative: &Path) -> Result<bool, Error> {
        let Some(old) = self.read(relative)? else {
            return Ok(false);
        };
        let path = self.resolve(relative)?;
        if self.dry_run {
            self.overlay.remove(relative);
            self.deleted.insert(relative.to_path_buf());
        } else {
            fs::remove_file(&path).map_err(|e| Error::io(&path, e))?;
        }
        self.record(relative, Some(old), None);
        Ok(true)
    }

    /// Delete a directory subtree, recording every file it held.
    pub fn delete_dir(&mut self, relative: &Path) -> Result<bool, Error> {
        if !self.dir_exists(relative) {
            return Ok(false);
        }
        let path = self.resolve(relative)?;

        for file in self.files_under(relative) {
            let old = self.read(&file)?;
            self.record(&file, old, None);
        }

        if self.dry_run {
            self.overlay.retain(|p, _| !p.starts_with(relative));
            self.deleted.insert(relative.to_path_buf());
        } else {
            fs::remove_dir_all(&path).map_err(|e| Error::io(&path, e))?;
        }
        tracing::debug!(path = %relative.display(), dry_run = self.dry_run, "removed directory");
        Ok(true)
    }

    /// Place a whole component directory at once.
    ///
    /// Files are written into a staging directory inside the output root and
    /// renamed into place, so a failure never leaves a half-written
    /// component. With `replace`, an existing directory is swapped out.
    pub fn flush_component(
        &mut self,
        relative: &Path,
        tree: &FileTree,
        replace: bool,
    ) -> Result<(), Error> {
        let previous = if self.dir_exists(relative) {
            if !replace {
                return Err(Error::ComponentExists(relative.to_path_buf()));
            }
            self.files_under(relative)
        } else {
            Vec::new()
        };

        let target = self.resolve(relative)?;
        let mut pending = Vec::with_capacity(tree.len() + previous.len());
        for (file, content) in tree.iter() {
            let path = relative.join(file);
            let old = self.read(&path)?;
            if old.as_deref() != Some(content) {
                pending.push((path, old, Some(content.to_string())));
            }
        }
        for path in previous {
            if tree.get(path.strip_prefix(relative).unwrap_or(&path)).is_none() {
                let old = self.read(&path)?;
                pending.push((path, old, None));
            }
        }

        if self.dry_run {
            self.overlay.retain(|p, _| !p.starts_with(relative));
            if replace {
                self.deleted.insert(relative.to_path_buf());
            }
            for (file, content) in tree.iter() {
                self.overlay.insert(relative.join(file), content.to_string());
            }
        } else {
            self.stage_and_swap(&target, tree)?;
        }

        for (path, old, new) in pending {
            self.record(&path, old, new.as_deref());
        }
        tracing::info!(
            component = %relative.display(),
            files = tree.len(),
            dry_run = self.dry_run,
            "component written"
        );
        Ok(())
    }

    fn stage_and_swap(&self, target: &Path, tree: &FileTree) -> Result<(), Error> {
        let staging = tempfile::Builder::new()
            .prefix(STAGING_PREFIX)
            .tempdir_in(&self.root)
            .map_err(|e| Error::io(&self.root, e))?;
        let staged = staging.path().join("component");

        for (file, content) in tree.iter() {
            let path = staged.join(file);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
            }
            fs::write(&path, content).map_err(|e| Error::io(&path, e))?;
        }

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
        }
        swap_into_place(&staged, target, &staging.path().join("previous"))
    }

    /// Load the baseline spec persisted by the last successful run.
    pub fn load_baseline(&self) -> Result<Option<Spec>, Error> {
        for format in SpecFormat::ALL {
            let path = baseline_path(format);
            if let Some(content) = self.read(&path)? {
                let spec = spec::load_from_str(&content, format).map_err(|e| match e {
                    spec::SpecError::Parse { format, message, .. } => spec::SpecError::Parse {
                        path: Some(self.root.join(&path)),
                        format,
                        message,
                    },
                    spec::SpecError::Validation { source, .. } => spec::SpecError::Validation {
                        path: Some(self.root.join(&path)),
                        source,
                    },
                    other => other,
                })?;
                return Ok(Some(spec));
            }
        }
        Ok(None)
    }

    /// Persist `spec` as the new baseline, dropping a baseline stored in the
    /// other format.
    pub fn save_baseline(&mut self, spec: &Spec, format: SpecFormat) -> Result<(), Error> {
        let content = spec::to_string(spec, format)?;
        self.write(&baseline_path(format), &content)?;
        for other in SpecFormat::ALL.into_iter().filter(|f| *f != format) {
            self.delete_file(&baseline_path(other))?;
        }
        Ok(())
    }
}

/// Rename `staged` onto `target`, parking an existing `target` at `backup`.
///
/// If the final rename fails the parked directory is moved back, so `target`
/// is either the old component or the new one.
fn swap_into_place(staged: &Path, target: &Path, backup: &Path) -> Result<(), Error> {
    let parked = target.exists();
    if parked {
        fs::rename(target, backup).map_err(|e| Error::io(target, e))?;
    }
    if let Err(e) = fs::rename(staged, target) {
        if parked {
            if let Err(restore) = fs::rename(backup, target) {
                tracing::error!(
                    component = %target.display(),
                    backup = %backup.display(),
                    error = %restore,
                    "failed to restore previous component"
                );
            }
        }
        return Err(Error::io(target, e));
    }
    Ok(())
}

/// Baseline location relative to the output root.
pub fn baseline_path(format: SpecFormat) -> PathBuf {
    Path::new(STATE_DIR).join(format!("baseline.{}", format.extension()))
}

fn edit_io(path: &Path, error: EditError) -> Error {
    match error {
        EditError::Io(source) => Error::io(path, source),
        other => Error::io(path, io::Error::other(other.to_string())),
    }
}
