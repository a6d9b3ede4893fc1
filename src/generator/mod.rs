//! Component generators: collaborators that produce the files of one
//! component as an in-memory tree.

pub mod external;
pub mod templates;

pub use external::CommandGenerator;
pub use templates::TemplateGenerator;

use crate::spec::{Component, ComponentKind, Spec};
use std::collections::BTreeMap;
use std::path::{Component as PathComponent, Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("{component}: failed to render template {template}: {message}")]
    Template {
        component: String,
        template: String,
        message: String,
    },

    #[error("{component}: generated path escapes the component directory: {path}")]
    InvalidPath { component: String, path: PathBuf },

    #[error("{component}: generator produced no files")]
    Empty { component: String },

    #[error("{component}: failed to start `{command}`: {source}")]
    Spawn {
        component: String,
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{component}: `{command}` exited with {status}: {stderr}")]
    CommandFailed {
        component: String,
        command: String,
        status: String,
        stderr: String,
    },

    #[error("{component}: I/O error at {path}: {source}")]
    Io {
        component: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Files of one component, keyed by path relative to the component directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileTree {
    files: BTreeMap<PathBuf, String>,
}

impl FileTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<PathBuf>, content: impl Into<String>) {
        self.files.insert(path.into(), content.into());
    }

    pub fn get(&self, path: impl AsRef<Path>) -> Option<&str> {
        self.files.get(path.as_ref()).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Path, &str)> {
        self.files.iter().map(|(p, c)| (p.as_path(), c.as_str()))
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Check the whole tree before anything touches the disk: it must be
    /// non-empty and every path must stay inside the component directory.
    pub fn validate(&self, component: &str) -> Result<(), GenerationError> {
        if self.files.is_empty() {
            return Err(GenerationError::Empty {
                component: component.to_string(),
            });
        }
        for path in self.files.keys() {
            let contained = !path.as_os_str().is_empty()
                && path
                    .components()
                    .all(|c| matches!(c, PathComponent::Normal(_)));
            if !contained {
                return Err(GenerationError::InvalidPath {
                    component: component.to_string(),
                    path: path.clone(),
                });
            }
        }
        Ok(())
    }
}

impl FromIterator<(PathBuf, String)> for FileTree {
    fn from_iter<I: IntoIterator<Item = (PathBuf, String)>>(iter: I) -> Self {
        Self {
            files: iter.into_iter().collect(),
        }
    }
}

/// Inputs shared by every generator invocation of one run.
#[derive(Debug, Clone, Copy)]
pub struct GenerationContext<'a> {
    pub spec: &'a Spec,
    pub remote_host: &'a str,
}

/// A collaborator that renders the files of one component.
pub trait ComponentGenerator {
    fn name(&self) -> &str;

    fn render(
        &self,
        component: Component<'_>,
        ctx: &GenerationContext<'_>,
    ) -> Result<FileTree, GenerationError>;

    /// Whether `render` is free of side effects and may run during dry-run.
    fn supports_preview(&self) -> bool {
        true
    }
}

/// The generator used for each component kind.
pub struct GeneratorSet {
    shell: Box<dyn ComponentGenerator>,
    remote: Box<dyn ComponentGenerator>,
    api: Box<dyn ComponentGenerator>,
}

impl GeneratorSet {
    pub fn new(
        shell: Box<dyn ComponentGenerator>,
        remote: Box<dyn ComponentGenerator>,
        api: Box<dyn ComponentGenerator>,
    ) -> Self {
        Self { shell, remote, api }
    }

    pub fn for_kind(&self, kind: ComponentKind) -> &dyn ComponentGenerator {
        match kind {
            ComponentKind::Shell => self.shell.as_ref(),
            ComponentKind::Remote => self.remote.as_ref(),
            ComponentKind::Api => self.api.as_ref(),
        }
    }

    /// Replace the generator for one kind.
    pub fn with(mut self, kind: ComponentKind, generator: Box<dyn ComponentGenerator>) -> Self {
        match kind {
            ComponentKind::Shell => self.shell = generator,
            ComponentKind::Remote => self.remote = generator,
            ComponentKind::Api => self.api = generator,
        }
        self
    }
}

impl Default for GeneratorSet {
    fn default() -> Self {
        Self::new(
            Box::new(TemplateGenerator::new()),
            Box::new(TemplateGenerator::new()),
            Box::new(TemplateGenerator::new()),
        )
    }
}
