use crate::generator::{CommandGenerator, GeneratorSet};
use crate::spec::ComponentKind;
use crate::wiring::DEFAULT_REMOTE_HOST;
use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ProjectConfig {
    /// Output root; relative paths resolve against the config file's directory
    #[serde(default)]
    pub output: Option<PathBuf>,
    /// Host prefix of remote registry entries
    #[serde(default)]
    pub remote_host: Option<String>,
    #[serde(default)]
    pub generators: GeneratorsConfig,
    /// Directory containing the config file, set by the loader
    #[serde(skip)]
    pub base_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct GeneratorsConfig {
    #[serde(default)]
    pub shell: Option<GeneratorConfig>,
    #[serde(default)]
    pub remote: Option<GeneratorConfig>,
    #[serde(default)]
    pub api: Option<GeneratorConfig>,
}

impl GeneratorsConfig {
    fn entries(&self) -> [(ComponentKind, Option<&GeneratorConfig>); 3] {
        [
            (ComponentKind::Shell, self.shell.as_ref()),
            (ComponentKind::Remote, self.remote.as_ref()),
            (ComponentKind::Api, self.api.as_ref()),
        ]
    }
}

/// External command replacing the built-in templates for one kind.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct GeneratorConfig {
    pub command: Vec<String>,
}

impl ProjectConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut issues = Vec::new();

        if let Some(output) = &self.output {
            if output.as_os_str().is_empty() {
                issues.push(ValidationIssue::InvalidValue {
                    field: "output".to_string(),
                    message: "must not be empty".to_string(),
                });
            }
        }

        if let Some(host) = &self.remote_host {
            if !(host.starts_with("http://") || host.starts_with("https://")) {
                issues.push(ValidationIssue::InvalidValue {
                    field: "remote_host".to_string(),
                    message: format!("'{host}' must start with http:// or https://"),
                });
            }
        }

        for (kind, generator) in self.generators.entries() {
            let Some(generator) = generator else {
                continue;
            };
            if generator.command.first().is_none_or(|p| p.trim().is_empty()) {
                issues.push(ValidationIssue::MissingField {
                    field: format!("generators.{kind}.command"),
                });
            }
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { issues })
        }
    }

    pub fn remote_host(&self) -> &str {
        self.remote_host.as_deref().unwrap_or(DEFAULT_REMOTE_HOST)
    }

    /// Configured output root, resolved against the config file location.
    pub fn output_root(&self) -> Option<PathBuf> {
        let output = self.output.as_ref()?;
        Some(match &self.base_dir {
            Some(base) if output.is_relative() => base.join(output),
            _ => output.clone(),
        })
    }

    /// Built-in templates, with configured commands substituted per kind.
    pub fn generator_set(&self) -> GeneratorSet {
        self.generators
            .entries()
            .into_iter()
            .fold(GeneratorSet::default(), |set, (kind, generator)| {
                match generator.and_then(|g| CommandGenerator::from_argv(&g.command)) {
                    Some(command) => set.with(kind, Box::new(command)),
                    None => set,
                }
            })
    }
}

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, issue) in self.issues.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    MissingField { field: String },
    InvalidValue { field: String, message: String },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::MissingField { field } => write!(f, "missing field '{field}'"),
            ValidationIssue::InvalidValue { field, message } => write!(f, "{field}: {message}"),
        }
    }
}
