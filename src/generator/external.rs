//! Generator that delegates to an external command.
//!
//! The command runs inside an empty scratch directory and everything it
//! leaves there becomes the component's file tree. The component is passed
//! through `FEDGEN_COMPONENT_*` environment variables.

use crate::generator::{ComponentGenerator, FileTree, GenerationContext, GenerationError};
use crate::spec::Component;
use std::fs;
use std::process::Command;
use walkdir::WalkDir;

pub const ENV_KIND: &str = "FEDGEN_COMPONENT_KIND";
pub const ENV_NAME: &str = "FEDGEN_COMPONENT_NAME";
pub const ENV_PORT: &str = "FEDGEN_COMPONENT_PORT";
pub const ENV_JSON: &str = "FEDGEN_COMPONENT_JSON";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandGenerator {
    program: String,
    args: Vec<String>,
}

impl CommandGenerator {
    /// Build from an argv list; `None` when the list is empty.
    pub fn from_argv(argv: &[String]) -> Option<Self> {
        let (program, args) = argv.split_first()?;
        Some(Self {
            program: program.clone(),
            args: args.to_vec(),
        })
    }

    fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl ComponentGenerator for CommandGenerator {
    fn name(&self) -> &str {
        &self.program
    }

    fn render(
        &self,
        component: Component<'_>,
        _ctx: &GenerationContext<'_>,
    ) -> Result<FileTree, GenerationError> {
        let name = component.name();
        let io_error = |path: &std::path::Path, source| GenerationError::Io {
            component: name.to_string(),
            path: path.to_path_buf(),
            source,
        };

        let staging = tempfile::tempdir().map_err(|e| io_error(&std::env::temp_dir(), e))?;
        tracing::debug!(component = name, command = %self.display(), "running external generator");

        let output = Command::new(&self.program)
            .args(&self.args)
            .current_dir(staging.path())
            .env(ENV_KIND, component.kind().as_str())
            .env(ENV_NAME, name)
            .env(ENV_PORT, component.port().to_string())
            .env(ENV_JSON, component.to_json().to_string())
            .output()
            .map_err(|source| GenerationError::Spawn {
                component: name.to_string(),
                command: self.display(),
                source,
            })?;

        if !output.status.success() {
            return Err(GenerationError::CommandFailed {
                component: name.to_string(),
                command: self.display(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let mut tree = FileTree::new();
        for entry in WalkDir::new(staging.path()).sort_by_file_name() {
            let entry = entry.map_err(|e| {
                let path = e.path().unwrap_or(staging.path()).to_path_buf();
                io_error(&path, e.into())
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let content = fs::read_to_string(entry.path()).map_err(|e| io_error(entry.path(), e))?;
            let relative = entry
                .path()
                .strip_prefix(staging.path())
                .map_err(|_| GenerationError::InvalidPath {
                    component: name.to_string(),
                    path: entry.path().to_path_buf(),
                })?;
            tree.insert(relative, content);
        }

        tree.validate(name)?;
        Ok(tree)
    }

    fn supports_preview(&self) -> bool {
        false
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::spec::{load_from_str, Spec, SpecFormat};

    fn spec() -> Spec {
        load_from_str(
            "name: shop\nshell: { name: host, port: 3000 }\nremotes: [{ name: alpha, port: 3001 }]\n",
            SpecFormat::Yaml,
        )
        .unwrap()
    }

    fn sh(script: &str) -> CommandGenerator {
        CommandGenerator::from_argv(&["sh".into(), "-c".into(), script.into()]).unwrap()
    }

    #[test]
    fn collects_files_written_by_command() {
        let spec = spec();
        let ctx = GenerationContext {
            spec: &spec,
            remote_host: "http://localhost",
        };
        let remote = spec.components().nth(1).unwrap();

        let generator = sh(
            r#"mkdir -p src && printf '%s:%s' "$FEDGEN_COMPONENT_KIND" "$FEDGEN_COMPONENT_PORT" > src/info.txt && echo "$FEDGEN_COMPONENT_NAME" > name.txt"#,
        );
        let tree = generator.render(remote, &ctx).unwrap();

        assert_eq!(tree.get("src/info.txt"), Some("remote:3001"));
        assert_eq!(tree.get("name.txt"), Some("alpha\n"));
        assert!(!generator.supports_preview());
    }

    #[test]
    fn failing_command_is_generation_error() {
        let spec = spec();
        let ctx = GenerationContext {
            spec: &spec,
            remote_host: "http://localhost",
        };
        let shell = spec.components().next().unwrap();

        let err = sh("echo broken >&2; exit 3").render(shell, &ctx).unwrap_err();
        match err {
            GenerationError::CommandFailed { stderr, .. } => assert_eq!(stderr, "broken"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn command_without_output_is_empty() {
        let spec = spec();
        let ctx = GenerationContext {
            spec: &spec,
            remote_host: "http://localhost",
        };
        let shell = spec.components().next().unwrap();

        assert!(matches!(
            sh("true").render(shell, &ctx),
            Err(GenerationError::Empty { .. })
        ));
    }

    #[test]
    fn empty_argv_is_rejected() {
        assert_eq!(CommandGenerator::from_argv(&[]), None);
    }
}
