use crate::spec::document::SpecDocument;
use crate::spec::schema::{Spec, ValidationError, ValidationIssue};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// On-disk encoding of a specification document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpecFormat {
    #[default]
    Yaml,
    Json,
}

impl SpecFormat {
    /// Infer the format from a file extension; unknown extensions read as YAML.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => SpecFormat::Json,
            _ => SpecFormat::Yaml,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            SpecFormat::Yaml => "yaml",
            SpecFormat::Json => "json",
        }
    }

    pub const ALL: [SpecFormat; 2] = [SpecFormat::Yaml, SpecFormat::Json];
}

impl fmt::Display for SpecFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpecFormat::Yaml => f.write_str("YAML"),
            SpecFormat::Json => f.write_str("JSON"),
        }
    }
}

#[derive(Debug)]
pub enum SpecError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse {
        path: Option<PathBuf>,
        format: SpecFormat,
        message: String,
    },
    Validation {
        path: Option<PathBuf>,
        source: ValidationError,
    },
    Serialize {
        format: SpecFormat,
        message: String,
    },
}

impl SpecError {
    fn with_path(self, path: &Path) -> Self {
        let path = path.to_path_buf();
        match self {
            SpecError::Parse {
                path: None,
                format,
                message,
            } => SpecError::Parse {
                path: Some(path),
                format,
                message,
            },
            SpecError::Validation { path: None, source } => SpecError::Validation {
                path: Some(path),
                source,
            },
            other => other,
        }
    }

    /// The first structural violation, when this is a validation failure.
    pub fn first_issue(&self) -> Option<&ValidationIssue> {
        match self {
            SpecError::Validation { source, .. } => source.first_issue(),
            _ => None,
        }
    }
}

impl fmt::Display for SpecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpecError::Io { path, source } => {
                write!(f, "failed to read specification {}: {}", path.display(), source)
            }
            SpecError::Parse {
                path,
                format,
                message,
            } => match path {
                Some(path) => write!(
                    f,
                    "failed to parse {format} specification ({}): {message}",
                    path.display()
                ),
                None => write!(f, "failed to parse {format} specification: {message}"),
            },
            SpecError::Validation { path, source } => match path {
                Some(path) => write!(f, "invalid specification ({}): {source}", path.display()),
                None => write!(f, "invalid specification: {source}"),
            },
            SpecError::Serialize { format, message } => {
                write!(f, "failed to serialize specification as {format}: {message}")
            }
        }
    }
}

impl std::error::Error for SpecError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SpecError::Io { source, .. } => Some(source),
            SpecError::Validation { source, .. } => Some(source),
            _ => None,
        }
    }
}

pub fn load_from_str(input: &str, format: SpecFormat) -> Result<Spec, SpecError> {
    let document: SpecDocument = match format {
        SpecFormat::Yaml => serde_yaml::from_str(input).map_err(|e| e.to_string()),
        SpecFormat::Json => serde_json::from_str(input).map_err(|e| e.to_string()),
    }
    .map_err(|message| SpecError::Parse {
        path: None,
        format,
        message,
    })?;

    document
        .validate()
        .map_err(|source| SpecError::Validation { path: None, source })
}

pub fn load_from_path(path: impl AsRef<Path>) -> Result<Spec, SpecError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|source| SpecError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    load_from_str(&contents, SpecFormat::from_path(path)).map_err(|error| error.with_path(path))
}

/// Serialize a spec so that [`load_from_str`] reads it back unchanged.
pub fn to_string(spec: &Spec, format: SpecFormat) -> Result<String, SpecError> {
    let rendered = match format {
        SpecFormat::Yaml => serde_yaml::to_string(spec).map_err(|e| e.to_string()),
        SpecFormat::Json => serde_json::to_string_pretty(spec)
            .map(|mut s| {
                s.push('\n');
                s
            })
            .map_err(|e| e.to_string()),
    };
    rendered.map_err(|message| SpecError::Serialize { format, message })
}
