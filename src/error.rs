use crate::generator::GenerationError;
use crate::spec::SpecError;
use crate::workspace::SafetyError;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Fatal errors of a generate or update run.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Spec(#[from] SpecError),

    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no baseline specification in {0}; run `generate` first")]
    MissingBaseline(PathBuf),

    #[error("component directory already exists: {0} (use --force to replace it)")]
    ComponentExists(PathBuf),

    #[error(transparent)]
    Safety(#[from] SafetyError),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}

/// A patch that could not be applied. The file is left untouched and the
/// run continues.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchWarning {
    pub file: PathBuf,
    /// Region id or structural path that was targeted
    pub target: String,
    pub reason: String,
    /// Closest existing name, when one looks like a typo of `target`
    pub suggestion: Option<String>,
}

impl PatchWarning {
    pub fn new(
        file: impl Into<PathBuf>,
        target: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            file: file.into(),
            target: target.into(),
            reason: reason.into(),
            suggestion: None,
        }
    }

    /// Attach the candidate closest to `needle`, if any is similar enough.
    pub fn suggest_from<'a>(
        mut self,
        needle: &str,
        candidates: impl IntoIterator<Item = &'a str>,
    ) -> Self {
        self.suggestion = closest_match(needle, candidates);
        self
    }
}

impl fmt::Display for PatchWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: could not patch '{}': {}",
            self.file.display(),
            self.target,
            self.reason
        )?;
        if let Some(suggestion) = &self.suggestion {
            write!(f, " (did you mean '{suggestion}'?)")?;
        }
        Ok(())
    }
}

const SUGGESTION_THRESHOLD: f64 = 0.8;

fn closest_match<'a>(
    target: &str,
    candidates: impl IntoIterator<Item = &'a str>,
) -> Option<String> {
    candidates
        .into_iter()
        .filter(|candidate| *candidate != target)
        .map(|candidate| (strsim::jaro_winkler(target, candidate), candidate))
        .filter(|(score, _)| *score >= SUGGESTION_THRESHOLD)
        .max_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, candidate)| candidate.to_string())
}
