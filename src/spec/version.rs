//! Specification format versioning using semver constraints.
//!
//! Documents carry a `formatVersion`; the loader accepts any version that
//! satisfies [`SUPPORTED_FORMAT`].

use semver::{Version, VersionReq};
use std::fmt;

/// Format version assumed when a document does not declare one.
pub const DEFAULT_FORMAT_VERSION: &str = "1.0.0";

/// Requirement every accepted document version must satisfy.
pub const SUPPORTED_FORMAT: &str = "^1";

#[derive(Debug, Clone)]
pub enum VersionError {
    /// Invalid version string (e.g., "not-a-version")
    InvalidVersion { value: String, source: String },
    /// Invalid version requirement (e.g., ">=bad")
    InvalidRequirement { value: String, source: String },
}

impl fmt::Display for VersionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VersionError::InvalidVersion { value, source } => {
                write!(f, "invalid version '{}': {}", value, source)
            }
            VersionError::InvalidRequirement { value, source } => {
                write!(f, "invalid version requirement '{}': {}", value, source)
            }
        }
    }
}

impl std::error::Error for VersionError {}

/// Check if a version matches a requirement string.
///
/// # Examples
///
/// ```
/// use fedgen::spec::version::matches_requirement;
///
/// assert!(matches_requirement("1.2.0", Some("^1")).unwrap());
/// assert!(!matches_requirement("2.0.0", Some("^1")).unwrap());
///
/// // None requirement accepts every version
/// assert!(matches_requirement("7.0.0", None).unwrap());
/// ```
pub fn matches_requirement(
    version: &str,
    requirement: Option<&str>,
) -> Result<bool, VersionError> {
    let Some(req_str) = requirement else {
        return Ok(true);
    };

    let req_str = req_str.trim();
    if req_str.is_empty() {
        return Ok(true);
    }

    // Short forms like "1" or "1.2" are accepted as "1.0.0" / "1.2.0"
    let normalized = match version.trim().split('.').count() {
        1 => format!("{}.0.0", version.trim()),
        2 => format!("{}.0", version.trim()),
        _ => version.trim().to_string(),
    };

    let version = Version::parse(&normalized).map_err(|e| VersionError::InvalidVersion {
        value: version.to_string(),
        source: e.to_string(),
    })?;

    let req = VersionReq::parse(req_str).map_err(|e| VersionError::InvalidRequirement {
        value: req_str.to_string(),
        source: e.to_string(),
    })?;

    Ok(req.matches(&version))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_requirement_accepts_everything() {
        assert!(matches_requirement("0.1.0", None).unwrap());
        assert!(matches_requirement("9.0.0", Some("   ")).unwrap());
    }

    #[test]
    fn supported_format_accepts_major_one() {
        assert!(matches_requirement(DEFAULT_FORMAT_VERSION, Some(SUPPORTED_FORMAT)).unwrap());
        assert!(matches_requirement("1.4.2", Some(SUPPORTED_FORMAT)).unwrap());
        assert!(!matches_requirement("2.0.0", Some(SUPPORTED_FORMAT)).unwrap());
        assert!(!matches_requirement("0.9.0", Some(SUPPORTED_FORMAT)).unwrap());
    }

    #[test]
    fn short_versions_are_padded() {
        assert!(matches_requirement("1", Some(SUPPORTED_FORMAT)).unwrap());
        assert!(matches_requirement("1.3", Some(SUPPORTED_FORMAT)).unwrap());
    }

    #[test]
    fn invalid_version() {
        let result = matches_requirement("not-a-version", Some(SUPPORTED_FORMAT));
        assert!(matches!(result, Err(VersionError::InvalidVersion { .. })));
    }

    #[test]
    fn invalid_requirement() {
        let result = matches_requirement("1.0.0", Some(">=bad-version"));
        assert!(matches!(result, Err(VersionError::InvalidRequirement { .. })));
    }
}
