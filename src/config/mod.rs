//! Optional project configuration (`fedgen.toml`).

pub mod loader;
pub mod schema;

pub use loader::{discover, load_from_path, load_from_str, ConfigError, CONFIG_FILE};
pub use schema::{
    GeneratorConfig, GeneratorsConfig, ProjectConfig, ValidationError, ValidationIssue,
};

use std::path::PathBuf;

/// Environment variable overriding the output root.
pub const OUTPUT_ENV: &str = "FEDGEN_OUTPUT";

/// Output root used when nothing else names one.
pub const DEFAULT_OUTPUT: &str = "generated";

/// Pick the output root: command line, then environment, then config file,
/// then the default.
pub fn resolve_output(
    cli: Option<PathBuf>,
    env: Option<PathBuf>,
    config: Option<&ProjectConfig>,
) -> PathBuf {
    cli.or(env)
        .or_else(|| config.and_then(ProjectConfig::output_root))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT))
}
