//! fedgen: specification-driven micro-frontend project generator
//!
//! Reads a declarative description of a module-federation application (a
//! shell, remote modules and HTTP APIs), emits a generated file tree and, on
//! later runs with an updated specification, patches only what changed.
//!
//! # Architecture
//!
//! Every in-place change compiles down to a single primitive: [`Edit`], a
//! verified byte-span replacement. Spans come from managed regions
//! (marker-delimited blocks the engine owns) or, when a file has no region
//! for a field yet, from a tree-sitter structural locator with a regex
//! fallback behind it.
//!
//! # Safety
//!
//! - Edits verify the expected before-text before applying
//! - Atomic file writes (tempfile + fsync + rename)
//! - New components are staged and renamed into place as a whole
//! - Every write stays inside the output root
//! - Dry-run never touches the filesystem
//!
//! # Example
//!
//! ```no_run
//! use fedgen::{load_from_path, Orchestrator, RunOptions};
//!
//! let spec = load_from_path("app.yaml")?;
//! let mut options = RunOptions::new("generated");
//! options.dry_run = true;
//!
//! let report = Orchestrator::new(options).update(&spec)?;
//! for change in &report.changes {
//!     println!("{} {}", change.action, change.path.display());
//! }
//! # Ok::<(), fedgen::Error>(())
//! ```

pub mod changes;
pub mod config;
pub mod edit;
pub mod error;
pub mod fallback;
pub mod generator;
pub mod logging;
pub mod orchestrator;
pub mod region;
pub mod report;
pub mod spec;
pub mod ts;
pub mod wiring;
pub mod workspace;

// Re-exports
pub use changes::{diff, ChangeSet, CollectionChanges, ComponentDelta, ShellField, TrackedField};
pub use config::{ConfigError, ProjectConfig};
pub use edit::{Edit, EditError};
pub use error::{Error, PatchWarning};
pub use fallback::{FallbackChain, PatchOutcome, PatchRequest, PatchStrategy};
pub use generator::{ComponentGenerator, FileTree, GenerationContext, GenerationError, GeneratorSet};
pub use orchestrator::{Orchestrator, RunOptions, RunReport};
pub use region::{scan, update_regions, ManagedRegion, RegionError, RegionIndex, RegionUpdate};
pub use report::{render, DiffLine, FileAction, FileChange, LineKind};
pub use spec::{
    load_from_path, load_from_str, Component, ComponentKind, Spec, SpecError, SpecFormat,
};
pub use workspace::{SafetyError, Workspace};
