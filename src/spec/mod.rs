pub mod document;
pub mod loader;
pub mod schema;
pub mod version;

pub use document::SpecDocument;
pub use loader::{load_from_path, load_from_str, to_string, SpecError, SpecFormat};
pub use schema::{
    component_dir, ApiSpec, Component, ComponentKind, RemoteSpec, RouteSpec, ShellSpec, Spec,
    ValidationError, ValidationIssue,
};
pub use version::{matches_requirement, VersionError};
