//! Tree-sitter integration for structural queries over JavaScript and
//! TypeScript wiring files.
//!
//! Spans are located on the concrete syntax tree so replacements keep
//! comments and formatting around the edited value intact.

pub mod errors;
pub mod locator;
pub mod parser;
pub mod pool;
pub mod query;
pub mod validator;

pub use errors::TreeSitterError;
pub use locator::{LocatorResult, StructuralLocator, StructuralTarget};
pub use parser::{ParsedSource, SourceLanguage, SourceParser};
pub use query::{QueryEngine, QueryMatch};
pub use validator::{validate_edit, validate_expression, validate_syntax};
