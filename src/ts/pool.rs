//! Thread-local parser pooling.
//!
//! Each thread keeps one parser per [`SourceLanguage`], created on first use
//! and reused for every later parse of that language.

use crate::ts::{SourceLanguage, SourceParser, TreeSitterError};
use std::cell::RefCell;
use std::collections::hash_map::Entry;
use std::collections::HashMap;

thread_local! {
    static PARSERS: RefCell<HashMap<SourceLanguage, SourceParser>> = RefCell::new(HashMap::new());
}

/// Execute function with the pooled parser for `language`.
///
/// # Example
///
/// ```no_run
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use fedgen::ts::pool::with_parser;
/// use fedgen::ts::SourceLanguage;
///
/// let has_errors = with_parser(SourceLanguage::JavaScript, |parser| {
///     parser.parse_with_source("export default {};").map(|p| p.has_errors())
/// })??;
/// # Ok(())
/// # }
/// ```
pub fn with_parser<F, R>(language: SourceLanguage, f: F) -> Result<R, TreeSitterError>
where
    F: FnOnce(&mut SourceParser) -> R,
{
    PARSERS.with(|cell| {
        let mut parsers = cell.borrow_mut();
        let parser = match parsers.entry(language) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(SourceParser::new(language)?),
        };
        Ok(f(parser))
    })
}
