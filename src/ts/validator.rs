use crate::ts::errors::TreeSitterError;
use crate::ts::parser::{ErrorNode, SourceLanguage};
use crate::ts::pool::with_parser;

/// Validate that source code has no syntax errors.
pub fn validate_syntax(source: &str, language: SourceLanguage) -> Result<(), TreeSitterError> {
    let errors = error_nodes(source, language)?;
    into_result(errors.iter().collect())
}

/// Validate that an edit doesn't introduce syntax errors.
///
/// The edit is applied virtually and the ERROR nodes of both versions are
/// compared; errors already present in `source` are tolerated.
pub fn validate_edit(
    source: &str,
    language: SourceLanguage,
    byte_start: usize,
    byte_end: usize,
    new_text: &str,
) -> Result<(), TreeSitterError> {
    let mut new_source = String::with_capacity(source.len() + new_text.len());
    new_source.push_str(&source[..byte_start]);
    new_source.push_str(new_text);
    new_source.push_str(&source[byte_end..]);

    let original_errors = error_nodes(source, language)?;
    let new_errors = error_nodes(&new_source, language)?;

    // Errors after the edit shift by the length delta
    let delta = new_text.len() as isize - (byte_end - byte_start) as isize;
    let shift = |offset: usize| -> usize {
        if offset >= byte_end {
            (offset as isize + delta) as usize
        } else {
            offset
        }
    };

    let introduced: Vec<&ErrorNode> = new_errors
        .iter()
        .filter(|e| {
            !original_errors
                .iter()
                .any(|o| shift(o.byte_start) == e.byte_start && shift(o.byte_end) == e.byte_end)
        })
        .collect();

    into_result(introduced)
}

/// Check that `snippet` parses as a single expression.
pub fn validate_expression(snippet: &str, language: SourceLanguage) -> Result<(), TreeSitterError> {
    let wrapped = format!("const __fedgen_value = (\n{snippet}\n);\n");
    validate_syntax(&wrapped, language)
}

fn error_nodes(source: &str, language: SourceLanguage) -> Result<Vec<ErrorNode>, TreeSitterError> {
    with_parser(language, |parser| {
        parser
            .parse_with_source(source)
            .map(|parsed| {
                if parsed.has_errors() {
                    parsed.error_nodes()
                } else {
                    Vec::new()
                }
            })
    })?
}

fn into_result(errors: Vec<&ErrorNode>) -> Result<(), TreeSitterError> {
    match errors.as_slice() {
        [] => Ok(()),
        [single] => Err(TreeSitterError::SyntaxError {
            byte_start: single.byte_start,
            byte_end: single.byte_end,
        }),
        many => Err(TreeSitterError::MultipleSyntaxErrors { count: many.len() }),
    }
}
