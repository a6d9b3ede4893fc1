//! Structural patching for files that carry no managed region for a field.
//!
//! Strategies run in order and the first one that applies wins:
//! syntax tree, then an anchored regex, then nothing (with a warning).

use crate::edit::Edit;
use crate::error::PatchWarning;
use crate::ts::{
    validate_edit, validate_expression, SourceLanguage, StructuralLocator, StructuralTarget,
};
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

/// One property replacement.
#[derive(Debug, Clone, Copy)]
pub struct PatchRequest<'a> {
    pub file: &'a Path,
    pub target: &'a StructuralTarget,
    /// Replacement expression, rendered as if it started at column zero
    pub value: &'a str,
}

/// Result of one strategy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attempt {
    /// The strategy located the target; the text is the patched file
    Applied(String),
    /// The strategy could not locate the target
    Skipped(String),
}

pub trait PatchStrategy {
    fn name(&self) -> &'static str;
    fn attempt(&self, text: &str, request: &PatchRequest<'_>) -> Attempt;
}

/// Outcome of the whole chain. Never an error: failure is a warning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchOutcome {
    pub text: String,
    pub changed: bool,
    /// Name of the strategy that applied
    pub strategy: Option<&'static str>,
    pub warning: Option<PatchWarning>,
}

/// Locate the value on the concrete syntax tree and splice a validated
/// expression over it.
#[derive(Debug, Default, Clone, Copy)]
pub struct SyntaxTreeStrategy;

impl PatchStrategy for SyntaxTreeStrategy {
    fn name(&self) -> &'static str {
        "syntax-tree"
    }

    fn attempt(&self, text: &str, request: &PatchRequest<'_>) -> Attempt {
        let Some(language) = SourceLanguage::from_path(request.file) else {
            return Attempt::Skipped(format!("no grammar for {}", request.file.display()));
        };
        if let Err(e) = validate_expression(request.value, language) {
            return Attempt::Skipped(format!("replacement is not an expression: {e}"));
        }

        let located = match StructuralLocator::new(language).locate(text, request.target) {
            Ok(located) => located,
            Err(e) => return Attempt::Skipped(e.to_string()),
        };

        let value = reindent(request.value, indent_at(text, located.pair_start));
        if let Err(e) =
            validate_edit(text, language, located.byte_start, located.byte_end, &value)
        {
            return Attempt::Skipped(format!("edit would break the file: {e}"));
        }

        splice(text, located.byte_start, located.byte_end, &value, &located.text)
    }
}

/// Replace the value of a `key: value` pair found by an anchored regex.
///
/// Handles flat objects, flat arrays, quoted strings and bare scalars, and
/// requires exactly one occurrence of the key.
#[derive(Debug, Default, Clone, Copy)]
pub struct RegexStrategy;

impl RegexStrategy {
    fn pattern(key: &str) -> Result<Regex, regex::Error> {
        let key = regex::escape(key);
        Regex::new(&format!(
            r#"(?P<prefix>(?:\b{key}|["']{key}["'])\s*:[ \t]*)(?P<value>\{{[^{{}}]*\}}|\[[^\[\]]*\]|"[^"\n]*"|'[^'\n]*'|[^,\n}}\]]+)"#
        ))
    }
}

impl PatchStrategy for RegexStrategy {
    fn name(&self) -> &'static str {
        "regex"
    }

    fn attempt(&self, text: &str, request: &PatchRequest<'_>) -> Attempt {
        let key = request.target.key();
        let pattern = match Self::pattern(key) {
            Ok(pattern) => pattern,
            Err(e) => return Attempt::Skipped(e.to_string()),
        };

        let mut found = pattern.captures_iter(text).filter_map(|c| c.name("value"));
        let (Some(value_match), None) = (found.next(), found.next()) else {
            let count = pattern.captures_iter(text).count();
            return Attempt::Skipped(format!("key '{key}' matched {count} times, expected 1"));
        };

        let current = value_match.as_str().trim_end();
        let start = value_match.start();
        let end = start + current.len();
        let value = reindent(request.value, indent_at(text, start));
        splice(text, start, end, &value, current)
    }
}

fn splice(text: &str, start: usize, end: usize, value: &str, current: &str) -> Attempt {
    if current == value {
        return Attempt::Applied(text.to_string());
    }
    match Edit::new(start, end, value, current).apply_to(text) {
        Ok(patched) => Attempt::Applied(patched),
        Err(e) => Attempt::Skipped(e.to_string()),
    }
}

/// Ordered strategy list; the first strategy that applies ends the chain.
pub struct FallbackChain {
    strategies: Vec<Box<dyn PatchStrategy>>,
}

impl FallbackChain {
    pub fn new(strategies: Vec<Box<dyn PatchStrategy>>) -> Self {
        Self { strategies }
    }

    pub fn patch(&self, text: &str, request: &PatchRequest<'_>) -> PatchOutcome {
        let mut reasons = Vec::new();
        for strategy in &self.strategies {
            match strategy.attempt(text, request) {
                Attempt::Applied(patched) => {
                    tracing::debug!(
                        file = %request.file.display(),
                        target = %request.target,
                        strategy = strategy.name(),
                        "structural patch applied"
                    );
                    return PatchOutcome {
                        changed: patched != text,
                        text: patched,
                        strategy: Some(strategy.name()),
                        warning: None,
                    };
                }
                Attempt::Skipped(reason) => {
                    tracing::debug!(
                        file = %request.file.display(),
                        target = %request.target,
                        strategy = strategy.name(),
                        %reason,
                        "strategy skipped"
                    );
                    reasons.push(format!("{}: {reason}", strategy.name()));
                }
            }
        }

        let reason = if reasons.is_empty() {
            "no patch strategy configured".to_string()
        } else {
            reasons.join("; ")
        };
        let keys = object_keys(text);
        let warning = PatchWarning::new(request.file, request.target.to_string(), reason)
            .suggest_from(request.target.key(), keys.iter().map(String::as_str));

        PatchOutcome {
            text: text.to_string(),
            changed: false,
            strategy: None,
            warning: Some(warning),
        }
    }
}

impl Default for FallbackChain {
    fn default() -> Self {
        Self::new(vec![Box::new(SyntaxTreeStrategy), Box::new(RegexStrategy)])
    }
}

static OBJECT_KEY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?m)^\s*["']?([A-Za-z_$][\w$]*)["']?\s*:"#).expect("static regex is valid")
});

fn object_keys(text: &str) -> Vec<String> {
    let mut keys: Vec<String> = OBJECT_KEY
        .captures_iter(text)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .collect();
    keys.sort();
    keys.dedup();
    keys
}

/// Leading whitespace of the line containing `offset`.
fn indent_at(text: &str, offset: usize) -> &str {
    let line_start = text[..offset].rfind('\n').map_or(0, |i| i + 1);
    let line = &text[line_start..];
    let width = line.len() - line.trim_start_matches([' ', '\t']).len();
    &line[..width]
}

/// Indent every line after the first so a multi-line value lines up with the
/// property it replaces.
fn reindent(value: &str, indent: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for (i, line) in value.split('\n').enumerate() {
        if i > 0 {
            out.push('\n');
            if !line.is_empty() {
                out.push_str(indent);
            }
        }
        out.push_str(line);
    }
    out
}
