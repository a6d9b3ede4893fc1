use crate::ts::errors::TreeSitterError;
use crate::ts::parser::{ParsedSource, SourceLanguage};
use crate::ts::pool::with_parser;
use crate::ts::query::{queries, QueryEngine};
use std::fmt;
use tree_sitter::Node;

/// A property inside the object literal handed to a configuration construct,
/// e.g. `devServer.port` inside `defineConfig({...})`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructuralTarget {
    /// Callee of `callee({...})` or `new callee({...})`
    pub callee: String,
    /// Property path through nested object literals
    pub path: Vec<String>,
}

impl StructuralTarget {
    pub fn new(callee: impl Into<String>, path: &str) -> Self {
        Self {
            callee: callee.into(),
            path: path.split('.').map(str::to_string).collect(),
        }
    }

    /// The property key being replaced.
    pub fn key(&self) -> &str {
        self.path.last().map(String::as_str).unwrap_or_default()
    }

    pub fn to_query(&self) -> String {
        queries::config_object(&self.callee)
    }
}

impl fmt::Display for StructuralTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(...).{}", self.callee, self.path.join("."))
    }
}

/// Span of a located property value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatorResult {
    pub byte_start: usize,
    pub byte_end: usize,
    /// The current value text
    pub text: String,
    /// Byte offset where the enclosing `key: value` pair starts
    pub pair_start: usize,
}

/// Structural locator for property values inside configuration objects.
#[derive(Debug, Clone, Copy)]
pub struct StructuralLocator {
    language: SourceLanguage,
}

impl StructuralLocator {
    pub fn new(language: SourceLanguage) -> Self {
        Self { language }
    }

    /// Locate the value of `target`, expecting exactly one configuration
    /// construct and exactly one property per path segment.
    pub fn locate(
        &self,
        source: &str,
        target: &StructuralTarget,
    ) -> Result<LocatorResult, TreeSitterError> {
        let parsed = with_parser(self.language, |parser| parser.parse_with_source(source))??;
        let engine = QueryEngine::new(self.language, &target.to_query())?;
        let m = engine.find_unique(&parsed)?;
        let config = m
            .captures
            .get("config")
            .ok_or_else(|| TreeSitterError::CaptureNotFound {
                name: "config".to_string(),
            })?;

        let mut object = object_at(&parsed, config.byte_start, config.byte_end).ok_or_else(|| {
            TreeSitterError::TargetNotFound {
                target: target.to_string(),
            }
        })?;

        let not_found = || TreeSitterError::TargetNotFound {
            target: target.to_string(),
        };

        let (last, parents) = target.path.split_last().ok_or_else(not_found)?;
        for segment in parents {
            let (_, value) = find_property(&parsed, object, segment)?.ok_or_else(not_found)?;
            if value.kind() != "object" {
                return Err(not_found());
            }
            object = value;
        }

        let (pair, value) = find_property(&parsed, object, last)?.ok_or_else(not_found)?;
        Ok(LocatorResult {
            byte_start: value.start_byte(),
            byte_end: value.end_byte(),
            text: parsed.node_text(value).to_string(),
            pair_start: pair.start_byte(),
        })
    }
}

fn object_at<'t>(parsed: &'t ParsedSource<'_>, start: usize, end: usize) -> Option<Node<'t>> {
    let mut node = parsed.root_node().descendant_for_byte_range(start, end)?;
    while node.kind() != "object" || node.start_byte() != start || node.end_byte() != end {
        node = node.parent()?;
    }
    Some(node)
}

/// Find the single `pair` in `object` whose key is `name`.
fn find_property<'t>(
    parsed: &ParsedSource<'_>,
    object: Node<'t>,
    name: &str,
) -> Result<Option<(Node<'t>, Node<'t>)>, TreeSitterError> {
    let mut found = Vec::new();
    let mut cursor = object.walk();
    for child in object.named_children(&mut cursor) {
        if child.kind() != "pair" {
            continue;
        }
        let (Some(key), Some(value)) = (
            child.child_by_field_name("key"),
            child.child_by_field_name("value"),
        ) else {
            continue;
        };
        if key_name(parsed.node_text(key), key.kind()) == Some(name) {
            found.push((child, value));
        }
    }

    match found.len() {
        0 => Ok(None),
        1 => Ok(found.pop()),
        count => Err(TreeSitterError::AmbiguousMatch { count }),
    }
}

fn key_name<'s>(text: &'s str, kind: &str) -> Option<&'s str> {
    match kind {
        "property_identifier" | "number" => Some(text),
        "string" => text.get(1..text.len().saturating_sub(1)),
        _ => None,
    }
}
