use crate::ts::errors::TreeSitterError;
use crate::ts::parser::{ParsedSource, SourceLanguage};
use std::collections::HashMap;
use tree_sitter::{Query, QueryCursor, StreamingIterator};

/// A match from a tree-sitter query with captured nodes.
#[derive(Debug, Clone)]
pub struct QueryMatch {
    /// The full match byte range
    pub byte_start: usize,
    pub byte_end: usize,
    /// Named captures: capture_name -> node
    pub captures: HashMap<String, CapturedNode>,
}

#[derive(Debug, Clone)]
pub struct CapturedNode {
    pub byte_start: usize,
    pub byte_end: usize,
    pub text: String,
    pub kind: String,
}

/// Engine for executing tree-sitter queries against parsed source.
pub struct QueryEngine {
    query: Query,
    capture_names: Vec<String>,
}

impl QueryEngine {
    /// Compile a query for `language`.
    ///
    /// Tree-sitter queries use S-expression syntax:
    /// ```text
    /// (call_expression
    ///   function: (identifier) @callee
    ///   arguments: (arguments (object) @config))
    /// ```
    pub fn new(language: SourceLanguage, query_str: &str) -> Result<Self, TreeSitterError> {
        let query = Query::new(&language.ts_language(), query_str).map_err(|e| {
            TreeSitterError::InvalidQuery {
                message: e.to_string(),
            }
        })?;

        let capture_names = query.capture_names().iter().map(|s| s.to_string()).collect();

        Ok(Self {
            query,
            capture_names,
        })
    }

    /// Execute the query against parsed source and return all matches.
    pub fn find_all(&self, parsed: &ParsedSource<'_>) -> Vec<QueryMatch> {
        let mut cursor = QueryCursor::new();
        let mut matches = cursor.matches(&self.query, parsed.root_node(), parsed.source.as_bytes());

        let mut results = Vec::new();

        while let Some(m) = matches.next() {
            let mut captures = HashMap::new();
            let mut overall_start = usize::MAX;
            let mut overall_end = 0usize;

            for capture in m.captures {
                let node = capture.node;
                let name = &self.capture_names[capture.index as usize];

                overall_start = overall_start.min(node.start_byte());
                overall_end = overall_end.max(node.end_byte());

                captures.insert(
                    name.clone(),
                    CapturedNode {
                        byte_start: node.start_byte(),
                        byte_end: node.end_byte(),
                        text: parsed.node_text(node).to_string(),
                        kind: node.kind().to_string(),
                    },
                );
            }

            if overall_start != usize::MAX {
                results.push(QueryMatch {
                    byte_start: overall_start,
                    byte_end: overall_end,
                    captures,
                });
            }
        }

        results
    }

    /// Execute the query and expect exactly one match.
    pub fn find_unique(&self, parsed: &ParsedSource<'_>) -> Result<QueryMatch, TreeSitterError> {
        let mut matches = self.find_all(parsed);

        match matches.len() {
            0 => Err(TreeSitterError::NoMatch),
            1 => matches.pop().ok_or(TreeSitterError::NoMatch),
            n => Err(TreeSitterError::AmbiguousMatch { count: n }),
        }
    }
}

/// Queries for the configuration constructs found in generated wiring files.
pub mod queries {
    /// Object literal passed as an argument to `callee(...)`.
    pub fn config_call(callee: &str) -> String {
        format!(
            r#"(call_expression
                function: (identifier) @callee
                arguments: (arguments (object) @config)
                (#eq? @callee "{callee}"))"#
        )
    }

    /// Object literal passed to `new callee(...)`.
    pub fn config_constructor(callee: &str) -> String {
        format!(
            r#"(new_expression
                constructor: (identifier) @callee
                arguments: (arguments (object) @config)
                (#eq? @callee "{callee}"))"#
        )
    }

    /// Either form of configuration construct, as one multi-pattern query.
    pub fn config_object(callee: &str) -> String {
        format!("{}\n{}", config_call(callee), config_constructor(callee))
    }
}
