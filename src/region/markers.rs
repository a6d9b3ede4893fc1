use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

/// Token that opens a managed region.
pub const START_TOKEN: &str = "fedgen:begin";

/// Token that closes a managed region.
pub const END_TOKEN: &str = "fedgen:end";

static ID_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"id:([A-Za-z0-9_.\-]+)").expect("static regex is valid"));

static VALID_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_.\-]+$").expect("static regex is valid"));

/// Comment leader used to embed markers in a particular file type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CommentStyle {
    /// `// ...`
    #[default]
    Slash,
    /// `# ...`
    Hash,
    /// `<!-- ... -->`
    Html,
}

impl CommentStyle {
    /// Pick the comment style for a file based on its extension.
    pub fn for_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()).unwrap_or("") {
            "yaml" | "yml" | "toml" | "py" | "sh" | "env" => CommentStyle::Hash,
            "html" | "htm" | "md" | "xml" => CommentStyle::Html,
            _ => CommentStyle::Slash,
        }
    }

    fn wrap(self, content: &str) -> String {
        match self {
            CommentStyle::Slash => format!("// {content}"),
            CommentStyle::Hash => format!("# {content}"),
            CommentStyle::Html => format!("<!-- {content} -->"),
        }
    }

    /// Start marker line (without indentation or newline).
    pub fn start_marker(self, id: Option<&str>) -> String {
        match id {
            Some(id) => self.wrap(&format!("{START_TOKEN} id:{id}")),
            None => self.wrap(START_TOKEN),
        }
    }

    /// End marker line (without indentation or newline).
    pub fn end_marker(self) -> String {
        self.wrap(END_TOKEN)
    }
}

/// Does this line open a region?
pub fn is_start(line: &str) -> bool {
    line.contains(START_TOKEN)
}

/// Does this line close a region?
pub fn is_end(line: &str) -> bool {
    line.contains(END_TOKEN)
}

/// Extract the `id:<name>` token from a start marker line.
pub fn extract_id(line: &str) -> Option<String> {
    let after = &line[line.find(START_TOKEN)? + START_TOKEN.len()..];
    ID_PATTERN
        .captures(after)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// Whether `id` can be embedded in a marker and read back unchanged.
pub fn is_valid_id(id: &str) -> bool {
    VALID_ID.is_match(id)
}

/// Render a complete region (markers plus body) at the given indentation.
///
/// The body is emitted verbatim and terminated with a newline if it lacks one.
pub fn render_region(style: CommentStyle, id: &str, indent: &str, body: &str) -> String {
    let mut out = String::with_capacity(body.len() + 64);
    out.push_str(indent);
    out.push_str(&style.start_marker(Some(id)));
    out.push('\n');
    out.push_str(body);
    if !body.is_empty() && !body.ends_with('\n') {
        out.push('\n');
    }
    out.push_str(indent);
    out.push_str(&style.end_marker());
    out.push('\n');
    out
}
