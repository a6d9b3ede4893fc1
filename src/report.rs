//! Line-level previews of pending file changes.

use similar::{ChangeTag, TextDiff};
use std::fmt;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Add,
    Remove,
    Context,
}

impl LineKind {
    pub fn sign(self) -> char {
        match self {
            LineKind::Add => '+',
            LineKind::Remove => '-',
            LineKind::Context => ' ',
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffLine {
    pub kind: LineKind,
    /// Line text without its terminator
    pub text: String,
}

impl DiffLine {
    fn new(kind: LineKind, text: &str) -> Self {
        Self {
            kind,
            text: text.trim_end_matches(['\n', '\r']).to_string(),
        }
    }
}

impl fmt::Display for DiffLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.kind.sign(), self.text)
    }
}

fn line_kind(tag: ChangeTag) -> LineKind {
    match tag {
        ChangeTag::Delete => LineKind::Remove,
        ChangeTag::Insert => LineKind::Add,
        ChangeTag::Equal => LineKind::Context,
    }
}

/// Full line diff of `old` against `new`.
///
/// An empty `old` yields only additions; identical texts yield nothing.
pub fn render(old: &str, new: &str) -> Vec<DiffLine> {
    if old == new {
        return Vec::new();
    }
    TextDiff::from_lines(old, new)
        .iter_all_changes()
        .map(|change| DiffLine::new(line_kind(change.tag()), change.value()))
        .collect()
}

/// A group of changed lines with surrounding context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hunk {
    /// 1-based first line in the old text
    pub old_start: usize,
    /// 1-based first line in the new text
    pub new_start: usize,
    pub lines: Vec<DiffLine>,
}

/// Diff grouped into hunks keeping `context` unchanged lines around edits.
pub fn render_hunks(old: &str, new: &str, context: usize) -> Vec<Hunk> {
    if old == new {
        return Vec::new();
    }
    let diff = TextDiff::from_lines(old, new);
    diff.grouped_ops(context)
        .iter()
        .filter_map(|group| {
            let first = group.first()?;
            let lines = group
                .iter()
                .flat_map(|op| diff.iter_changes(op))
                .map(|change| DiffLine::new(line_kind(change.tag()), change.value()))
                .collect();
            Some(Hunk {
                old_start: first.old_range().start + 1,
                new_start: first.new_range().start + 1,
                lines,
            })
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileAction {
    Create,
    Modify,
    Delete,
}

impl fmt::Display for FileAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FileAction::Create => "create",
            FileAction::Modify => "modify",
            FileAction::Delete => "delete",
        })
    }
}

/// One file written, created or deleted by a run (or pending, in dry-run).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileChange {
    /// Path relative to the output root
    pub path: PathBuf,
    pub action: FileAction,
    pub old: String,
    pub new: String,
}

impl FileChange {
    pub fn lines(&self) -> Vec<DiffLine> {
        render(&self.old, &self.new)
    }

    pub fn hunks(&self, context: usize) -> Vec<Hunk> {
        render_hunks(&self.old, &self.new, context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn new_file_is_all_additions() {
        let lines = render("", "a\nb\n");
        assert_eq!(
            lines,
            vec![
                DiffLine::new(LineKind::Add, "a"),
                DiffLine::new(LineKind::Add, "b"),
            ]
        );
    }

    #[test]
    fn identical_text_is_empty() {
        assert!(render("same\n", "same\n").is_empty());
        assert!(render_hunks("same\n", "same\n", 3).is_empty());
    }

    #[test]
    fn modified_line() {
        let lines = render("port: 3001\nhot: true\n", "port: 3002\nhot: true\n");
        let rendered: Vec<String> = lines.iter().map(ToString::to_string).collect();
        assert_eq!(rendered, vec!["-port: 3001", "+port: 3002", " hot: true"]);
    }

    #[test]
    fn deleted_file_is_all_removals() {
        let lines = render("x\ny", "");
        assert!(lines.iter().all(|l| l.kind == LineKind::Remove));
        assert_eq!(lines.len(), 2);
    }

    #[test]
    fn hunks_limit_context() {
        let old: String = (1..=20).map(|i| format!("line {i}\n")).collect();
        let new = old.replace("line 10\n", "line ten\n");

        let hunks = render_hunks(&old, &new, 2);
        assert_eq!(hunks.len(), 1);
        assert_eq!(hunks[0].old_start, 8);
        let rendered: Vec<String> = hunks[0].lines.iter().map(ToString::to_string).collect();
        assert_eq!(
            rendered,
            vec![" line 8", " line 9", "-line 10", "+line ten", " line 11", " line 12"]
        );
    }
}
