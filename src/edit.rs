use std::fs;
use std::io::Write;
use std::path::Path;
use thiserror::Error;
use xxhash_rust::xxh3::xxh3_64;

/// The fundamental text mutation: byte-span replacement with verification.
///
/// Region rewrites and syntax-tree splices both compile down to this
/// primitive. Intelligence lives in span acquisition (marker scanning,
/// tree-sitter queries, regex anchors), not in application.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "Edit does nothing until applied"]
pub struct Edit {
    /// Starting byte offset (inclusive)
    pub byte_start: usize,
    /// Ending byte offset (exclusive)
    pub byte_end: usize,
    /// New text to insert at [byte_start, byte_end)
    pub new_text: String,
    /// Verification of what we expect to find before applying
    pub expected_before: EditVerification,
}

/// Verification strategy for edit safety.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditVerification {
    /// Exact text match required
    ExactMatch(String),
    /// xxh3 hash of expected text (used for large region bodies)
    Hash(u64),
}

impl EditVerification {
    /// Check if the provided text matches the verification criteria.
    pub fn matches(&self, text: &str) -> bool {
        match self {
            EditVerification::ExactMatch(expected) => text == expected,
            EditVerification::Hash(expected_hash) => xxh3_64(text.as_bytes()) == *expected_hash,
        }
    }

    /// Create verification from text, using hash for text over 1KB.
    pub fn from_text(text: &str) -> Self {
        if text.len() > 1024 {
            EditVerification::Hash(xxh3_64(text.as_bytes()))
        } else {
            EditVerification::ExactMatch(text.to_string())
        }
    }
}

#[derive(Error, Debug)]
pub enum EditError {
    #[error("before-text verification failed at byte {byte_start}")]
    BeforeTextMismatch {
        byte_start: usize,
        byte_end: usize,
        found: String,
    },

    #[error("invalid byte range: [{byte_start}, {byte_end}) in text of length {len}")]
    InvalidByteRange {
        byte_start: usize,
        byte_end: usize,
        len: usize,
    },

    #[error("edits overlap at byte {byte_start}")]
    Overlap { byte_start: usize },

    #[error("edit boundary {offset} is not on a UTF-8 character boundary")]
    NotCharBoundary { offset: usize },

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Edit {
    /// Create a new edit with automatic verification generation.
    pub fn new(
        byte_start: usize,
        byte_end: usize,
        new_text: impl Into<String>,
        expected_before: &str,
    ) -> Self {
        Self {
            byte_start,
            byte_end,
            new_text: new_text.into(),
            expected_before: EditVerification::from_text(expected_before),
        }
    }

    /// Validate the edit against the current text and return the spanned slice.
    fn validate<'a>(&self, content: &'a str) -> Result<&'a str, EditError> {
        if self.byte_start > self.byte_end || self.byte_end > content.len() {
            return Err(EditError::InvalidByteRange {
                byte_start: self.byte_start,
                byte_end: self.byte_end,
                len: content.len(),
            });
        }
        for offset in [self.byte_start, self.byte_end] {
            if !content.is_char_boundary(offset) {
                return Err(EditError::NotCharBoundary { offset });
            }
        }

        let current = &content[self.byte_start..self.byte_end];

        // Already applied
        if current == self.new_text {
            return Ok(current);
        }

        if !self.expected_before.matches(current) {
            return Err(EditError::BeforeTextMismatch {
                byte_start: self.byte_start,
                byte_end: self.byte_end,
                found: current.to_string(),
            });
        }

        Ok(current)
    }

    /// Apply this edit to `content`, returning the new text.
    pub fn apply_to(&self, content: &str) -> Result<String, EditError> {
        self.validate(content)?;
        let mut out = String::with_capacity(
            content.len() + self.new_text.len() - (self.byte_end - self.byte_start),
        );
        out.push_str(&content[..self.byte_start]);
        out.push_str(&self.new_text);
        out.push_str(&content[self.byte_end..]);
        Ok(out)
    }

    /// Apply several non-overlapping edits to the same text.
    ///
    /// Edits are sorted by byte_start descending and applied bottom-to-top
    /// so offsets computed against the original text stay valid.
    pub fn apply_all(content: &str, mut edits: Vec<Edit>) -> Result<String, EditError> {
        edits.sort_by(|a, b| b.byte_start.cmp(&a.byte_start));

        for edit in &edits {
            edit.validate(content)?;
        }

        // Sorted descending: the earlier edit must end before the later one starts
        for window in edits.windows(2) {
            let (later, earlier) = (&window[0], &window[1]);
            if earlier.byte_end > later.byte_start {
                return Err(EditError::Overlap {
                    byte_start: later.byte_start,
                });
            }
        }

        let mut out = content.to_string();
        for edit in &edits {
            out.replace_range(edit.byte_start..edit.byte_end, &edit.new_text);
        }
        Ok(out)
    }
}

/// Atomic file write: tempfile + fsync + rename.
///
/// Either the full write succeeds or the previous content stays in place.
pub fn atomic_write(path: &Path, content: &[u8]) -> Result<(), EditError> {
    let parent = path.parent().ok_or_else(|| {
        EditError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "path has no parent directory",
        ))
    })?;
    fs::create_dir_all(parent)?;

    let mut temp = tempfile::NamedTempFile::new_in(parent)?;
    temp.write_all(content)?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| e.error)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verification_exact_match() {
        let verify = EditVerification::ExactMatch("hello world".to_string());
        assert!(verify.matches("hello world"));
        assert!(!verify.matches("hello"));
    }

    #[test]
    fn verification_switches_to_hash_for_large_text() {
        assert!(matches!(
            EditVerification::from_text("small"),
            EditVerification::ExactMatch(_)
        ));
        let large = "x".repeat(2000);
        let verify = EditVerification::from_text(&large);
        assert!(matches!(verify, EditVerification::Hash(_)));
        assert!(verify.matches(&large));
        assert!(!verify.matches("x"));
    }

    #[test]
    fn invalid_range_is_rejected() {
        let edit = Edit::new(5, 20, "replacement", "");
        assert!(matches!(
            edit.apply_to("hello world"),
            Err(EditError::InvalidByteRange { .. })
        ));

        let inverted = Edit::new(10, 5, "replacement", "");
        assert!(matches!(
            inverted.apply_to("hello world"),
            Err(EditError::InvalidByteRange { .. })
        ));
    }

    #[test]
    fn mismatched_before_text_is_rejected() {
        let edit = Edit::new(0, 5, "HELLO", "howdy");
        assert!(matches!(
            edit.apply_to("hello world"),
            Err(EditError::BeforeTextMismatch { .. })
        ));
    }

    #[test]
    fn already_applied_edit_is_a_no_op() {
        let edit = Edit::new(0, 5, "hello", "something else");
        assert_eq!(edit.apply_to("hello world").unwrap(), "hello world");
    }

    #[test]
    fn batch_applies_bottom_to_top() {
        let content = "line1\nline2\nline3\n";
        let edits = vec![
            Edit::new(0, 5, "LINE_ONE", "line1"),
            Edit::new(12, 17, "L3", "line3"),
            Edit::new(6, 11, "LINE2", "line2"),
        ];
        let out = Edit::apply_all(content, edits).unwrap();
        assert_eq!(out, "LINE_ONE\nLINE2\nL3\n");
    }

    #[test]
    fn batch_rejects_overlap() {
        let edits = vec![Edit::new(0, 6, "a", "hello "), Edit::new(3, 8, "b", "lo wo")];
        assert!(matches!(
            Edit::apply_all("hello world", edits),
            Err(EditError::Overlap { .. })
        ));
    }

    #[test]
    fn atomic_write_creates_parent_directories() {
        let temp_dir = tempfile::tempdir().unwrap();
        let file_path = temp_dir.path().join("nested/dir/test.txt");

        atomic_write(&file_path, b"content").unwrap();
        assert_eq!(fs::read_to_string(&file_path).unwrap(), "content");

        atomic_write(&file_path, b"replaced").unwrap();
        assert_eq!(fs::read_to_string(&file_path).unwrap(), "replaced");
    }
}
