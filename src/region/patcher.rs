use crate::edit::Edit;
use crate::region::errors::RegionError;
use crate::region::indexer::RegionIndex;
use crate::region::markers;
use std::collections::BTreeMap;

/// Outcome of rewriting region bodies in one file.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "RegionUpdate carries the rewritten text"]
pub struct RegionUpdate {
    pub text: String,
    /// False when nothing matched or every matched body was already current
    pub changed: bool,
    /// Ids whose region was found (whether or not its body changed)
    pub applied: Vec<String>,
    /// Requested ids with no region in this file
    pub missing: Vec<String>,
}

/// Rewrite the bodies of the regions named in `updates`.
///
/// Ids absent from the file are reported in `missing` rather than treated as
/// errors. An id that appears more than once is refused, since the update
/// could not address it unambiguously. Replacements are applied bottom-up so
/// offsets from the original scan stay valid.
pub fn update_regions(
    text: &str,
    updates: &BTreeMap<String, String>,
) -> Result<RegionUpdate, RegionError> {
    let index = RegionIndex::new(text);
    let newline = line_ending(text);
    let mut edits = Vec::new();
    let mut applied = Vec::new();
    let mut missing = Vec::new();

    for (id, body) in updates {
        if !markers::is_valid_id(id) {
            return Err(RegionError::InvalidId { id: id.clone() });
        }
        let found = index.find_all(id);
        match found.len() {
            0 => missing.push(id.clone()),
            1 => {
                let region = found[0];
                edits.push((
                    region.start_line,
                    Edit::new(
                        region.body_start,
                        region.body_end,
                        normalize_body(body, newline),
                        &region.body,
                    ),
                ));
                applied.push(id.clone());
            }
            count => {
                return Err(RegionError::AmbiguousId {
                    id: id.clone(),
                    count,
                })
            }
        }
    }

    if edits.is_empty() {
        return Ok(RegionUpdate {
            text: text.to_string(),
            changed: false,
            applied,
            missing,
        });
    }

    // Descending start line; Edit::apply_all also orders by byte offset.
    edits.sort_by(|a, b| b.0.cmp(&a.0));
    let new_text = Edit::apply_all(text, edits.into_iter().map(|(_, e)| e).collect())?;
    let changed = new_text != text;

    Ok(RegionUpdate {
        text: new_text,
        changed,
        applied,
        missing,
    })
}

/// Line terminator used by `text`: CRLF when the first line ends with one.
fn line_ending(text: &str) -> &'static str {
    match text.find('\n') {
        Some(i) if text[..i].ends_with('\r') => "\r\n",
        _ => "\n",
    }
}

/// Bring `body` onto the file's line terminator and end it with a newline.
fn normalize_body(body: &str, newline: &str) -> String {
    let mut out = if newline == "\r\n" {
        body.replace("\r\n", "\n").replace('\n', "\r\n")
    } else {
        body.to_string()
    };
    if !out.is_empty() && !out.ends_with('\n') {
        out.push_str(newline);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const FILE: &str = "\
module.exports = createModuleFederationConfig({
  // fedgen:begin id:name
  name: \"shell\",
  // fedgen:end
  // fedgen:begin id:remotes
  remotes: {},
  // fedgen:end
  shared: { react: { singleton: true } },
});
";

    fn updates(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn unknown_id_leaves_text_untouched() {
        let result = update_regions(FILE, &updates(&[("doesNotExist", "y")])).unwrap();
        assert_eq!(result.text, FILE);
        assert!(!result.changed);
        assert_eq!(result.missing, vec!["doesNotExist".to_string()]);
    }

    #[test]
    fn rewrites_several_regions_in_one_pass() {
        let result = update_regions(
            FILE,
            &updates(&[
                ("name", "  name: \"host\","),
                ("remotes", "  remotes: {\n    alpha: \"alpha@x\",\n  },\n"),
            ]),
        )
        .unwrap();

        assert!(result.changed);
        assert!(result.text.contains("  name: \"host\",\n"));
        assert!(result.text.contains("    alpha: \"alpha@x\",\n"));
        assert!(result.text.ends_with("  shared: { react: { singleton: true } },\n});\n"));
        assert_eq!(result.applied, vec!["name".to_string(), "remotes".to_string()]);
    }

    #[test]
    fn identical_body_reports_unchanged() {
        let result = update_regions(FILE, &updates(&[("name", "  name: \"shell\",\n")])).unwrap();
        assert!(!result.changed);
        assert_eq!(result.text, FILE);
        assert_eq!(result.applied, vec!["name".to_string()]);
    }

    #[test]
    fn update_is_idempotent() {
        let first = update_regions(FILE, &updates(&[("remotes", "  remotes: { a: 1 },")])).unwrap();
        let second =
            update_regions(&first.text, &updates(&[("remotes", "  remotes: { a: 1 },")])).unwrap();
        assert!(first.changed);
        assert!(!second.changed);
        assert_eq!(first.text, second.text);
    }

    #[test]
    fn empty_body_clears_region() {
        let result = update_regions(FILE, &updates(&[("remotes", "")])).unwrap();
        assert!(result
            .text
            .contains("// fedgen:begin id:remotes\n  // fedgen:end\n"));
    }

    #[test]
    fn duplicate_id_is_refused() {
        let text = "// fedgen:begin id:a\n1\n// fedgen:end\n// fedgen:begin id:a\n2\n// fedgen:end\n";
        let err = update_regions(text, &updates(&[("a", "3")])).unwrap_err();
        assert!(matches!(err, RegionError::AmbiguousId { count: 2, .. }));
    }

    #[test]
    fn crlf_files_keep_their_line_endings() {
        let text = "a\r\n// fedgen:begin id:x\r\nold\r\n// fedgen:end\r\nb\r\n";
        let result = update_regions(text, &updates(&[("x", "new\nlines")])).unwrap();

        assert_eq!(
            result.text,
            "a\r\n// fedgen:begin id:x\r\nnew\r\nlines\r\n// fedgen:end\r\nb\r\n"
        );
        let again = update_regions(&result.text, &updates(&[("x", "new\nlines")])).unwrap();
        assert!(!again.changed);
    }

    #[test]
    fn invalid_id_is_rejected() {
        let err = update_regions(FILE, &updates(&[("no spaces", "x")])).unwrap_err();
        assert!(matches!(err, RegionError::InvalidId { .. }));
    }
}
