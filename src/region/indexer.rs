use crate::region::markers;
use std::collections::HashMap;

/// A managed region found in a file.
///
/// Line indices are zero-based and refer to the marker lines themselves;
/// `body` holds the exact text between them, line terminators included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagedRegion {
    pub id: Option<String>,
    pub start_line: usize,
    pub end_line: usize,
    pub body: String,
    /// Byte offset of the first body byte (just after the start marker line)
    pub body_start: usize,
    /// Byte offset just past the last body byte (start of the end marker line)
    pub body_end: usize,
}

/// Scan text for managed regions in a single pass.
///
/// A start marker seen while a region is already open restarts it, end
/// markers with nothing open are ignored, and a region still open at end of
/// file is dropped.
pub fn scan(text: &str) -> Vec<ManagedRegion> {
    struct Open {
        id: Option<String>,
        line: usize,
        body_start: usize,
    }

    let mut regions = Vec::new();
    let mut open: Option<Open> = None;
    let mut offset = 0usize;

    for (index, line) in text.split_inclusive('\n').enumerate() {
        let line_start = offset;
        offset += line.len();

        if markers::is_start(line) {
            if let Some(previous) = open.take() {
                tracing::debug!(
                    line = previous.line,
                    "managed region restarted before it was closed"
                );
            }
            open = Some(Open {
                id: markers::extract_id(line),
                line: index,
                body_start: offset,
            });
        } else if markers::is_end(line) {
            if let Some(current) = open.take() {
                regions.push(ManagedRegion {
                    id: current.id,
                    start_line: current.line,
                    end_line: index,
                    body: text[current.body_start..line_start].to_string(),
                    body_start: current.body_start,
                    body_end: line_start,
                });
            }
        }
    }

    if let Some(unterminated) = open {
        tracing::debug!(
            line = unterminated.line,
            id = unterminated.id.as_deref().unwrap_or(""),
            "dropping unterminated managed region"
        );
    }

    regions
}

/// A piece of a file: either developer-owned text or a region body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    Outside(&'a str),
    Body {
        id: Option<&'a str>,
        text: &'a str,
    },
}

impl Segment<'_> {
    pub fn text(&self) -> &str {
        match self {
            Segment::Outside(text) => text,
            Segment::Body { text, .. } => text,
        }
    }
}

/// Indexed view of one file's regions.
#[derive(Debug, Clone)]
pub struct RegionIndex<'a> {
    text: &'a str,
    regions: Vec<ManagedRegion>,
    by_id: HashMap<String, Vec<usize>>,
}

impl<'a> RegionIndex<'a> {
    pub fn new(text: &'a str) -> Self {
        let regions = scan(text);
        let mut by_id: HashMap<String, Vec<usize>> = HashMap::new();
        for (i, region) in regions.iter().enumerate() {
            if let Some(id) = &region.id {
                by_id.entry(id.clone()).or_default().push(i);
            }
        }
        Self {
            text,
            regions,
            by_id,
        }
    }

    pub fn regions(&self) -> &[ManagedRegion] {
        &self.regions
    }

    /// All regions carrying `id`, in file order.
    pub fn find_all(&self, id: &str) -> Vec<&ManagedRegion> {
        self.by_id
            .get(id)
            .map(|indices| indices.iter().map(|&i| &self.regions[i]).collect())
            .unwrap_or_default()
    }

    /// Ids present in the file, in file order, without duplicates.
    pub fn ids(&self) -> Vec<&str> {
        let mut seen = Vec::new();
        for id in self.regions.iter().filter_map(|r| r.id.as_deref()) {
            if !seen.contains(&id) {
                seen.push(id);
            }
        }
        seen
    }

    /// Split the file into outside text and region bodies, in order.
    ///
    /// Marker lines count as outside text, so concatenating every segment
    /// reproduces the original file exactly.
    pub fn segments(&self) -> Vec<Segment<'_>> {
        let mut segments = Vec::with_capacity(self.regions.len() * 2 + 1);
        let mut cursor = 0usize;
        let text = self.text;

        for region in &self.regions {
            if region.body_start > cursor {
                segments.push(Segment::Outside(&text[cursor..region.body_start]));
            }
            if region.body_end > region.body_start {
                segments.push(Segment::Body {
                    id: region.id.as_deref(),
                    text: &text[region.body_start..region.body_end],
                });
            }
            cursor = region.body_end;
        }
        if cursor < text.len() {
            segments.push(Segment::Outside(&text[cursor..]));
        }
        segments
    }
}
