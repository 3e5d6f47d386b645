use std::collections::HashSet;
use std::io::Write;

use crate::error::Result;
use crate::index::models::Tag;
use crate::index::writer::TagWriter;

/// Duplicate-free collection of tags.
///
/// In sorted mode tags are appended as they arrive and duplicates are
/// dropped while writing, after sorting. In unsorted mode a tag is only
/// kept the first time it is seen, so the output follows insertion order.
#[derive(Debug)]
pub struct TagStore {
    sorted: bool,
    tags: Vec<Tag>,
    seen: HashSet<Tag>,
}

impl TagStore {
    pub fn new(sorted: bool) -> Self {
        Self {
            sorted,
            tags: Vec::new(),
            seen: HashSet::new(),
        }
    }

    pub fn is_sorted(&self) -> bool {
        self.sorted
    }

    pub fn add(&mut self, tag: Tag) {
        if self.sorted {
            self.tags.push(tag);
        } else if self.seen.insert(tag.clone()) {
            self.tags.push(tag);
        }
    }

    /// Number of stored tags. In sorted mode this still counts duplicates.
    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// Distinct paths of the file tags, in first-seen order.
    pub fn files(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.tags
            .iter()
            .filter_map(|tag| match tag {
                Tag::File { path, .. } => Some(path.as_str()),
                _ => None,
            })
            .filter(|path| seen.insert(*path))
            .map(str::to_string)
            .collect()
    }

    /// Tags in output order with duplicates removed.
    pub fn into_tags(self) -> Vec<Tag> {
        let mut tags = self.tags;
        if self.sorted {
            tags.sort();
            tags.dedup();
        }
        tags
    }

    /// Write every tag, in output order, through `writer`.
    pub fn write_all<W: Write>(self, writer: &mut TagWriter<W>) -> Result<usize> {
        let tags = self.into_tags();
        for tag in &tags {
            writer.write_tag(tag)?;
        }
        Ok(tags.len())
    }
}
