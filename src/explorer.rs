//! Test-explorer mirror of a declaration tree.
//!
//! Editors address tests by stable ids and line/character ranges rather than
//! byte offsets. The mirror is rebuilt from scratch whenever a file changes.

use serde::Serialize;

use crate::types::{DeclarationKind, TestTreeNode};

/// A zero-based line and a character offset counted in UTF-16 code units,
/// matching the editor `positionAt` convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct LinePosition {
    pub line: usize,
    pub character: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Range {
    pub start: LinePosition,
    pub end: LinePosition,
}

/// Maps byte offsets to [`LinePosition`]s.
pub struct LineIndex<'a> {
    source: &'a str,
    /// Byte offset of the first character of each line.
    line_starts: Vec<usize>,
}

impl<'a> LineIndex<'a> {
    pub fn new(source: &'a str) -> Self {
        let line_starts = std::iter::once(0)
            .chain(source.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        Self {
            source,
            line_starts,
        }
    }

    /// Convert a byte offset. Offsets past the end clamp to the end of input.
    pub fn position_at(&self, offset: usize) -> LinePosition {
        let mut offset = offset.min(self.source.len());
        while !self.source.is_char_boundary(offset) {
            offset -= 1;
        }
        let line = self.line_starts.partition_point(|&start| start <= offset) - 1;
        let start = self.line_starts[line];
        LinePosition {
            line,
            character: self.source[start..offset].encode_utf16().count(),
        }
    }

    /// Byte offset of the first character of a zero-based line, if it exists.
    pub fn line_start(&self, line: usize) -> Option<usize> {
        self.line_starts.get(line).copied()
    }
}

/// One entry of the test explorer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestItem {
    /// `<file>/<name>`.
    pub id: String,
    pub label: String,
    pub kind: DeclarationKind,
    pub file: String,
    pub range: Range,
    pub children: Vec<TestItem>,
}

/// Mirror a declaration tree into explorer items for `file`.
pub fn mirror(file: &str, source: &str, nodes: &[TestTreeNode]) -> Vec<TestItem> {
    let index = LineIndex::new(source);
    mirror_nodes(file, &index, nodes)
}

fn mirror_nodes(file: &str, index: &LineIndex<'_>, nodes: &[TestTreeNode]) -> Vec<TestItem> {
    nodes
        .iter()
        .map(|node| {
            let position = node.position();
            TestItem {
                id: format!("{file}/{}", node.name()),
                label: node.name().to_string(),
                kind: node.kind(),
                file: file.to_string(),
                range: Range {
                    start: index.position_at(position.start),
                    end: index.position_at(position.end),
                },
                children: mirror_nodes(file, index, node.children()),
            }
        })
        .collect()
}
