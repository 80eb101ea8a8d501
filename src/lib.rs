pub mod cli;
pub mod git;
pub mod parser;
pub mod render;
pub mod store;

pub use parser::{ParseError, parse};

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// How a file changed between the old and new side of a diff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileMode {
    #[default]
    Modified,
    Deleted,
    New,
    Renamed,
}

impl FileMode {
    pub fn as_str(self) -> &'static str {
        match self {
            FileMode::Modified => "modified",
            FileMode::Deleted => "deleted",
            FileMode::New => "new",
            FileMode::Renamed => "renamed",
        }
    }
}

/// Classification of a content line inside a hunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineMode {
    Added,
    Removed,
    Unchanged,
}

impl LineMode {
    /// The leading character this mode has in unified diff text.
    pub fn prefix(self) -> char {
        match self {
            LineMode::Added => '+',
            LineMode::Removed => '-',
            LineMode::Unchanged => ' ',
        }
    }
}

/// A single content line of a hunk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffLine {
    pub mode: LineMode,
    /// 1-based line number in the file version of the range holding this line.
    pub number: u32,
    /// Line text without the leading classification character.
    pub content: String,
    /// 1-based index among the hunk's content lines.
    pub position: u32,
    /// Position relative to the file's first hunk header, counting every
    /// diff line after it (later hunk headers included).
    pub diff_position: u32,
}

/// One side of a hunk (or the interleaved whole of it).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffRange {
    pub start: u32,
    /// Declared line count from the hunk header.
    pub length: u32,
    pub lines: Vec<DiffLine>,
    /// The last line of this side is followed by `\ No newline at end of file`.
    pub missing_newline: bool,
}

impl DiffRange {
    pub fn new(start: u32, length: u32) -> Self {
        Self {
            start,
            length,
            lines: Vec::new(),
            missing_newline: false,
        }
    }
}

/// A contiguous change region of a file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffHunk {
    /// Text after the closing `@@`, usually the enclosing function.
    pub context: Option<String>,
    pub orig_range: DiffRange,
    pub new_range: DiffRange,
    /// All content lines in diff order. Unchanged lines appear once, numbered
    /// on the new side. Spans positions `1..=length`.
    pub whole_range: DiffRange,
}

impl DiffHunk {
    /// Number of diff lines the hunk occupies, header included.
    pub fn display_len(&self) -> usize {
        self.whole_range.lines.len() + 1
    }
}

/// One file entry of a diff.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffFile {
    pub mode: FileMode,
    /// Empty for new files.
    pub orig_name: String,
    /// Empty for deleted files.
    pub new_name: String,
    /// 0-100, only meaningful for renamed files.
    pub similarity_index: u8,
    /// Raw header lines preceding the first hunk.
    pub diff_header: String,
    /// Content reported as `Binary files ... differ`; never has hunks.
    pub binary: bool,
    pub additions: u32,
    pub deletions: u32,
    pub hunks: Vec<DiffHunk>,
}

impl DiffFile {
    /// The name the file is best known by: new name, or the old one for deletions.
    pub fn name(&self) -> &str {
        if self.new_name.is_empty() {
            &self.orig_name
        } else {
            &self.new_name
        }
    }
}

/// Totals over all files of a diff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DiffStats {
    pub files: usize,
    pub hunks: usize,
    pub additions: u64,
    pub deletions: u64,
}

/// The parsed form of a unified diff document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diff {
    pub files: Vec<DiffFile>,
    /// The text this diff was parsed from.
    pub raw: String,
}

impl Diff {
    pub fn parse(input: &str) -> Result<Self, ParseError> {
        parser::parse(input)
    }

    /// Map each new file name to the line numbers added in it.
    ///
    /// Deleted files are skipped, as are files without added lines.
    pub fn changed(&self) -> BTreeMap<String, BTreeSet<u32>> {
        let mut changed: BTreeMap<String, BTreeSet<u32>> = BTreeMap::new();
        for file in self.files.iter().filter(|f| f.mode != FileMode::Deleted) {
            for line in file.hunks.iter().flat_map(|h| &h.new_range.lines) {
                if line.mode == LineMode::Added {
                    changed
                        .entry(file.new_name.clone())
                        .or_default()
                        .insert(line.number);
                }
            }
        }
        changed
    }

    /// Map each original file name to the line numbers removed from it.
    ///
    /// New files are skipped, as are files without removed lines.
    pub fn removed(&self) -> BTreeMap<String, BTreeSet<u32>> {
        let mut removed: BTreeMap<String, BTreeSet<u32>> = BTreeMap::new();
        for file in self.files.iter().filter(|f| f.mode != FileMode::New) {
            for line in file.hunks.iter().flat_map(|h| &h.orig_range.lines) {
                if line.mode == LineMode::Removed {
                    removed
                        .entry(file.orig_name.clone())
                        .or_default()
                        .insert(line.number);
                }
            }
        }
        removed
    }

    /// Look up a file by its new name, falling back to its original name.
    pub fn file(&self, name: &str) -> Option<&DiffFile> {
        self.files
            .iter()
            .find(|f| f.new_name == name)
            .or_else(|| self.files.iter().find(|f| f.orig_name == name))
    }

    pub fn stats(&self) -> DiffStats {
        self.files.iter().fold(
            DiffStats {
                files: self.files.len(),
                ..DiffStats::default()
            },
            |mut stats, file| {
                stats.hunks += file.hunks.len();
                stats.additions += u64::from(file.additions);
                stats.deletions += u64::from(file.deletions);
                stats
            },
        )
    }
}
