//! Hunk headers, content line classification and range building.

use regex::Regex;
use std::sync::OnceLock;

use super::{ParseError, Result};
use crate::{DiffHunk, DiffLine, DiffRange, LineMode};

pub const NO_NEWLINE_MARKER: &str = "\\ No newline at end of file";

/// The numeric part of `@@ -A,B +C,D @@ context`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HunkHeader {
    pub orig_start: u32,
    pub orig_length: u32,
    pub new_start: u32,
    pub new_length: u32,
    pub context: Option<String>,
}

/// Parse a hunk header. Omitted lengths default to 1.
pub fn parse_header(line_no: usize, line: &str) -> Result<HunkHeader> {
    static HUNK_HEADER: OnceLock<Regex> = OnceLock::new();

    let re = HUNK_HEADER.get_or_init(|| {
        Regex::new(r"^@@ -(\d+)(?:,(\d+))? \+(\d+)(?:,(\d+))? @@ ?(.*)$").expect("valid regex")
    });
    let malformed = || ParseError::MalformedHunkHeader {
        line: line_no,
        header: line.to_string(),
    };

    let caps = re.captures(line).ok_or_else(malformed)?;
    let number = |idx: usize| -> Result<Option<u32>> {
        caps.get(idx)
            .map(|m| m.as_str().parse::<u32>().map_err(|_| malformed()))
            .transpose()
    };

    let orig_start = number(1)?.ok_or_else(malformed)?;
    let orig_length = number(2)?.unwrap_or(1);
    let new_start = number(3)?.ok_or_else(malformed)?;
    let new_length = number(4)?.unwrap_or(1);
    // Line numbers are 1-based; only an empty side may start at 0.
    if (orig_start == 0 && orig_length > 0) || (new_start == 0 && new_length > 0) {
        return Err(malformed());
    }
    let context = caps
        .get(5)
        .map(|m| m.as_str())
        .filter(|ctx| !ctx.is_empty())
        .map(str::to_string);

    Ok(HunkHeader {
        orig_start,
        orig_length,
        new_start,
        new_length,
        context,
    })
}

/// What a physical line inside a hunk is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HunkLine<'a> {
    Content(LineMode, &'a str),
    NoNewline,
    /// Does not start with a classification character.
    Other,
}

pub fn classify(line: &str) -> HunkLine<'_> {
    if line == NO_NEWLINE_MARKER {
        return HunkLine::NoNewline;
    }
    let mode = match line.as_bytes().first() {
        Some(b' ') => LineMode::Unchanged,
        Some(b'+') => LineMode::Added,
        Some(b'-') => LineMode::Removed,
        // Some tools strip the lone space of an empty context line.
        None => return HunkLine::Content(LineMode::Unchanged, ""),
        Some(_) => return HunkLine::Other,
    };
    HunkLine::Content(mode, &line[1..])
}

/// Running line numbers of a hunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    pub next_old: u32,
    pub next_new: u32,
    /// Position of the last content line, 0 before the first.
    pub position: u32,
}

/// Where one content line lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot {
    pub old: Option<u32>,
    pub new: Option<u32>,
    pub position: u32,
}

impl Cursor {
    pub fn seed(header: &HunkHeader) -> Self {
        Self {
            next_old: header.orig_start,
            next_new: header.new_start,
            position: 0,
        }
    }

    /// Place a line of the given mode and return the cursor for the next one.
    pub fn advance(self, mode: LineMode) -> (Slot, Cursor) {
        let position = self.position.saturating_add(1);
        let (old, new) = match mode {
            LineMode::Added => (None, Some(self.next_new)),
            LineMode::Removed => (Some(self.next_old), None),
            LineMode::Unchanged => (Some(self.next_old), Some(self.next_new)),
        };
        let next = Cursor {
            next_old: self.next_old.saturating_add(u32::from(old.is_some())),
            next_new: self.next_new.saturating_add(u32::from(new.is_some())),
            position,
        };
        (Slot { old, new, position }, next)
    }
}

/// Accumulates the content lines of one hunk.
#[derive(Debug)]
pub struct HunkBuilder {
    hunk: DiffHunk,
    cursor: Cursor,
    remaining_old: u32,
    remaining_new: u32,
    last: Option<LineMode>,
}

impl HunkBuilder {
    pub fn new(header: HunkHeader) -> Self {
        let cursor = Cursor::seed(&header);
        Self {
            cursor,
            remaining_old: header.orig_length,
            remaining_new: header.new_length,
            last: None,
            hunk: DiffHunk {
                context: header.context,
                orig_range: DiffRange::new(header.orig_start, header.orig_length),
                new_range: DiffRange::new(header.new_start, header.new_length),
                whole_range: DiffRange::new(1, 0),
            },
        }
    }

    /// Whether the header still declares lines that have not been seen.
    pub fn wants_content(&self) -> bool {
        self.remaining_old > 0 || self.remaining_new > 0
    }

    pub fn push(&mut self, mode: LineMode, content: &str, diff_position: u32) {
        let (slot, cursor) = self.cursor.advance(mode);
        self.cursor = cursor;
        self.last = Some(mode);

        let line = |number: u32| DiffLine {
            mode,
            number,
            content: content.to_string(),
            position: slot.position,
            diff_position,
        };

        if let Some(number) = slot.old {
            self.hunk.orig_range.lines.push(line(number));
            self.remaining_old = self.remaining_old.saturating_sub(1);
        }
        if let Some(number) = slot.new {
            self.hunk.new_range.lines.push(line(number));
            self.remaining_new = self.remaining_new.saturating_sub(1);
        }
        if let Some(number) = slot.new.or(slot.old) {
            self.hunk.whole_range.lines.push(line(number));
        }
    }

    /// The line pushed last has no trailing newline on its side(s).
    pub fn mark_missing_newline(&mut self) {
        match self.last {
            Some(LineMode::Removed) => self.hunk.orig_range.missing_newline = true,
            Some(LineMode::Added) => self.hunk.new_range.missing_newline = true,
            Some(LineMode::Unchanged) => {
                self.hunk.orig_range.missing_newline = true;
                self.hunk.new_range.missing_newline = true;
            }
            None => {}
        }
    }

    pub fn finish(mut self) -> DiffHunk {
        self.hunk.whole_range.length = self.cursor.position;
        self.hunk
    }
}
