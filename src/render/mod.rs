//! Writing a [`Diff`] back out as unified diff text.

use std::fmt::{self, Write};

use crate::parser::filename::{encode_name, encode_path};
use crate::parser::hunk::NO_NEWLINE_MARKER;
use crate::{Diff, DiffFile, DiffHunk, DiffLine, FileMode, LineMode};

/// Render normalized git-style diff text for the whole diff.
pub fn render(diff: &Diff) -> String {
    diff.to_string()
}

impl fmt::Display for Diff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for file in &self.files {
            write_file(f, file)?;
        }
        Ok(())
    }
}

fn write_file(out: &mut impl Write, file: &DiffFile) -> fmt::Result {
    let orig = if file.orig_name.is_empty() { &file.new_name } else { &file.orig_name };
    let new = if file.new_name.is_empty() { &file.orig_name } else { &file.new_name };
    writeln!(out, "diff --git {} {}", encode_path("a/", orig), encode_path("b/", new))?;

    if file.mode == FileMode::Renamed {
        writeln!(out, "similarity index {}%", file.similarity_index)?;
        writeln!(out, "rename from {}", encode_name(&file.orig_name))?;
        writeln!(out, "rename to {}", encode_name(&file.new_name))?;
    }

    let old_side = match file.mode {
        FileMode::New => "/dev/null".to_string(),
        _ => encode_path("a/", orig),
    };
    let new_side = match file.mode {
        FileMode::Deleted => "/dev/null".to_string(),
        _ => encode_path("b/", new),
    };

    if file.binary {
        return writeln!(out, "Binary files {old_side} and {new_side} differ");
    }

    writeln!(out, "--- {old_side}")?;
    writeln!(out, "+++ {new_side}")?;
    for hunk in &file.hunks {
        write_hunk(out, hunk)?;
    }
    Ok(())
}

fn write_hunk(out: &mut impl Write, hunk: &DiffHunk) -> fmt::Result {
    let (orig, new) = (&hunk.orig_range, &hunk.new_range);
    write!(out, "@@ -{},{} +{},{} @@", orig.start, orig.length, new.start, new.length)?;
    match &hunk.context {
        Some(context) => writeln!(out, " {context}")?,
        None => writeln!(out)?,
    }

    let last_orig = orig.lines.last().map(|l| l.position);
    let last_new = new.lines.last().map(|l| l.position);
    for line in &hunk.whole_range.lines {
        writeln!(out, "{}{}", line.mode.prefix(), line.content)?;
        if ends_without_newline(line, (orig.missing_newline, last_orig), (new.missing_newline, last_new)) {
            writeln!(out, "{NO_NEWLINE_MARKER}")?;
        }
    }
    Ok(())
}

fn ends_without_newline(line: &DiffLine, orig: (bool, Option<u32>), new: (bool, Option<u32>)) -> bool {
    let is_last = |(missing, last): (bool, Option<u32>)| missing && last == Some(line.position);
    match line.mode {
        LineMode::Removed => is_last(orig),
        LineMode::Added => is_last(new),
        LineMode::Unchanged => is_last(orig) || is_last(new),
    }
}
