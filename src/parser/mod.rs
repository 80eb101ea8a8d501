pub mod filename;
pub mod header;
pub mod hunk;

use log::{debug, trace, warn};
use std::mem;
use thiserror::Error;

use crate::{Diff, DiffFile, FileMode, LineMode};
use header::{BinarySide, HeaderLine};
use hunk::{HunkBuilder, HunkLine};

/// Errors that abort a parse. Line numbers are 1-based.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("line {line}: malformed hunk header: {header}")]
    MalformedHunkHeader { line: usize, header: String },
    #[error("line {line}: unrecognized line inside hunk: {content:?}")]
    UnrecognizedLineMode { line: usize, content: String },
    #[error("line {line}: malformed binary files marker: {content}")]
    MalformedBinaryMarker { line: usize, content: String },
}

impl ParseError {
    /// The input line the error was found on.
    pub fn line(&self) -> usize {
        match self {
            ParseError::MalformedHunkHeader { line, .. }
            | ParseError::UnrecognizedLineMode { line, .. }
            | ParseError::MalformedBinaryMarker { line, .. } => *line,
        }
    }
}

pub type Result<T> = std::result::Result<T, ParseError>;

/// Parse unified diff text (as produced by `git diff` or `diff -u`).
///
/// Single pass over the input lines. Returns the complete [`Diff`] or the
/// first structural error; there is no partial result.
pub fn parse(input: &str) -> Result<Diff> {
    let mut assembler = Assembler::default();
    for (idx, line) in input.lines().enumerate() {
        assembler.feed(idx + 1, line)?;
    }
    let files = assembler.finish();
    debug!("parsed diff with {} file(s)", files.len());

    Ok(Diff {
        files,
        raw: input.to_string(),
    })
}

/// Separator `git format-patch` writes between the last hunk and its trailer.
const FORMAT_PATCH_TRAILER: &str = "-- ";

/// Whether a content-looking line after a hunk's declared counts still
/// belongs to it. Blank lines, header lines and the format-patch trailer
/// do not.
fn extends_exhausted_hunk(line: &str) -> bool {
    !line.is_empty()
        && line != FORMAT_PATCH_TRAILER
        && matches!(header::classify(line), HeaderLine::Unknown)
}

/// Decode raw diff bytes. Bytes that are not UTF-8 (e.g. Latin-1 file
/// content) are replaced with U+FFFD rather than rejecting the input.
pub fn decode_input(bytes: Vec<u8>) -> String {
    String::from_utf8(bytes).unwrap_or_else(|err| {
        warn!(
            "diff is not valid UTF-8 after byte {}; replacing invalid bytes",
            err.utf8_error().valid_up_to()
        );
        String::from_utf8_lossy(err.as_bytes()).into_owned()
    })
}

#[derive(Debug, Default)]
enum State {
    #[default]
    Header,
    InHunk(HunkBuilder),
}

/// A file entry still receiving lines.
#[derive(Debug, Default)]
struct FileDraft {
    file: DiffFile,
    git_names: Option<(String, String)>,
    /// Set by `rename from`/`rename to`; `---`/`+++` no longer override names.
    names_fixed: bool,
    saw_old_marker: bool,
    saw_binary: bool,
    /// `None` until the first hunk header of the file.
    diff_position: Option<u32>,
}

impl FileDraft {
    fn tick(&mut self) {
        if let Some(pos) = self.diff_position.as_mut() {
            *pos = pos.saturating_add(1);
        }
    }

    fn record_header(&mut self, line: &str) {
        if !self.file.hunks.is_empty() {
            return;
        }
        if !self.file.diff_header.is_empty() {
            self.file.diff_header.push('\n');
        }
        self.file.diff_header.push_str(line);
    }

    fn tally(&mut self, mode: LineMode) {
        match mode {
            LineMode::Added => self.file.additions += 1,
            LineMode::Removed => self.file.deletions += 1,
            LineMode::Unchanged => {}
        }
    }

    /// Whether a header line of this kind starts a new entry rather than
    /// annotating this one.
    ///
    /// A binary marker and a `---`/`+++`/`@@` section never share an entry.
    fn is_closed_for(&self, kind: &HeaderLine<'_>) -> bool {
        match kind {
            HeaderLine::Unknown => false,
            HeaderLine::Hunk => self.saw_binary,
            _ if !self.file.hunks.is_empty() => true,
            HeaderLine::OldFile(_) | HeaderLine::OldDevNull => self.saw_old_marker || self.saw_binary,
            HeaderLine::NewFile(_) | HeaderLine::NewDevNull => self.saw_binary,
            HeaderLine::Binary(_) => self.saw_binary || self.saw_old_marker,
            _ => false,
        }
    }

    fn apply(&mut self, line_no: usize, line: &str, kind: HeaderLine<'_>) -> Result<()> {
        let file = &mut self.file;
        match kind {
            HeaderLine::Diff(rest) => self.git_names = header::git_names(rest),
            HeaderLine::NewFileMode => file.mode = FileMode::New,
            HeaderLine::DeletedFileMode => file.mode = FileMode::Deleted,
            HeaderLine::Similarity(percent) => {
                file.mode = FileMode::Renamed;
                file.similarity_index = match percent {
                    Some(p) => p.min(100) as u8,
                    None => {
                        warn!("line {line_no}: unparsable similarity index: {line}");
                        0
                    }
                };
            }
            HeaderLine::RenameFrom(name) => {
                file.mode = FileMode::Renamed;
                file.orig_name = filename::decode_name(name);
                self.names_fixed = true;
            }
            HeaderLine::RenameTo(name) => {
                file.mode = FileMode::Renamed;
                file.new_name = filename::decode_name(name);
                self.names_fixed = true;
            }
            HeaderLine::OldDevNull => {
                file.mode = FileMode::New;
                file.orig_name.clear();
                self.saw_old_marker = true;
            }
            HeaderLine::NewDevNull => {
                file.mode = FileMode::Deleted;
                file.new_name.clear();
            }
            HeaderLine::OldFile(token) => {
                self.saw_old_marker = true;
                if !self.names_fixed {
                    file.orig_name = filename::decode_path(token);
                }
            }
            HeaderLine::NewFile(token) => {
                if !self.names_fixed {
                    file.new_name = filename::decode_path(token);
                }
            }
            HeaderLine::Binary(body) => {
                let (orig, new) =
                    header::split_binary(body).ok_or_else(|| ParseError::MalformedBinaryMarker {
                        line: line_no,
                        content: line.to_string(),
                    })?;
                self.saw_binary = true;
                file.binary = true;
                if !self.names_fixed {
                    file.mode = FileMode::Modified;
                    match orig {
                        BinarySide::Named(name) => file.orig_name = name,
                        BinarySide::Missing => {
                            file.mode = FileMode::New;
                            file.orig_name.clear();
                        }
                    }
                    match new {
                        BinarySide::Named(name) => file.new_name = name,
                        BinarySide::Missing => {
                            file.mode = FileMode::Deleted;
                            file.new_name.clear();
                        }
                    }
                }
            }
            HeaderLine::Index | HeaderLine::Hunk | HeaderLine::Unknown => {}
        }
        Ok(())
    }

    fn finish(self) -> DiffFile {
        let mut file = self.file;
        if let Some((orig, new)) = self.git_names {
            if file.orig_name.is_empty() && file.mode != FileMode::New {
                file.orig_name = orig;
            }
            if file.new_name.is_empty() && file.mode != FileMode::Deleted {
                file.new_name = new;
            }
        }
        match file.mode {
            FileMode::New => file.orig_name.clear(),
            FileMode::Deleted => file.new_name.clear(),
            FileMode::Modified | FileMode::Renamed => {}
        }
        if file.mode != FileMode::Renamed {
            file.similarity_index = 0;
        }
        file
    }
}

/// Owns every running counter of one parse.
#[derive(Debug, Default)]
struct Assembler {
    files: Vec<DiffFile>,
    current: Option<FileDraft>,
    state: State,
}

impl Assembler {
    fn feed(&mut self, line_no: usize, line: &str) -> Result<()> {
        if let Some(draft) = self.current.as_mut() {
            draft.tick();
        }

        if let (State::InHunk(builder), Some(draft)) = (&mut self.state, self.current.as_mut()) {
            match hunk::classify(line) {
                HunkLine::NoNewline => {
                    builder.mark_missing_newline();
                    return Ok(());
                }
                HunkLine::Content(mode, content) if builder.wants_content() => {
                    builder.push(mode, content, draft.diff_position.unwrap_or(0));
                    draft.tally(mode);
                    return Ok(());
                }
                HunkLine::Content(mode, content) if extends_exhausted_hunk(line) => {
                    warn!("line {line_no}: content beyond the counts of its hunk header: {line:?}");
                    builder.push(mode, content, draft.diff_position.unwrap_or(0));
                    draft.tally(mode);
                    return Ok(());
                }
                HunkLine::Other
                    if builder.wants_content()
                        && matches!(header::classify(line), HeaderLine::Unknown) =>
                {
                    return Err(ParseError::UnrecognizedLineMode {
                        line: line_no,
                        content: line.to_string(),
                    });
                }
                _ => {}
            }
            self.close_hunk();
        }

        self.feed_header(line_no, line)
    }

    fn feed_header(&mut self, line_no: usize, line: &str) -> Result<()> {
        let kind = header::classify(line);

        if let HeaderLine::Unknown = kind {
            match self.current.as_mut() {
                Some(draft) if draft.file.hunks.is_empty() => draft.record_header(line),
                Some(_) if !line.is_empty() => {
                    trace!("line {line_no}: ignoring line after hunk: {line:?}")
                }
                _ => {}
            }
            return Ok(());
        }

        let opens = match (&kind, self.current.as_ref()) {
            (HeaderLine::Diff(_), _) | (_, None) => true,
            (kind, Some(draft)) => draft.is_closed_for(kind),
        };
        if opens {
            self.close_file();
            debug!("line {line_no}: new file entry");
        }
        let draft = self.current.get_or_insert_with(FileDraft::default);

        if let HeaderLine::Hunk = kind {
            let header = hunk::parse_header(line_no, line)?;
            trace!(
                "line {line_no}: hunk -{},{} +{},{}",
                header.orig_start, header.orig_length, header.new_start, header.new_length
            );
            if draft.diff_position.is_none() {
                draft.diff_position = Some(0);
            }
            self.state = State::InHunk(HunkBuilder::new(header));
            return Ok(());
        }

        draft.record_header(line);
        draft.apply(line_no, line, kind)
    }

    fn close_hunk(&mut self) {
        if let State::InHunk(builder) = mem::take(&mut self.state)
            && let Some(draft) = self.current.as_mut()
        {
            draft.file.hunks.push(builder.finish());
        }
    }

    fn close_file(&mut self) {
        self.close_hunk();
        if let Some(draft) = self.current.take() {
            self.files.push(draft.finish());
        }
    }

    fn finish(mut self) -> Vec<DiffFile> {
        self.close_file();
        self.files
    }
}
