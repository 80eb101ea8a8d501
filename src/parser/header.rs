//! Recognition of the lines that open or annotate a file entry.

use regex::Regex;
use std::sync::OnceLock;

use super::filename::decode_path;

const DEV_NULL: &str = "/dev/null";

/// What a line outside of hunk content means.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderLine<'a> {
    /// `diff ...`, with the text after `diff `.
    Diff(&'a str),
    Index,
    NewFileMode,
    DeletedFileMode,
    /// `similarity index NN%`; `None` when the percentage is not a number.
    Similarity(Option<u32>),
    RenameFrom(&'a str),
    RenameTo(&'a str),
    OldDevNull,
    NewDevNull,
    OldFile(&'a str),
    NewFile(&'a str),
    /// `Binary files A and B differ`, with the `A and B` part.
    Binary(&'a str),
    Hunk,
    Unknown,
}

/// Classify a header line. First matching rule wins.
pub fn classify(line: &str) -> HeaderLine<'_> {
    static SIMILARITY: OnceLock<Regex> = OnceLock::new();

    if let Some(rest) = line.strip_prefix("diff ") {
        return HeaderLine::Diff(rest);
    }
    if line.starts_with("@@") {
        return HeaderLine::Hunk;
    }
    if line.starts_with("similarity index ") {
        let re = SIMILARITY
            .get_or_init(|| Regex::new(r"^similarity index (\d+)%$").expect("valid regex"));
        let percent = re
            .captures(line)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse().ok());
        return HeaderLine::Similarity(percent);
    }
    if let Some(name) = line.strip_prefix("rename from ") {
        return HeaderLine::RenameFrom(name);
    }
    if let Some(name) = line.strip_prefix("rename to ") {
        return HeaderLine::RenameTo(name);
    }
    if let Some(rest) = line.strip_prefix("--- ") {
        let token = cut_metadata(rest);
        return if token == DEV_NULL {
            HeaderLine::OldDevNull
        } else {
            HeaderLine::OldFile(token)
        };
    }
    if let Some(rest) = line.strip_prefix("+++ ") {
        let token = cut_metadata(rest);
        return if token == DEV_NULL {
            HeaderLine::NewDevNull
        } else {
            HeaderLine::NewFile(token)
        };
    }
    if let Some(rest) = line.strip_prefix("Binary files ") {
        return HeaderLine::Binary(rest.strip_suffix(" differ").unwrap_or(rest));
    }
    if line.starts_with("index ") {
        return HeaderLine::Index;
    }
    if line.starts_with("new file mode ") {
        return HeaderLine::NewFileMode;
    }
    if line.starts_with("deleted file mode ") {
        return HeaderLine::DeletedFileMode;
    }
    HeaderLine::Unknown
}

/// One side of a binary marker, after decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BinarySide {
    Missing,
    Named(String),
}

/// Split the `A and B` part of a binary marker into exactly two names.
pub fn split_binary(body: &str) -> Option<(BinarySide, BinarySide)> {
    let parts: Vec<&str> = body.split(" and ").collect();
    let [orig, new] = parts.as_slice() else {
        return None;
    };
    Some((binary_side(orig), binary_side(new)))
}

fn binary_side(token: &str) -> BinarySide {
    let name = decode_path(token);
    if name == DEV_NULL {
        BinarySide::Missing
    } else {
        BinarySide::Named(name)
    }
}

/// Both names of a `diff --git A B` line (text after `diff `), decoded.
pub fn git_names(rest: &str) -> Option<(String, String)> {
    let pair = rest.strip_prefix("--git ")?;
    let (orig, new) = split_pair(pair)?;
    Some((decode_path(orig), decode_path(new)))
}

/// `diff -u` appends a tab and a timestamp to file names.
fn cut_metadata(token: &str) -> &str {
    token.split('\t').next().unwrap_or(token)
}

fn split_pair(pair: &str) -> Option<(&str, &str)> {
    if pair.starts_with('"') {
        let end = closing_quote(pair)?;
        let (orig, rest) = pair.split_at(end + 1);
        return Some((orig, rest.strip_prefix(' ')?));
    }

    // Names may contain spaces; an unchanged path splits into equal halves.
    let spaces: Vec<usize> = pair.match_indices(' ').map(|(i, _)| i).collect();
    let at = spaces
        .iter()
        .find(|&&i| decode_path(&pair[..i]) == decode_path(&pair[i + 1..]))
        .or_else(|| {
            spaces.iter().rev().find(|&&i| {
                let tail = &pair[i + 1..];
                tail.starts_with("b/") || tail.starts_with('"')
            })
        })
        .or_else(|| spaces.first())?;
    Some((&pair[..*at], &pair[*at + 1..]))
}

fn closing_quote(quoted: &str) -> Option<usize> {
    let bytes = quoted.as_bytes();
    let mut i = 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'"' => return Some(i),
            _ => i += 1,
        }
    }
    None
}
