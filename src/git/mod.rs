use log::debug;
use std::process::Command;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GitError {
    #[error("git command failed: {0}")]
    CommandFailed(String),
    #[error("invalid git ref: {0}")]
    InvalidRef(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, GitError>;

/// Validate a user-supplied git ref or range to prevent shell injection.
///
/// Allows: alphanumeric, dash, underscore, slash, dot, tilde, caret, @, colon, braces
pub fn validate_git_ref(ref_str: &str) -> Result<()> {
    if ref_str.is_empty() {
        return Err(GitError::InvalidRef("Empty git ref".to_string()));
    }
    if ref_str.starts_with('-') {
        return Err(GitError::InvalidRef(format!(
            "git ref may not start with '-': {ref_str}"
        )));
    }

    for ch in ref_str.chars() {
        if !ch.is_alphanumeric()
            && !matches!(
                ch,
                '-' | '_' | '/' | '.' | '~' | '^' | '@' | ':' | '{' | '}'
            )
        {
            return Err(GitError::InvalidRef(format!(
                "Invalid character in git ref: '{}'",
                ch
            )));
        }
    }

    Ok(())
}

/// Run `git diff <range>` in the current directory and return its output.
///
/// Quoting of unusual file names is left on (git's default), which the
/// parser decodes. Non-UTF-8 file content is decoded lossily.
pub fn diff(range: &str) -> Result<String> {
    validate_git_ref(range)?;
    debug!("running git diff {range}");

    let output = Command::new("git")
        .args(["diff", "--no-color", "--no-ext-diff", range])
        .output()?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(GitError::CommandFailed(stderr.trim().to_string()));
    }

    Ok(crate::parser::decode_input(output.stdout))
}
