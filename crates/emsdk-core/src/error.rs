//! Error type shared by the whole library.
//!
//! Variants fall in five groups: bad user input, unmet preconditions,
//! network/transient failures, internal invariant violations, and
//! interruption. Best-effort operations never produce an `Error`; they log at
//! debug level and carry on.

use std::path::PathBuf;
use thiserror::Error;

/// Result alias used throughout emsdk-core.
pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Error, Debug)]
pub enum Error {
    // User input
    #[error("tool or SDK not found: '{0}'")]
    UnknownItem(String),

    #[error("tool is not installed and therefore cannot be activated: '{0}'")]
    NotInstalled(String),

    #[error("{0}")]
    Unsupported(String),

    #[error("{0}")]
    Deprecated(String),

    #[error("Malformed git URL and refspec {0}!")]
    MalformedOverride(String),

    // Environment / preconditions
    #[error("{0}")]
    MissingProgram(String),

    #[error("failed to parse {file}: {reason}")]
    Manifest { file: String, reason: String },

    #[error("error parsing emscripten-releases-tags.json: {0}")]
    Releases(String),

    // Network / side effects
    #[error("error downloading URL '{url}': {reason}")]
    Download { url: String, reason: String },

    #[error("unpacking '{}' failed: {reason}", path.display())]
    Extract { path: PathBuf, reason: String },

    #[error("git {op} failed in '{}'", path.display())]
    Vcs { op: String, path: PathBuf },

    #[error("build failed: {0}")]
    Build(String),

    #[error("post-install step failed: {hook}: {reason}")]
    Hook { hook: &'static str, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Invariant violations
    #[error("{0}")]
    Internal(String),

    #[error("internal emsdk error: duplicate item '{0}' in manifest")]
    DuplicateItem(String),

    #[error("aborted by user, exiting")]
    Interrupted,
}

impl Error {
    /// Whether the error indicates a defect in emsdk or its manifest rather
    /// than a problem with the user's input or machine.
    pub fn is_internal(&self) -> bool {
        matches!(self, Self::Internal(_) | Self::DuplicateItem(_))
    }

    /// Build an [`Error::Io`] that names the path it happened on.
    pub fn io_at(path: &std::path::Path, err: &std::io::Error) -> Self {
        Self::Io(std::io::Error::new(
            err.kind(),
            format!("{}: {err}", path.display()),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn internal_classification() {
        assert!(Error::Internal("x".into()).is_internal());
        assert!(Error::DuplicateItem("node-1".into()).is_internal());
        assert!(!Error::UnknownItem("foo".into()).is_internal());
        assert!(!Error::Interrupted.is_internal());
    }

    #[test]
    fn messages() {
        assert_eq!(
            Error::UnknownItem("foo".into()).to_string(),
            "tool or SDK not found: 'foo'"
        );
        assert_eq!(Error::Interrupted.to_string(), "aborted by user, exiting");
    }
}
