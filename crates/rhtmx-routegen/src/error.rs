//! Error types for route compilation
//!
//! Only path patterns can fail. Slot resolution and tree building are total.

use std::path::PathBuf;

/// A directory segment that could not be tokenized
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PatternError {
    #[error("empty segment in path `{path}`")]
    EmptySegment { path: String },

    #[error("unclosed `{open}` in segment `{segment}` at offset {offset}")]
    Unclosed {
        segment: String,
        open: char,
        offset: usize,
    },

    #[error("unexpected `{found}` in segment `{segment}` at offset {offset}")]
    Unexpected {
        segment: String,
        found: char,
        offset: usize,
    },

    #[error("missing parameter name in segment `{segment}` at offset {offset}")]
    MissingName { segment: String, offset: usize },

    #[error("reserved character `{found}` in segment `{segment}` at offset {offset}")]
    Reserved {
        segment: String,
        found: char,
        offset: usize,
    },
}

/// Per-route failure, reported as a diagnostic while the rest of the build continues
#[derive(Debug, thiserror::Error)]
pub enum RouteError {
    #[error("invalid route path in {}: {source}", file.display())]
    Pattern {
        file: PathBuf,
        #[source]
        source: PatternError,
    },

    #[error("route file {} is outside of {}", file.display(), root.display())]
    OutsideRoot { file: PathBuf, root: PathBuf },

    #[error("route path {} is not valid UTF-8", file.display())]
    NotUtf8 { file: PathBuf },
}

impl RouteError {
    /// The route file this error belongs to
    pub fn file(&self) -> &PathBuf {
        match self {
            RouteError::Pattern { file, .. }
            | RouteError::OutsideRoot { file, .. }
            | RouteError::NotUtf8 { file } => file,
        }
    }
}
