/// Path pattern compiler
///
/// Turns a route directory path like `users/[id]/posts/{...path}` into typed
/// tokens (one per directory segment) and a canonical pattern string.
///
/// All functions are **pure**: given same input, always produce same output with no side effects.

use serde::{Deserialize, Serialize};

use crate::error::PatternError;

pub mod hierarchy;
mod segment;
pub mod variants;

pub use hierarchy::PathHierarchy;
pub use segment::sanitize_param_name;
pub use variants::{expand_variants, PatternVariant};

/// What a directory segment is made of
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PathTokenKind {
    /// Exactly one literal part
    Static,
    /// Exactly one parameter part
    Param,
    /// Anything else, e.g. `book-:id`
    Mixed,
}

/// How a parameter participates in matching
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamKind {
    /// Not enclosed in any optional group
    Required,
    /// Inside at least one optional group
    Optional,
    /// Captures a variable number of trailing segments
    Splat,
}

/// One piece of a segment
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PathTokenPart {
    Static { value: String },
    Param { name: String, kind: ParamKind },
}

/// One compiled directory segment
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PathToken {
    pub kind: PathTokenKind,
    /// Raw segment text as found on disk
    pub orig: String,
    /// Compiled fragment, always starting with `/` or `{/`
    pub pattern: String,
    pub parts: Vec<PathTokenPart>,
}

impl PathToken {
    pub fn is_static(&self) -> bool {
        self.kind == PathTokenKind::Static
    }
}

/// Result of compiling a route directory path
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PathPattern {
    pub tokens: Vec<PathToken>,
    /// Canonical pattern, e.g. `users/:id{/*path}`; empty for the root
    pub pattern: String,
}

impl PathPattern {
    /// Parameter names and kinds in declaration order
    pub fn params(&self) -> Vec<(&str, ParamKind)> {
        self.tokens
            .iter()
            .flat_map(|token| token.parts.iter())
            .filter_map(|part| match part {
                PathTokenPart::Param { name, kind } => Some((name.as_str(), *kind)),
                PathTokenPart::Static { .. } => None,
            })
            .collect()
    }

    /// Pattern rooted at `/`, as mounted by an HTTP router
    ///
    /// # Examples
    ///
    /// ```
    /// use rhtmx_routegen::path::compile_path;
    ///
    /// assert_eq!(compile_path("index").unwrap().route_path(), "/");
    /// assert_eq!(compile_path("users/[id]").unwrap().route_path(), "/users/:id");
    /// assert_eq!(compile_path("[[lang]]/about").unwrap().route_path(), "{/:lang}/about");
    /// ```
    pub fn route_path(&self) -> String {
        if self.pattern.is_empty() {
            "/".to_string()
        } else if self.pattern.starts_with('{') {
            self.pattern.clone()
        } else {
            format!("/{}", self.pattern)
        }
    }
}

/// Compiles a single directory segment into a token
pub fn compile_segment(orig: &str) -> Result<PathToken, PatternError> {
    let normalized = segment::normalize_splats(orig);
    let nodes = segment::parse(&normalized, false)?;
    let parts = segment::flatten(&nodes);

    Ok(PathToken {
        kind: classify_parts(&parts),
        orig: orig.to_string(),
        pattern: segment::render_segment(&nodes),
        parts,
    })
}

/// Derives a segment kind from its parts
fn classify_parts(parts: &[PathTokenPart]) -> PathTokenKind {
    match parts {
        [PathTokenPart::Static { .. }] => PathTokenKind::Static,
        [PathTokenPart::Param { .. }] => PathTokenKind::Param,
        _ => PathTokenKind::Mixed,
    }
}

/// Compiles a route directory path (pure function)
///
/// A leading `index` segment denotes the directory's own route and is dropped,
/// so `index` compiles to the root and `index/[id]` to `:id`.
///
/// # Examples
///
/// ```
/// use rhtmx_routegen::path::{compile_path, ParamKind, PathTokenKind, PathTokenPart};
///
/// let compiled = compile_path("users/[id]").unwrap();
/// assert_eq!(compiled.pattern, "users/:id");
/// assert_eq!(compiled.tokens[0].kind, PathTokenKind::Static);
/// assert_eq!(
///     compiled.tokens[1].parts,
///     vec![PathTokenPart::Param { name: "id".into(), kind: ParamKind::Required }]
/// );
///
/// let compiled = compile_path("docs/[...slug]").unwrap();
/// assert_eq!(compiled.pattern, "docs{/*slug}");
/// ```
///
/// # Errors
///
/// Returns the first segment that cannot be tokenized.
pub fn compile_path(path: &str) -> Result<PathPattern, PatternError> {
    let trimmed = path.trim_matches('/');
    if trimmed.is_empty() {
        return Ok(PathPattern::default());
    }

    let mut segments = trimmed.split('/').peekable();
    if segments.peek() == Some(&"index") {
        segments.next();
    }

    let tokens = segments
        .map(|segment| {
            if segment.is_empty() {
                Err(PatternError::EmptySegment {
                    path: path.to_string(),
                })
            } else {
                compile_segment(segment)
            }
        })
        .collect::<Result<Vec<_>, _>>()?;

    let pattern = join_patterns(&tokens);
    Ok(PathPattern { tokens, pattern })
}

/// Joins token patterns into one route pattern
///
/// Every token pattern starts with its separator. The first segment drops a
/// plain leading `/`; segments opening with a group keep theirs inside it.
pub(crate) fn join_patterns(tokens: &[PathToken]) -> String {
    tokens
        .iter()
        .enumerate()
        .fold(String::new(), |mut pattern, (i, token)| {
            match token.pattern.strip_prefix('/') {
                Some(rest) if i == 0 => pattern.push_str(rest),
                _ => pattern.push_str(&token.pattern),
            }
            pattern
        })
}
