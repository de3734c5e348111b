//! Discovered route files
//!
//! A [`RouteEntry`] is created once per route file and never mutated; the
//! builder methods consume `self` and return a new entry.

use std::fmt;
use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config::NestedConfig;
use crate::error::{PatternError, RouteError};
use crate::path::{compile_path, PathPattern, PathToken};

/// Route namespace a file belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteFolder {
    /// Server routes, mounted on the HTTP router
    Api,
    /// UI routes, mounted on the nested client router
    Pages,
}

impl fmt::Display for RouteFolder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteFolder::Api => f.write_str("api"),
            RouteFolder::Pages => f.write_str("pages"),
        }
    }
}

/// Role of a route file inside its directory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouteFileKind {
    /// The directory's own route
    Index,
    /// Wrapping shell for descendants
    Layout,
    Other,
}

/// One discovered route file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteEntry {
    /// Logical route path: the directory path joined by `/`
    pub name: String,
    pub folder: RouteFolder,
    /// File name inside the route directory
    pub file: String,
    pub file_fullpath: PathBuf,
    pub path_tokens: Vec<PathToken>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path_pattern: Option<String>,
}

impl RouteEntry {
    /// Creates an entry for `file` inside the route directory `name`
    ///
    /// # Examples
    ///
    /// ```
    /// use rhtmx_routegen::{RouteEntry, RouteFolder};
    ///
    /// let entry = RouteEntry::new(RouteFolder::Api, "users/[id]", "index.rs", "api/users/[id]/index.rs").unwrap();
    /// assert_eq!(entry.path_pattern.as_deref(), Some("users/:id"));
    /// assert_eq!(entry.path_tokens.len(), 2);
    /// ```
    pub fn new(
        folder: RouteFolder,
        name: impl Into<String>,
        file: impl Into<String>,
        file_fullpath: impl Into<PathBuf>,
    ) -> Result<Self, PatternError> {
        let name = name.into();
        let PathPattern { tokens, pattern } = compile_path(&name)?;

        Ok(Self {
            name,
            folder,
            file: file.into(),
            file_fullpath: file_fullpath.into(),
            path_tokens: tokens,
            path_pattern: Some(pattern),
        })
    }

    /// Creates an entry from a file under `routes_dir`
    ///
    /// The route name is the file's directory relative to `routes_dir`.
    /// Files directly inside `routes_dir` belong to the root route `index`.
    ///
    /// # Examples
    ///
    /// ```
    /// use rhtmx_routegen::{RouteEntry, RouteFolder};
    ///
    /// let entry = RouteEntry::from_path("pages/blog/[slug]/layout.rsx", "pages", RouteFolder::Pages).unwrap();
    /// assert_eq!(entry.name, "blog/[slug]");
    /// assert_eq!(entry.file, "layout.rsx");
    ///
    /// let root = RouteEntry::from_path("pages/index.rsx", "pages", RouteFolder::Pages).unwrap();
    /// assert_eq!(root.name, "index");
    /// assert_eq!(root.path_pattern.as_deref(), Some(""));
    /// ```
    pub fn from_path(
        file_path: impl AsRef<Path>,
        routes_dir: impl AsRef<Path>,
        folder: RouteFolder,
    ) -> Result<Self, RouteError> {
        let file_path = file_path.as_ref();
        let routes_dir = routes_dir.as_ref();

        let outside = || RouteError::OutsideRoot {
            file: file_path.to_path_buf(),
            root: routes_dir.to_path_buf(),
        };

        let not_utf8 = || RouteError::NotUtf8 {
            file: file_path.to_path_buf(),
        };

        let relative = file_path.strip_prefix(routes_dir).map_err(|_| outside())?;
        let file = relative
            .file_name()
            .ok_or_else(outside)?
            .to_str()
            .ok_or_else(not_utf8)?;

        let segments = relative
            .parent()
            .into_iter()
            .flat_map(Path::components)
            .map(|component| match component {
                Component::Normal(segment) => segment.to_str().ok_or_else(not_utf8),
                _ => Err(outside()),
            })
            .collect::<Result<Vec<_>, _>>()?;

        let name = if segments.is_empty() {
            "index".to_string()
        } else {
            segments.join("/")
        };

        Self::new(folder, name, file, file_path).map_err(|source| RouteError::Pattern {
            file: file_path.to_path_buf(),
            source,
        })
    }

    /// Replaces the compiled pattern
    pub fn with_path_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.path_pattern = Some(pattern.into());
        self
    }

    /// Compiled pattern, empty for the root
    pub fn pattern(&self) -> &str {
        self.path_pattern.as_deref().unwrap_or("")
    }

    /// Tokens and pattern as a [`PathPattern`]
    pub fn path(&self) -> PathPattern {
        PathPattern {
            tokens: self.path_tokens.clone(),
            pattern: self.pattern().to_string(),
        }
    }

    /// File stem, e.g. `layout` for `layout.rsx`
    pub fn file_stem(&self) -> &str {
        Path::new(&self.file)
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or(&self.file)
    }

    /// Classifies the file by its stem
    pub fn file_kind(&self, nested: &NestedConfig) -> RouteFileKind {
        let stem = self.file_stem();
        if stem == nested.index_stem {
            RouteFileKind::Index
        } else if stem == nested.layout_stem {
            RouteFileKind::Layout
        } else {
            RouteFileKind::Other
        }
    }

    /// Number of static tokens
    pub fn static_count(&self) -> usize {
        self.path_tokens.iter().filter(|t| t.is_static()).count()
    }
}
