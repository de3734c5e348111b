// File: src/discovery.rs
// Purpose: Walk route directories and collect route entries

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::config::{RoutegenConfig, RoutesConfig};
use crate::entry::{RouteEntry, RouteFolder};
use crate::error::RouteError;
use crate::specificity;

/// A route file that was left out of the build
#[derive(Debug)]
pub struct RouteDiagnostic {
    pub file: PathBuf,
    pub error: RouteError,
}

impl fmt::Display for RouteDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.file.display(), self.error)
    }
}

/// Route files found under one directory
#[derive(Debug, Default)]
pub struct DiscoveredRoutes {
    /// Valid entries, most specific first
    pub entries: Vec<RouteEntry>,
    pub diagnostics: Vec<RouteDiagnostic>,
}

impl DiscoveredRoutes {
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

/// Both route folders of a project
#[derive(Debug, Default)]
pub struct ProjectRoutes {
    pub api: DiscoveredRoutes,
    pub pages: DiscoveredRoutes,
}

/// Collects every route file under `routes_dir`
///
/// A file whose directory path does not compile is reported as a diagnostic
/// and left out; the walk continues with the next file.
pub fn discover_routes(
    routes_dir: impl AsRef<Path>,
    folder: RouteFolder,
    routes: &RoutesConfig,
) -> Result<DiscoveredRoutes> {
    let routes_dir = routes_dir.as_ref();
    if !routes_dir.is_dir() {
        bail!("Routes directory not found: {:?}", routes_dir);
    }

    let mut entries = Vec::new();
    let mut diagnostics = Vec::new();

    for entry in WalkDir::new(routes_dir).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warn!("Skipping unreadable path under {:?}: {}", routes_dir, err);
                continue;
            }
        };

        let path = entry.path();
        if !entry.file_type().is_file() || !routes.is_route_file(path) {
            continue;
        }

        match RouteEntry::from_path(path, routes_dir, folder) {
            Ok(route) => {
                debug!(route = %route.name, file = %route.file, "discovered {} route", folder);
                entries.push(route);
            }
            Err(error) => {
                warn!("Excluding route {:?}: {}", path, error);
                diagnostics.push(RouteDiagnostic {
                    file: path.to_path_buf(),
                    error,
                });
            }
        }
    }

    Ok(DiscoveredRoutes {
        entries: specificity::sorted(&entries),
        diagnostics,
    })
}

/// Discovers the api and pages folders configured under `root`
///
/// A folder that does not exist yields no routes.
pub fn discover_project(root: impl AsRef<Path>, config: &RoutegenConfig) -> Result<ProjectRoutes> {
    let root = root.as_ref();

    let discover = |dir: &str, folder: RouteFolder| -> Result<DiscoveredRoutes> {
        let path = root.join(dir);
        if path.is_dir() {
            discover_routes(&path, folder, &config.routes)
        } else {
            debug!("No {} directory at {:?}", folder, path);
            Ok(DiscoveredRoutes::default())
        }
    };

    Ok(ProjectRoutes {
        api: discover(&config.routes.api_dir, RouteFolder::Api)?,
        pages: discover(&config.routes.pages_dir, RouteFolder::Pages)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;

    fn touch(root: &Path, file: &str) {
        let path = root.join(file);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "").unwrap();
    }

    #[test]
    fn test_discovers_sorted_entries() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "users/[id]/index.rs");
        touch(dir.path(), "users/account/index.rs");
        touch(dir.path(), "index.rs");
        touch(dir.path(), "users/README.md");

        let found = discover_routes(dir.path(), RouteFolder::Api, &RoutesConfig::default()).unwrap();

        let names: Vec<&str> = found.entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["users/account", "users/[id]", "index"]);
        assert!(found.is_clean());
    }

    #[test]
    fn test_invalid_route_is_a_diagnostic() {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "users/{:id/index.rs");
        touch(dir.path(), "users/index.rs");

        let found = discover_routes(dir.path(), RouteFolder::Api, &RoutesConfig::default()).unwrap();

        assert_eq!(found.entries.len(), 1);
        assert_eq!(found.diagnostics.len(), 1);
        let diagnostic = &found.diagnostics[0];
        assert!(diagnostic.file.ends_with("users/{:id/index.rs"));
        assert!(matches!(diagnostic.error, RouteError::Pattern { .. }));
    }

    #[test]
    fn test_missing_directory_is_an_error() {
        let dir = TempDir::new().unwrap();
        let result = discover_routes(dir.path().join("api"), RouteFolder::Api, &RoutesConfig::default());
        assert!(result.is_err());
    }

    #[test]
    fn test_discover_project_skips_missing_folders() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "pages/about/index.rsx");
        touch(dir.path(), "pages/about/layout.rsx");

        let project = discover_project(dir.path(), &RoutegenConfig::default()).unwrap();

        assert!(project.api.entries.is_empty());
        assert_eq!(project.pages.entries.len(), 2);
        assert!(project
            .pages
            .entries
            .iter()
            .all(|e| e.folder == RouteFolder::Pages));
    }
}
