//! # RHTMX Route Generator
//!
//! Compiles a file-based route tree into what the HTTP router and the nested
//! client router mount:
//! - Path patterns (`users/[id]`, `[[lang]]/about`, `docs/{...slug}`)
//! - Specificity ordering (`/users/account` before `/users/:id`)
//! - Nested index/layout trees
//! - Prioritized middleware stacks, one per route and method
//!
//! ## Pure Core
//!
//! Everything except [`discovery`] and [`RoutegenConfig::load`] is pure and
//! synchronous: inputs are borrowed, outputs are new values, and the caller's
//! data is never reordered or mutated.
//!
//! ## Example
//!
//! ```
//! use rhtmx_routegen::middleware::{Declaration, HttpMethod, MiddlewareOptions, ServerRoute, StackCompiler};
//! use rhtmx_routegen::{RouteEntry, RouteFolder};
//!
//! let entry = RouteEntry::new(RouteFolder::Api, "users/[id]", "index.rs", "api/users/[id]/index.rs").unwrap();
//! let route = ServerRoute::new(entry).with_declarations([
//!     Declaration::middleware(["parse_body"], MiddlewareOptions::new().with_slot("bodyparser")),
//!     Declaration::handler(HttpMethod::Get, ["show_user"]),
//! ]);
//!
//! let routes = StackCompiler::new().compile_routes(&[route]);
//! assert_eq!(routes[0].path, "/users/:id");
//! assert_eq!(routes[0].middleware, vec!["parse_body", "show_user"]);
//! ```

// ============================================================================
// Module Declarations
// ============================================================================

pub mod config;
pub mod discovery;
pub mod entry;
pub mod error;
pub mod middleware;
pub mod nested;
pub mod path;
pub mod specificity;

// Re-export public types
pub use config::{NestedConfig, RoutegenConfig, RoutesConfig};
pub use discovery::{discover_project, discover_routes, DiscoveredRoutes, ProjectRoutes, RouteDiagnostic};
pub use entry::{RouteEntry, RouteFileKind, RouteFolder};
pub use error::{PatternError, RouteError};
pub use middleware::{RouterRoute, ServerRoute, StackCompiler};
pub use nested::{build_nested_routes, NestedRouteEntry};
pub use path::{compile_path, expand_variants, PathPattern, PathToken};
pub use specificity::Specificity;
