//! Routes as mounted by the HTTP router
//!
//! A [`ServerRoute`] is what a route file declares. Compiling it yields one
//! [`RouterRoute`] per handler, each with a single method and a flat, fully
//! ordered middleware list.

use std::fmt;

use serde::Serialize;
use tracing::debug;

use super::stack::{StackCompiler, StackItem};
use super::{Declaration, HttpMethod, MiddlewareDefinition, MiddlewareOptions, Origin, Slot};
use crate::entry::RouteEntry;
use crate::path::PathToken;
use crate::specificity::{self, Specificity};

/// Declarations of one server route file
#[derive(Debug, Clone, PartialEq)]
pub struct ServerRoute<F> {
    pub entry: RouteEntry,
    /// Middleware from wrapping `use` files, applied before the route's own
    pub wrappers: Vec<MiddlewareDefinition<F>>,
    /// Middleware and handlers in declaration order
    pub declarations: Vec<Declaration<F>>,
}

impl<F> ServerRoute<F> {
    pub fn new(entry: RouteEntry) -> Self {
        Self {
            entry,
            wrappers: Vec::new(),
            declarations: Vec::new(),
        }
    }

    pub fn with_wrapper(mut self, wrapper: MiddlewareDefinition<F>) -> Self {
        self.wrappers.push(wrapper);
        self
    }

    pub fn with_declaration(mut self, declaration: Declaration<F>) -> Self {
        self.declarations.push(declaration);
        self
    }

    pub fn with_declarations<I>(mut self, declarations: I) -> Self
    where
        I: IntoIterator<Item = Declaration<F>>,
    {
        self.declarations.extend(declarations);
        self
    }

    /// Methods with a declared handler
    pub fn methods(&self) -> Vec<HttpMethod> {
        self.declarations
            .iter()
            .filter_map(Declaration::as_handler)
            .map(|handler| handler.method)
            .collect()
    }
}

impl<F> Specificity for ServerRoute<F> {
    fn specificity_name(&self) -> &str {
        &self.entry.name
    }

    fn specificity_tokens(&self) -> &[PathToken] {
        &self.entry.path_tokens
    }
}

/// Where one contributing stack item came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MiddlewareTrace {
    /// `None` for the handler itself
    pub origin: Option<Origin>,
    pub handler: Option<HttpMethod>,
    pub slot: Option<Slot>,
    pub on: Option<Vec<HttpMethod>>,
    pub label: Option<String>,
    /// Number of functions the item contributed
    pub functions: usize,
}

impl MiddlewareTrace {
    fn middleware<F>(origin: Origin, definition: &MiddlewareDefinition<F>) -> Self {
        let MiddlewareOptions { slot, on, debug } = &definition.options;
        Self {
            origin: Some(origin),
            handler: None,
            slot: slot.clone(),
            on: on.clone(),
            label: debug.clone(),
            functions: definition.functions.len(),
        }
    }
}

impl fmt::Display for MiddlewareTrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.origin, self.handler) {
            (_, Some(method)) => write!(f, "handler {method}")?,
            (Some(origin), None) => write!(f, "{origin}")?,
            (None, None) => f.write_str("?")?,
        }
        if let Some(slot) = &self.slot {
            write!(f, " [{slot}]")?;
        }
        if let Some(label) = &self.label {
            write!(f, " {label}")?;
        }
        if let Some(on) = &self.on {
            let methods: Vec<&str> = on.iter().map(HttpMethod::as_str).collect();
            write!(f, " on {}", methods.join(","))?;
        }
        write!(f, " ({})", self.functions)
    }
}

/// One mountable route: a pattern, a single method, its middleware
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouterRoute<F> {
    pub name: String,
    /// Pattern rooted at `/`
    pub path: String,
    /// Always exactly one method
    pub methods: Vec<HttpMethod>,
    pub middleware: Vec<F>,
    pub debug: Vec<MiddlewareTrace>,
}

impl<F> RouterRoute<F> {
    /// Human readable stack trace, one item per line
    pub fn debug_text(&self) -> String {
        let methods: Vec<&str> = self.methods.iter().map(HttpMethod::as_str).collect();
        let mut text = format!("{} {}\n", methods.join(","), self.path);
        for (i, trace) in self.debug.iter().enumerate() {
            text.push_str(&format!("  {}. {}\n", i + 1, trace));
        }
        text
    }
}

/// Expands a compiled stack into one route per handler
///
/// Each method gets every middleware item of the stack that runs for it,
/// followed by its own handler functions. A stack without handlers yields
/// nothing.
pub fn expand_methods<F: Clone>(
    name: &str,
    path: &str,
    stack: &[StackItem<F>],
) -> Vec<RouterRoute<F>> {
    stack
        .iter()
        .filter_map(|item| match item {
            StackItem::Handler(handler) => Some(handler),
            StackItem::Middleware { .. } => None,
        })
        .map(|handler| {
            let mut middleware = Vec::new();
            let mut traces = Vec::new();

            for item in stack {
                if let StackItem::Middleware { origin, definition } = item {
                    if definition.options.applies_to(handler.method) {
                        middleware.extend(definition.functions.iter().cloned());
                        traces.push(MiddlewareTrace::middleware(*origin, definition));
                    }
                }
            }

            middleware.extend(handler.functions.iter().cloned());
            traces.push(MiddlewareTrace {
                origin: None,
                handler: Some(handler.method),
                slot: None,
                on: None,
                label: None,
                functions: handler.functions.len(),
            });

            RouterRoute {
                name: name.to_string(),
                path: path.to_string(),
                methods: vec![handler.method],
                middleware,
                debug: traces,
            }
        })
        .collect()
}

impl<F: Clone> StackCompiler<F> {
    /// Compiles one route into its per-method router routes
    pub fn compile_route(&self, route: &ServerRoute<F>) -> Vec<RouterRoute<F>> {
        let stack = self.compile_stack(route);
        let path = route.entry.path().route_path();
        let compiled = expand_methods(&route.entry.name, &path, &stack);

        if compiled.is_empty() {
            debug!(route = %route.entry.name, "route declares no handlers");
        }
        compiled
    }

    /// Compiles a route table, most specific route first
    ///
    /// Routes with equal specificity keep their given order, and so do the
    /// methods of one route.
    ///
    /// # Examples
    ///
    /// ```
    /// use rhtmx_routegen::middleware::{Declaration, HttpMethod, ServerRoute, StackCompiler};
    /// use rhtmx_routegen::{RouteEntry, RouteFolder};
    ///
    /// let route = |name: &str, handler: &'static str| {
    ///     let entry = RouteEntry::new(RouteFolder::Api, name, "index.rs", format!("api/{name}/index.rs")).unwrap();
    ///     ServerRoute::new(entry).with_declaration(Declaration::handler(HttpMethod::Get, [handler]))
    /// };
    ///
    /// let compiler = StackCompiler::new();
    /// let routes = compiler.compile_routes(&[route("users/[id]", "show"), route("users/account", "account")]);
    ///
    /// let paths: Vec<&str> = routes.iter().map(|r| r.path.as_str()).collect();
    /// assert_eq!(paths, vec!["/users/account", "/users/:id"]);
    /// ```
    pub fn compile_routes(&self, routes: &[ServerRoute<F>]) -> Vec<RouterRoute<F>> {
        let mut ordered: Vec<&ServerRoute<F>> = routes.iter().collect();
        ordered.sort_by(|a, b| specificity::compare(*a, *b));

        ordered
            .into_iter()
            .flat_map(|route| self.compile_route(route))
            .collect()
    }
}
