/// Middleware stack resolution
///
/// Merges core, global and route declarations into one ordered stack:
///
/// 1. Prioritized slots first, in fixed order, one winner each
/// 2. Global middleware, with custom slots overridable by the route
/// 3. Remaining route declarations, in declaration order
///
/// Every slot is resolved by [`find_last`]: later declarations override
/// earlier ones, so the scan order of the working set is what decides.

use serde::Serialize;
use tracing::debug;

use super::{
    Declaration, HandlerDefinition, MiddlewareDefinition, Origin, ServerRoute, Slot,
    PRIORITIZED_SLOTS,
};

/// Prioritized slots the framework ships a default for
pub const DEFAULT_SLOTS: [Slot; 4] = [
    Slot::Params,
    Slot::ValidateParams,
    Slot::ValidatePayload,
    Slot::ValidateResponse,
];

/// One resolved entry of a compiled stack
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum StackItem<F> {
    Middleware {
        origin: Origin,
        definition: MiddlewareDefinition<F>,
    },
    Handler(HandlerDefinition<F>),
}

impl<F> StackItem<F> {
    pub fn slot(&self) -> Option<&Slot> {
        match self {
            StackItem::Middleware { definition, .. } => definition.slot(),
            StackItem::Handler(_) => None,
        }
    }

    pub fn is_handler(&self) -> bool {
        matches!(self, StackItem::Handler(_))
    }
}

/// Last item matching `predicate`
///
/// Resolution is temporal: whatever was declared later wins. This is kept as
/// a scan over the ordered list rather than a map keyed by slot.
///
/// # Examples
///
/// ```
/// use rhtmx_routegen::middleware::find_last;
///
/// let declared = [("payload", "a"), ("auth", "x"), ("payload", "b")];
/// let winner = find_last(&declared, |(slot, _)| *slot == "payload");
/// assert_eq!(winner, Some(&("payload", "b")));
/// ```
pub fn find_last<T, P>(items: &[T], mut predicate: P) -> Option<&T>
where
    P: FnMut(&T) -> bool,
{
    items.iter().rev().find(|item| predicate(item))
}

/// Framework defaults for [`DEFAULT_SLOTS`]
///
/// `factory` supplies the middleware function for each slot.
pub fn core_defaults<F, M>(mut factory: M) -> Vec<MiddlewareDefinition<F>>
where
    M: FnMut(&Slot) -> F,
{
    DEFAULT_SLOTS
        .iter()
        .map(|slot| {
            MiddlewareDefinition::new(
                [factory(slot)],
                super::MiddlewareOptions::new().with_slot(slot.clone()),
            )
        })
        .collect()
}

/// Compiles route declarations into ordered middleware stacks
///
/// Holds the declarations shared by every route: `core` (framework defaults)
/// and `global` (application-wide).
#[derive(Debug, Clone)]
pub struct StackCompiler<F> {
    core: Vec<MiddlewareDefinition<F>>,
    global: Vec<MiddlewareDefinition<F>>,
}

impl<F> Default for StackCompiler<F> {
    fn default() -> Self {
        Self {
            core: Vec::new(),
            global: Vec::new(),
        }
    }
}

impl<F: Clone> StackCompiler<F> {
    /// Creates a compiler without core or global middleware
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a compiler seeded with the framework defaults
    ///
    /// # Examples
    ///
    /// ```
    /// use rhtmx_routegen::middleware::{ServerRoute, StackCompiler};
    /// use rhtmx_routegen::{RouteEntry, RouteFolder};
    ///
    /// let compiler = StackCompiler::with_defaults(|slot| format!("core::{slot}"));
    /// let entry = RouteEntry::new(RouteFolder::Api, "health", "index.rs", "api/health/index.rs").unwrap();
    ///
    /// let stack = compiler.compile_stack(&ServerRoute::new(entry));
    /// assert_eq!(stack.len(), 4);
    /// ```
    pub fn with_defaults<M>(factory: M) -> Self
    where
        M: FnMut(&Slot) -> F,
    {
        Self::new().with_core(core_defaults(factory))
    }

    /// Appends core declarations; later ones override earlier ones per slot
    pub fn with_core<I>(mut self, definitions: I) -> Self
    where
        I: IntoIterator<Item = MiddlewareDefinition<F>>,
    {
        self.core.extend(definitions);
        self
    }

    /// Appends global declarations
    pub fn with_global<I>(mut self, definitions: I) -> Self
    where
        I: IntoIterator<Item = MiddlewareDefinition<F>>,
    {
        self.global.extend(definitions);
        self
    }

    pub fn core(&self) -> &[MiddlewareDefinition<F>] {
        &self.core
    }

    pub fn global(&self) -> &[MiddlewareDefinition<F>] {
        &self.global
    }

    /// Resolves the full stack for one route, handlers included
    pub fn compile_stack(&self, route: &ServerRoute<F>) -> Vec<StackItem<F>> {
        // Wrapping `use` declarations come before the route's own
        let declared: Vec<Declaration<F>> = route
            .wrappers
            .iter()
            .cloned()
            .map(Declaration::Middleware)
            .chain(route.declarations.iter().cloned())
            .collect();

        let route_middleware: Vec<&MiddlewareDefinition<F>> =
            declared.iter().filter_map(Declaration::as_middleware).collect();

        let working: Vec<(Origin, &MiddlewareDefinition<F>)> = self
            .core
            .iter()
            .map(|definition| (Origin::Core, definition))
            .chain(self.global.iter().map(|definition| (Origin::Global, definition)))
            .chain(route_middleware.iter().map(|definition| (Origin::Route, *definition)))
            .collect();

        let mut stack = Vec::new();
        let mut claimed: Vec<Slot> = PRIORITIZED_SLOTS.to_vec();

        for slot in PRIORITIZED_SLOTS.iter() {
            if let Some(&(origin, definition)) = find_last(&working, |(_, d)| d.has_slot(slot)) {
                debug!(route = %route.entry.name, slot = %slot, origin = %origin, "resolved prioritized slot");
                stack.push(StackItem::Middleware {
                    origin,
                    definition: definition.clone(),
                });
            }
        }

        for global in &self.global {
            match global.slot() {
                None => stack.push(StackItem::Middleware {
                    origin: Origin::Global,
                    definition: global.clone(),
                }),
                Some(slot) if claimed.contains(slot) => {}
                Some(slot) => {
                    let candidates: Vec<(Origin, &MiddlewareDefinition<F>)> = self
                        .global
                        .iter()
                        .map(|definition| (Origin::Global, definition))
                        .chain(route_middleware.iter().map(|definition| (Origin::Route, *definition)))
                        .filter(|(_, definition)| definition.has_slot(slot))
                        .collect();

                    if let Some(&(origin, definition)) = find_last(&candidates, |_| true) {
                        if origin == Origin::Route {
                            debug!(route = %route.entry.name, slot = %slot, "route overrides global slot");
                        }
                        stack.push(StackItem::Middleware {
                            origin,
                            definition: definition.clone(),
                        });
                    }
                    claimed.push(slot.clone());
                }
            }
        }

        for declaration in &declared {
            match declaration {
                Declaration::Handler(handler) => stack.push(StackItem::Handler(handler.clone())),
                Declaration::Middleware(middleware) => match middleware.slot() {
                    None => stack.push(StackItem::Middleware {
                        origin: Origin::Route,
                        definition: middleware.clone(),
                    }),
                    Some(slot) if claimed.contains(slot) => {}
                    Some(slot) => {
                        if let Some(winner) = find_last(&route_middleware, |d| d.has_slot(slot)) {
                            stack.push(StackItem::Middleware {
                                origin: Origin::Route,
                                definition: (*winner).clone(),
                            });
                        }
                        claimed.push(slot.clone());
                    }
                },
            }
        }

        stack
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::{HttpMethod, MiddlewareOptions};
    use crate::{RouteEntry, RouteFolder};
    use pretty_assertions::assert_eq;

    fn route(declarations: Vec<Declaration<&'static str>>) -> ServerRoute<&'static str> {
        let entry = RouteEntry::new(RouteFolder::Api, "users", "index.rs", "api/users/index.rs").unwrap();
        ServerRoute::new(entry).with_declarations(declarations)
    }

    fn slotted(function: &'static str, slot: &str) -> MiddlewareDefinition<&'static str> {
        MiddlewareDefinition::new([function], MiddlewareOptions::new().with_slot(slot))
    }

    fn plain(function: &'static str) -> MiddlewareDefinition<&'static str> {
        MiddlewareDefinition::new([function], MiddlewareOptions::new())
    }

    fn use_slot(function: &'static str, slot: &str) -> Declaration<&'static str> {
        Declaration::Middleware(slotted(function, slot))
    }

    fn functions(stack: &[StackItem<&'static str>]) -> Vec<&'static str> {
        stack
            .iter()
            .flat_map(|item| match item {
                StackItem::Middleware { definition, .. } => definition.functions.clone(),
                StackItem::Handler(handler) => handler.functions.clone(),
            })
            .collect()
    }

    fn defaults() -> StackCompiler<&'static str> {
        StackCompiler::with_defaults(|slot| match slot {
            Slot::Params => "core_params",
            Slot::ValidateParams => "core_validate_params",
            Slot::ValidatePayload => "core_validate_payload",
            Slot::ValidateResponse => "core_validate_response",
            _ => "core_other",
        })
    }

    #[test]
    fn test_defaults_only() {
        let stack = defaults().compile_stack(&route(vec![]));
        assert_eq!(
            functions(&stack),
            vec![
                "core_params",
                "core_validate_params",
                "core_validate_payload",
                "core_validate_response",
            ]
        );
        assert!(stack
            .iter()
            .all(|item| matches!(item, StackItem::Middleware { origin: Origin::Core, .. })));
    }

    #[test]
    fn test_empty_compiler_yields_empty_stack() {
        let stack = StackCompiler::new().compile_stack(&route(vec![]));
        assert!(stack.is_empty());
    }

    #[test]
    fn test_prioritized_slots_lead_in_fixed_order() {
        let stack = StackCompiler::new().compile_stack(&route(vec![
            Declaration::middleware(["first"], MiddlewareOptions::new()),
            use_slot("response", "validateResponse"),
            use_slot("errors", "errorHandler"),
            use_slot("body", "bodyparser"),
            Declaration::handler(HttpMethod::Get, ["get"]),
        ]));

        assert_eq!(functions(&stack), vec!["errors", "body", "response", "first", "get"]);
    }

    #[test]
    fn test_last_declaration_wins_slot() {
        let stack = StackCompiler::new().compile_stack(&route(vec![
            use_slot("a", "payload"),
            use_slot("b", "payload"),
        ]));

        assert_eq!(functions(&stack), vec!["b"]);
    }

    #[test]
    fn test_route_overrides_core_and_global() {
        let compiler = defaults().with_global([slotted("global_params", "params")]);

        let stack = compiler.compile_stack(&route(vec![]));
        assert_eq!(functions(&stack)[0], "global_params");

        let stack = compiler.compile_stack(&route(vec![use_slot("route_params", "params")]));
        assert_eq!(functions(&stack)[0], "route_params");
        assert_eq!(stack.len(), 4);
    }

    #[test]
    fn test_global_without_slot_follows_prioritized() {
        let compiler = defaults().with_global([plain("cors"), plain("logger")]);
        let stack = compiler.compile_stack(&route(vec![
            Declaration::middleware(["auth"], MiddlewareOptions::new()),
            Declaration::handler(HttpMethod::Get, ["get"]),
        ]));

        assert_eq!(&functions(&stack)[4..], &["cors", "logger", "auth", "get"]);
    }

    #[test]
    fn test_route_overrides_global_custom_slot_in_place() {
        let compiler = StackCompiler::new().with_global([
            plain("cors"),
            slotted("session", "auth"),
            plain("logger"),
        ]);
        let stack = compiler.compile_stack(&route(vec![
            Declaration::middleware(["audit"], MiddlewareOptions::new()),
            use_slot("token", "auth"),
        ]));

        assert_eq!(functions(&stack), vec!["cors", "token", "logger", "audit"]);
        assert!(matches!(stack[1], StackItem::Middleware { origin: Origin::Route, .. }));
    }

    #[test]
    fn test_global_custom_slot_kept_without_override() {
        let compiler = StackCompiler::new().with_global([slotted("session", "auth")]);
        let stack = compiler.compile_stack(&route(vec![]));

        assert_eq!(functions(&stack), vec!["session"]);
    }

    #[test]
    fn test_later_global_wins_custom_slot() {
        let compiler = StackCompiler::new()
            .with_global([slotted("session", "auth"), slotted("jwt", "auth")]);
        let stack = compiler.compile_stack(&route(vec![]));

        assert_eq!(functions(&stack), vec!["jwt"]);
    }

    #[test]
    fn test_route_only_custom_slot_is_not_duplicated() {
        let stack = StackCompiler::new().compile_stack(&route(vec![
            use_slot("cache_a", "cache"),
            Declaration::middleware(["audit"], MiddlewareOptions::new()),
            use_slot("cache_b", "cache"),
        ]));

        assert_eq!(functions(&stack), vec!["cache_b", "audit"]);
    }

    #[test]
    fn test_wrappers_come_before_route_declarations() {
        let entry = RouteEntry::new(RouteFolder::Api, "admin", "index.rs", "api/admin/index.rs").unwrap();
        let route = ServerRoute::new(entry)
            .with_wrapper(plain("require_admin"))
            .with_wrapper(slotted("wrapper_payload", "payload"))
            .with_declarations([
                Declaration::middleware(["audit"], MiddlewareOptions::new()),
                Declaration::handler(HttpMethod::Post, ["create"]),
            ]);

        let stack = StackCompiler::<&str>::new().compile_stack(&route);
        assert_eq!(
            functions(&stack),
            vec!["wrapper_payload", "require_admin", "audit", "create"]
        );
    }

    #[test]
    fn test_handlers_stay_in_declaration_order() {
        let stack = StackCompiler::new().compile_stack(&route(vec![
            Declaration::handler(HttpMethod::Get, ["get"]),
            Declaration::middleware(["after"], MiddlewareOptions::new()),
            Declaration::handler(HttpMethod::Post, ["post"]),
        ]));

        let kinds: Vec<bool> = stack.iter().map(StackItem::is_handler).collect();
        assert_eq!(kinds, vec![true, false, true]);
    }

    #[test]
    fn test_core_defaults_cover_default_slots() {
        let core = core_defaults(|slot| slot.to_string());
        let slots: Vec<&Slot> = core.iter().filter_map(|d| d.slot()).collect();
        assert_eq!(slots, DEFAULT_SLOTS.iter().collect::<Vec<_>>());
        assert_eq!(core[0].functions, vec!["params".to_string()]);
    }

    #[test]
    fn test_custom_spelling_of_prioritized_slot_is_resolved_first() {
        let stack = defaults().with_global([plain("cors")]).compile_stack(&route(vec![
            Declaration::middleware(["audit"], MiddlewareOptions::new()),
            Declaration::middleware(
                ["route_params"],
                MiddlewareOptions::new().with_slot(Slot::Custom("params".to_string())),
            ),
        ]));

        assert_eq!(
            functions(&stack),
            vec![
                "route_params",
                "core_validate_params",
                "core_validate_payload",
                "core_validate_response",
                "cors",
                "audit",
            ]
        );
    }

    #[test]
    fn test_find_last_empty() {
        let empty: [u8; 0] = [];
        assert_eq!(find_last(&empty, |_| true), None);
    }
}
