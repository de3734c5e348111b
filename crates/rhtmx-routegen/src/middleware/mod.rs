//! Middleware declarations and stack compilation
//!
//! Middleware functions are opaque to the compiler: every type here is generic
//! over the function type `F`, which only needs to be `Clone`. Generated code
//! typically uses a path or identifier, a server runtime an `Arc<dyn Fn ..>`.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

mod route;
mod stack;

pub use route::{expand_methods, MiddlewareTrace, RouterRoute, ServerRoute};
pub use stack::{core_defaults, find_last, StackCompiler, StackItem, DEFAULT_SLOTS};

/// HTTP method a handler answers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
}

impl HttpMethod {
    pub const ALL: [HttpMethod; 7] = [
        HttpMethod::Get,
        HttpMethod::Post,
        HttpMethod::Put,
        HttpMethod::Patch,
        HttpMethod::Delete,
        HttpMethod::Head,
        HttpMethod::Options,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Head => "HEAD",
            HttpMethod::Options => "OPTIONS",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown HTTP method `{0}`")]
pub struct UnknownMethod(pub String);

impl FromStr for HttpMethod {
    type Err = UnknownMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        HttpMethod::ALL
            .into_iter()
            .find(|method| method.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownMethod(s.to_string()))
    }
}

/// Named override point in the middleware stack
///
/// Prioritized slots always come first in a compiled stack, in the order of
/// [`PRIORITIZED_SLOTS`]. Any other name is a [`Slot::Custom`] slot.
///
/// Slots compare by name, so `Slot::Custom("params".into())` is `Slot::Params`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Slot {
    ErrorHandler,
    Params,
    ValidateParams,
    Bodyparser,
    Payload,
    ValidatePayload,
    ValidateResponse,
    Custom(String),
}

/// Slots that lead every compiled stack, in this exact order
pub const PRIORITIZED_SLOTS: [Slot; 7] = [
    Slot::ErrorHandler,
    Slot::Params,
    Slot::ValidateParams,
    Slot::Bodyparser,
    Slot::Payload,
    Slot::ValidatePayload,
    Slot::ValidateResponse,
];

impl Slot {
    pub fn as_str(&self) -> &str {
        match self {
            Slot::ErrorHandler => "errorHandler",
            Slot::Params => "params",
            Slot::ValidateParams => "validateParams",
            Slot::Bodyparser => "bodyparser",
            Slot::Payload => "payload",
            Slot::ValidatePayload => "validatePayload",
            Slot::ValidateResponse => "validateResponse",
            Slot::Custom(name) => name,
        }
    }

    pub fn is_prioritized(&self) -> bool {
        PRIORITIZED_SLOTS
            .iter()
            .any(|slot| slot.as_str() == self.as_str())
    }
}

impl PartialEq for Slot {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Eq for Slot {}

impl Hash for Slot {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_str().hash(state);
    }
}

impl From<String> for Slot {
    fn from(name: String) -> Self {
        PRIORITIZED_SLOTS
            .into_iter()
            .find(|slot| slot.as_str() == name)
            .unwrap_or(Slot::Custom(name))
    }
}

impl From<&str> for Slot {
    fn from(name: &str) -> Self {
        Slot::from(name.to_string())
    }
}

impl From<Slot> for String {
    fn from(slot: Slot) -> Self {
        match slot {
            Slot::Custom(name) => name,
            other => other.as_str().to_string(),
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a middleware declaration came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    /// Framework default, replaceable by any later declaration of the same slot
    Core,
    /// Application-wide
    Global,
    /// Declared by the route itself or a wrapping `use` file
    Route,
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Origin::Core => f.write_str("core"),
            Origin::Global => f.write_str("global"),
            Origin::Route => f.write_str("route"),
        }
    }
}

/// Options attached to a middleware declaration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MiddlewareOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slot: Option<Slot>,
    /// Methods this middleware runs for; `None` means all of them
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on: Option<Vec<HttpMethod>>,
    /// Label shown in debug traces
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debug: Option<String>,
}

impl MiddlewareOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_slot(mut self, slot: impl Into<Slot>) -> Self {
        self.slot = Some(slot.into());
        self
    }

    pub fn with_methods<I>(mut self, methods: I) -> Self
    where
        I: IntoIterator<Item = HttpMethod>,
    {
        self.on = Some(methods.into_iter().collect());
        self
    }

    pub fn with_debug(mut self, label: impl Into<String>) -> Self {
        self.debug = Some(label.into());
        self
    }

    /// Whether this middleware runs for `method`
    pub fn applies_to(&self, method: HttpMethod) -> bool {
        self.on
            .as_ref()
            .map_or(true, |methods| methods.contains(&method))
    }
}

/// Ordered middleware functions sharing one set of options
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MiddlewareDefinition<F> {
    pub functions: Vec<F>,
    pub options: MiddlewareOptions,
}

impl<F> MiddlewareDefinition<F> {
    pub fn new<I>(functions: I, options: MiddlewareOptions) -> Self
    where
        I: IntoIterator<Item = F>,
    {
        Self {
            functions: functions.into_iter().collect(),
            options,
        }
    }

    pub fn slot(&self) -> Option<&Slot> {
        self.options.slot.as_ref()
    }

    pub fn has_slot(&self, slot: &Slot) -> bool {
        self.slot() == Some(slot)
    }
}

/// Handler functions for one HTTP method
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HandlerDefinition<F> {
    pub method: HttpMethod,
    pub functions: Vec<F>,
}

impl<F> HandlerDefinition<F> {
    pub fn new<I>(method: HttpMethod, functions: I) -> Self
    where
        I: IntoIterator<Item = F>,
    {
        Self {
            method,
            functions: functions.into_iter().collect(),
        }
    }
}

/// One item declared by a route file
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Declaration<F> {
    Middleware(MiddlewareDefinition<F>),
    Handler(HandlerDefinition<F>),
}

impl<F> Declaration<F> {
    /// Declares middleware, the equivalent of a route file's `use(...)`
    pub fn middleware<I>(functions: I, options: MiddlewareOptions) -> Self
    where
        I: IntoIterator<Item = F>,
    {
        Declaration::Middleware(MiddlewareDefinition::new(functions, options))
    }

    pub fn handler<I>(method: HttpMethod, functions: I) -> Self
    where
        I: IntoIterator<Item = F>,
    {
        Declaration::Handler(HandlerDefinition::new(method, functions))
    }

    pub fn as_middleware(&self) -> Option<&MiddlewareDefinition<F>> {
        match self {
            Declaration::Middleware(definition) => Some(definition),
            Declaration::Handler(_) => None,
        }
    }

    pub fn as_handler(&self) -> Option<&HandlerDefinition<F>> {
        match self {
            Declaration::Handler(definition) => Some(definition),
            Declaration::Middleware(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("errorHandler", Slot::ErrorHandler)]
    #[case("params", Slot::Params)]
    #[case("validateParams", Slot::ValidateParams)]
    #[case("bodyparser", Slot::Bodyparser)]
    #[case("payload", Slot::Payload)]
    #[case("validatePayload", Slot::ValidatePayload)]
    #[case("validateResponse", Slot::ValidateResponse)]
    fn test_prioritized_slot_names(#[case] name: &str, #[case] slot: Slot) {
        assert_eq!(Slot::from(name), slot);
        assert_eq!(slot.as_str(), name);
        assert!(slot.is_prioritized());
    }

    #[test]
    fn test_custom_slot() {
        let slot = Slot::from("auth");
        assert_eq!(slot, Slot::Custom("auth".to_string()));
        assert!(!slot.is_prioritized());
        assert_eq!(String::from(slot), "auth");
    }

    #[test]
    fn test_custom_slot_with_prioritized_name() {
        let spelled = Slot::Custom("params".to_string());
        assert_eq!(spelled, Slot::Params);
        assert!(spelled.is_prioritized());

        let definition: MiddlewareDefinition<&str> =
            MiddlewareDefinition::new(["p"], MiddlewareOptions::new().with_slot(spelled));
        assert!(definition.has_slot(&Slot::Params));
    }

    #[test]
    fn test_slot_serde_uses_names() {
        let json = serde_json::to_string(&Slot::ValidatePayload).unwrap();
        assert_eq!(json, "\"validatePayload\"");

        let slot: Slot = serde_json::from_str("\"rateLimit\"").unwrap();
        assert_eq!(slot, Slot::Custom("rateLimit".to_string()));
    }

    #[test]
    fn test_method_parse_and_display() {
        assert_eq!("get".parse::<HttpMethod>().unwrap(), HttpMethod::Get);
        assert_eq!("DELETE".parse::<HttpMethod>().unwrap(), HttpMethod::Delete);
        assert!("FETCH".parse::<HttpMethod>().is_err());
        assert_eq!(HttpMethod::Patch.to_string(), "PATCH");
        assert_eq!(serde_json::to_string(&HttpMethod::Options).unwrap(), "\"OPTIONS\"");
    }

    #[test]
    fn test_applies_to() {
        let all = MiddlewareOptions::new();
        assert!(HttpMethod::ALL.iter().all(|m| all.applies_to(*m)));

        let get_only = MiddlewareOptions::new().with_methods([HttpMethod::Get]);
        assert!(get_only.applies_to(HttpMethod::Get));
        assert!(!get_only.applies_to(HttpMethod::Post));

        let none = MiddlewareOptions::new().with_methods([]);
        assert!(!none.applies_to(HttpMethod::Get));
    }

    #[test]
    fn test_declaration_accessors() {
        let middleware: Declaration<&str> =
            Declaration::middleware(["log"], MiddlewareOptions::new().with_slot("logger"));
        let handler: Declaration<&str> = Declaration::handler(HttpMethod::Get, ["list"]);

        assert_eq!(
            middleware.as_middleware().and_then(|m| m.slot()),
            Some(&Slot::Custom("logger".to_string()))
        );
        assert!(middleware.as_handler().is_none());
        assert_eq!(handler.as_handler().map(|h| h.method), Some(HttpMethod::Get));
    }
}
