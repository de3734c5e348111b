//! Route specificity ordering
//!
//! Decides which of two overlapping routes is tried first. A static segment is
//! always more specific than a parameter that could match the same text, so
//! static-heavy routes sort before parameter-heavy ones regardless of depth.

use std::cmp::Ordering;

use crate::path::PathToken;

/// Anything that can be ordered by route specificity
pub trait Specificity {
    /// Logical route name, the final tie-breaker
    fn specificity_name(&self) -> &str;

    fn specificity_tokens(&self) -> &[PathToken];
}

/// Compares two routes (pure function)
///
/// 1. More static segments first
/// 2. Fewer segments first
/// 3. Name ascending
///
/// # Examples
///
/// ```
/// use rhtmx_routegen::{specificity, RouteEntry, RouteFolder};
/// use std::cmp::Ordering;
///
/// let account = RouteEntry::new(RouteFolder::Api, "users/account", "index.rs", "x").unwrap();
/// let user = RouteEntry::new(RouteFolder::Api, "users/[id]", "index.rs", "x").unwrap();
///
/// assert_eq!(specificity::compare(&account, &user), Ordering::Less);
/// ```
pub fn compare<A, B>(a: &A, b: &B) -> Ordering
where
    A: Specificity + ?Sized,
    B: Specificity + ?Sized,
{
    let statics = |tokens: &[PathToken]| tokens.iter().filter(|t| t.is_static()).count();
    let (a_tokens, b_tokens) = (a.specificity_tokens(), b.specificity_tokens());

    statics(b_tokens)
        .cmp(&statics(a_tokens))
        .then_with(|| a_tokens.len().cmp(&b_tokens.len()))
        .then_with(|| a.specificity_name().cmp(b.specificity_name()))
}

/// Returns a sorted copy, leaving the caller's slice untouched
pub fn sorted<T>(items: &[T]) -> Vec<T>
where
    T: Specificity + Clone,
{
    let mut items = items.to_vec();
    items.sort_by(compare);
    items
}

impl Specificity for crate::RouteEntry {
    fn specificity_name(&self) -> &str {
        &self.name
    }

    fn specificity_tokens(&self) -> &[PathToken] {
        &self.path_tokens
    }
}
