/// Optional-group expansion
///
/// Routers without optional groups need every concrete form of a pattern.
/// Each group is either left out or included, and an inner group can only be
/// included together with its enclosing group, so `name{-v:version{-:pre}}`
/// expands to `name`, `name-v:version` and `name-v:version-:pre`.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::segment::{self, Node};
use super::PathPattern;
use crate::error::PatternError;

/// One concrete form of a route pattern, without optional groups
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternVariant {
    /// URL pattern rooted at `/`, e.g. `/users/:id`
    pub pattern: String,
    /// Parameters bound by this variant, in declaration order
    pub params: Vec<String>,
}

#[derive(Debug, Clone, Copy)]
enum Atom<'a> {
    Text(&'a str),
    Param(&'a str),
    Wildcard(&'a str),
}

/// Expands a compiled pattern into its concrete variants
///
/// Variants come out from least to most specific. Two variants with the same
/// shape (pattern with parameter names erased) would match the same URLs; only
/// the one binding its parameters earliest in declaration order is kept, e.g.
/// `[[a]]/[[b]]` yields `/:a` but not `/:b`.
///
/// # Examples
///
/// ```
/// use rhtmx_routegen::path::{compile_path, expand_variants};
///
/// let compiled = compile_path("pkg/name{-v:version{-:pre}}").unwrap();
/// let patterns: Vec<String> = expand_variants(&compiled)
///     .unwrap()
///     .into_iter()
///     .map(|v| v.pattern)
///     .collect();
///
/// assert_eq!(
///     patterns,
///     vec!["/pkg/name", "/pkg/name-v:version", "/pkg/name-v:version-:pre"]
/// );
/// ```
pub fn expand_variants(compiled: &PathPattern) -> Result<Vec<PatternVariant>, PatternError> {
    let parsed = compiled
        .tokens
        .iter()
        .map(|token| segment::parse(&token.pattern, true))
        .collect::<Result<Vec<_>, _>>()?;

    let combined = parsed.iter().fold(vec![Vec::new()], |acc, nodes| {
        cartesian(&acc, &expand(nodes))
    });

    let declared: HashMap<&str, usize> = compiled
        .params()
        .into_iter()
        .enumerate()
        .map(|(i, (name, _))| (name, i))
        .collect();

    let mut variants: Vec<(String, Vec<usize>, PatternVariant)> = Vec::new();
    let mut by_shape: HashMap<String, usize> = HashMap::new();
    let mut pruned = 0usize;

    for atoms in &combined {
        let (variant, shape) = render(atoms);
        let order: Vec<usize> = variant
            .params
            .iter()
            .map(|name| declared.get(name.as_str()).copied().unwrap_or(usize::MAX))
            .collect();

        match by_shape.get(&shape) {
            Some(&slot) if order < variants[slot].1 => {
                variants[slot] = (shape, order, variant);
                pruned += 1;
            }
            Some(_) => pruned += 1,
            None => {
                by_shape.insert(shape.clone(), variants.len());
                variants.push((shape, order, variant));
            }
        }
    }

    if pruned > 0 {
        debug!(pattern = %compiled.pattern, pruned = pruned, "pruned ambiguous pattern variants");
    }

    Ok(variants.into_iter().map(|(_, _, variant)| variant).collect())
}

/// Every include/exclude combination of the groups in `nodes`
fn expand(nodes: &[Node]) -> Vec<Vec<Atom<'_>>> {
    nodes.iter().fold(vec![Vec::new()], |acc, node| {
        let options = match node {
            Node::Text(text) => vec![vec![Atom::Text(text)]],
            Node::Param(name) => vec![vec![Atom::Param(name)]],
            Node::Wildcard(name) => vec![vec![Atom::Wildcard(name)]],
            Node::Group(inner) => {
                let mut options = vec![Vec::new()];
                options.extend(expand(inner));
                options
            }
        };
        cartesian(&acc, &options)
    })
}

fn cartesian<'a>(prefixes: &[Vec<Atom<'a>>], options: &[Vec<Atom<'a>>]) -> Vec<Vec<Atom<'a>>> {
    prefixes
        .iter()
        .flat_map(|prefix| {
            options.iter().map(move |option| {
                let mut atoms = prefix.clone();
                atoms.extend_from_slice(option);
                atoms
            })
        })
        .collect()
}

/// Renders atoms into a variant and its shape
fn render(atoms: &[Atom<'_>]) -> (PatternVariant, String) {
    let mut pattern = String::new();
    let mut shape = String::new();
    let mut params = Vec::new();

    for atom in atoms {
        match atom {
            Atom::Text(text) => {
                pattern.push_str(text);
                shape.push_str(text);
            }
            Atom::Param(name) => {
                pattern.push(':');
                pattern.push_str(name);
                shape.push(':');
                params.push(name.to_string());
            }
            Atom::Wildcard(name) => {
                pattern.push('*');
                pattern.push_str(name);
                shape.push('*');
                params.push(name.to_string());
            }
        }
    }

    if !pattern.starts_with('/') {
        pattern.insert(0, '/');
        shape.insert(0, '/');
    }

    (PatternVariant { pattern, params }, shape)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::compile_path;
    use pretty_assertions::assert_eq;

    fn patterns(path: &str) -> Vec<String> {
        expand_variants(&compile_path(path).unwrap())
            .unwrap()
            .into_iter()
            .map(|v| v.pattern)
            .collect()
    }

    #[test]
    fn test_static_has_single_variant() {
        assert_eq!(patterns("users/account"), vec!["/users/account"]);
    }

    #[test]
    fn test_root_variant() {
        assert_eq!(patterns("index"), vec!["/"]);
    }

    #[test]
    fn test_optional_param() {
        assert_eq!(patterns("users/[[id]]"), vec!["/users", "/users/:id"]);
    }

    #[test]
    fn test_leading_optional_segment() {
        assert_eq!(patterns("[[lang]]/about"), vec!["/about", "/:lang/about"]);
    }

    #[test]
    fn test_splat() {
        assert_eq!(patterns("docs/[...slug]"), vec!["/docs", "/docs/*slug"]);
    }

    #[test]
    fn test_three_levels_of_nesting() {
        assert_eq!(
            patterns("{a{b{c}}}"),
            vec!["/", "/a", "/ab", "/abc"]
        );
    }

    #[test]
    fn test_sibling_groups() {
        assert_eq!(
            patterns("file{.:ext}{-:lang}"),
            vec!["/file", "/file-:lang", "/file.:ext", "/file.:ext-:lang"]
        );
    }

    #[test]
    fn test_phantom_variant_is_pruned() {
        let variants = expand_variants(&compile_path("[[a]]/[[b]]").unwrap()).unwrap();
        let bound: Vec<Vec<String>> = variants.into_iter().map(|v| v.params).collect();
        assert_eq!(
            bound,
            vec![
                vec![],
                vec!["a".to_string()],
                vec!["a".to_string(), "b".to_string()],
            ]
        );
    }

    #[test]
    fn test_distinct_shapes_are_kept() {
        assert_eq!(
            patterns("users/[[a]]/posts/[[b]]"),
            vec![
                "/users/posts",
                "/users/posts/:b",
                "/users/:a/posts",
                "/users/:a/posts/:b",
            ]
        );
    }
}
