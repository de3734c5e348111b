/// Segment tokenizer for route directory names
///
/// Turns one directory name such as `book-[id]` or `name{-v:version{-:pre}}`
/// into a small tree of literal text, parameters, wildcards and optional
/// groups, then flattens that tree into typed parts.
///
/// All functions are **pure**: same input → same output, no side effects.

use std::borrow::Cow;
use std::iter::Peekable;
use std::str::CharIndices;

use sha2::{Digest, Sha256};

use super::{ParamKind, PathTokenPart};
use crate::error::PatternError;

/// Node of a parsed segment
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Node {
    Text(String),
    Param(String),
    Wildcard(String),
    Group(Vec<Node>),
}

/// Rewrites `{...name}` into the canonical wildcard group `{*name}`
///
/// Bracket splats (`[...name]`, `[[...name]]`) are handled by the parser
/// because their names may contain characters the brace syntax does not allow.
pub(crate) fn normalize_splats(segment: &str) -> Cow<'_, str> {
    if segment.contains("{...") {
        Cow::Owned(segment.replace("{...", "{*"))
    } else {
        Cow::Borrowed(segment)
    }
}

/// Parses a normalized segment into nodes
///
/// With `allow_separator` the parser also accepts `/` as literal text, which
/// lets it read back a whole compiled route pattern.
pub(crate) fn parse(segment: &str, allow_separator: bool) -> Result<Vec<Node>, PatternError> {
    let mut parser = Parser {
        segment,
        chars: segment.char_indices().peekable(),
        allow_separator,
    };
    parser.nodes(None)
}

struct Parser<'a> {
    segment: &'a str,
    chars: Peekable<CharIndices<'a>>,
    allow_separator: bool,
}

impl<'a> Parser<'a> {
    fn nodes(&mut self, open_at: Option<usize>) -> Result<Vec<Node>, PatternError> {
        let mut nodes = Vec::new();

        loop {
            let Some(&(offset, c)) = self.chars.peek() else {
                return match open_at {
                    Some(offset) => Err(self.unclosed('{', offset)),
                    None => Ok(nodes),
                };
            };

            match c {
                '}' => {
                    self.chars.next();
                    return match open_at {
                        Some(_) if nodes.is_empty() => Err(self.unexpected('}', offset)),
                        Some(_) => Ok(nodes),
                        None => Err(self.unexpected('}', offset)),
                    };
                }
                '{' => {
                    self.chars.next();
                    let inner = self.nodes(Some(offset))?;
                    nodes.push(Node::Group(inner));
                }
                ':' => {
                    self.chars.next();
                    let name = self.identifier(offset)?;
                    nodes.push(Node::Param(sanitize_param_name(name).into_owned()));
                }
                '*' => {
                    self.chars.next();
                    let name = self.identifier(offset)?;
                    nodes.push(Node::Wildcard(sanitize_param_name(name).into_owned()));
                }
                '[' => nodes.push(self.bracket(offset)?),
                ']' => return Err(self.unexpected(']', offset)),
                '/' if !self.allow_separator => return Err(self.unexpected('/', offset)),
                '(' | ')' | '?' | '+' | '!' | '\\' => {
                    return Err(PatternError::Reserved {
                        segment: self.segment.to_string(),
                        found: c,
                        offset,
                    })
                }
                _ => {
                    self.chars.next();
                    match nodes.last_mut() {
                        Some(Node::Text(text)) => text.push(c),
                        _ => nodes.push(Node::Text(c.to_string())),
                    }
                }
            }
        }
    }

    /// Reads `[A-Za-z0-9_$]+` following a `:` or `*`
    fn identifier(&mut self, marker_at: usize) -> Result<&'a str, PatternError> {
        let start = marker_at + 1;
        let mut end = start;
        while let Some(&(offset, c)) = self.chars.peek() {
            if c.is_ascii_alphanumeric() || c == '_' || c == '$' {
                end = offset + c.len_utf8();
                self.chars.next();
            } else {
                break;
            }
        }

        if end == start {
            return Err(PatternError::MissingName {
                segment: self.segment.to_string(),
                offset: marker_at,
            });
        }
        Ok(&self.segment[start..end])
    }

    /// Bracket sugar: `[name]`, `[[name]]`, `[...name]`, `[[...name]]`
    fn bracket(&mut self, open_at: usize) -> Result<Node, PatternError> {
        self.chars.next();
        let double = matches!(self.chars.peek(), Some(&(_, '[')));
        if double {
            self.chars.next();
        }

        let start = open_at + if double { 2 } else { 1 };
        let end = loop {
            match self.chars.next() {
                Some((offset, ']')) => break offset,
                Some((_, '[')) | Some((_, '/')) | None => {
                    return Err(self.unclosed('[', open_at));
                }
                Some(_) => {}
            }
        };

        if double {
            match self.chars.next() {
                Some((_, ']')) => {}
                _ => return Err(self.unclosed('[', open_at)),
            }
        }

        let inner = &self.segment[start..end];
        let (splat, raw) = match inner.strip_prefix("...") {
            Some(raw) => (true, raw),
            None => (false, inner),
        };

        if raw.is_empty() {
            return Err(PatternError::MissingName {
                segment: self.segment.to_string(),
                offset: open_at,
            });
        }

        let name = sanitize_param_name(raw).into_owned();
        Ok(match (splat, double) {
            (true, _) => Node::Group(vec![Node::Wildcard(name)]),
            (false, true) => Node::Group(vec![Node::Param(name)]),
            (false, false) => Node::Param(name),
        })
    }

    fn unclosed(&self, open: char, offset: usize) -> PatternError {
        PatternError::Unclosed {
            segment: self.segment.to_string(),
            open,
            offset,
        }
    }

    fn unexpected(&self, found: char, offset: usize) -> PatternError {
        PatternError::Unexpected {
            segment: self.segment.to_string(),
            found,
            offset,
        }
    }
}

/// Makes a parameter name safe for generated identifiers
///
/// Names made of ASCII letters, digits and `_` that do not start with a digit
/// are returned as is. Anything else has offending characters replaced by `_`
/// and a short hash of the raw name appended, so `user-id` and `user.id` never
/// collapse into the same name.
///
/// # Examples
///
/// ```
/// use rhtmx_routegen::path::sanitize_param_name;
///
/// assert_eq!(sanitize_param_name("id"), "id");
///
/// let name = sanitize_param_name("user-id");
/// assert!(name.starts_with("user_id_"));
/// assert_ne!(name, sanitize_param_name("user.id"));
/// ```
pub fn sanitize_param_name(raw: &str) -> Cow<'_, str> {
    let leading_digit = raw.chars().next().is_some_and(|c| c.is_ascii_digit());
    let clean = raw.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');

    if clean && !leading_digit && !raw.is_empty() {
        return Cow::Borrowed(raw);
    }

    let mut name: String = raw
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    if leading_digit {
        name.insert(0, '_');
    }

    let digest = hex::encode(Sha256::digest(raw.as_bytes()));
    Cow::Owned(format!("{}_{}", name, &digest[..8]))
}

/// Flattens a node tree into typed parts
///
/// Top-level parameters are required, anything inside a group (at any depth)
/// is optional, wildcards are always splats. Literal text only becomes a part
/// at the top level.
pub(crate) fn flatten(nodes: &[Node]) -> Vec<PathTokenPart> {
    fn walk(nodes: &[Node], depth: usize, parts: &mut Vec<PathTokenPart>) {
        for node in nodes {
            match node {
                Node::Text(value) if depth == 0 => parts.push(PathTokenPart::Static {
                    value: value.clone(),
                }),
                Node::Text(_) => {}
                Node::Param(name) => parts.push(PathTokenPart::Param {
                    name: name.clone(),
                    kind: if depth == 0 {
                        ParamKind::Required
                    } else {
                        ParamKind::Optional
                    },
                }),
                Node::Wildcard(name) => parts.push(PathTokenPart::Param {
                    name: name.clone(),
                    kind: ParamKind::Splat,
                }),
                Node::Group(inner) => walk(inner, depth + 1, parts),
            }
        }
    }

    let mut parts = Vec::new();
    walk(nodes, 0, &mut parts);
    parts
}

/// Renders nodes back into canonical pattern text
pub(crate) fn render(nodes: &[Node], out: &mut String) {
    for node in nodes {
        match node {
            Node::Text(text) => out.push_str(text),
            Node::Param(name) => {
                out.push(':');
                out.push_str(name);
            }
            Node::Wildcard(name) => {
                out.push('*');
                out.push_str(name);
            }
            Node::Group(inner) => {
                out.push('{');
                render(inner, out);
                out.push('}');
            }
        }
    }
}

/// Renders a segment with its leading separator
///
/// A segment opening with a group carries the separator inside the group
/// (`{:id}` → `{/:id}`), so leaving the group out also drops the slash.
pub(crate) fn render_segment(nodes: &[Node]) -> String {
    let mut out = String::new();
    match nodes.split_first() {
        Some((Node::Group(inner), rest)) => {
            out.push_str("{/");
            render(inner, &mut out);
            out.push('}');
            render(rest, &mut out);
        }
        _ => {
            out.push('/');
            render(nodes, &mut out);
        }
    }
    out
}
