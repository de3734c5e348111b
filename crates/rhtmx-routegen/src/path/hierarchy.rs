/// Lazy iterator over a route name and its ancestors
///
/// For name `blog/post/[slug]`, yields: `blog/post/[slug]` → `blog/post` → `blog`
///
/// Route names are directory paths without a leading slash, so the iteration
/// ends at the top-level directory rather than at a root `/`.
///
/// # Performance
///
/// - **Allocations**: Zero (only borrows from input string)
/// - **Complexity**: O(depth) where depth is path levels
///
/// # Examples
///
/// ```
/// use rhtmx_routegen::path::PathHierarchy;
///
/// let names: Vec<&str> = PathHierarchy::new("a/b/c").collect();
/// assert_eq!(names, vec!["a/b/c", "a/b", "a"]);
///
/// let ancestors: Vec<&str> = PathHierarchy::ancestors("a/b/c").collect();
/// assert_eq!(ancestors, vec!["a/b", "a"]);
/// ```
#[derive(Debug, Clone)]
pub struct PathHierarchy<'a> {
    current: Option<&'a str>,
}

impl<'a> PathHierarchy<'a> {
    /// Starts at `name` itself
    pub fn new(name: &'a str) -> Self {
        let name = name.trim_matches('/');
        Self {
            current: (!name.is_empty()).then_some(name),
        }
    }

    /// Starts at the parent of `name`
    pub fn ancestors(name: &'a str) -> Self {
        let mut hierarchy = Self::new(name);
        hierarchy.next();
        hierarchy
    }
}

impl<'a> Iterator for PathHierarchy<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.current?;
        self.current = current.rfind('/').map(|slash_pos| &current[..slash_pos]);
        Some(current)
    }
}

/// Whether `ancestor` is a strict path-prefix of `name`
///
/// Matches on whole segments: `blog` is an ancestor of `blog/post` but not of `blogroll`.
pub fn is_ancestor(ancestor: &str, name: &str) -> bool {
    name.strip_prefix(ancestor)
        .is_some_and(|rest| rest.starts_with('/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_segment() {
        let names: Vec<_> = PathHierarchy::new("about").collect();
        assert_eq!(names, vec!["about"]);
        assert_eq!(PathHierarchy::ancestors("about").next(), None);
    }

    #[test]
    fn test_empty_name() {
        assert_eq!(PathHierarchy::new("").next(), None);
        assert_eq!(PathHierarchy::new("/").next(), None);
    }

    #[test]
    fn test_is_ancestor_whole_segments() {
        assert!(is_ancestor("blog", "blog/post"));
        assert!(is_ancestor("blog", "blog/post/[slug]"));
        assert!(!is_ancestor("blog", "blogroll"));
        assert!(!is_ancestor("blog", "blog"));
        assert!(!is_ancestor("blog/post", "blog"));
    }

    #[test]
    fn test_iterator_is_lazy_and_clonable() {
        let hierarchy = PathHierarchy::new("a/b/c");
        let found = hierarchy.clone().find(|name| *name == "a/b");
        assert_eq!(found, Some("a/b"));
        assert_eq!(hierarchy.count(), 3);
    }
}
