pub mod coerce;
mod directive;

pub use directive::{Directive, ScalarKind, Target};

use crate::{error::*, value::graph::ObjectRef};
use std::collections::HashMap;

/// Segment matching any single key on its level.
pub const WILDCARD: &str = "*";
pub const SEPARATOR: char = '/';

/// Joins parent path and key the way mapping paths are written.
pub fn child_path(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_owned()
    } else {
        format!("{}{}{}", parent, SEPARATOR, key)
    }
}

fn segments(path: &str) -> impl Iterator<Item = &str> {
    (!path.is_empty())
        .then(|| path.split(SEPARATOR))
        .into_iter()
        .flatten()
}

#[derive(Debug, Default, Clone, PartialEq)]
struct MapNode {
    directive: Option<Directive>,
    children: HashMap<String, MapNode>,
}

/// Path keyed table of type directives steering rehydration.
///
/// # Example
/// ```rust
/// use serde_graph::mapping::{Mapping, Directive};
///
/// let mapping = Mapping::from_pairs([("", "object"), ("list/*", "cl:demo::Item")]).unwrap();
/// assert_eq!(mapping.resolve("list/2"), Some(&Directive::instance("demo::Item")));
/// assert_eq!(mapping.resolve("list"), None);
/// ```
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Mapping {
    root: MapNode,
}

impl Mapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Result<Self> {
        let mut result = Self::new();
        for (path, spec) in pairs {
            result.add(path, spec)?;
        }
        Ok(result)
    }

    pub fn with(mut self, path: &str, spec: &str) -> Result<Self> {
        self.add(path, spec)?;
        Ok(self)
    }

    /// Parses `spec` and maps it at `path`, replacing previous directive.
    pub fn add(&mut self, path: &str, spec: &str) -> Result<()> {
        let directive = Directive::parse(spec).map_err(|error| error.at(path))?;
        self.insert(path, directive);
        Ok(())
    }

    pub fn insert(&mut self, path: &str, directive: Directive) {
        let mut node = &mut self.root;
        for segment in segments(path) {
            node = node.children.entry(segment.to_owned()).or_default();
        }
        node.directive = Some(directive);
    }

    pub fn remove(&mut self, path: &str) -> Option<Directive> {
        let mut node = &mut self.root;
        for segment in segments(path) {
            node = node.children.get_mut(segment)?;
        }
        node.directive.take()
    }

    pub fn clear(&mut self) {
        self.root = Default::default();
    }

    pub fn is_empty(&self) -> bool {
        self.root.directive.is_none() && self.root.children.is_empty()
    }

    /// Exact segments win over wildcards on every level, there is no
    /// backtracking and partially matched paths are unmapped.
    pub fn resolve(&self, path: &str) -> Option<&Directive> {
        let mut node = &self.root;
        for segment in segments(path) {
            node = node
                .children
                .get(segment)
                .or_else(|| node.children.get(WILDCARD))?;
        }
        node.directive.as_ref()
    }
}

/// Mapping together with objects constructed so far in one call.
#[derive(Debug)]
pub struct MappingState<'a> {
    mapping: &'a Mapping,
    references: HashMap<String, ObjectRef>,
}

impl<'a> MappingState<'a> {
    pub fn new(mapping: &'a Mapping) -> Self {
        Self {
            mapping,
            references: Default::default(),
        }
    }

    pub fn resolve(&self, path: &str) -> Option<&'a Directive> {
        self.mapping.resolve(path)
    }

    pub fn register_constructed(&mut self, path: &str, object: &ObjectRef) {
        self.references.insert(path.to_owned(), object.clone());
    }

    pub fn lookup_reference(&self, path: &str) -> Option<ObjectRef> {
        self.references.get(path).cloned()
    }

    pub fn reset(&mut self) {
        self.references.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_precedence() {
        let mapping = Mapping::from_pairs([
            ("", "object"),
            ("list/*", "cl:Item"),
            ("list/0", "int"),
            ("list/*/test", "?string"),
            ("deep/a/b", "bool"),
        ])
        .unwrap();
        assert_eq!(mapping.resolve(""), Some(&Directive::scalar(ScalarKind::Object)));
        assert_eq!(mapping.resolve("list/0"), Some(&Directive::scalar(ScalarKind::Int)));
        assert_eq!(mapping.resolve("list/7"), Some(&Directive::instance("Item")));
        assert_eq!(
            mapping.resolve("list/el_1/test"),
            Some(&Directive::scalar(ScalarKind::String).nullable())
        );
        // exact `0` wins and has no `test` child, no fallback to wildcard
        assert_eq!(mapping.resolve("list/0/test"), None);
        assert_eq!(mapping.resolve("list"), None);
        assert_eq!(mapping.resolve("deep/a"), None);
        assert_eq!(mapping.resolve("deep/a/b/c"), None);
        assert_eq!(mapping.resolve("other"), None);
    }

    #[test]
    fn test_directive_grammar() {
        let directive = Directive::parse("?cl:demo::Item").unwrap();
        assert!(directive.nullable);
        assert_eq!(directive.target, Target::Instance("demo::Item".to_owned()));
        assert_eq!(
            Directive::parse("rf:").unwrap(),
            Directive::reference("")
        );
        assert_eq!(
            Directive::parse("rf:list/a").unwrap(),
            Directive::reference("list/a")
        );
        assert_eq!(
            Directive::parse("integer").unwrap(),
            Directive::scalar(ScalarKind::Int)
        );
        assert_eq!(
            Directive::parse("boolean").unwrap(),
            Directive::scalar(ScalarKind::Bool)
        );
        for spec in ["", "?", "intx", "cl:", "cl:a b", "??int", "number"] {
            assert!(
                matches!(Directive::parse(spec), Err(Error::Mapping { .. })),
                "{:?} should be rejected",
                spec
            );
        }
        match Mapping::new().with("a/b", "wat") {
            Err(Error::Mapping { path, .. }) => assert_eq!(path, "a/b"),
            result => panic!("unexpected result: {:?}", result),
        }
    }

    #[test]
    fn test_remove() {
        let mut mapping = Mapping::from_pairs([("a", "int"), ("a/b", "bool")]).unwrap();
        assert_eq!(mapping.remove("a"), Some(Directive::scalar(ScalarKind::Int)));
        assert_eq!(mapping.resolve("a"), None);
        assert!(mapping.resolve("a/b").is_some());
        assert_eq!(mapping.remove("missing/path"), None);
        mapping.clear();
        assert!(mapping.is_empty());
    }
}
