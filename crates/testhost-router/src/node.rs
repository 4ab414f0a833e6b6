//! Radix tree node implementation.
//!
//! Each node represents one path segment. Literal segments compare ignoring
//! ASCII case; parameter values are percent-decoded when captured.

use std::borrow::Cow;

use crate::method_router::MethodRouter;
use crate::params::Params;

/// Type of path segment in the radix tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SegmentKind {
    /// Literal path segment (e.g., "products", "api")
    Static,
    /// Named parameter (e.g., "{id}")
    Param(String),
    /// Parameter followed by a format extension (e.g., "{id}.{format}")
    ///
    /// The format value is captured lowercased, so `5.JSON` and `5.json`
    /// produce identical parameters.
    ParamWithFormat {
        /// Name of the leading parameter
        name: String,
        /// Name of the extension parameter
        format: String,
    },
    /// Catch-all wildcard (e.g., "*path")
    Wildcard(String),
}

/// A node in the radix tree.
#[derive(Debug, Clone)]
pub struct Node {
    /// The path segment as written in the route template
    pub segment: String,

    /// Lowercased segment used for literal comparison
    key: String,

    /// The kind of segment
    pub kind: SegmentKind,

    /// Method router for this node (if it's a route endpoint)
    pub methods: Option<MethodRouter>,

    /// Literal children, sorted by lowercased segment for binary search
    pub static_children: Vec<Node>,

    /// Parameter-with-extension child, tried before the plain parameter
    pub format_child: Option<Box<Node>>,

    /// Parameter child (at most one per node)
    pub param_child: Option<Box<Node>>,

    /// Wildcard child (at most one per node, must be leaf)
    pub wildcard_child: Option<Box<Node>>,
}

impl Node {
    fn with_kind(segment: String, kind: SegmentKind) -> Self {
        Self {
            key: segment.to_ascii_lowercase(),
            segment,
            kind,
            methods: None,
            static_children: Vec::new(),
            format_child: None,
            param_child: None,
            wildcard_child: None,
        }
    }

    /// Creates a new literal node.
    #[must_use]
    pub fn new_static(segment: impl Into<String>) -> Self {
        Self::with_kind(segment.into(), SegmentKind::Static)
    }

    /// Creates a new parameter node.
    #[must_use]
    pub fn new_param(name: impl Into<String>) -> Self {
        let name = name.into();
        Self::with_kind(format!("{{{name}}}"), SegmentKind::Param(name))
    }

    /// Creates a new parameter-with-extension node.
    #[must_use]
    pub fn new_param_with_format(name: impl Into<String>, format: impl Into<String>) -> Self {
        let (name, format) = (name.into(), format.into());
        Self::with_kind(
            format!("{{{name}}}.{{{format}}}"),
            SegmentKind::ParamWithFormat { name, format },
        )
    }

    /// Creates a new wildcard node.
    #[must_use]
    pub fn new_wildcard(name: impl Into<String>) -> Self {
        let name = name.into();
        Self::with_kind(format!("*{name}"), SegmentKind::Wildcard(name))
    }

    /// Creates a root node for the tree.
    #[must_use]
    pub fn root() -> Self {
        Self::new_static("")
    }

    /// Inserts a route into the tree.
    ///
    /// # Panics
    ///
    /// Panics if a wildcard segment is not the last segment of `path`.
    pub fn insert(&mut self, path: &str, methods: MethodRouter) {
        let segments = Self::parse_path(path);
        self.insert_segments(&segments, methods);
    }

    fn parse_segment(s: &str) -> SegmentKind {
        if let Some(inner) = s.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
            if let Some((name, format)) = inner.split_once("}.{") {
                return SegmentKind::ParamWithFormat {
                    name: name.to_string(),
                    format: format.to_string(),
                };
            }
            SegmentKind::Param(inner.to_string())
        } else if let Some(name) = s.strip_prefix('*') {
            SegmentKind::Wildcard(name.to_string())
        } else {
            SegmentKind::Static
        }
    }

    /// Parses a path into segments.
    fn parse_path(path: &str) -> Vec<(String, SegmentKind)> {
        path.split('/')
            .filter(|s| !s.is_empty())
            .map(|s| (s.to_string(), Self::parse_segment(s)))
            .collect()
    }

    fn set_methods(&mut self, methods: MethodRouter) {
        if let Some(existing) = &mut self.methods {
            existing.merge(methods);
        } else {
            self.methods = Some(methods);
        }
    }

    fn child_slot(slot: &mut Option<Box<Node>>, make: impl FnOnce() -> Node) -> &mut Node {
        slot.get_or_insert_with(|| Box::new(make()))
    }

    /// Inserts segments into the tree recursively.
    fn insert_segments(&mut self, segments: &[(String, SegmentKind)], methods: MethodRouter) {
        let Some(((segment, kind), remaining)) = segments.split_first() else {
            self.set_methods(methods);
            return;
        };

        match kind {
            SegmentKind::Static => {
                let key = segment.to_ascii_lowercase();
                match self
                    .static_children
                    .binary_search_by(|c| c.key.as_str().cmp(&key))
                {
                    Ok(i) => self.static_children[i].insert_segments(remaining, methods),
                    Err(i) => {
                        let mut child = Node::new_static(segment);
                        child.insert_segments(remaining, methods);
                        self.static_children.insert(i, child);
                    }
                }
            }
            SegmentKind::Param(name) => {
                Self::child_slot(&mut self.param_child, || Node::new_param(name))
                    .insert_segments(remaining, methods);
            }
            SegmentKind::ParamWithFormat { name, format } => {
                Self::child_slot(&mut self.format_child, || {
                    Node::new_param_with_format(name, format)
                })
                .insert_segments(remaining, methods);
            }
            SegmentKind::Wildcard(name) => {
                assert!(
                    remaining.is_empty(),
                    "Wildcard must be the last segment in path"
                );
                Self::child_slot(&mut self.wildcard_child, || Node::new_wildcard(name))
                    .set_methods(methods);
            }
        }
    }

    /// Matches a path against the tree.
    ///
    /// Returns the method router and extracted parameters if found.
    #[must_use]
    pub fn match_path(&self, path: &str) -> Option<(&MethodRouter, Params)> {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let mut params = Params::new();
        let methods = self.match_segments(&segments, &mut params)?;
        Some((methods, params))
    }

    fn decode(segment: &str) -> String {
        urlencoding::decode(segment).map_or_else(|_| segment.to_string(), Cow::into_owned)
    }

    /// Matches segments against the tree recursively.
    ///
    /// On failure `params` is restored to its length on entry.
    fn match_segments<'a>(
        &'a self,
        segments: &[&str],
        params: &mut Params,
    ) -> Option<&'a MethodRouter> {
        let Some((&segment, remaining)) = segments.split_first() else {
            return self.methods.as_ref();
        };
        let mark = params.len();

        if let Some(child) = self.find_static_child(segment) {
            if let Some(result) = child.match_segments(remaining, params) {
                return Some(result);
            }
        }

        if let Some(child) = &self.format_child {
            if let SegmentKind::ParamWithFormat { name, format } = &child.kind {
                if let Some((value, ext)) = segment.rsplit_once('.') {
                    if !value.is_empty() && !ext.is_empty() {
                        params.push(name.clone(), Self::decode(value));
                        params.push(format.clone(), ext.to_ascii_lowercase());
                        if let Some(result) = child.match_segments(remaining, params) {
                            return Some(result);
                        }
                        params.truncate(mark);
                    }
                }
            }
        }

        if let Some(child) = &self.param_child {
            if let SegmentKind::Param(name) = &child.kind {
                params.push(name.clone(), Self::decode(segment));
                if let Some(result) = child.match_segments(remaining, params) {
                    return Some(result);
                }
                params.truncate(mark);
            }
        }

        if let Some(child) = &self.wildcard_child {
            if let SegmentKind::Wildcard(name) = &child.kind {
                if let Some(methods) = &child.methods {
                    params.push(name.clone(), segments.join("/"));
                    return Some(methods);
                }
            }
        }

        None
    }

    /// Finds a literal child ignoring ASCII case.
    fn find_static_child(&self, segment: &str) -> Option<&Node> {
        let key = segment.to_ascii_lowercase();
        self.static_children
            .binary_search_by(|c| c.key.as_str().cmp(&key))
            .ok()
            .map(|i| &self.static_children[i])
    }
}
