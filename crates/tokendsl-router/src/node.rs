//! Radix tree node.
//!
//! Each node owns one path segment. Literal children are kept sorted so
//! lookups can binary search; a node has at most one parameter child.
//!
//! Parameter nodes match by position only. The names a capture is reported
//! under come from the template each method was registered with, so
//! `GET /users/:id` and `DELETE /users/:user_id` share one node.

use crate::key::Segment;
use crate::method::HttpMethod;
use crate::method_router::MethodRouter;
use crate::params::Params;
use crate::router::InsertError;

/// A node in the routing tree.
#[derive(Debug, Clone)]
pub struct Node {
    /// The segment this node represents (the empty string for the root).
    pub segment: Segment,

    /// Operations registered at this exact path, if any.
    pub methods: Option<MethodRouter>,

    /// Parameter names per registered method, in template order.
    pub param_names: Vec<(HttpMethod, Vec<String>)>,

    /// Literal children, sorted by segment text.
    pub static_children: Vec<Node>,

    /// Parameter child, at most one per node.
    pub param_child: Option<Box<Node>>,
}

impl Node {
    /// Creates the root node.
    #[must_use]
    pub fn root() -> Self {
        Self::new(Segment::Literal(String::new()))
    }

    fn new(segment: Segment) -> Self {
        Self {
            segment,
            methods: None,
            param_names: Vec::new(),
            static_children: Vec::new(),
            param_child: None,
        }
    }

    fn literal(&self) -> &str {
        match &self.segment {
            Segment::Literal(s) | Segment::Param(s) => s,
        }
    }

    /// Inserts `methods` at the path described by `segments`.
    ///
    /// Fails if a method is already taken at the target path: with
    /// [`InsertError::ConflictingParam`] when the two templates name their
    /// parameters differently, with [`InsertError::DuplicateMethod`]
    /// otherwise. A failed insert registers nothing.
    pub fn insert(
        &mut self,
        segments: &[Segment],
        methods: MethodRouter,
        path: &str,
    ) -> Result<(), InsertError> {
        let names: Vec<String> = segments
            .iter()
            .filter_map(|s| match s {
                Segment::Param(name) => Some(name.clone()),
                Segment::Literal(_) => None,
            })
            .collect();
        self.insert_segments(segments, methods, &names, path)
    }

    fn insert_segments(
        &mut self,
        segments: &[Segment],
        methods: MethodRouter,
        names: &[String],
        path: &str,
    ) -> Result<(), InsertError> {
        let Some((first, rest)) = segments.split_first() else {
            return self.insert_here(methods, names, path);
        };

        match first {
            Segment::Literal(lit) => {
                let index = match self
                    .static_children
                    .binary_search_by(|c| c.literal().cmp(lit.as_str()))
                {
                    Ok(index) => index,
                    Err(index) => {
                        self.static_children
                            .insert(index, Node::new(first.clone()));
                        index
                    }
                };
                self.static_children[index].insert_segments(rest, methods, names, path)
            }
            Segment::Param(_) => self
                .param_child
                .get_or_insert_with(|| Box::new(Node::new(first.clone())))
                .insert_segments(rest, methods, names, path),
        }
    }

    fn insert_here(
        &mut self,
        methods: MethodRouter,
        names: &[String],
        path: &str,
    ) -> Result<(), InsertError> {
        let added = methods.allowed_methods();

        if let Some(existing) = &self.methods {
            if let Some(taken) = added
                .iter()
                .copied()
                .find(|m| existing.operation(*m).is_some())
            {
                let registered = self.names_for(taken).unwrap_or_default();
                if let Some((old, new)) = registered
                    .iter()
                    .zip(names)
                    .find(|(old, new)| old != new)
                {
                    return Err(InsertError::ConflictingParam {
                        path: path.to_string(),
                        existing: old.clone(),
                        conflicting: new.clone(),
                    });
                }
                return Err(InsertError::DuplicateMethod {
                    method: taken,
                    path: path.to_string(),
                });
            }
        }

        match &mut self.methods {
            Some(existing) => existing
                .merge(methods)
                .map_err(|method| InsertError::DuplicateMethod {
                    method,
                    path: path.to_string(),
                })?,
            None => self.methods = Some(methods),
        }
        self.param_names
            .extend(added.into_iter().map(|m| (m, names.to_vec())));
        Ok(())
    }

    fn names_for(&self, method: HttpMethod) -> Option<&[String]> {
        self.param_names
            .iter()
            .find(|(m, _)| *m == method)
            .map(|(_, names)| names.as_slice())
    }

    /// Matches a concrete request path against the tree.
    ///
    /// Literal children take priority over the parameter child. If the literal
    /// branch dead-ends, matching backtracks into the parameter branch.
    ///
    /// Captures are labelled with the names of the first template inserted
    /// at each parameter node. Use [`find`](Self::find) for the names of a
    /// specific method.
    #[must_use]
    pub fn match_path(&self, path: &str) -> Option<(&MethodRouter, Params)> {
        let (node, params) = self.match_node(path)?;
        node.methods.as_ref().map(|methods| (methods, params))
    }

    fn match_node(&self, path: &str) -> Option<(&Node, Params)> {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let mut params = Params::new();
        let node = self.match_segments(&segments, &mut params)?;
        Some((node, params))
    }

    fn match_segments<'a>(&'a self, segments: &[&str], params: &mut Params) -> Option<&'a Node> {
        let Some((segment, rest)) = segments.split_first() else {
            return self
                .methods
                .as_ref()
                .filter(|m| !m.is_empty())
                .map(|_| self);
        };

        if let Some(child) = self.find_static_child(segment) {
            if let Some(found) = child.match_segments(rest, params) {
                return Some(found);
            }
        }

        if let Some(child) = &self.param_child {
            let mark = params.len();
            params.push(child.literal(), *segment);
            if let Some(found) = child.match_segments(rest, params) {
                return Some(found);
            }
            params.truncate(mark);
        }

        None
    }

    fn find_static_child(&self, segment: &str) -> Option<&Node> {
        self.static_children
            .binary_search_by(|c| c.literal().cmp(segment))
            .ok()
            .map(|i| &self.static_children[i])
    }

    /// Returns the operation for `method` at `path`, if registered.
    ///
    /// Captures carry the parameter names of the template `method` was
    /// registered with.
    #[must_use]
    pub fn find(&self, method: HttpMethod, path: &str) -> Option<(&str, Params)> {
        let (node, captured) = self.match_node(path)?;
        let operation = node.methods.as_ref()?.operation(method)?;

        let params = match node.names_for(method) {
            Some(names) => {
                let mut params = Params::new();
                for (name, (_, value)) in names.iter().zip(captured.iter()) {
                    params.push(name.as_str(), value);
                }
                params
            }
            None => captured,
        };
        Some((operation, params))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::PathTemplate;

    fn insert(node: &mut Node, path: &str, methods: MethodRouter) -> Result<(), InsertError> {
        let template = PathTemplate::parse(path).unwrap();
        node.insert(template.segments(), methods, path)
    }

    #[test]
    fn test_static_children_stay_sorted() {
        let mut root = Node::root();
        for path in ["/zeta", "/alpha", "/mid"] {
            insert(&mut root, path, MethodRouter::new().get(path)).unwrap();
        }
        let order: Vec<_> = root.static_children.iter().map(Node::literal).collect();
        assert_eq!(order, ["alpha", "mid", "zeta"]);
    }

    #[test]
    fn test_root_path() {
        let mut root = Node::root();
        insert(&mut root, "/", MethodRouter::new().get("home")).unwrap();
        let (op, params) = root.find(HttpMethod::Get, "/").unwrap();
        assert_eq!(op, "home");
        assert!(params.is_empty());
    }

    #[test]
    fn test_backtracks_out_of_static_branch() {
        let mut root = Node::root();
        insert(&mut root, "/users/me/settings", MethodRouter::new().get("settings")).unwrap();
        insert(&mut root, "/users/:id/posts", MethodRouter::new().get("posts")).unwrap();

        let (op, params) = root.find(HttpMethod::Get, "/users/me/posts").unwrap();
        assert_eq!(op, "posts");
        assert_eq!(params.get("id"), Some("me"));
        assert_eq!(params.len(), 1);
    }

    #[test]
    fn test_failed_param_branch_drops_captures() {
        let mut root = Node::root();
        insert(&mut root, "/a/:x/b", MethodRouter::new().get("axb")).unwrap();
        insert(&mut root, "/a/c/:y", MethodRouter::new().get("acy")).unwrap();

        let (op, params) = root.find(HttpMethod::Get, "/a/c/d").unwrap();
        assert_eq!(op, "acy");
        assert_eq!(params.get("x"), None);
        assert_eq!(params.get("y"), Some("d"));
    }

    #[test]
    fn test_param_names_per_method() {
        let mut root = Node::root();
        insert(&mut root, "/users/:id", MethodRouter::new().get("get")).unwrap();
        insert(&mut root, "/users/:user_id", MethodRouter::new().delete("delete")).unwrap();

        let (op, params) = root.find(HttpMethod::Get, "/users/7").unwrap();
        assert_eq!(op, "get");
        assert_eq!(params.get("id"), Some("7"));
        assert_eq!(params.get("user_id"), None);

        let (op, params) = root.find(HttpMethod::Delete, "/users/7").unwrap();
        assert_eq!(op, "delete");
        assert_eq!(params.get("user_id"), Some("7"));
        assert_eq!(params.get("id"), None);
    }

    #[test]
    fn test_same_method_different_names_conflict() {
        let mut root = Node::root();
        insert(&mut root, "/a/:id", MethodRouter::new().get("one")).unwrap();

        let err = insert(&mut root, "/a/:key", MethodRouter::new().get("two")).unwrap_err();
        assert_eq!(
            err,
            InsertError::ConflictingParam {
                path: "/a/:key".to_string(),
                existing: "id".to_string(),
                conflicting: "key".to_string(),
            }
        );
        assert_eq!(root.find(HttpMethod::Get, "/a/1").unwrap().0, "one");
    }

    #[test]
    fn test_duplicate_method() {
        let mut root = Node::root();
        insert(&mut root, "/users", MethodRouter::new().get("one")).unwrap();
        let err = insert(&mut root, "/users", MethodRouter::new().get("two")).unwrap_err();
        assert!(matches!(
            err,
            InsertError::DuplicateMethod {
                method: HttpMethod::Get,
                ..
            }
        ));
        assert_eq!(root.find(HttpMethod::Get, "/users").unwrap().0, "one");
    }

    #[test]
    fn test_intermediate_node_is_not_a_route() {
        let mut root = Node::root();
        insert(&mut root, "/users/:id", MethodRouter::new().get("get")).unwrap();
        assert!(root.match_path("/users").is_none());
        assert!(root.match_path("/users/1/extra").is_none());
    }
}
