//! Generic tree nodes
//!
//! A `Node` is a named, uniquely identified object with an attribute map, an
//! ordered list of owned children and at most one parent. Nodes are shared
//! handles: cloning a `Node` clones the handle, not the subtree, which is what
//! lets normalization passes restructure the tree while it is being walked.
//!
//! Structural operations either fully succeed or return a `NodeError` with the
//! tree unchanged. Attaching a node that already has a parent is always an
//! error; callers detach first.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

/// Source of node identities. Identities are only used for debugging and
/// equality, never for ordering.
static NODE_IDS: AtomicU64 = AtomicU64::new(0);

/// A scalar attribute value. These are exactly the types that the tdoc
/// display format can round-trip through its literal grammar.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Str(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Str(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl fmt::Display for Value {
    /// Renders the value in the literal syntax understood by the tdoc reader:
    /// double-quoted escaped strings, integers, floats and booleans.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s) => {
                write!(f, "\"")?;
                for c in s.chars() {
                    match c {
                        '"' => write!(f, "\\\"")?,
                        '\\' => write!(f, "\\\\")?,
                        '\n' => write!(f, "\\n")?,
                        '\t' => write!(f, "\\t")?,
                        '\r' => write!(f, "\\r")?,
                        c => write!(f, "{}", c)?,
                    }
                }
                write!(f, "\"")
            }
            Value::Int(i) => write!(f, "{}", i),
            // Debug keeps the decimal point, so floats stay floats on re-read
            Value::Float(x) => write!(f, "{:?}", x),
            Value::Bool(b) => write!(f, "{}", b),
        }
    }
}

/// Errors raised by structural operations
#[derive(Debug, Clone, PartialEq)]
pub enum NodeError {
    /// The node to attach already has a parent
    HasParent { child: String },
    /// The node to remove is not a child of this node
    NotAChild { child: String },
    /// A node cannot be attached to itself
    SelfAttach,
    /// The operation requires the node to have a parent
    NoParent,
    /// Index out of bounds for an insertion
    IndexOutOfBounds { index: usize, len: usize },
}

impl std::error::Error for NodeError {}

impl fmt::Display for NodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeError::HasParent { child } => {
                write!(f, "cannot attach '{}', it already has a parent", child)
            }
            NodeError::NotAChild { child } => {
                write!(f, "cannot remove '{}', it has a different parent", child)
            }
            NodeError::SelfAttach => write!(f, "cannot attach a node to itself"),
            NodeError::NoParent => write!(f, "operation requires the node to have a parent"),
            NodeError::IndexOutOfBounds { index, len } => {
                write!(f, "index {} out of bounds for {} children", index, len)
            }
        }
    }
}

struct NodeData {
    name: String,
    id: u64,
    attributes: BTreeMap<String, Value>,
    children: Vec<Node>,
    parent: Weak<RefCell<NodeData>>,
}

/// A shared handle to a tree node
#[derive(Clone)]
pub struct Node {
    data: Rc<RefCell<NodeData>>,
}

impl PartialEq for Node {
    /// Handle identity, not structural equality; see [`Node::structural_eq`].
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.data, &other.data)
    }
}

impl Node {
    pub fn new(name: &str) -> Node {
        Node {
            data: Rc::new(RefCell::new(NodeData {
                name: name.to_string(),
                id: NODE_IDS.fetch_add(1, Ordering::Relaxed),
                attributes: BTreeMap::new(),
                children: Vec::new(),
                parent: Weak::new(),
            })),
        }
    }

    /// Builder-style attribute setter for freshly created nodes
    pub fn with_attr(self, name: &str, value: impl Into<Value>) -> Node {
        self.set_attr(name, value);
        self
    }

    pub fn name(&self) -> String {
        self.data.borrow().name.clone()
    }

    pub fn set_name(&self, name: &str) {
        self.data.borrow_mut().name = name.to_string();
    }

    pub fn id(&self) -> u64 {
        self.data.borrow().id
    }

    pub fn attr(&self, name: &str) -> Option<Value> {
        self.data.borrow().attributes.get(name).cloned()
    }

    pub fn set_attr(&self, name: &str, value: impl Into<Value>) -> &Self {
        self.data
            .borrow_mut()
            .attributes
            .insert(name.to_string(), value.into());
        self
    }

    pub fn remove_attr(&self, name: &str) -> Option<Value> {
        self.data.borrow_mut().attributes.remove(name)
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.data.borrow().attributes.contains_key(name)
    }

    /// Attributes in key order
    pub fn attrs(&self) -> Vec<(String, Value)> {
        self.data
            .borrow()
            .attributes
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    pub fn has_attributes(&self) -> bool {
        !self.data.borrow().attributes.is_empty()
    }

    pub fn is_leaf(&self) -> bool {
        self.data.borrow().children.is_empty()
    }

    /// A node with no children and no attributes
    pub fn is_empty(&self) -> bool {
        self.is_leaf() && !self.has_attributes()
    }

    pub fn child_count(&self) -> usize {
        self.data.borrow().children.len()
    }

    /// Handles to the children, in sibling order
    pub fn children(&self) -> Vec<Node> {
        self.data.borrow().children.clone()
    }

    pub fn child(&self, index: usize) -> Option<Node> {
        self.data.borrow().children.get(index).cloned()
    }

    pub fn first_child(&self) -> Option<Node> {
        self.data.borrow().children.first().cloned()
    }

    pub fn last_child(&self) -> Option<Node> {
        self.data.borrow().children.last().cloned()
    }

    pub fn parent(&self) -> Option<Node> {
        self.data
            .borrow()
            .parent
            .upgrade()
            .map(|data| Node { data })
    }

    /// The topmost ancestor, or this node when detached
    pub fn root(&self) -> Node {
        let mut current = self.clone();
        while let Some(parent) = current.parent() {
            current = parent;
        }
        current
    }

    /// Position among the parent's children
    pub fn index(&self) -> Option<usize> {
        let parent = self.parent()?;
        let position = parent
            .data
            .borrow()
            .children
            .iter()
            .position(|c| Rc::ptr_eq(&c.data, &self.data));
        position
    }

    pub fn previous_sibling(&self) -> Option<Node> {
        let parent = self.parent()?;
        let index = self.index()?;
        if index == 0 {
            None
        } else {
            parent.child(index - 1)
        }
    }

    pub fn next_sibling(&self) -> Option<Node> {
        let parent = self.parent()?;
        let index = self.index()?;
        parent.child(index + 1)
    }

    /// Appends `child` and returns its handle
    pub fn append(&self, child: &Node) -> Result<Node, NodeError> {
        if Rc::ptr_eq(&self.data, &child.data) {
            return Err(NodeError::SelfAttach);
        }
        if child.parent().is_some() {
            return Err(NodeError::HasParent { child: child.name() });
        }
        child.data.borrow_mut().parent = Rc::downgrade(&self.data);
        self.data.borrow_mut().children.push(child.clone());
        Ok(child.clone())
    }

    /// Inserts `child` before the child currently at `index`
    pub fn insert(&self, index: usize, child: &Node) -> Result<Node, NodeError> {
        if Rc::ptr_eq(&self.data, &child.data) {
            return Err(NodeError::SelfAttach);
        }
        if child.parent().is_some() {
            return Err(NodeError::HasParent { child: child.name() });
        }
        let len = self.child_count();
        if index > len {
            return Err(NodeError::IndexOutOfBounds { index, len });
        }
        child.data.borrow_mut().parent = Rc::downgrade(&self.data);
        self.data.borrow_mut().children.insert(index, child.clone());
        Ok(child.clone())
    }

    /// Replaces the child at `index` in place, detaching the previous
    /// occupant. The index is clamped; on an empty node this appends.
    pub fn set(&self, index: usize, child: &Node) -> Result<Node, NodeError> {
        if Rc::ptr_eq(&self.data, &child.data) {
            return Err(NodeError::SelfAttach);
        }
        if child.parent().is_some() {
            return Err(NodeError::HasParent { child: child.name() });
        }
        let len = self.child_count();
        if len == 0 {
            return self.append(child);
        }
        let index = index.min(len - 1);
        let previous = self.data.borrow_mut().children[index].clone();
        previous.data.borrow_mut().parent = Weak::new();
        child.data.borrow_mut().parent = Rc::downgrade(&self.data);
        self.data.borrow_mut().children[index] = child.clone();
        Ok(child.clone())
    }

    /// Removes `child` from this node, severing both directions
    pub fn remove(&self, child: &Node) -> Result<Node, NodeError> {
        let position = self
            .data
            .borrow()
            .children
            .iter()
            .position(|c| Rc::ptr_eq(&c.data, &child.data));
        match position {
            Some(index) => {
                self.data.borrow_mut().children.remove(index);
                child.data.borrow_mut().parent = Weak::new();
                Ok(child.clone())
            }
            None => Err(NodeError::NotAChild { child: child.name() }),
        }
    }

    /// Detaches this node from its parent, if any, and returns its handle
    pub fn detach(&self) -> Node {
        if let Some(parent) = self.parent() {
            // the node is known to be a child of its parent
            let _ = parent.remove(self);
        }
        self.clone()
    }

    /// Splices `wrapper` in at this node's position and moves this node into
    /// it. A detached node is simply appended to the wrapper.
    pub fn wrap(&self, wrapper: &Node) -> Result<(), NodeError> {
        if Rc::ptr_eq(&self.data, &wrapper.data) {
            return Err(NodeError::SelfAttach);
        }
        if wrapper.parent().is_some() {
            return Err(NodeError::HasParent {
                child: wrapper.name(),
            });
        }
        if let (Some(parent), Some(index)) = (self.parent(), self.index()) {
            parent.set(index, wrapper)?;
        }
        wrapper.append(self)?;
        Ok(())
    }

    /// Pulls another node's children and attributes into this node. Existing
    /// attributes are kept unless `replace` is set.
    pub fn merge(&self, other: &Node, attributes: bool, replace: bool) -> Result<(), NodeError> {
        if Rc::ptr_eq(&self.data, &other.data) {
            return Err(NodeError::SelfAttach);
        }
        let children = other.children();
        if children.iter().any(|c| Rc::ptr_eq(&c.data, &self.data)) {
            return Err(NodeError::SelfAttach);
        }
        if attributes {
            for (key, value) in other.attrs() {
                if replace || !self.has_attr(&key) {
                    self.set_attr(&key, value);
                }
            }
        }
        for child in children {
            child.detach();
            self.append(&child)?;
        }
        Ok(())
    }

    /// Detaches `other` and merges its children and attributes in
    pub fn absorb(&self, other: &Node) -> Result<(), NodeError> {
        if Rc::ptr_eq(&self.data, &other.data) {
            return Err(NodeError::SelfAttach);
        }
        other.detach();
        self.merge(other, true, false)
    }

    /// Replaces the current children with `children`. Incoming nodes must be
    /// detached or already children of this node.
    pub fn set_children(&self, children: Vec<Node>) -> Result<(), NodeError> {
        for (i, child) in children.iter().enumerate() {
            if Rc::ptr_eq(&self.data, &child.data) {
                return Err(NodeError::SelfAttach);
            }
            if let Some(parent) = child.parent() {
                if !Rc::ptr_eq(&parent.data, &self.data) {
                    return Err(NodeError::HasParent { child: child.name() });
                }
            }
            if children[..i].iter().any(|c| Rc::ptr_eq(&c.data, &child.data)) {
                return Err(NodeError::HasParent { child: child.name() });
            }
        }
        for child in self.children() {
            child.data.borrow_mut().parent = Weak::new();
        }
        self.data.borrow_mut().children.clear();
        for child in children {
            self.append(&child)?;
        }
        Ok(())
    }

    /// Splices `nodes` in at this node's position, then detaches this node
    pub fn replace_with(&self, nodes: Vec<Node>) -> Result<(), NodeError> {
        let parent = self.parent().ok_or(NodeError::NoParent)?;
        let index = self.index().ok_or(NodeError::NoParent)?;
        for (i, node) in nodes.iter().enumerate() {
            if node.parent().is_some() {
                return Err(NodeError::HasParent { child: node.name() });
            }
            if Rc::ptr_eq(&node.data, &parent.data) {
                return Err(NodeError::SelfAttach);
            }
            if nodes[..i].iter().any(|n| Rc::ptr_eq(&n.data, &node.data)) {
                return Err(NodeError::HasParent { child: node.name() });
            }
        }
        for (offset, node) in nodes.iter().enumerate() {
            parent.insert(index + offset, node)?;
        }
        self.detach();
        Ok(())
    }

    /// Lazy depth-first traversal of this node and its descendants
    pub fn walk(&self) -> TreeWalk {
        TreeWalk {
            stack: vec![self.clone()],
            filter: None,
        }
    }

    /// Like [`Node::walk`], but a filter returning [`Walk::Skip`] suppresses
    /// the node and its whole subtree.
    pub fn walk_filtered<F>(&self, filter: F) -> TreeWalk
    where
        F: Fn(&Node) -> Walk + 'static,
    {
        TreeWalk {
            stack: vec![self.clone()],
            filter: Some(Box::new(filter)),
        }
    }

    /// Deep equality on names, attributes and children, ignoring identities
    pub fn structural_eq(&self, other: &Node) -> bool {
        if self.name() != other.name() {
            return false;
        }
        if self.attrs() != other.attrs() {
            return false;
        }
        let ours = self.children();
        let theirs = other.children();
        ours.len() == theirs.len()
            && ours
                .iter()
                .zip(theirs.iter())
                .all(|(a, b)| a.structural_eq(b))
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let data = self.data.borrow();
        write!(f, "<Node:{} #{}", data.name, data.id)?;
        for (key, value) in data.attributes.iter() {
            write!(f, " {}={}", key, value)?;
        }
        if !data.children.is_empty() {
            write!(f, " …{}", data.children.len())?;
        }
        write!(f, ">")
    }
}

/// Filter decision for [`Node::walk_filtered`]
pub enum Walk {
    Continue,
    Skip,
}

/// Iterator over a depth-first traversal
pub struct TreeWalk {
    stack: Vec<Node>,
    filter: Option<Box<dyn Fn(&Node) -> Walk>>,
}

impl Iterator for TreeWalk {
    type Item = Node;

    fn next(&mut self) -> Option<Node> {
        while let Some(node) = self.stack.pop() {
            if let Some(filter) = &self.filter {
                if matches!(filter(&node), Walk::Skip) {
                    continue;
                }
            }
            for child in node.children().into_iter().rev() {
                self.stack.push(child);
            }
            return Some(node);
        }
        None
    }
}
