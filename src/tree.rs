//! The in-memory tree model shared by all three codec versions.
//!
//! Nodes live in an arena owned by `Tree` and are addressed by `NodeId`
//! indices; each node stores its parent's index as a back-reference. That
//! back-reference is what makes the cycle checks cheap: attaching a node
//! walks the prospective parent's ancestor chain instead of scanning the
//! whole arena.
//!
//! A `NodeId` is only meaningful for the tree that created it. Nodes start
//! detached; attaching to a parent sets the back-reference, detaching clears
//! it, and re-attaching elsewhere detaches from the old parent first.
//! Dropping the `Tree` releases every node.

use alloc::string::String;
use alloc::vec::Vec;

use crate::error::FluxionError;
use crate::header::CURRENT_VERSION;
use crate::value::{Tolerance, Value};

/// Index of a node in its tree's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    #[inline]
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// A named, valued leaf attached to a node. Carries no children.
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    name: Option<String>,
    pub value: Value,
}

impl Attribute {
    /// Blank or whitespace-only names collapse to absent.
    pub fn new(name: Option<&str>, value: Value) -> Self {
        Self {
            name: normalize_name(name),
            value,
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn set_name(&mut self, name: Option<&str>) {
        self.name = normalize_name(name);
    }
}

#[derive(Debug, Clone)]
struct NodeData {
    name: Option<String>,
    value: Value,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    attributes: Vec<Attribute>,
}

/// Which parts of a node `Tree::clone_node` copies. Children are always
/// copied in full once selected; the selectors apply to the cloned root.
#[derive(Debug, Clone, Copy)]
pub struct CloneSpec {
    pub name: bool,
    pub value: bool,
    pub attributes: bool,
    pub children: bool,
}

impl Default for CloneSpec {
    fn default() -> Self {
        Self {
            name: true,
            value: true,
            attributes: true,
            children: true,
        }
    }
}

/// Arena of nodes plus the format version the data was decoded from.
/// The version lives on the tree, so every node reports the same one.
#[derive(Debug, Clone)]
pub struct Tree {
    nodes: Vec<NodeData>,
    version: u8,
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

impl Tree {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            version: CURRENT_VERSION,
        }
    }

    /// Format version of the file this tree was decoded from, or the
    /// current version for trees built in memory.
    pub fn version(&self) -> u8 {
        self.version
    }

    pub(crate) fn set_version(&mut self, version: u8) {
        self.version = version;
    }

    /// Creates a detached node and returns its id.
    pub fn add_node(&mut self, name: Option<&str>, value: Value) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(NodeData {
            name: normalize_name(name),
            value,
            parent: None,
            children: Vec::new(),
            attributes: Vec::new(),
        });
        id
    }

    pub fn name(&self, id: NodeId) -> Option<&str> {
        self.nodes[id.index()].name.as_deref()
    }

    pub fn set_name(&mut self, id: NodeId, name: Option<&str>) {
        self.nodes[id.index()].name = normalize_name(name);
    }

    pub fn value(&self, id: NodeId) -> &Value {
        &self.nodes[id.index()].value
    }

    pub fn set_value(&mut self, id: NodeId, value: Value) {
        self.nodes[id.index()].value = value;
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.index()].parent
    }

    /// A node is a root iff it has no parent.
    pub fn is_root(&self, id: NodeId) -> bool {
        self.parent(id).is_none()
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.index()].children
    }

    pub fn child_count(&self, id: NodeId) -> usize {
        self.nodes[id.index()].children.len()
    }

    /// First child with the given name, in insertion order.
    pub fn child_by_name(&self, id: NodeId, name: &str) -> Option<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .find(|&child| self.name(child) == Some(name))
    }

    pub fn attributes(&self, id: NodeId) -> &[Attribute] {
        &self.nodes[id.index()].attributes
    }

    pub fn attribute_count(&self, id: NodeId) -> usize {
        self.nodes[id.index()].attributes.len()
    }

    /// First attribute with the given name, in insertion order.
    pub fn attribute_by_name(&self, id: NodeId, name: &str) -> Option<&Attribute> {
        self.attributes(id)
            .iter()
            .find(|attr| attr.name() == Some(name))
    }

    pub fn push_attribute(&mut self, id: NodeId, attribute: Attribute) {
        self.nodes[id.index()].attributes.push(attribute);
    }

    /// Removes and returns the first attribute with the given name.
    pub fn remove_attribute_by_name(&mut self, id: NodeId, name: &str) -> Option<Attribute> {
        let attrs = &mut self.nodes[id.index()].attributes;
        let pos = attrs.iter().position(|attr| attr.name() == Some(name))?;
        Some(attrs.remove(pos))
    }

    /// Appends `child` to `parent`'s child sequence and returns its index.
    /// Detaches the child from a previous parent first. Fails with
    /// `InvalidParent` if the attachment would create a cycle.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) -> Result<usize, FluxionError> {
        self.check_attachable(parent, child)?;
        self.detach(child);
        let children = &mut self.nodes[parent.index()].children;
        children.push(child);
        let index = children.len() - 1;
        self.nodes[child.index()].parent = Some(parent);
        Ok(index)
    }

    /// Inserts `child` at `index`. An index past the end is a silent no-op.
    pub fn insert_child(
        &mut self,
        parent: NodeId,
        index: usize,
        child: NodeId,
    ) -> Result<(), FluxionError> {
        self.check_attachable(parent, child)?;
        if index > self.nodes[parent.index()].children.len() {
            return Ok(());
        }
        self.detach(child);
        // Detaching from this same parent may have shifted the slot left.
        let children = &mut self.nodes[parent.index()].children;
        let index = core::cmp::min(index, children.len());
        children.insert(index, child);
        self.nodes[child.index()].parent = Some(parent);
        Ok(())
    }

    /// Appends every id in order. The cycle rule is checked for the whole
    /// batch before anything is mutated.
    pub fn add_children(&mut self, parent: NodeId, ids: &[NodeId]) -> Result<(), FluxionError> {
        for &child in ids {
            self.check_attachable(parent, child)?;
        }
        for &child in ids {
            self.add_child(parent, child)?;
        }
        Ok(())
    }

    /// Removes the first occurrence of `child` and clears its back-reference
    /// if it pointed at `parent`. Returns whether anything was removed.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> bool {
        let children = &mut self.nodes[parent.index()].children;
        let Some(pos) = children.iter().position(|&c| c == child) else {
            return false;
        };
        children.remove(pos);
        if self.nodes[child.index()].parent == Some(parent) {
            self.nodes[child.index()].parent = None;
        }
        true
    }

    /// Detaches `child` from its parent, if any.
    pub fn detach(&mut self, child: NodeId) {
        if let Some(parent) = self.nodes[child.index()].parent {
            self.remove_child(parent, child);
        }
    }

    /// Deep copy with independent selectors; the clone is detached.
    /// Unselected parts fall back to absent name, `Null` value, or empty
    /// sequences.
    pub fn clone_node(&mut self, id: NodeId, spec: &CloneSpec) -> NodeId {
        let source = &self.nodes[id.index()];
        let name = if spec.name { source.name.clone() } else { None };
        let value = if spec.value {
            source.value.clone()
        } else {
            Value::Null
        };
        let attributes = if spec.attributes {
            source.attributes.clone()
        } else {
            Vec::new()
        };
        let children = if spec.children {
            source.children.clone()
        } else {
            Vec::new()
        };

        let clone = NodeId(self.nodes.len() as u32);
        self.nodes.push(NodeData {
            name,
            value,
            parent: None,
            children: Vec::new(),
            attributes,
        });
        for child in children {
            let child_clone = self.clone_node(child, &CloneSpec::default());
            self.nodes[clone.index()].children.push(child_clone);
            self.nodes[child_clone.index()].parent = Some(clone);
        }
        clone
    }

    /// Structural equality: name, value within tolerance, then children and
    /// attributes pairwise in order. `other` may be this same tree.
    pub fn deep_equal(
        &self,
        a: NodeId,
        other: &Tree,
        b: NodeId,
        tolerance: &Tolerance,
    ) -> bool {
        let left = &self.nodes[a.index()];
        let right = &other.nodes[b.index()];
        if left.name != right.name {
            return false;
        }
        if !left.value.approx_eq(&right.value, tolerance) {
            return false;
        }
        if left.attributes.len() != right.attributes.len()
            || left.children.len() != right.children.len()
        {
            return false;
        }
        for (la, ra) in left.attributes.iter().zip(&right.attributes) {
            if la.name() != ra.name() || !la.value.approx_eq(&ra.value, tolerance) {
                return false;
            }
        }
        left.children
            .iter()
            .zip(&right.children)
            .all(|(&lc, &rc)| self.deep_equal(lc, other, rc, tolerance))
    }

    /// Rejects self-parenting and attachments where `child` is an ancestor
    /// of `parent`.
    fn check_attachable(&self, parent: NodeId, child: NodeId) -> Result<(), FluxionError> {
        if parent == child {
            return Err(FluxionError::InvalidParent);
        }
        let mut cursor = self.nodes[parent.index()].parent;
        while let Some(ancestor) = cursor {
            if ancestor == child {
                return Err(FluxionError::InvalidParent);
            }
            cursor = self.nodes[ancestor.index()].parent;
        }
        Ok(())
    }
}

fn normalize_name(name: Option<&str>) -> Option<String> {
    match name {
        Some(s) if !s.trim().is_empty() => Some(String::from(s)),
        _ => None,
    }
}
