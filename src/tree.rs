use std::ops::Index;
use std::sync::Arc;
use std::time::Duration;

use indexmap::IndexMap;

use crate::clock::Clock;
use crate::node::{NodeId, RegionNode};

/// Name of the root node, which spans the whole profiled run.
pub const ROOT_NODE_NAME: &str = "<main>";

/// Arena of region nodes. Parents own their children through the arena; the `parent` link of a
/// node is a plain id.
#[derive(Debug)]
pub struct RegionTree {
    nodes: Vec<RegionNode>,
    global_registry: IndexMap<String, NodeId>,
    clock: Arc<dyn Clock>,
}

impl RegionTree {
    pub(crate) fn new(clock: Arc<dyn Clock>) -> Self {
        let root = RegionNode::new(
            NodeId::ROOT,
            ROOT_NODE_NAME.to_string(),
            None,
            false,
            clock.clone(),
        );
        Self {
            nodes: vec![root],
            global_registry: IndexMap::new(),
            clock,
        }
    }

    #[must_use]
    pub fn root(&self) -> &RegionNode {
        &self.nodes[NodeId::ROOT.0]
    }

    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<&RegionNode> {
        self.nodes.get(id.0)
    }

    pub(crate) fn get_mut(&mut self, id: NodeId) -> &mut RegionNode {
        &mut self.nodes[id.0]
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All nodes in creation order.
    pub fn nodes(&self) -> impl Iterator<Item = &RegionNode> {
        self.nodes.iter()
    }

    /// Looks up a global node by name.
    #[must_use]
    pub fn global(&self, name: &str) -> Option<NodeId> {
        self.global_registry.get(name).copied()
    }

    /// Global nodes in registration order.
    pub fn globals(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.global_registry.values().copied()
    }

    /// Follows a path of names from the root, e.g. `["foo()", "a", "b"]`. The first name may
    /// also match a global node.
    #[must_use]
    pub fn find_path(&self, path: &[&str]) -> Option<&RegionNode> {
        let mut current = self.root();
        for (position, name) in path.iter().enumerate() {
            let child = match current.child(name) {
                Some(id) => id,
                None if position == 0 => self.global(name)?,
                None => return None,
            };
            current = &self[child];
        }
        Some(current)
    }

    /// Returns the child of `parent` called `name`, creating it if absent. Global nodes are
    /// always children of the root and are found through the global registry.
    pub(crate) fn get_or_create(&mut self, parent: NodeId, name: &str, as_global: bool) -> NodeId {
        if as_global {
            if let Some(&id) = self.global_registry.get(name) {
                return id;
            }
            let id = self.insert_child(NodeId::ROOT, name, true);
            self.global_registry.insert(name.to_string(), id);
            return id;
        }
        match self.nodes[parent.0].child(name) {
            Some(id) => id,
            None => {
                let id = self.insert_child(parent, name, false);
                self.nodes[parent.0].child_index.insert(name.to_string(), id);
                id
            }
        }
    }

    fn insert_child(&mut self, parent: NodeId, name: &str, is_global: bool) -> NodeId {
        let id = NodeId(self.nodes.len());
        let node = RegionNode::new(
            id,
            name.to_string(),
            Some(parent),
            is_global,
            self.clock.clone(),
        );
        self.nodes.push(node);
        self.nodes[parent.0].children.push(id);
        id
    }

    /// Exclusive time: total time minus the total time of all direct children. Global nodes
    /// are children of the root, so their time is charged against the root only. The root can
    /// see more child time than it has itself when global regions are entered from nested
    /// contexts, which saturates to zero.
    #[must_use]
    pub fn inner_time(&self, id: NodeId) -> Duration {
        let node = &self[id];
        let children: Duration = node.children().map(|child| self[child].total()).sum();
        node.total().saturating_sub(children)
    }

    /// Depth of a node below the root; the root has depth zero.
    #[must_use]
    pub fn depth(&self, id: NodeId) -> usize {
        let mut depth = 0;
        let mut current = self[id].parent;
        while let Some(parent) = current {
            depth += 1;
            current = self[parent].parent;
        }
        depth
    }

    /// Root-first depth-first traversal, siblings in first-discovery order.
    #[must_use]
    pub fn depth_first(&self) -> Vec<NodeId> {
        self.depth_first_by(|children| children)
    }

    /// Root-first depth-first traversal; `order` may reorder each node's children.
    pub(crate) fn depth_first_by<F>(&self, mut order: F) -> Vec<NodeId>
    where
        F: FnMut(Vec<NodeId>) -> Vec<NodeId>,
    {
        let mut visited = Vec::with_capacity(self.nodes.len());
        let mut pending = vec![NodeId::ROOT];
        while let Some(id) = pending.pop() {
            visited.push(id);
            let children = order(self[id].children().collect());
            pending.extend(children.into_iter().rev());
        }
        visited
    }
}

impl Index<NodeId> for RegionTree {
    type Output = RegionNode;

    fn index(&self, id: NodeId) -> &RegionNode {
        &self.nodes[id.0]
    }
}
