use std::fmt::{self, Display};

use crate::node::NodeId;

/// Why a node could not be popped from the [`ActiveStack`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum StackMismatch {
    /// The node is open, but other nodes were entered after it and are still open.
    NotTop { top: NodeId, position: usize },
    /// The node is not open at all.
    NotActive,
}

impl Display for StackMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StackMismatch::NotTop { top, position } => {
                write!(f, "node is at stack position {position} below open node {top}")
            }
            StackMismatch::NotActive => write!(f, "node is not on the active stack"),
        }
    }
}

/// The currently open nodes, innermost last. The root is always at the bottom and is never
/// popped.
#[derive(Debug, Clone)]
pub struct ActiveStack {
    entries: Vec<NodeId>,
}

impl ActiveStack {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: vec![NodeId::ROOT],
        }
    }

    /// The innermost open node; the root when nothing else is open.
    #[must_use]
    pub fn top(&self) -> NodeId {
        self.entries.last().copied().unwrap_or(NodeId::ROOT)
    }

    /// The node a new region is attached to. Global regions bypass the stack.
    #[must_use]
    pub fn resolve_parent(&self, as_global: bool) -> NodeId {
        if as_global {
            NodeId::ROOT
        } else {
            self.top()
        }
    }

    pub fn push(&mut self, id: NodeId) {
        self.entries.push(id);
    }

    /// Pops `id`, which must be the innermost open node.
    pub fn pop(&mut self, id: NodeId) -> Result<(), StackMismatch> {
        if id == NodeId::ROOT {
            return Err(StackMismatch::NotActive);
        }
        match self.entries.iter().rposition(|&entry| entry == id) {
            Some(position) if position == self.entries.len() - 1 => {
                self.entries.pop();
                Ok(())
            }
            Some(position) => Err(StackMismatch::NotTop {
                top: self.top(),
                position,
            }),
            None => Err(StackMismatch::NotActive),
        }
    }

    /// Removes the innermost occurrence of `id` together with every node opened after it.
    /// Returns the removed nodes innermost first, ending with `id`, or `None` if `id` is not
    /// open. Used to abandon a node that was closed out of order.
    pub fn unwind(&mut self, id: NodeId) -> Option<Vec<NodeId>> {
        if id == NodeId::ROOT {
            return None;
        }
        let position = self.entries.iter().rposition(|&entry| entry == id)?;
        Some(self.entries.drain(position..).rev().collect())
    }

    /// Number of open nodes, the root included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Open nodes from the root outwards.
    pub fn iter(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.entries.iter().copied()
    }
}

impl Default for ActiveStack {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_stack_resolves_to_root() {
        let stack = ActiveStack::new();
        assert_eq!(stack.top(), NodeId::ROOT);
        assert_eq!(stack.resolve_parent(false), NodeId::ROOT);
        assert_eq!(stack.len(), 1);
    }

    #[test]
    fn parent_is_the_innermost_open_node_unless_global() {
        let mut stack = ActiveStack::new();
        stack.push(NodeId(1));
        stack.push(NodeId(2));
        assert_eq!(stack.resolve_parent(false), NodeId(2));
        assert_eq!(stack.resolve_parent(true), NodeId::ROOT);
    }

    #[test]
    fn pop_requires_the_top() {
        let mut stack = ActiveStack::new();
        stack.push(NodeId(1));
        stack.push(NodeId(2));
        assert_eq!(
            stack.pop(NodeId(1)),
            Err(StackMismatch::NotTop {
                top: NodeId(2),
                position: 1
            })
        );
        assert_eq!(stack.pop(NodeId(3)), Err(StackMismatch::NotActive));
        assert_eq!(stack.pop(NodeId(2)), Ok(()));
        assert_eq!(stack.pop(NodeId(1)), Ok(()));
        assert_eq!(stack.top(), NodeId::ROOT);
    }

    #[test]
    fn the_root_is_never_popped() {
        let mut stack = ActiveStack::new();
        assert_eq!(stack.pop(NodeId::ROOT), Err(StackMismatch::NotActive));
        assert_eq!(stack.unwind(NodeId::ROOT), None);
        assert_eq!(stack.len(), 1);
    }

    #[test]
    fn unwind_drops_the_node_and_everything_above_it() {
        let mut stack = ActiveStack::new();
        stack.push(NodeId(1));
        stack.push(NodeId(2));
        stack.push(NodeId(1));
        stack.push(NodeId(3));
        assert_eq!(stack.unwind(NodeId(1)), Some(vec![NodeId(3), NodeId(1)]));
        assert_eq!(
            stack.iter().collect::<Vec<_>>(),
            vec![NodeId::ROOT, NodeId(1), NodeId(2)]
        );
        assert_eq!(stack.unwind(NodeId(4)), None);
        assert_eq!(stack.len(), 3);
    }
}
