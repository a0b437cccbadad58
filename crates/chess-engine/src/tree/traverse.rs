//! Depth-first traversal with an explicit stack.
//!
//! Each stack frame holds a node and the next of its edges to walk. The
//! stack never grows past `limit + 1` frames. Nodes are expanded on the way
//! down while above the limit; a node reached at the limit has whatever
//! subtree it still carries pruned away.

use super::{EdgeId, NodeId, TreeArena, TreeError};
use crate::config::TreeConfig;

#[derive(Debug, Clone, Copy)]
struct Frame {
    node: NodeId,
    next: Option<EdgeId>,
}

impl TreeArena {
    fn enter(&mut self, node: NodeId, level: usize, limit: usize) -> Result<Frame, TreeError> {
        if level >= limit {
            if self.node(node)?.first_edge.is_some() {
                self.prune(node)?;
            }
            return Ok(Frame { node, next: None });
        }
        let current = self.node(node)?;
        if !current.is_expanded() && current.status().is_ongoing() {
            self.expand(node)?;
        }
        Ok(Frame {
            node,
            next: self.node(node)?.first_edge,
        })
    }

    /// Moves the top frame to its next edge and returns the child at the
    /// end of the current one, materializing it if needed.
    fn step(&mut self, stack: &mut [Frame]) -> Result<Option<NodeId>, TreeError> {
        let Some(top) = stack.last_mut() else {
            return Ok(None);
        };
        let Some(edge) = top.next else {
            return Ok(None);
        };
        top.next = self.edge(edge)?.sibling;
        let parent = top.node;
        self.materialize_child(parent, edge)
    }
}

fn check_limit(limit: usize) -> Result<(), TreeError> {
    if limit > TreeConfig::DEPTH_CEILING as usize {
        return Err(TreeError::DepthLimit);
    }
    Ok(())
}

/// Visits `root` and its descendants down to `limit` levels, each node
/// before its children. `visit` receives the node and its level.
pub(super) fn preorder<F>(
    arena: &mut TreeArena,
    root: NodeId,
    limit: usize,
    mut visit: F,
) -> Result<(), TreeError>
where
    F: FnMut(&TreeArena, NodeId, usize),
{
    check_limit(limit)?;
    let mut stack = Vec::with_capacity(limit + 1);
    visit(arena, root, 0);
    stack.push(arena.enter(root, 0, limit)?);

    while let Some(&Frame { node, next }) = stack.last() {
        if next.is_none() {
            stack.pop();
            arena.unwind(node)?;
            continue;
        }
        let level = stack.len();
        if let Some(child) = arena.step(&mut stack)? {
            visit(arena, child, level);
            stack.push(arena.enter(child, level, limit)?);
        }
    }
    Ok(())
}

/// Visits `root` and its descendants down to `limit` levels, each node
/// after its children.
pub(super) fn postorder<F>(
    arena: &mut TreeArena,
    root: NodeId,
    limit: usize,
    mut visit: F,
) -> Result<(), TreeError>
where
    F: FnMut(&TreeArena, NodeId, usize),
{
    check_limit(limit)?;
    let mut stack = Vec::with_capacity(limit + 1);
    stack.push(arena.enter(root, 0, limit)?);

    while let Some(&Frame { node, next }) = stack.last() {
        if next.is_none() {
            stack.pop();
            arena.unwind(node)?;
            visit(arena, node, stack.len());
            continue;
        }
        let level = stack.len();
        if let Some(child) = arena.step(&mut stack)? {
            stack.push(arena.enter(child, level, limit)?);
        }
    }
    Ok(())
}
