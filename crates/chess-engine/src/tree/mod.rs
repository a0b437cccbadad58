//! Lazily grown game tree over pooled nodes and edges.
//!
//! ```text
//!        Node (board, flags)                 level
//!          |
//!        Edge (move) -> Edge (move) -> ...   children of Node
//!          |              |
//!        Node           (not yet materialized)  level + 1
//! ```
//!
//! Expanding a node creates one edge per legal move. The node at the end of
//! an edge is only created when a traversal walks down that edge. All nodes
//! and edges live in the two pools of a [`TreeArena`] and are addressed by
//! index handles, so a freed slot is detectable instead of dangling.

mod traverse;

use chess_core::{Move, MoveRequest};
use thiserror::Error;
use tracing::{debug, warn};

use crate::arena::{Pool, PoolError};
use crate::config::TreeConfig;
use crate::movegen::{generate_legal, MoveList};
use crate::{transition, Board, BoardError, GameStatus};

/// Handle to a node slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u32);

/// Handle to an edge slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EdgeId(u32);

/// Node state flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NodeFlags(u8);

impl NodeFlags {
    /// No children have been created.
    pub const LEAF: NodeFlags = NodeFlags(1);
    /// The node has been expanded.
    pub const PARENT: NodeFlags = NodeFlags(2);
    pub const ROOT: NodeFlags = NodeFlags(4);
    /// Part of the subtree was discarded or could not be allocated.
    pub const PRUNED: NodeFlags = NodeFlags(8);
    /// Allocated while the node pool was nearly empty; freed when the
    /// traversal moves back above it.
    pub const RESERVED: NodeFlags = NodeFlags(128);

    #[inline]
    pub const fn bits(self) -> u8 {
        self.0
    }

    #[inline]
    pub const fn contains(self, other: NodeFlags) -> bool {
        self.0 & other.0 == other.0
    }

    #[inline]
    pub fn insert(&mut self, other: NodeFlags) {
        self.0 |= other.0;
    }

    #[inline]
    pub fn remove(&mut self, other: NodeFlags) {
        self.0 &= !other.0;
    }
}

impl std::ops::BitOr for NodeFlags {
    type Output = NodeFlags;

    fn bitor(self, rhs: NodeFlags) -> NodeFlags {
        NodeFlags(self.0 | rhs.0)
    }
}

/// A position in the tree.
#[derive(Debug, Clone)]
pub struct Node {
    board: Board,
    flags: NodeFlags,
    depth: u8,
    first_edge: Option<EdgeId>,
    children: u16,
}

impl Node {
    fn new(board: Board, flags: NodeFlags) -> Self {
        Node {
            board,
            flags,
            depth: 0,
            first_edge: None,
            children: 0,
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn flags(&self) -> NodeFlags {
        self.flags
    }

    /// Height of the materialized subtree below this node.
    pub fn depth(&self) -> u8 {
        self.depth
    }

    /// Number of edges hanging off this node.
    pub fn children(&self) -> u16 {
        self.children
    }

    pub fn is_expanded(&self) -> bool {
        self.flags.contains(NodeFlags::PARENT)
    }

    pub fn status(&self) -> GameStatus {
        self.board.status()
    }
}

/// A move from a node, and the node it leads to once materialized.
#[derive(Debug, Clone, Copy)]
pub struct Edge {
    mv: Move,
    node: Option<NodeId>,
    sibling: Option<EdgeId>,
}

impl Edge {
    pub fn mv(&self) -> &Move {
        &self.mv
    }

    pub fn node(&self) -> Option<NodeId> {
        self.node
    }

    pub fn sibling(&self) -> Option<EdgeId> {
        self.sibling
    }
}

/// Errors from tree operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TreeError {
    #[error("position is already decided: {0}")]
    GameOver(GameStatus),

    #[error("node {0:?} is already expanded")]
    AlreadyExpanded(NodeId),

    #[error("node {0:?} has not been expanded")]
    NotExpanded(NodeId),

    #[error("node {0:?} still has expanded children")]
    LiveGrandchildren(NodeId),

    #[error("depth limit of {} exceeded", TreeConfig::DEPTH_CEILING)]
    DepthLimit,

    #[error("pool accounting mismatch after teardown: {nodes} nodes, {edges} edges")]
    Leak { nodes: usize, edges: usize },

    #[error("no edge for move {0}")]
    NoSuchMove(String),

    #[error(transparent)]
    Pool(#[from] PoolError),

    #[error(transparent)]
    Board(#[from] BoardError),
}

/// The node and edge pools shared by the trees built on them, plus the
/// move-generation scratch lists.
///
/// Leak detection compares pool free counts, so only one [`Tree`] should be
/// alive in an arena at a time.
#[derive(Debug)]
pub struct TreeArena {
    nodes: Pool<Node>,
    edges: Pool<Edge>,
    pseudo: MoveList,
    legal: MoveList,
    reserve_threshold: usize,
}

impl Default for TreeArena {
    fn default() -> Self {
        Self::from_config(&TreeConfig::default())
    }
}

impl TreeArena {
    pub fn from_config(config: &TreeConfig) -> Self {
        TreeArena {
            nodes: Pool::with_capacity(config.node_capacity),
            edges: Pool::with_capacity(config.edge_capacity),
            pseudo: MoveList::new(),
            legal: MoveList::new(),
            reserve_threshold: config.reserve_threshold(),
        }
    }

    pub fn nodes(&self) -> &Pool<Node> {
        &self.nodes
    }

    pub fn edges(&self) -> &Pool<Edge> {
        &self.edges
    }

    pub fn node(&self, id: NodeId) -> Result<&Node, TreeError> {
        Ok(self.nodes.get(id.0)?)
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node, TreeError> {
        Ok(self.nodes.get_mut(id.0)?)
    }

    pub fn edge(&self, id: EdgeId) -> Result<&Edge, TreeError> {
        Ok(self.edges.get(id.0)?)
    }

    fn edge_mut(&mut self, id: EdgeId) -> Result<&mut Edge, TreeError> {
        Ok(self.edges.get_mut(id.0)?)
    }

    /// Iterates over the edges of `id`, most recently created first.
    pub fn children(&self, id: NodeId) -> Children<'_> {
        Children {
            arena: self,
            next: self.nodes.get(id.0).ok().and_then(|n| n.first_edge),
        }
    }

    fn new_root(&mut self, board: Board) -> Result<NodeId, TreeError> {
        let root = Node::new(board, NodeFlags::LEAF | NodeFlags::ROOT);
        Ok(NodeId(self.nodes.acquire(root)?))
    }

    /// Creates one edge per legal move of the node's position and returns
    /// how many were created.
    ///
    /// If the edge pool runs out, the node keeps the edges created so far and
    /// is flagged pruned.
    pub fn expand(&mut self, id: NodeId) -> Result<usize, TreeError> {
        let node = self.node(id)?;
        if node.is_expanded() {
            return Err(TreeError::AlreadyExpanded(id));
        }
        if node.status().is_over() {
            return Err(TreeError::GameOver(node.status()));
        }
        let mut board = node.board.clone();
        generate_legal(&mut board, &mut self.pseudo, &mut self.legal)?;

        let mut head = None;
        let mut count = 0u16;
        let mut exhausted = false;
        for mv in self.legal.as_slice() {
            let edge = Edge {
                mv: *mv,
                node: None,
                sibling: head,
            };
            match self.edges.acquire(edge) {
                Ok(index) => {
                    head = Some(EdgeId(index));
                    count += 1;
                }
                Err(PoolError::Exhausted) => {
                    exhausted = true;
                    break;
                }
                Err(e) => return Err(e.into()),
            }
        }

        let node = self.node_mut(id)?;
        node.first_edge = head;
        node.children = count;
        node.flags.remove(NodeFlags::LEAF | NodeFlags::PRUNED);
        node.flags.insert(NodeFlags::PARENT);
        if exhausted {
            node.flags.insert(NodeFlags::PRUNED);
            warn!(node = ?id, edges = count, "edge pool exhausted during expansion");
        }
        Ok(count as usize)
    }

    /// Returns the node at the end of `edge`, creating it from `parent`'s
    /// board if needed.
    ///
    /// Returns `Ok(None)` when the node pool is exhausted; `parent` is then
    /// flagged pruned.
    pub fn materialize_child(
        &mut self,
        parent: NodeId,
        edge: EdgeId,
    ) -> Result<Option<NodeId>, TreeError> {
        let parent_node = self.node(parent)?;
        if !parent_node.is_expanded() {
            return Err(TreeError::NotExpanded(parent));
        }
        let link = self.edge(edge)?;
        if let Some(existing) = link.node {
            return Ok(Some(existing));
        }
        let mv = link.mv;

        let mut board = parent_node.board.clone();
        transition::apply_move(&mut board, &mv, &mut self.pseudo, &mut self.legal)?;

        let mut flags = NodeFlags::LEAF;
        if self.nodes.free() < self.reserve_threshold {
            flags.insert(NodeFlags::RESERVED);
        }
        match self.nodes.acquire(Node::new(board, flags)) {
            Ok(index) => {
                let child = NodeId(index);
                self.edge_mut(edge)?.node = Some(child);
                let parent_node = self.node_mut(parent)?;
                parent_node.depth = parent_node.depth.max(1);
                Ok(Some(child))
            }
            Err(PoolError::Exhausted) => {
                self.node_mut(parent)?.flags.insert(NodeFlags::PRUNED);
                warn!(node = ?parent, "node pool exhausted");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Frees the children of `id` and all of its edges, leaving `id` a
    /// pruned leaf.
    ///
    /// Fails without freeing anything if a child still has edges.
    pub fn release_children(&mut self, id: NodeId) -> Result<(), TreeError> {
        for (_, edge) in self.children(id) {
            if let Some(child) = edge.node {
                if self.node(child)?.first_edge.is_some() {
                    return Err(TreeError::LiveGrandchildren(id));
                }
            }
        }

        let mut next = self.node(id)?.first_edge;
        while let Some(edge) = next {
            let link = self.edges.release(edge.0)?;
            if let Some(child) = link.node {
                self.nodes.release(child.0)?;
            }
            next = link.sibling;
        }

        let node = self.node_mut(id)?;
        node.first_edge = None;
        node.children = 0;
        node.depth = 0;
        node.flags.remove(NodeFlags::PARENT);
        node.flags.insert(NodeFlags::LEAF | NodeFlags::PRUNED);
        Ok(())
    }

    /// Frees every descendant of `id`, bottom-up, without recursion.
    ///
    /// Nothing is released if the subtree is deeper than the traversal
    /// ceiling.
    pub fn prune(&mut self, id: NodeId) -> Result<(), TreeError> {
        self.check_prune_depth(id)?;
        let mut stack = vec![(id, self.node(id)?.first_edge)];
        while let Some(&(node, cursor)) = stack.last() {
            let Some(edge) = cursor else {
                stack.pop();
                self.release_children(node)?;
                continue;
            };
            let link = *self.edge(edge)?;
            let top = stack.len() - 1;
            stack[top].1 = link.sibling;
            if let Some(child) = link.node {
                let first = self.node(child)?.first_edge;
                if first.is_some() {
                    stack.push((child, first));
                }
            }
        }
        Ok(())
    }

    /// Walks the subtree below `id` with the same stack discipline as
    /// [`TreeArena::prune`], touching nothing.
    fn check_prune_depth(&self, id: NodeId) -> Result<(), TreeError> {
        let mut stack = vec![self.node(id)?.first_edge];
        while let Some(&cursor) = stack.last() {
            let Some(edge) = cursor else {
                stack.pop();
                continue;
            };
            let link = self.edge(edge)?;
            let top = stack.len() - 1;
            stack[top] = link.sibling;
            if let Some(child) = link.node {
                let first = self.node(child)?.first_edge;
                if first.is_some() {
                    if stack.len() > TreeConfig::DEPTH_CEILING as usize {
                        return Err(TreeError::DepthLimit);
                    }
                    stack.push(first);
                }
            }
        }
        Ok(())
    }

    /// Brings `id` up to date after its children were traversed: reserved
    /// children without descendants are freed and the subtree height is
    /// recomputed.
    pub(crate) fn unwind(&mut self, id: NodeId) -> Result<(), TreeError> {
        let mut depth = 0;
        let mut next = self.node(id)?.first_edge;
        while let Some(edge) = next {
            let link = *self.edge(edge)?;
            next = link.sibling;
            let Some(child) = link.node else { continue };
            let child_node = self.node(child)?;
            if child_node.flags.contains(NodeFlags::RESERVED) && child_node.depth == 0 {
                self.release_children(child)?;
                self.nodes.release(child.0)?;
                self.edge_mut(edge)?.node = None;
            } else {
                depth = depth.max(child_node.depth + 1);
            }
        }
        self.node_mut(id)?.depth = depth;
        Ok(())
    }
}

/// Iterator over the edges of one node.
pub struct Children<'a> {
    arena: &'a TreeArena,
    next: Option<EdgeId>,
}

impl<'a> Iterator for Children<'a> {
    type Item = (EdgeId, &'a Edge);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.next?;
        let edge = self.arena.edges.get(id.0).ok()?;
        self.next = edge.sibling;
        Some((id, edge))
    }
}

/// Slots handed back to the pools by [`Tree::destroy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeStats {
    pub nodes_released: usize,
    pub edges_released: usize,
}

/// A game tree rooted at one position.
#[derive(Debug)]
pub struct Tree {
    root: NodeId,
    max_depth: u8,
    /// Pool free counts before the tree was built.
    baseline: (usize, usize),
}

impl Tree {
    /// Creates a tree holding only the root position.
    pub fn new(arena: &mut TreeArena, board: &Board, max_depth: u8) -> Result<Tree, TreeError> {
        if max_depth > TreeConfig::DEPTH_CEILING {
            return Err(TreeError::DepthLimit);
        }
        if board.status().is_over() {
            return Err(TreeError::GameOver(board.status()));
        }
        let baseline = (arena.nodes.free(), arena.edges.free());
        let root = arena.new_root(board.clone())?;
        debug!(max_depth, nodes_free = baseline.0, edges_free = baseline.1, "tree created");
        Ok(Tree {
            root,
            max_depth,
            baseline,
        })
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn max_depth(&self) -> u8 {
        self.max_depth
    }

    /// Visits every node down to the depth limit, parents before children.
    pub fn preorder<F>(&self, arena: &mut TreeArena, visit: F) -> Result<(), TreeError>
    where
        F: FnMut(&TreeArena, NodeId, usize),
    {
        traverse::preorder(arena, self.root, self.max_depth as usize, visit)
    }

    /// Visits every node down to the depth limit, children before parents.
    pub fn postorder<F>(&self, arena: &mut TreeArena, visit: F) -> Result<(), TreeError>
    where
        F: FnMut(&TreeArena, NodeId, usize),
    {
        traverse::postorder(arena, self.root, self.max_depth as usize, visit)
    }

    /// Frees the whole tree and checks that both pools are back to the
    /// free counts they had before the tree was built.
    pub fn destroy(self, arena: &mut TreeArena) -> Result<TreeStats, TreeError> {
        let before = (arena.nodes.free(), arena.edges.free());
        arena.prune(self.root)?;
        arena.nodes.release(self.root.0)?;

        let after = (arena.nodes.free(), arena.edges.free());
        let nodes = after.0.abs_diff(self.baseline.0);
        let edges = after.1.abs_diff(self.baseline.1);
        if nodes != 0 || edges != 0 {
            warn!(nodes, edges, "tree teardown leaked pool slots");
            return Err(TreeError::Leak { nodes, edges });
        }

        let stats = TreeStats {
            nodes_released: after.0 - before.0,
            edges_released: after.1 - before.1,
        };
        debug!(
            nodes = stats.nodes_released,
            edges = stats.edges_released,
            "tree destroyed"
        );
        Ok(stats)
    }

    /// Moves the root down the edge matching `request` and frees every other
    /// branch along with the old root.
    ///
    /// The pool baseline is kept, so [`Tree::destroy`] still checks the whole
    /// history of the tree for leaks. On error the root stays where it was.
    pub fn advance(&mut self, arena: &mut TreeArena, request: &MoveRequest) -> Result<(), TreeError> {
        if !arena.node(self.root)?.is_expanded() {
            arena.expand(self.root)?;
        }
        let edge = arena
            .children(self.root)
            .find(|(_, e)| e.mv.matches(request))
            .map(|(id, _)| id)
            .ok_or_else(|| TreeError::NoSuchMove(request.to_string()))?;
        let child = arena
            .materialize_child(self.root, edge)?
            .ok_or(TreeError::Pool(PoolError::Exhausted))?;

        arena.check_prune_depth(self.root)?;
        arena.edge_mut(edge)?.node = None;
        arena.prune(self.root)?;
        arena.nodes.release(self.root.0)?;

        let node = arena.node_mut(child)?;
        node.flags.insert(NodeFlags::ROOT);
        node.flags.remove(NodeFlags::RESERVED);
        self.root = child;
        debug!(mv = %request, "tree advanced");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arena(nodes: u32, edges: u32) -> TreeArena {
        TreeArena::from_config(&TreeConfig {
            max_depth: 3,
            node_capacity: nodes,
            edge_capacity: edges,
            reserve_margin: 0,
        })
    }

    #[test]
    fn expand_creates_one_edge_per_move() {
        let mut arena = arena(16, 64);
        let tree = Tree::new(&mut arena, &Board::startpos(), 2).unwrap();
        assert_eq!(arena.nodes().in_use(), 1);
        assert_eq!(arena.expand(tree.root()).unwrap(), 20);
        assert_eq!(arena.edges().in_use(), 20);
        let root = arena.node(tree.root()).unwrap();
        assert_eq!(root.children(), 20);
        assert!(root.flags().contains(NodeFlags::PARENT | NodeFlags::ROOT));
        assert!(!root.flags().contains(NodeFlags::LEAF));
        assert!(arena.children(tree.root()).all(|(_, e)| e.node().is_none()));
        assert_eq!(
            arena.expand(tree.root()),
            Err(TreeError::AlreadyExpanded(tree.root()))
        );
        tree.destroy(&mut arena).unwrap();
    }

    #[test]
    fn materialized_children_follow_their_move() {
        let mut arena = arena(16, 64);
        let tree = Tree::new(&mut arena, &Board::startpos(), 2).unwrap();
        let root = tree.root();
        assert_eq!(
            arena.materialize_child(root, EdgeId(0)),
            Err(TreeError::NotExpanded(root))
        );
        arena.expand(root).unwrap();
        let (edge, mv) = arena
            .children(root)
            .map(|(id, e)| (id, *e.mv()))
            .find(|(_, mv)| mv.to_string() == "e2e4")
            .unwrap();
        let child = arena.materialize_child(root, edge).unwrap().unwrap();
        assert_eq!(arena.materialize_child(root, edge).unwrap(), Some(child));
        assert_eq!(arena.nodes().in_use(), 2);

        let node = arena.node(child).unwrap();
        assert_eq!(
            node.board().to_fen(),
            "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1"
        );
        assert!(node.flags().contains(NodeFlags::LEAF));
        assert_eq!(arena.node(root).unwrap().depth(), 1);
        assert_eq!(mv.to_string(), "e2e4");
        tree.destroy(&mut arena).unwrap();
    }

    #[test]
    fn release_children_refuses_live_grandchildren() {
        let mut arena = arena(16, 128);
        let tree = Tree::new(&mut arena, &Board::startpos(), 2).unwrap();
        let root = tree.root();
        arena.expand(root).unwrap();
        let (edge, _) = arena.children(root).next().unwrap();
        let child = arena.materialize_child(root, edge).unwrap().unwrap();
        arena.expand(child).unwrap();

        let in_use = (arena.nodes().in_use(), arena.edges().in_use());
        assert_eq!(
            arena.release_children(root),
            Err(TreeError::LiveGrandchildren(root))
        );
        assert_eq!(in_use, (arena.nodes().in_use(), arena.edges().in_use()));

        arena.release_children(child).unwrap();
        assert!(arena
            .node(child)
            .unwrap()
            .flags()
            .contains(NodeFlags::LEAF | NodeFlags::PRUNED));
        arena.release_children(root).unwrap();
        assert_eq!(arena.nodes().in_use(), 1);
        assert_eq!(arena.edges().in_use(), 0);
        tree.destroy(&mut arena).unwrap();
    }

    #[test]
    fn terminal_positions_are_not_expanded() {
        let mut arena = arena(4, 4);
        let mate = Board::from_fen("rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3")
            .unwrap();
        assert!(matches!(
            Tree::new(&mut arena, &mate, 2),
            Err(TreeError::GameOver(_))
        ));
        assert_eq!(arena.nodes().in_use(), 0);
        assert!(matches!(
            Tree::new(&mut arena, &Board::startpos(), TreeConfig::DEPTH_CEILING + 1),
            Err(TreeError::DepthLimit)
        ));
    }

    #[test]
    fn edge_exhaustion_marks_node_pruned() {
        let mut arena = arena(4, 5);
        let tree = Tree::new(&mut arena, &Board::startpos(), 1).unwrap();
        assert_eq!(arena.expand(tree.root()).unwrap(), 5);
        let root = arena.node(tree.root()).unwrap();
        assert!(root.flags().contains(NodeFlags::PRUNED | NodeFlags::PARENT));
        assert_eq!(arena.edges().free(), 0);
        let stats = tree.destroy(&mut arena).unwrap();
        assert_eq!(stats.nodes_released, 1);
        assert_eq!(stats.edges_released, 5);
    }

    #[test]
    fn node_exhaustion_marks_parent_pruned() {
        let mut arena = arena(2, 64);
        let tree = Tree::new(&mut arena, &Board::startpos(), 1).unwrap();
        let root = tree.root();
        arena.expand(root).unwrap();
        let edges: Vec<_> = arena.children(root).map(|(id, _)| id).collect();
        assert!(arena.materialize_child(root, edges[0]).unwrap().is_some());
        assert_eq!(arena.materialize_child(root, edges[1]).unwrap(), None);
        assert!(arena
            .node(root)
            .unwrap()
            .flags()
            .contains(NodeFlags::PRUNED));
        tree.destroy(&mut arena).unwrap();
        assert_eq!(arena.nodes().free(), 2);
    }

    #[test]
    fn reserved_nodes_near_exhaustion() {
        let mut arena = TreeArena::from_config(&TreeConfig {
            max_depth: 1,
            node_capacity: 8,
            edge_capacity: 64,
            reserve_margin: 3,
        });
        let tree = Tree::new(&mut arena, &Board::startpos(), 1).unwrap();
        let root = tree.root();
        arena.expand(root).unwrap();
        let edges: Vec<_> = arena.children(root).map(|(id, _)| id).collect();
        let mut reserved = 0;
        for &edge in &edges[..7] {
            let child = arena.materialize_child(root, edge).unwrap().unwrap();
            if arena.node(child).unwrap().flags().contains(NodeFlags::RESERVED) {
                reserved += 1;
            }
        }
        // Children created with fewer than 1 + 3 free slots are reserved.
        assert_eq!(reserved, 3);
        arena.unwind(root).unwrap();
        assert_eq!(arena.nodes().in_use(), 5);
        assert_eq!(arena.node(root).unwrap().depth(), 1);
        tree.destroy(&mut arena).unwrap();
    }

    #[test]
    fn prune_frees_whole_subtree() {
        let mut arena = arena(64, 1024);
        let tree = Tree::new(&mut arena, &Board::startpos(), 3).unwrap();
        let root = tree.root();
        arena.expand(root).unwrap();
        let edges: Vec<_> = arena.children(root).map(|(id, _)| id).take(2).collect();
        for edge in edges {
            let child = arena.materialize_child(root, edge).unwrap().unwrap();
            arena.expand(child).unwrap();
            let (grand_edge, _) = arena.children(child).next().unwrap();
            let grandchild = arena.materialize_child(child, grand_edge).unwrap().unwrap();
            arena.expand(grandchild).unwrap();
        }
        assert_eq!(arena.nodes().in_use(), 5);

        arena.prune(root).unwrap();
        assert_eq!(arena.nodes().in_use(), 1);
        assert_eq!(arena.edges().in_use(), 0);
        let node = arena.node(root).unwrap();
        assert!(node.flags().contains(NodeFlags::LEAF | NodeFlags::PRUNED | NodeFlags::ROOT));
        assert_eq!(node.depth(), 0);

        // A pruned node can be expanded again.
        assert_eq!(arena.expand(root).unwrap(), 20);
        tree.destroy(&mut arena).unwrap();
    }

    #[test]
    fn advance_keeps_only_the_played_branch() {
        let mut arena = arena(64, 256);
        let mut tree = Tree::new(&mut arena, &Board::startpos(), 1).unwrap();
        tree.preorder(&mut arena, |_, _, _| {}).unwrap();
        assert_eq!(arena.nodes().in_use(), 21);
        assert_eq!(arena.edges().in_use(), 20);

        tree.advance(&mut arena, &"g1f3".parse().unwrap()).unwrap();
        let root = arena.node(tree.root()).unwrap();
        assert!(root.flags().contains(NodeFlags::ROOT));
        assert_eq!(
            root.board().to_fen(),
            "rnbqkbnr/pppppppp/8/8/8/5N2/PPPPPPPP/RNBQKB1R b KQkq - 1 1"
        );
        assert_eq!(arena.nodes().in_use(), 1);
        assert_eq!(arena.edges().in_use(), 0);

        let root = tree.root();
        assert_eq!(
            tree.advance(&mut arena, &"e2e4".parse().unwrap()),
            Err(TreeError::NoSuchMove("e2e4".to_string()))
        );
        assert_eq!(tree.root(), root);

        tree.advance(&mut arena, &"e7e5".parse().unwrap()).unwrap();
        tree.destroy(&mut arena).unwrap();
        assert_eq!(arena.nodes().free(), 64);
        assert_eq!(arena.edges().free(), 256);
    }

    fn child_for(arena: &mut TreeArena, node: NodeId, mv: &str) -> NodeId {
        let request: MoveRequest = mv.parse().unwrap();
        let edge = arena
            .children(node)
            .find(|(_, e)| e.mv().matches(&request))
            .map(|(id, _)| id)
            .unwrap();
        arena.materialize_child(node, edge).unwrap().unwrap()
    }

    #[test]
    fn too_deep_to_prune_releases_nothing() {
        let mut arena = arena(64, 1024);
        let mut tree = Tree::new(&mut arena, &Board::startpos(), 3).unwrap();
        let root = tree.root();
        arena.expand(root).unwrap();
        let side = child_for(&mut arena, root, "e2e4");
        arena.expand(side).unwrap();

        // Knights shuffle out and back, one expanded node per ply.
        let mut node = root;
        for mv in ["g1f3", "g8f6", "f3g1", "f6g8"]
            .iter()
            .cycle()
            .take(TreeConfig::DEPTH_CEILING as usize + 1)
        {
            node = child_for(&mut arena, node, mv);
            arena.expand(node).unwrap();
        }

        let before = (arena.nodes().free(), arena.edges().free());
        assert_eq!(arena.prune(root), Err(TreeError::DepthLimit));
        assert_eq!((arena.nodes().free(), arena.edges().free()), before);

        assert_eq!(
            tree.advance(&mut arena, &"g1f3".parse().unwrap()),
            Err(TreeError::DepthLimit)
        );
        assert_eq!(tree.root(), root);
        assert_eq!((arena.nodes().free(), arena.edges().free()), before);
        let first = arena
            .children(root)
            .find(|(_, e)| e.mv().to_string() == "g1f3")
            .and_then(|(_, e)| e.node());
        assert!(first.is_some());
    }

    #[test]
    fn destroy_reports_leaks() {
        let mut arena = arena(8, 64);
        let tree = Tree::new(&mut arena, &Board::startpos(), 1).unwrap();
        let other = Tree::new(&mut arena, &Board::startpos(), 1).unwrap();
        arena.expand(other.root()).unwrap();
        assert_eq!(
            tree.destroy(&mut arena),
            Err(TreeError::Leak { nodes: 1, edges: 20 })
        );
        // The second tree's baseline counted the first root as taken.
        assert_eq!(
            other.destroy(&mut arena),
            Err(TreeError::Leak { nodes: 1, edges: 0 })
        );
        assert_eq!(arena.nodes().free(), 8);
    }
}
