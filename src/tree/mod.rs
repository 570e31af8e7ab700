use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::RwLock;

pub mod layout;

#[cfg(test)]
mod test_reroot;

pub type NodeId = usize;

/// Shared handle to a tree read by several plots at once.
///
/// Structural mutation (reroot) takes the write lock; layout recomputation
/// takes the read lock.
pub type SharedTree = Arc<RwLock<Tree>>;

/// Representation of a rooted phylogenetic tree with an explicit node list.
#[derive(Debug, Clone, Default)]
pub struct Tree {
    pub root: Option<NodeId>,
    pub nodes: Vec<TreeNode>,
}

impl Tree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a node to the arena and wire it under `parent`.
    ///
    /// A node added without a parent becomes the root when none is set yet.
    pub fn add_node(
        &mut self,
        name: Option<String>,
        length: Option<f64>,
        parent: Option<NodeId>,
    ) -> NodeId {
        let id = self.nodes.len();
        let mut node = TreeNode::new(id, name, length);
        node.parent = parent;
        self.nodes.push(node);
        match parent {
            Some(parent_id) => self.nodes[parent_id].children.push(id),
            None => {
                if self.root.is_none() {
                    self.root = Some(id);
                }
            }
        }
        id
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> Option<&TreeNode> {
        self.nodes.get(id)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut TreeNode> {
        self.nodes.get_mut(id)
    }

    pub fn root(&self) -> Option<&TreeNode> {
        self.root.and_then(|id| self.nodes.get(id))
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id).and_then(|node| node.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(id)
            .map(|node| node.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn leaf_count(&self) -> usize {
        self.nodes.iter().filter(|node| node.is_leaf()).count()
    }

    /// Number of leaves in the subtree below `id` (a leaf counts itself).
    pub fn leaf_count_of(&self, id: NodeId) -> usize {
        let node = &self.nodes[id];
        if node.is_leaf() {
            1
        } else {
            node.children
                .iter()
                .map(|&child| self.leaf_count_of(child))
                .sum()
        }
    }

    /// Maximum cumulative branch length from the root down to any leaf.
    pub fn max_depth(&self) -> f64 {
        fn descend(tree: &Tree, id: NodeId, depth: f64) -> f64 {
            let node = &tree.nodes[id];
            let mut max_depth = depth;
            for &child in &node.children {
                let length = tree.nodes[child]
                    .length
                    .unwrap_or(layout::DEFAULT_BRANCH_LENGTH);
                max_depth = max_depth.max(descend(tree, child, depth + length));
            }
            max_depth
        }

        match self.root {
            Some(root) => descend(self, root, 0.0),
            None => 0.0,
        }
    }

    /// Lazy preorder traversal starting at the root. Restartable: each call
    /// yields a fresh iterator.
    pub fn preorder(&self) -> Preorder<'_> {
        Preorder {
            tree: self,
            stack: self.root.into_iter().collect(),
        }
    }

    /// Lazy postorder traversal starting at the root.
    pub fn postorder(&self) -> Postorder<'_> {
        Postorder {
            tree: self,
            stack: self.root.map(|root| (root, 0)).into_iter().collect(),
        }
    }

    /// Lazy breadth-first traversal starting at the root. The position of a
    /// node in this order is its stable plot index.
    pub fn breadth_first(&self) -> BreadthFirst<'_> {
        BreadthFirst {
            tree: self,
            queue: self.root.into_iter().collect(),
        }
    }

    /// Position of `id` in breadth-first order, the index used to correlate
    /// plot points back to nodes.
    pub fn index_of(&self, id: NodeId) -> Option<usize> {
        self.breadth_first().position(|node| node == id)
    }

    /// Make `new_root` the root by reversing every edge on its ancestor chain.
    ///
    /// At each step the former parent is detached from its own parent first,
    /// then appended to the promoted node's children, and its stored branch
    /// length is overwritten with the length the promoted node held before
    /// promotion: the edge weight follows the node being pushed down. The old
    /// root ends up the last child of the final promoted node. The new root
    /// keeps its now-stale stored length, which is never serialised.
    ///
    /// # Panics
    ///
    /// Panics if `new_root` is not attached to the current root.
    pub fn reroot(&mut self, new_root: NodeId) {
        let root = self.root.expect("reroot on an empty tree");
        assert!(
            new_root < self.nodes.len(),
            "reroot target is not part of this tree"
        );

        let mut probe = new_root;
        let mut steps = 0usize;
        while let Some(parent) = self.nodes[probe].parent {
            probe = parent;
            steps += 1;
            assert!(steps <= self.nodes.len(), "parent chain does not terminate");
        }
        assert!(
            probe == root,
            "reroot target is not attached to the current root"
        );

        if new_root == root {
            return;
        }

        let mut promoted = new_root;
        let mut demoted = self.nodes[new_root].parent;
        let mut carried_length = self.nodes[new_root].length;
        self.nodes[new_root].parent = None;

        while let Some(node) = demoted {
            let next = self.nodes[node].parent;
            self.nodes[node].parent = None;
            self.nodes[node].children.retain(|&child| child != promoted);

            self.nodes[promoted].children.push(node);
            self.nodes[node].parent = Some(promoted);

            let displaced = self.nodes[node].length;
            self.nodes[node].length = carried_length;
            carried_length = displaced;

            promoted = node;
            demoted = next;
        }

        self.root = Some(new_root);
    }
}

/// Node within a phylogenetic tree.
#[derive(Debug, Clone)]
pub struct TreeNode {
    pub id: NodeId,
    pub name: Option<String>,
    /// Branch length to the parent. `None` marks a node carrying no weighted
    /// model; layouts substitute [`layout::DEFAULT_BRANCH_LENGTH`].
    pub length: Option<f64>,
    /// Bootstrap replicates or confidence on the edge to the parent; 0 = unset.
    pub bootstrap: f64,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

impl TreeNode {
    pub fn new(id: NodeId, name: Option<String>, length: Option<f64>) -> Self {
        Self {
            id,
            name,
            length,
            bootstrap: 0.0,
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}

pub struct Preorder<'a> {
    tree: &'a Tree,
    stack: Vec<NodeId>,
}

impl Iterator for Preorder<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.stack.pop()?;
        let node = &self.tree.nodes[id];
        self.stack.extend(node.children.iter().rev().copied());
        Some(id)
    }
}

pub struct Postorder<'a> {
    tree: &'a Tree,
    // (node, index of the next child to descend into)
    stack: Vec<(NodeId, usize)>,
}

impl Iterator for Postorder<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        loop {
            let &(id, child_index) = self.stack.last()?;
            let children = &self.tree.nodes[id].children;
            if child_index < children.len() {
                let child = children[child_index];
                if let Some(top) = self.stack.last_mut() {
                    top.1 += 1;
                }
                self.stack.push((child, 0));
            } else {
                self.stack.pop();
                return Some(id);
            }
        }
    }
}

pub struct BreadthFirst<'a> {
    tree: &'a Tree,
    queue: VecDeque<NodeId>,
}

impl Iterator for BreadthFirst<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.queue.pop_front()?;
        let node = &self.tree.nodes[id];
        self.queue.extend(node.children.iter().copied());
        Some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Fixture:
    //        0
    //       / \
    //      1   4
    //     / \
    //    2   3
    fn sample_tree() -> Tree {
        let mut tree = Tree::new();
        let root = tree.add_node(None, None, None);
        let inner = tree.add_node(Some("inner".into()), Some(1.0), Some(root));
        tree.add_node(Some("A".into()), Some(2.0), Some(inner));
        tree.add_node(Some("B".into()), Some(3.0), Some(inner));
        tree.add_node(Some("C".into()), Some(4.0), Some(root));
        tree
    }

    #[test]
    fn traversal_orders() {
        let tree = sample_tree();
        let pre: Vec<NodeId> = tree.preorder().collect();
        assert_eq!(pre, vec![0, 1, 2, 3, 4]);

        let post: Vec<NodeId> = tree.postorder().collect();
        assert_eq!(post, vec![2, 3, 1, 4, 0]);

        let bfs: Vec<NodeId> = tree.breadth_first().collect();
        assert_eq!(bfs, vec![0, 1, 4, 2, 3]);
    }

    #[test]
    fn traversals_are_restartable() {
        let tree = sample_tree();
        let first: Vec<NodeId> = tree.preorder().collect();
        let second: Vec<NodeId> = tree.preorder().collect();
        assert_eq!(first, second);
    }

    #[test]
    fn breadth_first_index_contract() {
        let tree = sample_tree();
        assert_eq!(tree.index_of(0), Some(0));
        assert_eq!(tree.index_of(4), Some(2));
        assert_eq!(tree.index_of(3), Some(4));
        assert_eq!(tree.index_of(99), None);
    }

    #[test]
    fn leaf_counts() {
        let tree = sample_tree();
        assert_eq!(tree.leaf_count(), 3);
        assert_eq!(tree.leaf_count_of(1), 2);
        assert_eq!(tree.leaf_count_of(2), 1);
        assert_eq!(tree.leaf_count_of(0), 3);
    }

    #[test]
    fn max_depth_follows_longest_path() {
        let tree = sample_tree();
        // root -> inner (1.0) -> B (3.0)
        assert!((tree.max_depth() - 4.0).abs() < 1e-12);
    }

    #[test]
    fn empty_tree_has_no_traversal() {
        let tree = Tree::new();
        assert_eq!(tree.preorder().count(), 0);
        assert_eq!(tree.breadth_first().count(), 0);
        assert_eq!(tree.max_depth(), 0.0);
    }
}
