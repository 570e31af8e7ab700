//! Tests pinning the reroot edge reversal and its branch-length
//! reassignment rule: each demoted ancestor takes over the length the node
//! promoted above it held before promotion, so the weight follows the node
//! pushed down the new tree.

use super::{NodeId, Tree};

// Fixture:
//       R (0)
//      /     \
//     P (1)   B (4, len 4)
//    /    \
//   A (2)  C (3)
// lengths: P=1, A=2, C=3
fn create_test_tree() -> Tree {
    let mut tree = Tree::new();
    let r = tree.add_node(Some("R".to_string()), None, None);
    let p = tree.add_node(Some("P".to_string()), Some(1.0), Some(r));
    tree.add_node(Some("A".to_string()), Some(2.0), Some(p));
    tree.add_node(Some("C".to_string()), Some(3.0), Some(p));
    tree.add_node(Some("B".to_string()), Some(4.0), Some(r));
    tree
}

fn verify_tree_consistency(tree: &Tree) {
    for node in &tree.nodes {
        for &child_id in &node.children {
            let child = &tree.nodes[child_id];
            assert_eq!(
                child.parent,
                Some(node.id),
                "child {child_id} should have parent {}",
                node.id
            );
        }
        if let Some(parent_id) = node.parent {
            let parent = &tree.nodes[parent_id];
            let occurrences = parent
                .children
                .iter()
                .filter(|&&child| child == node.id)
                .count();
            assert_eq!(
                occurrences, 1,
                "parent {parent_id} should list child {} exactly once",
                node.id
            );
        }
    }

    if let Some(root_id) = tree.root {
        assert!(
            tree.nodes[root_id].parent.is_none(),
            "root node should have no parent"
        );
    }
}

/// Canonical subtree signature for order-insensitive comparison. The root's
/// own length is excluded: rerooting leaves a stale, never-serialised value
/// there.
fn signature(tree: &Tree, id: NodeId, is_root: bool) -> String {
    let node = &tree.nodes[id];
    let mut children: Vec<String> = node
        .children
        .iter()
        .map(|&child| signature(tree, child, false))
        .collect();
    children.sort();
    let own = if is_root {
        node.name.clone().unwrap_or_default()
    } else {
        format!("{}:{:?}", node.name.clone().unwrap_or_default(), node.length)
    };
    format!("{own}({})", children.join(","))
}

#[test]
fn reroot_reverses_the_ancestor_chain() {
    let mut tree = create_test_tree();
    tree.reroot(2); // A

    assert_eq!(tree.root, Some(2));
    verify_tree_consistency(&tree);

    // A adopted P; P lost A, kept C, and adopted R last; R kept B.
    assert_eq!(tree.nodes[2].children, vec![1]);
    assert_eq!(tree.nodes[1].children, vec![3, 0]);
    assert_eq!(tree.nodes[0].children, vec![4]);

    // The edge weights follow the demoted nodes: P takes A's old length,
    // R takes P's old length; B and C are untouched.
    assert_eq!(tree.nodes[1].length, Some(2.0));
    assert_eq!(tree.nodes[0].length, Some(1.0));
    assert_eq!(tree.nodes[4].length, Some(4.0));
    assert_eq!(tree.nodes[3].length, Some(3.0));
}

#[test]
fn reroot_to_current_root_is_a_noop() {
    let mut tree = create_test_tree();
    let before: Vec<_> = tree.nodes.iter().map(|n| n.children.clone()).collect();
    tree.reroot(0);
    let after: Vec<_> = tree.nodes.iter().map(|n| n.children.clone()).collect();
    assert_eq!(tree.root, Some(0));
    assert_eq!(before, after);
}

#[test]
fn double_reroot_restores_the_original_tree() {
    let original = create_test_tree();
    let mut tree = original.clone();

    tree.reroot(2); // A
    verify_tree_consistency(&tree);
    tree.reroot(0); // back to the original root
    verify_tree_consistency(&tree);

    assert_eq!(tree.root, Some(0));
    assert_eq!(
        signature(&tree, 0, true),
        signature(&original, 0, true),
        "double reroot should reproduce the original tree up to child order"
    );
}

#[test]
fn reroot_of_a_leaf_keeps_every_node_reachable() {
    let mut tree = create_test_tree();
    tree.reroot(3); // C
    verify_tree_consistency(&tree);
    assert_eq!(tree.breadth_first().count(), tree.len());
}

#[test]
#[should_panic(expected = "not attached to the current root")]
fn reroot_on_a_detached_node_panics() {
    let mut tree = create_test_tree();
    // An orphan in the arena is not part of the rooted tree.
    let orphan = tree.add_node(Some("orphan".to_string()), None, None);
    tree.reroot(orphan);
}

#[test]
#[should_panic(expected = "not part of this tree")]
fn reroot_out_of_range_panics() {
    let mut tree = create_test_tree();
    tree.reroot(42);
}
