use super::*;
use std::cell::Cell;

/// Minimal node with parent tracking and a layout dirty flag.
struct TestNode {
    children: Vec<NodeId>,
    parent: Cell<Option<NodeId>>,
    needs_layout: Cell<bool>,
    id: Cell<Option<NodeId>>,
}

impl TestNode {
    fn new() -> Self {
        Self {
            children: Vec::new(),
            parent: Cell::new(None),
            needs_layout: Cell::new(false),
            id: Cell::new(None),
        }
    }
}

impl Node for TestNode {
    fn insert_child(&mut self, child: NodeId) {
        self.children.push(child);
    }

    fn remove_child(&mut self, child: NodeId) {
        self.children.retain(|&c| c != child);
    }

    fn children(&self) -> Vec<NodeId> {
        self.children.clone()
    }

    fn set_node_id(&mut self, id: NodeId) {
        self.id.set(Some(id));
    }

    fn on_attached_to_parent(&mut self, parent: NodeId) {
        self.parent.set(Some(parent));
    }

    fn on_removed_from_parent(&mut self) {
        self.parent.set(None);
    }

    fn parent(&self) -> Option<NodeId> {
        self.parent.get()
    }

    fn mark_needs_layout(&self) {
        self.needs_layout.set(true);
    }

    fn needs_layout(&self) -> bool {
        self.needs_layout.get()
    }
}

struct OtherNode;

impl Node for OtherNode {}

fn attach(arena: &mut NodeArena, parent: NodeId, child: NodeId) {
    arena
        .get_mut(parent)
        .expect("parent exists")
        .insert_child(child);
    arena
        .get_mut(child)
        .expect("child exists")
        .on_attached_to_parent(parent);
}

#[test]
fn create_records_node_id() -> Result<(), NodeError> {
    let mut arena = NodeArena::new();
    let id = arena.create(Box::new(TestNode::new()));
    let stored = arena.with_node::<TestNode, _>(id, |node| node.id.get())?;
    assert_eq!(stored, Some(id));
    Ok(())
}

#[test]
fn with_node_reports_type_mismatch() {
    let mut arena = NodeArena::new();
    let id = arena.create(Box::new(OtherNode));
    let err = arena
        .with_node::<TestNode, _>(id, |_| ())
        .expect_err("downcast should fail");
    assert!(matches!(err, NodeError::TypeMismatch { .. }));
}

#[test]
fn get_mut_on_unknown_id_is_missing() {
    let mut arena = NodeArena::new();
    // Map the Ok value away: `&mut dyn Node` has no Debug impl, which
    // `expect_err` needs to format it.
    let err = arena.get_mut(7).map(|_| ()).expect_err("empty arena");
    assert_eq!(err, NodeError::Missing { id: 7 });
}

#[test]
fn remove_drops_whole_subtree() -> Result<(), NodeError> {
    let mut arena = NodeArena::new();
    let root = arena.create(Box::new(TestNode::new()));
    let child = arena.create(Box::new(TestNode::new()));
    let grandchild = arena.create(Box::new(TestNode::new()));
    attach(&mut arena, root, child);
    attach(&mut arena, child, grandchild);

    assert_eq!(arena.len(), 3);
    arena.remove(child)?;
    assert_eq!(arena.len(), 1);
    assert!(arena.contains(root));
    assert!(!arena.contains(child));
    assert!(!arena.contains(grandchild));
    Ok(())
}

#[test]
fn removed_id_stays_missing() {
    let mut arena = NodeArena::new();
    let id = arena.create(Box::new(TestNode::new()));
    arena.remove(id).expect("first remove succeeds");
    assert_eq!(arena.remove(id), Err(NodeError::Missing { id }));
}

#[test]
fn bubble_marks_node_and_ancestors() {
    let mut arena = NodeArena::new();
    let root = arena.create(Box::new(TestNode::new()));
    let mid = arena.create(Box::new(TestNode::new()));
    let leaf = arena.create(Box::new(TestNode::new()));
    attach(&mut arena, root, mid);
    attach(&mut arena, mid, leaf);

    bubble_layout_dirty(&mut arena, leaf);

    for id in [leaf, mid, root] {
        let dirty = arena
            .with_node::<TestNode, _>(id, |node| node.needs_layout())
            .expect("node exists");
        assert!(dirty, "node {id} should be dirty after bubbling");
    }
}

#[test]
fn bubble_stops_at_already_dirty_ancestor() {
    let mut arena = NodeArena::new();
    let root = arena.create(Box::new(TestNode::new()));
    let mid = arena.create(Box::new(TestNode::new()));
    let leaf = arena.create(Box::new(TestNode::new()));
    attach(&mut arena, root, mid);
    attach(&mut arena, mid, leaf);

    // Pre-dirty the middle node; the walk must stop there without touching
    // the root.
    arena
        .with_node::<TestNode, _>(mid, |node| node.mark_needs_layout())
        .unwrap();
    bubble_layout_dirty(&mut arena, leaf);

    let root_dirty = arena
        .with_node::<TestNode, _>(root, |node| node.needs_layout())
        .unwrap();
    assert!(!root_dirty, "bubbling should early-exit at dirty ancestor");
}

#[test]
fn bubble_from_root_marks_root() {
    let mut arena = NodeArena::new();
    let root = arena.create(Box::new(TestNode::new()));
    bubble_layout_dirty(&mut arena, root);
    let dirty = arena
        .with_node::<TestNode, _>(root, |node| node.needs_layout())
        .unwrap();
    assert!(dirty);
}

#[test]
fn dump_tree_lists_children_indented() {
    let mut arena = NodeArena::new();
    let root = arena.create(Box::new(TestNode::new()));
    let child = arena.create(Box::new(TestNode::new()));
    attach(&mut arena, root, child);

    let dump = arena.dump_tree(Some(root));
    assert!(dump.contains(&format!("[{root}]")));
    assert!(dump.contains(&format!("  [{child}]")));
}
