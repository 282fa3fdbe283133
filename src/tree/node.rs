//! AVL node and the rotations that keep it balanced.
//!
//! Nodes are never mutated once they are wrapped in an `Arc`. Every
//! structural change builds fresh nodes along the affected path and shares
//! everything else with the previous version.

use std::sync::Arc;

/// Shared child pointer. `None` is the empty sentinel.
pub(crate) type Link<V> = Option<Arc<Node<V>>>;

/// Internal node of an [`IntTree`](super::IntTree).
#[derive(Clone)]
pub(crate) struct Node<V> {
    pub(crate) key: i32,
    pub(crate) value: V,
    pub(crate) height: i32,
    pub(crate) left: Link<V>,
    pub(crate) right: Link<V>,
}

/// Height of an optional subtree; the empty subtree has height 0.
#[inline]
pub(crate) fn height<V>(link: Option<&Arc<Node<V>>>) -> i32 {
    link.map_or(0, |node| node.height)
}

impl<V> Node<V> {
    /// Creates a node and derives its height from the children.
    pub(crate) fn new(key: i32, value: V, left: Link<V>, right: Link<V>) -> Self {
        let height = 1 + height(left.as_ref()).max(height(right.as_ref()));
        Self {
            key,
            value,
            height,
            left,
            right,
        }
    }

    /// Creates a node with no children.
    pub(crate) const fn leaf(key: i32, value: V) -> Self {
        Self {
            key,
            value,
            height: 1,
            left: None,
            right: None,
        }
    }

    /// Left height minus right height.
    #[inline]
    pub(crate) fn balance_factor(&self) -> i32 {
        height(self.left.as_ref()) - height(self.right.as_ref())
    }
}

impl<V: Clone> Node<V> {
    /// Copies this node with a replaced value. Shape and height are kept.
    pub(crate) fn with_value(&self, value: V) -> Self {
        Self {
            key: self.key,
            value,
            height: self.height,
            left: self.left.clone(),
            right: self.right.clone(),
        }
    }

    /// Copies this node with a new left child.
    pub(crate) fn with_left(&self, left: Link<V>) -> Self {
        Self::new(self.key, self.value.clone(), left, self.right.clone())
    }

    /// Copies this node with a new right child.
    pub(crate) fn with_right(&self, right: Link<V>) -> Self {
        Self::new(self.key, self.value.clone(), self.left.clone(), right)
    }
}

// =============================================================================
// Rotations
// =============================================================================

/// Restores the AVL invariant at `node` after one of its subtrees grew by one.
///
/// Both children must already be balanced. Nodes that are not shared with
/// another version (the freshly copied insertion path) are unwrapped rather
/// than cloned.
pub(crate) fn rebalance<V: Clone>(node: Node<V>) -> Node<V> {
    let factor = node.balance_factor();

    if factor > 1 {
        // Left-Right: the heavy child leans the other way.
        if node.left.as_ref().is_some_and(|left| left.balance_factor() < 0) {
            let Node {
                key,
                value,
                left,
                right,
                ..
            } = node;
            let left = left.map(|left| Arc::new(rotate_left(Arc::unwrap_or_clone(left))));
            return rotate_right(Node::new(key, value, left, right));
        }
        // Left-Left
        return rotate_right(node);
    }

    if factor < -1 {
        // Right-Left
        if node.right.as_ref().is_some_and(|right| right.balance_factor() > 0) {
            let Node {
                key,
                value,
                left,
                right,
                ..
            } = node;
            let right = right.map(|right| Arc::new(rotate_right(Arc::unwrap_or_clone(right))));
            return rotate_left(Node::new(key, value, left, right));
        }
        // Right-Right
        return rotate_left(node);
    }

    node
}

/// Lifts the left child above `node`.
fn rotate_right<V: Clone>(node: Node<V>) -> Node<V> {
    let Node {
        key,
        value,
        left,
        right,
        ..
    } = node;

    match left {
        Some(pivot) => {
            let Node {
                key: pivot_key,
                value: pivot_value,
                left: pivot_left,
                right: pivot_right,
                ..
            } = Arc::unwrap_or_clone(pivot);
            let lowered = Node::new(key, value, pivot_right, right);
            Node::new(pivot_key, pivot_value, pivot_left, Some(Arc::new(lowered)))
        }
        None => Node::new(key, value, None, right),
    }
}

/// Lifts the right child above `node`.
fn rotate_left<V: Clone>(node: Node<V>) -> Node<V> {
    let Node {
        key,
        value,
        left,
        right,
        ..
    } = node;

    match right {
        Some(pivot) => {
            let Node {
                key: pivot_key,
                value: pivot_value,
                left: pivot_left,
                right: pivot_right,
                ..
            } = Arc::unwrap_or_clone(pivot);
            let lowered = Node::new(key, value, left, pivot_left);
            Node::new(pivot_key, pivot_value, Some(Arc::new(lowered)), pivot_right)
        }
        None => Node::new(key, value, left, None),
    }
}
