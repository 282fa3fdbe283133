//! Structural validation for [`IntTree`](super::IntTree).

use std::fmt;
use std::sync::Arc;

use super::node::{Node, height};

/// A structural invariant that a tree failed to uphold.
///
/// Returned by [`IntTree::check_invariants`](super::IntTree::check_invariants).
/// A tree built only through the public API never produces one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvariantError {
    /// A key sits on the wrong side of one of its ancestors.
    OutOfOrder {
        /// The misplaced key.
        key: i32,
    },
    /// Sibling subtree heights differ by more than one.
    Unbalanced {
        /// Key of the unbalanced node.
        key: i32,
        /// Height of the left subtree.
        left_height: i32,
        /// Height of the right subtree.
        right_height: i32,
    },
    /// A node's cached height disagrees with its children.
    HeightMismatch {
        /// Key of the offending node.
        key: i32,
        /// Height stored in the node.
        recorded: i32,
        /// Height derived from the children.
        computed: i32,
    },
    /// The cached entry count disagrees with the number of nodes.
    LengthMismatch {
        /// Count stored in the tree handle.
        recorded: usize,
        /// Nodes actually reachable from the root.
        counted: usize,
    },
}

impl fmt::Display for InvariantError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfOrder { key } => {
                write!(formatter, "key {key} violates search order")
            }
            Self::Unbalanced {
                key,
                left_height,
                right_height,
            } => write!(
                formatter,
                "node {key} is unbalanced (left height {left_height}, right height {right_height})"
            ),
            Self::HeightMismatch {
                key,
                recorded,
                computed,
            } => write!(
                formatter,
                "node {key} records height {recorded} but its children give {computed}"
            ),
            Self::LengthMismatch { recorded, counted } => write!(
                formatter,
                "tree records {recorded} entries but {counted} are reachable"
            ),
        }
    }
}

impl std::error::Error for InvariantError {}

/// Walks the subtree checking order, balance and heights.
///
/// `lower` and `upper` are exclusive bounds inherited from ancestors.
/// Returns the number of nodes visited.
pub(crate) fn check_subtree<V>(
    link: Option<&Arc<Node<V>>>,
    lower: Option<i32>,
    upper: Option<i32>,
) -> Result<usize, InvariantError> {
    let Some(node) = link else {
        return Ok(0);
    };

    if lower.is_some_and(|bound| node.key <= bound) || upper.is_some_and(|bound| node.key >= bound)
    {
        return Err(InvariantError::OutOfOrder { key: node.key });
    }

    let left_height = height(node.left.as_ref());
    let right_height = height(node.right.as_ref());

    if (left_height - right_height).abs() > 1 {
        return Err(InvariantError::Unbalanced {
            key: node.key,
            left_height,
            right_height,
        });
    }

    let computed = 1 + left_height.max(right_height);
    if node.height != computed {
        return Err(InvariantError::HeightMismatch {
            key: node.key,
            recorded: node.height,
            computed,
        });
    }

    let left_count = check_subtree(node.left.as_ref(), lower, Some(node.key))?;
    let right_count = check_subtree(node.right.as_ref(), Some(node.key), upper)?;
    Ok(left_count + right_count + 1)
}
