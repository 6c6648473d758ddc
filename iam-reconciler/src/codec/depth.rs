//! Depth policy for group and auth-grant trees.

use iam_core::client::GrantNode;
use thiserror::Error;

use crate::models::GroupGrant;

/// Deepest grant tree the server hands out, and the bound of every attribute
/// tree in this crate.
pub const MAX_GRANT_DEPTH: usize = 50;

/// Operator-facing message for trees deeper than the bound.
pub const DEPTH_EXCEEDED_MESSAGE: &str = "unsupported subgroup depth";

/// A tree was deeper than the configured bound.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("unsupported subgroup depth")]
pub struct DepthExceeded {
    pub depth: usize,
    pub limit: usize,
}

/// A node with an ordered list of children.
pub trait TreeNode: Sized {
    fn children(&self) -> &[Self];
}

impl TreeNode for GrantNode {
    fn children(&self) -> &[Self] {
        &self.sub_groups
    }
}

impl TreeNode for GroupGrant {
    fn children(&self) -> &[Self] {
        &self.sub_groups
    }
}

/// Rejects trees deeper than `limit` levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepthGuard {
    limit: usize,
}

impl Default for DepthGuard {
    fn default() -> Self {
        Self::new(MAX_GRANT_DEPTH)
    }
}

impl DepthGuard {
    pub const fn new(limit: usize) -> Self {
        Self { limit }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Number of levels in the tree: 0 for an empty list, 1 for a flat one.
    ///
    /// Walks with an explicit stack; server input has no depth bound yet.
    pub fn depth<T: TreeNode>(nodes: &[T]) -> usize {
        let mut max = 0;
        let mut stack: Vec<(&T, usize)> = nodes.iter().map(|node| (node, 1)).collect();

        while let Some((node, level)) = stack.pop() {
            max = max.max(level);
            stack.extend(node.children().iter().map(|child| (child, level + 1)));
        }

        max
    }

    pub fn check<T: TreeNode>(&self, nodes: &[T]) -> Result<(), DepthExceeded> {
        let depth = Self::depth(nodes);
        if depth > self.limit {
            tracing::warn!(depth, limit = self.limit, "{}", DEPTH_EXCEEDED_MESSAGE);
            return Err(DepthExceeded {
                depth,
                limit: self.limit,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain(depth: usize) -> Vec<GrantNode> {
        let mut nodes = Vec::new();
        for level in (1..=depth).rev() {
            nodes = vec![GrantNode {
                group_id: level as i64,
                sub_groups: nodes,
                ..Default::default()
            }];
        }
        nodes
    }

    #[test]
    fn test_depth_of_empty_and_flat_lists() {
        assert_eq!(DepthGuard::depth::<GrantNode>(&[]), 0);
        let flat = vec![
            GrantNode {
                group_id: 1,
                ..Default::default()
            },
            GrantNode {
                group_id: 2,
                sub_groups: vec![],
                ..Default::default()
            },
        ];
        assert_eq!(DepthGuard::depth(&flat), 1);
    }

    #[test]
    fn test_depth_takes_deepest_branch() {
        let mut tree = chain(3);
        tree.push(GrantNode {
            group_id: 99,
            ..Default::default()
        });
        assert_eq!(DepthGuard::depth(&tree), 3);
    }

    #[test]
    fn test_limit_is_inclusive() {
        let guard = DepthGuard::default();
        assert!(guard.check(&chain(MAX_GRANT_DEPTH)).is_ok());

        let err = guard.check(&chain(MAX_GRANT_DEPTH + 1)).unwrap_err();
        assert_eq!(err.to_string(), "unsupported subgroup depth");
        assert_eq!(err.depth, 51);
        assert_eq!(err.limit, 50);
    }

    #[test]
    fn test_very_deep_server_tree_does_not_overflow() {
        let guard = DepthGuard::default();
        let err = guard.check(&chain(2_000)).unwrap_err();
        assert_eq!(err.depth, 2_000);
    }
}
