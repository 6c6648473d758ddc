//! Conversion between server grant trees and bounded attribute trees.

use iam_core::client::{AuthGrantRequest, ClientGroupRequest, GrantNode};

use super::depth::{DepthExceeded, DepthGuard};
use crate::models::{BoundedGrants, GroupGrant};

/// Order-preserving codec between [`GrantNode`] lists and [`BoundedGrants`].
pub struct GrantTreeCodec;

impl GrantTreeCodec {
    /// Decode a server tree into a `D`-level attribute tree.
    ///
    /// Entries on level `D` keep their scalar fields but lose any children:
    /// the attribute layout has no room for them. Use [`Self::decode_checked`]
    /// to reject such input instead.
    pub fn decode<const D: usize>(nodes: &[GrantNode]) -> BoundedGrants<D> {
        if D == 0 {
            return BoundedGrants::empty();
        }
        BoundedGrants::from_trusted(decode_level(nodes, D))
    }

    /// Depth-check a freshly fetched tree, then decode it.
    pub fn decode_checked<const D: usize>(
        nodes: &[GrantNode],
    ) -> Result<BoundedGrants<D>, DepthExceeded> {
        DepthGuard::new(D).check(nodes)?;
        Ok(Self::decode(nodes))
    }

    /// Write-significant fields of an API client's group access.
    pub fn encode_group_access<const D: usize>(
        grants: &BoundedGrants<D>,
    ) -> Vec<ClientGroupRequest> {
        encode_group_level(grants)
    }

    /// Write-significant fields of a user's auth grants, blocked flag included.
    pub fn encode_auth_grants<const D: usize>(grants: &BoundedGrants<D>) -> Vec<AuthGrantRequest> {
        encode_auth_level(grants)
    }
}

fn decode_level(nodes: &[GrantNode], remaining: usize) -> Vec<GroupGrant> {
    nodes
        .iter()
        .map(|node| {
            let sub_groups = if remaining > 1 {
                decode_level(&node.sub_groups, remaining - 1)
            } else {
                if !node.sub_groups.is_empty() {
                    tracing::debug!(
                        group_id = node.group_id,
                        dropped = node.sub_groups.len(),
                        "Dropping sub-groups below the deepest attribute level"
                    );
                }
                Vec::new()
            };

            GroupGrant {
                group_id: node.group_id,
                role_id: node.role_id,
                is_blocked: node.is_blocked,
                group_name: node.group_name.clone(),
                parent_group_id: node.parent_group_id,
                role_name: node.role_name.clone(),
                role_description: node.role_description.clone(),
                sub_groups,
            }
        })
        .collect()
}

fn encode_group_level(grants: &[GroupGrant]) -> Vec<ClientGroupRequest> {
    grants
        .iter()
        .map(|grant| ClientGroupRequest {
            group_id: grant.group_id,
            role_id: grant.role_id,
            subgroups: encode_group_level(&grant.sub_groups),
        })
        .collect()
}

fn encode_auth_level(grants: &[GroupGrant]) -> Vec<AuthGrantRequest> {
    grants
        .iter()
        .map(|grant| AuthGrantRequest {
            group_id: grant.group_id,
            role_id: grant.role_id,
            is_blocked: grant.is_blocked,
            sub_groups: encode_auth_level(&grant.sub_groups),
        })
        .collect()
}
