//! Group and auth-grant attribute trees.

use serde::{Deserialize, Serialize};
use std::ops::Deref;

use crate::codec::{DepthExceeded, DepthGuard, MAX_GRANT_DEPTH};

/// One entry of a group access list or auth-grant tree.
///
/// `group_id`, `role_id` and `is_blocked` are declared by the operator; the
/// names, description and parent are filled in by the server.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct GroupGrant {
    pub group_id: i64,
    #[serde(default)]
    pub role_id: Option<i64>,
    #[serde(default)]
    pub is_blocked: bool,
    #[serde(default)]
    pub group_name: Option<String>,
    #[serde(default)]
    pub parent_group_id: Option<i64>,
    #[serde(default)]
    pub role_name: Option<String>,
    #[serde(default)]
    pub role_description: Option<String>,
    #[serde(default)]
    pub sub_groups: Vec<GroupGrant>,
}

impl GroupGrant {
    pub fn new(group_id: i64, role_id: Option<i64>) -> Self {
        Self {
            group_id,
            role_id,
            ..Default::default()
        }
    }

    pub fn with_sub_groups(mut self, sub_groups: Vec<GroupGrant>) -> Self {
        self.sub_groups = sub_groups;
        self
    }

    /// Drop the server-derived fields of this entry, keeping what the
    /// operator declares.
    pub fn clear_server_fields(&mut self) {
        self.group_name = None;
        self.parent_group_id = None;
        self.role_description = None;
    }
}

/// A grant tree at most `D` levels deep.
///
/// The bound is checked on construction and on deserialization, so a value
/// of this type always fits the nested attribute layout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<GroupGrant>", into = "Vec<GroupGrant>")]
pub struct BoundedGrants<const D: usize>(Vec<GroupGrant>);

/// The grant tree shape shared by every resource and listing.
pub type GrantTree = BoundedGrants<MAX_GRANT_DEPTH>;

impl<const D: usize> BoundedGrants<D> {
    pub fn new(grants: Vec<GroupGrant>) -> Result<Self, DepthExceeded> {
        DepthGuard::new(D).check(&grants)?;
        Ok(Self(grants))
    }

    pub fn empty() -> Self {
        Self(Vec::new())
    }

    /// Wrap a tree already known to fit, e.g. the output of a decode.
    pub(crate) fn from_trusted(grants: Vec<GroupGrant>) -> Self {
        debug_assert!(DepthGuard::depth(&grants) <= D);
        Self(grants)
    }

    pub fn depth(&self) -> usize {
        DepthGuard::depth(&self.0)
    }

    pub fn into_inner(self) -> Vec<GroupGrant> {
        self.0
    }
}

impl<const D: usize> Deref for BoundedGrants<D> {
    type Target = [GroupGrant];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<const D: usize> TryFrom<Vec<GroupGrant>> for BoundedGrants<D> {
    type Error = DepthExceeded;

    fn try_from(grants: Vec<GroupGrant>) -> Result<Self, Self::Error> {
        Self::new(grants)
    }
}

impl<const D: usize> From<BoundedGrants<D>> for Vec<GroupGrant> {
    fn from(grants: BoundedGrants<D>) -> Self {
        grants.0
    }
}
