//! Group listings and user auth grants as bounded trees.

use iam_core::client::GrantNode;
use std::sync::Arc;
use tracing::instrument;

use super::error::ReconcileError;
use super::metrics::remote_call;
use super::remote::IdentityService;
use crate::codec::GrantTreeCodec;
use crate::models::{GrantTree, GroupGrant};

pub struct GrantReader {
    service: Arc<dyn IdentityService>,
}

impl GrantReader {
    pub fn new(service: Arc<dyn IdentityService>) -> Self {
        Self { service }
    }

    /// The account's group tree.
    #[instrument(skip(self))]
    pub async fn groups(&self) -> Result<GrantTree, ReconcileError> {
        let nodes = remote_call("list_groups", self.service.list_groups()).await?;
        decode("list_groups", &nodes)
    }

    /// Groups `username` can hand out to an API client.
    #[instrument(skip(self))]
    pub async fn accessible_groups(&self, username: &str) -> Result<GrantTree, ReconcileError> {
        let nodes = remote_call(
            "list_accessible_groups",
            self.service.list_accessible_groups(username),
        )
        .await?;
        decode("list_accessible_groups", &nodes)
    }

    #[instrument(skip(self))]
    pub async fn user_auth_grants(&self, ui_identity_id: &str) -> Result<GrantTree, ReconcileError> {
        let nodes = remote_call(
            "get_user_auth_grants",
            self.service.get_user_auth_grants(ui_identity_id),
        )
        .await?;
        decode("get_user_auth_grants", &nodes)
    }

    /// Replace a user's auth grants. Trees deeper than the bound are rejected
    /// before anything is sent.
    #[instrument(skip(self, grants))]
    pub async fn update_user_auth_grants(
        &self,
        ui_identity_id: &str,
        grants: Vec<GroupGrant>,
    ) -> Result<GrantTree, ReconcileError> {
        let grants = GrantTree::new(grants)?;
        let request = GrantTreeCodec::encode_auth_grants(&grants);
        let nodes = remote_call(
            "update_user_auth_grants",
            self.service.update_user_auth_grants(ui_identity_id, &request),
        )
        .await?;
        tracing::info!(ui_identity_id = %ui_identity_id, "Auth grants updated");
        decode("update_user_auth_grants", &nodes)
    }
}

fn decode(operation: &'static str, nodes: &[GrantNode]) -> Result<GrantTree, ReconcileError> {
    let tree: GrantTree = GrantTreeCodec::decode_checked(nodes)?;
    tracing::debug!(operation, entries = tree.len(), depth = tree.depth(), "Decoded grant tree");
    Ok(tree)
}
