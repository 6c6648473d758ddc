//! Fixtures shared by the iam-reconciler integration tests.

#![allow(dead_code)]

use iam_core::client::{AccessLevel, ClientType, GrantNode};
use iam_reconciler::models::{
    ApiAccess, ApiAccessConfig, ApiClientConfig, GroupAccessConfig, GroupGrant,
};
use iam_reconciler::services::{ApiClientReconciler, GrantReader, MockIdentityService};
use std::sync::Arc;

pub fn api_client_config() -> ApiClientConfig {
    ApiClientConfig {
        authorized_users: vec!["jdoe".to_string()],
        client_type: ClientType::Client,
        client_name: Some("deploy-pipeline".to_string()),
        client_description: Some("CI deploys".to_string()),
        allow_account_switch: false,
        can_auto_create_credential: false,
        notification_emails: vec![],
        api_access: ApiAccessConfig {
            all_accessible_apis: false,
            apis: vec![ApiAccess::new(5801, AccessLevel::ReadWrite)],
        },
        group_access: GroupAccessConfig {
            clone_authorized_user_groups: false,
            groups: vec![
                GroupGrant::new(123, Some(340))
                    .with_sub_groups(vec![GroupGrant::new(333, Some(540))]),
            ],
        },
        purge_options: None,
        ip_acl: None,
        lock: false,
        credential: None,
    }
}

/// A single-branch grant chain `depth` levels deep.
pub fn grant_chain(depth: usize) -> Vec<GroupGrant> {
    let mut grants = Vec::new();
    for level in (1..=depth).rev() {
        grants = vec![GroupGrant::new(level as i64, Some(1)).with_sub_groups(grants)];
    }
    grants
}

pub fn node_chain(depth: usize) -> Vec<GrantNode> {
    let mut nodes = Vec::new();
    for level in (1..=depth).rev() {
        nodes = vec![GrantNode {
            group_id: level as i64,
            group_name: Some(format!("group-{}", level)),
            role_id: Some(1),
            sub_groups: nodes,
            ..Default::default()
        }];
    }
    nodes
}

pub fn reconciler() -> (Arc<MockIdentityService>, ApiClientReconciler) {
    let mock = Arc::new(MockIdentityService::new());
    let reconciler = ApiClientReconciler::new(mock.clone());
    (mock, reconciler)
}

pub fn reader(mock: MockIdentityService) -> (Arc<MockIdentityService>, GrantReader) {
    let mock = Arc::new(mock);
    let reader = GrantReader::new(mock.clone());
    (mock, reader)
}
