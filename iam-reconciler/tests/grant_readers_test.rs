mod common;

use iam_core::client::GrantNode;
use iam_reconciler::codec::MAX_GRANT_DEPTH;
use iam_reconciler::models::GroupGrant;
use iam_reconciler::services::{MockIdentityService, ReconcileError, RemoteCall};

use common::{grant_chain, node_chain, reader};

#[tokio::test]
async fn test_groups_at_depth_limit_decode() {
    let (_mock, reader) =
        reader(MockIdentityService::new().with_groups(node_chain(MAX_GRANT_DEPTH)));

    let groups = reader.groups().await.unwrap();

    assert_eq!(groups.depth(), MAX_GRANT_DEPTH);
    assert_eq!(groups[0].group_name.as_deref(), Some("group-1"));
}

#[tokio::test]
async fn test_groups_beyond_depth_limit_fail() {
    let (_mock, reader) =
        reader(MockIdentityService::new().with_groups(node_chain(MAX_GRANT_DEPTH + 1)));

    let err = reader.groups().await.unwrap_err();

    assert!(matches!(err, ReconcileError::DepthExceeded(_)));
    assert_eq!(err.to_string(), "unsupported subgroup depth");
}

#[tokio::test]
async fn test_accessible_groups_preserve_order() {
    let nodes = vec![
        GrantNode {
            group_id: 20,
            ..Default::default()
        },
        GrantNode {
            group_id: 10,
            sub_groups: vec![GrantNode {
                group_id: 11,
                ..Default::default()
            }],
            ..Default::default()
        },
    ];
    let (mock, reader) = reader(MockIdentityService::new().with_groups(nodes));

    let groups = reader.accessible_groups("jdoe").await.unwrap();

    let ids: Vec<i64> = groups.iter().map(|g| g.group_id).collect();
    assert_eq!(ids, vec![20, 10]);
    assert_eq!(groups[1].sub_groups[0].group_id, 11);
    assert_eq!(
        mock.calls(),
        vec![RemoteCall::ListAccessibleGroups("jdoe".to_string())]
    );
}

#[tokio::test]
async fn test_empty_listing_is_empty_tree() {
    let (_mock, reader) = reader(MockIdentityService::new());
    let groups = reader.groups().await.unwrap();
    assert!(groups.is_empty());
    assert_eq!(groups.depth(), 0);
}

#[tokio::test]
async fn test_user_auth_grants_round_trip() {
    let (mock, reader) = reader(MockIdentityService::new().with_auth_grants("ui-1", vec![]));

    let mut blocked = GroupGrant::new(18, Some(3));
    blocked.is_blocked = true;
    let grants = vec![GroupGrant::new(17, Some(2)).with_sub_groups(vec![blocked])];

    let written = reader
        .update_user_auth_grants("ui-1", grants)
        .await
        .unwrap();
    assert!(written[0].sub_groups[0].is_blocked);

    let read = reader.user_auth_grants("ui-1").await.unwrap();
    assert_eq!(read, written);
    assert_eq!(read[0].group_id, 17);
    assert_eq!(read[0].sub_groups[0].parent_group_id, Some(17));
    assert_eq!(
        mock.operations(),
        vec!["update_user_auth_grants", "get_user_auth_grants"]
    );
}

#[tokio::test]
async fn test_deep_auth_grants_rejected_before_write() {
    let (mock, reader) = reader(MockIdentityService::new().with_auth_grants("ui-1", vec![]));

    let err = reader
        .update_user_auth_grants("ui-1", grant_chain(MAX_GRANT_DEPTH + 1))
        .await
        .unwrap_err();

    assert!(matches!(err, ReconcileError::DepthExceeded(_)));
    assert!(mock.calls().is_empty());
}

#[tokio::test]
async fn test_unknown_user_surfaces_remote_error() {
    let (_mock, reader) = reader(MockIdentityService::new());

    let err = reader.user_auth_grants("nobody").await.unwrap_err();

    assert!(err.is_not_found());
    assert!(err.to_string().starts_with("get_user_auth_grants failed"));
}
