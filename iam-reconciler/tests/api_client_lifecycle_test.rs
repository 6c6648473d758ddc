mod common;

use chrono::{TimeZone, Utc};
use iam_core::client::{AccessLevel, ApiAccessEntry, CredentialStatus};
use iam_reconciler::models::{ApiAccess, CredentialConfig, PurgeOptions};
use iam_reconciler::services::mock::DEFAULT_NOTIFICATION_EMAIL;
use iam_reconciler::services::validation::{APIS_FORBIDDEN, UNLOCK_FIRST};
use iam_reconciler::services::{
    ApiClientReconciler, MockFailure, MockIdentityService, ReconcileError, RemoteCall,
};
use secrecy::ExposeSecret;
use std::sync::Arc;
use tokio_test::{assert_err, assert_ok};

use common::{api_client_config, grant_chain, node_chain, reconciler};

#[tokio::test]
async fn test_create_exposes_nested_groups() {
    let (mock, reconciler) = reconciler();

    let state = assert_ok!(reconciler.create(&api_client_config()).await);

    let groups = &state.group_access.groups;
    assert_eq!(groups[0].group_id, 123);
    assert_eq!(groups[0].role_id, Some(340));
    assert_eq!(groups[0].sub_groups[0].group_id, 333);
    assert_eq!(groups[0].sub_groups[0].role_id, Some(540));
    assert_eq!(groups[0].group_name.as_deref(), Some("group-123"));

    assert_eq!(
        mock.operations(),
        vec!["create_api_client", "update_api_client", "get_api_client"]
    );
}

#[tokio::test]
async fn test_create_overrides_default_notification_email() {
    let (mock, reconciler) = reconciler();

    let state = reconciler.create(&api_client_config()).await.unwrap();
    assert!(state.notification_emails.is_empty());

    let created = match &mock.calls()[0] {
        RemoteCall::CreateApiClient(request) => request.clone(),
        other => panic!("unexpected first call: {:?}", other),
    };
    assert_eq!(created.create_credential, Some(true));
    assert!(created.notification_emails.is_empty());
    assert!(mock.client().unwrap().notification_emails.is_empty());
    assert_ne!(
        state.notification_emails,
        vec![DEFAULT_NOTIFICATION_EMAIL.to_string()]
    );
}

#[tokio::test]
async fn test_create_with_emails_skips_follow_up_update() {
    let (mock, reconciler) = reconciler();
    let mut config = api_client_config();
    config.notification_emails = vec!["ops@example.com".to_string()];

    let state = reconciler.create(&config).await.unwrap();

    assert_eq!(state.notification_emails, vec!["ops@example.com"]);
    assert_eq!(mock.operations(), vec!["create_api_client", "get_api_client"]);
}

#[tokio::test]
async fn test_create_keeps_issued_secret() {
    let (_mock, reconciler) = reconciler();

    let state = reconciler.create(&api_client_config()).await.unwrap();

    let credential = state.credential.unwrap();
    assert_eq!(credential.credential_id, 1001);
    assert_eq!(credential.status, CredentialStatus::Active);
    assert_eq!(credential.client_secret.unwrap().expose_secret(), "secret-1");
}

#[tokio::test]
async fn test_create_locked_issues_separate_lock() {
    let (mock, reconciler) = reconciler();
    let mut config = api_client_config();
    config.lock = true;

    let state = reconciler.create(&config).await.unwrap();

    assert!(state.lock);
    assert_eq!(
        mock.operations(),
        vec![
            "create_api_client",
            "update_api_client",
            "lock_api_client",
            "get_api_client"
        ]
    );
}

#[tokio::test]
async fn test_create_rejects_deep_groups_before_any_call() {
    let (mock, reconciler) = reconciler();
    let mut config = api_client_config();
    config.group_access.groups = grant_chain(51);

    let err = assert_err!(reconciler.create(&config).await);

    assert!(matches!(err, ReconcileError::DepthExceeded(_)));
    assert_eq!(err.to_string(), "unsupported subgroup depth");
    assert!(mock.writes().is_empty());
    assert!(mock.calls().is_empty());
}

#[tokio::test]
async fn test_create_accepts_fifty_levels() {
    let (_mock, reconciler) = reconciler();
    let mut config = api_client_config();
    config.group_access.groups = grant_chain(50);

    let state = reconciler.create(&config).await.unwrap();
    assert_eq!(state.group_access.groups.depth(), 50);
}

#[tokio::test]
async fn test_create_rejects_invalid_config_before_any_call() {
    let (mock, reconciler) = reconciler();
    let mut config = api_client_config();
    config.api_access.all_accessible_apis = true;
    config.purge_options = Some(PurgeOptions::default());

    let err = reconciler.create(&config).await.unwrap_err();

    assert!(err.is_validation());
    assert_eq!(err.to_string(), APIS_FORBIDDEN);
    assert!(mock.calls().is_empty());
}

#[tokio::test]
async fn test_all_accessible_apis_read_back_from_catalog() {
    let mock = Arc::new(MockIdentityService::new().with_api_catalog(vec![ApiAccessEntry {
        api_id: 1,
        access_level: AccessLevel::ReadOnly,
        api_name: Some("Identity Management".to_string()),
        description: None,
        documentation_url: None,
        endpoint: Some("/identity-management".to_string()),
    }]));
    let reconciler = ApiClientReconciler::new(mock.clone());
    let mut config = api_client_config();
    config.api_access.all_accessible_apis = true;
    config.api_access.apis.clear();
    config.purge_options = Some(PurgeOptions::default());

    let state = reconciler.create(&config).await.unwrap();

    assert_eq!(state.api_access.apis.len(), 1);
    assert_eq!(
        state.api_access.apis[0].api_name.as_deref(),
        Some("Identity Management")
    );

    // The catalog is informational; re-applying the same config changes nothing.
    mock.clear_calls();
    reconciler.update(&state, &config).await.unwrap();
    assert!(mock.writes().is_empty());
}

#[tokio::test]
async fn test_create_stops_at_first_failure() {
    let (mock, reconciler) = reconciler();
    mock.fail_on("lock_api_client", MockFailure::Unavailable);
    let mut config = api_client_config();
    config.lock = true;

    let err = reconciler.create(&config).await.unwrap_err();

    assert!(matches!(
        err,
        ReconcileError::RemoteCall {
            operation: "lock_api_client",
            ..
        }
    ));
    assert_eq!(mock.operations().last(), Some(&"lock_api_client"));
    assert!(mock.client().is_some());
}

#[tokio::test]
async fn test_update_lock_only_issues_single_lock() {
    let (mock, reconciler) = reconciler();
    let state = reconciler.create(&api_client_config()).await.unwrap();
    mock.clear_calls();

    let mut desired = api_client_config();
    desired.lock = true;
    let updated = reconciler.update(&state, &desired).await.unwrap();

    assert!(updated.lock);
    assert_eq!(
        mock.writes(),
        vec![RemoteCall::LockApiClient(state.client_id.clone())]
    );
    assert_eq!(mock.operations(), vec!["lock_api_client", "get_api_client"]);
}

#[tokio::test]
async fn test_update_unlocks_before_changing_fields() {
    let (mock, reconciler) = reconciler();
    let mut config = api_client_config();
    config.lock = true;
    let state = reconciler.create(&config).await.unwrap();
    mock.clear_calls();

    let mut desired = api_client_config();
    desired.client_description = Some("now unlocked".to_string());
    let updated = reconciler.update(&state, &desired).await.unwrap();

    assert!(!updated.lock);
    assert_eq!(updated.client_description.as_deref(), Some("now unlocked"));
    assert_eq!(
        mock.operations(),
        vec!["unlock_api_client", "update_api_client", "get_api_client"]
    );
}

#[tokio::test]
async fn test_update_locks_after_changing_fields() {
    let (mock, reconciler) = reconciler();
    let state = reconciler.create(&api_client_config()).await.unwrap();
    mock.clear_calls();

    let mut desired = api_client_config();
    desired.lock = true;
    desired.api_access.apis.push(ApiAccess::new(6000, AccessLevel::ReadOnly));
    let updated = reconciler.update(&state, &desired).await.unwrap();

    assert!(updated.lock);
    assert_eq!(updated.api_access.apis.len(), 2);
    assert_eq!(
        mock.operations(),
        vec!["update_api_client", "lock_api_client", "get_api_client"]
    );
}

#[tokio::test]
async fn test_update_rejects_changes_while_locked() {
    let (mock, reconciler) = reconciler();
    let mut config = api_client_config();
    config.lock = true;
    let state = reconciler.create(&config).await.unwrap();
    mock.clear_calls();

    config.client_name = Some("renamed".to_string());
    let err = reconciler.update(&state, &config).await.unwrap_err();

    assert_eq!(err.to_string(), UNLOCK_FIRST);
    assert!(mock.calls().is_empty());
}

#[tokio::test]
async fn test_update_credential_only_keeps_secret() {
    let (mock, reconciler) = reconciler();
    let state = reconciler.create(&api_client_config()).await.unwrap();
    let credential_id = state.credential_id().unwrap();
    mock.clear_calls();

    let expires_on = Utc.with_ymd_and_hms(2030, 6, 30, 0, 0, 0).unwrap();
    let mut desired = api_client_config();
    desired.credential = Some(CredentialConfig {
        description: Some("rotated by pipeline".to_string()),
        expires_on: Some(expires_on),
        status: None,
    });
    let updated = reconciler.update(&state, &desired).await.unwrap();

    let writes = mock.writes();
    assert_eq!(writes.len(), 1);
    match &writes[0] {
        RemoteCall::UpdateCredential {
            credential_id: id,
            request,
            ..
        } => {
            assert_eq!(*id, credential_id);
            assert_eq!(request.description.as_deref(), Some("rotated by pipeline"));
            assert_eq!(request.expires_on, expires_on);
            assert_eq!(request.status, CredentialStatus::Active);
        }
        other => panic!("unexpected write: {:?}", other),
    }

    let credential = updated.credential.unwrap();
    assert_eq!(credential.credential_id, credential_id);
    assert_eq!(credential.expires_on, expires_on);
    assert_eq!(credential.client_secret.unwrap().expose_secret(), "secret-1");
}

#[tokio::test]
async fn test_update_without_changes_only_reads() {
    let (mock, reconciler) = reconciler();
    let state = reconciler.create(&api_client_config()).await.unwrap();
    mock.clear_calls();

    reconciler.update(&state, &api_client_config()).await.unwrap();

    assert_eq!(mock.operations(), vec!["get_api_client"]);
}

#[tokio::test]
async fn test_read_returns_none_when_gone() {
    let (mock, reconciler) = reconciler();
    let state = reconciler.create(&api_client_config()).await.unwrap();
    reconciler.delete(&state).await.unwrap();
    assert!(mock.client().is_none());

    let refreshed = reconciler.read(&state).await.unwrap();
    assert!(refreshed.is_none());
}

#[tokio::test]
async fn test_read_drops_secret_on_drift() {
    let (mock, reconciler) = reconciler();
    let state = reconciler.create(&api_client_config()).await.unwrap();

    let mut replacement = mock.client().unwrap().credentials[0].clone();
    replacement.credential_id = 4242;
    mock.set_credentials(vec![replacement]);

    let refreshed = reconciler.read(&state).await.unwrap().unwrap();
    let credential = refreshed.credential.unwrap();
    assert_eq!(credential.credential_id, 4242);
    assert!(credential.client_secret.is_none());
}

#[tokio::test]
async fn test_read_without_credentials_fails() {
    let (mock, reconciler) = reconciler();
    let state = reconciler.create(&api_client_config()).await.unwrap();
    mock.set_credentials(vec![]);

    let err = reconciler.read(&state).await.unwrap_err();
    assert!(matches!(err, ReconcileError::NoCredentialsFound { .. }));
}

#[tokio::test]
async fn test_read_rejects_groups_beyond_depth_limit() {
    let (mock, reconciler) = reconciler();
    let state = reconciler.create(&api_client_config()).await.unwrap();

    let mut fetched = mock.client().unwrap();
    fetched.group_access.groups = node_chain(51);
    let reconciler = ApiClientReconciler::new(Arc::new(
        MockIdentityService::new().with_client(fetched),
    ));

    let err = reconciler.read(&state).await.unwrap_err();
    assert!(matches!(err, ReconcileError::DepthExceeded(_)));
    assert_eq!(err.to_string(), "unsupported subgroup depth");
}

#[tokio::test]
async fn test_import_leaves_secret_unknown() {
    let (_mock, reconciler) = reconciler();
    let created = reconciler.create(&api_client_config()).await.unwrap();

    let imported = reconciler.import(&created.client_id).await.unwrap();

    assert_eq!(imported.client_id, created.client_id);
    assert_eq!(imported.group_access.groups, created.group_access.groups);
    let credential = imported.credential.unwrap();
    assert_eq!(credential.credential_id, 1001);
    assert!(credential.client_secret.is_none());
}

#[tokio::test]
async fn test_import_missing_client_fails() {
    let (_mock, reconciler) = reconciler();
    let err = reconciler.import("missing").await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_delete_deactivates_then_deletes() {
    let (mock, reconciler) = reconciler();
    let state = reconciler.create(&api_client_config()).await.unwrap();
    mock.clear_calls();

    reconciler.delete(&state).await.unwrap();

    assert_eq!(
        mock.writes(),
        vec![
            RemoteCall::DeactivateCredential {
                client_id: state.client_id.clone(),
                credential_id: 1001,
            },
            RemoteCall::DeleteApiClient(state.client_id.clone()),
        ]
    );
}

#[tokio::test]
async fn test_delete_skips_inactive_credential() {
    let (mock, reconciler) = reconciler();
    let mut state = reconciler.create(&api_client_config()).await.unwrap();
    if let Some(credential) = state.credential.as_mut() {
        credential.status = CredentialStatus::Inactive;
    }
    mock.clear_calls();

    reconciler.delete(&state).await.unwrap();

    assert_eq!(mock.operations(), vec!["delete_api_client"]);
}

#[tokio::test]
async fn test_delete_tolerates_deactivation_failure() {
    let (mock, reconciler) = reconciler();
    let state = reconciler.create(&api_client_config()).await.unwrap();
    mock.fail_on(
        "deactivate_credential",
        MockFailure::BadRequest("credential is already inactive".to_string()),
    );

    assert_ok!(reconciler.delete(&state).await);
    assert!(mock.client().is_none());
}

#[tokio::test]
async fn test_delete_failure_is_surfaced() {
    let (mock, reconciler) = reconciler();
    let state = reconciler.create(&api_client_config()).await.unwrap();
    mock.fail_on("deactivate_credential", MockFailure::Unavailable);
    mock.fail_on(
        "delete_api_client",
        MockFailure::Conflict("client has dependants".to_string()),
    );

    let err = reconciler.delete(&state).await.unwrap_err();

    assert!(matches!(
        err,
        ReconcileError::RemoteCall {
            operation: "delete_api_client",
            ..
        }
    ));
}
