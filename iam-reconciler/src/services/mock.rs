//! In-memory identity service that records every call.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use iam_core::client::{
    ApiAccessEntry, ApiAccessResponse, ApiClientRequest, ApiClientResponse, AuthGrantRequest,
    ClientActionsPayload, ClientGroupRequest, CredentialActionsPayload, CredentialResponse,
    CredentialStatus, GrantNode, GroupAccessResponse, UpdateCredentialRequest,
};
use iam_core::error::AppError;
use secrecy::Secret;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use super::remote::IdentityService;

/// Address the server puts on a new client when no notification email is sent.
pub const DEFAULT_NOTIFICATION_EMAIL: &str = "creator@example.com";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteCall {
    CreateApiClient(ApiClientRequest),
    GetApiClient(String),
    UpdateApiClient(String, ApiClientRequest),
    DeleteApiClient(String),
    LockApiClient(String),
    UnlockApiClient(String),
    UpdateCredential {
        client_id: String,
        credential_id: i64,
        request: UpdateCredentialRequest,
    },
    DeactivateCredential {
        client_id: String,
        credential_id: i64,
    },
    ListGroups,
    ListAccessibleGroups(String),
    GetUserAuthGrants(String),
    UpdateUserAuthGrants(String, Vec<AuthGrantRequest>),
}

impl RemoteCall {
    pub fn operation(&self) -> &'static str {
        match self {
            RemoteCall::CreateApiClient(_) => "create_api_client",
            RemoteCall::GetApiClient(_) => "get_api_client",
            RemoteCall::UpdateApiClient(..) => "update_api_client",
            RemoteCall::DeleteApiClient(_) => "delete_api_client",
            RemoteCall::LockApiClient(_) => "lock_api_client",
            RemoteCall::UnlockApiClient(_) => "unlock_api_client",
            RemoteCall::UpdateCredential { .. } => "update_credential",
            RemoteCall::DeactivateCredential { .. } => "deactivate_credential",
            RemoteCall::ListGroups => "list_groups",
            RemoteCall::ListAccessibleGroups(_) => "list_accessible_groups",
            RemoteCall::GetUserAuthGrants(_) => "get_user_auth_grants",
            RemoteCall::UpdateUserAuthGrants(..) => "update_user_auth_grants",
        }
    }

    /// True for calls that change remote state.
    pub fn is_write(&self) -> bool {
        !matches!(
            self,
            RemoteCall::GetApiClient(_)
                | RemoteCall::ListGroups
                | RemoteCall::ListAccessibleGroups(_)
                | RemoteCall::GetUserAuthGrants(_)
        )
    }
}

/// Failure a mock operation can be primed with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockFailure {
    NotFound,
    Conflict(String),
    BadRequest(String),
    Unavailable,
}

impl MockFailure {
    fn to_error(&self) -> AppError {
        match self {
            MockFailure::NotFound => AppError::NotFound(anyhow::anyhow!("Resource not found")),
            MockFailure::Conflict(msg) => AppError::Conflict(anyhow::anyhow!(msg.clone())),
            MockFailure::BadRequest(msg) => AppError::BadRequest(anyhow::anyhow!(msg.clone())),
            MockFailure::Unavailable => AppError::ServiceUnavailable,
        }
    }
}

/// Behaves like a single-account identity API holding at most one API client.
///
/// Like the real service it rejects updates to a locked client, defaults an
/// empty notification list to the creator, and discloses a credential secret
/// only on the create response.
pub struct MockIdentityService {
    calls: Mutex<Vec<RemoteCall>>,
    client: Mutex<Option<ApiClientResponse>>,
    groups: Mutex<Vec<GrantNode>>,
    api_catalog: Mutex<Vec<ApiAccessEntry>>,
    auth_grants: Mutex<HashMap<String, Vec<GrantNode>>>,
    failures: Mutex<HashMap<&'static str, MockFailure>>,
    next_id: Mutex<i64>,
}

impl Default for MockIdentityService {
    fn default() -> Self {
        Self::new()
    }
}

fn guard<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, AppError> {
    mutex
        .lock()
        .map_err(|e| AppError::InternalError(anyhow::anyhow!("Mock identity mutex poisoned: {}", e)))
}

impl MockIdentityService {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            client: Mutex::new(None),
            groups: Mutex::new(Vec::new()),
            api_catalog: Mutex::new(Vec::new()),
            auth_grants: Mutex::new(HashMap::new()),
            failures: Mutex::new(HashMap::new()),
            next_id: Mutex::new(1),
        }
    }

    pub fn with_groups(self, groups: Vec<GrantNode>) -> Self {
        if let Ok(mut g) = self.groups.lock() {
            *g = groups;
        }
        self
    }

    /// APIs reported when a client has access to every accessible API.
    pub fn with_api_catalog(self, catalog: Vec<ApiAccessEntry>) -> Self {
        if let Ok(mut c) = self.api_catalog.lock() {
            *c = catalog;
        }
        self
    }

    pub fn with_auth_grants(self, ui_identity_id: &str, grants: Vec<GrantNode>) -> Self {
        if let Ok(mut a) = self.auth_grants.lock() {
            a.insert(ui_identity_id.to_string(), grants);
        }
        self
    }

    pub fn with_client(self, client: ApiClientResponse) -> Self {
        if let Ok(mut c) = self.client.lock() {
            *c = Some(client);
        }
        self
    }

    /// Make every later call of `operation` fail.
    pub fn fail_on(&self, operation: &'static str, failure: MockFailure) {
        if let Ok(mut f) = self.failures.lock() {
            f.insert(operation, failure);
        }
    }

    pub fn calls(&self) -> Vec<RemoteCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn writes(&self) -> Vec<RemoteCall> {
        self.calls().into_iter().filter(RemoteCall::is_write).collect()
    }

    pub fn operations(&self) -> Vec<&'static str> {
        self.calls().iter().map(RemoteCall::operation).collect()
    }

    pub fn clear_calls(&self) {
        if let Ok(mut c) = self.calls.lock() {
            c.clear();
        }
    }

    pub fn client(&self) -> Option<ApiClientResponse> {
        self.client.lock().ok().and_then(|c| c.clone())
    }

    /// Replace the stored client's credentials, e.g. to simulate out-of-band rotation.
    pub fn set_credentials(&self, credentials: Vec<CredentialResponse>) {
        if let Ok(mut c) = self.client.lock() {
            if let Some(client) = c.as_mut() {
                client.credentials = credentials;
            }
        }
    }

    /// Record the call, then fail it if primed to.
    fn record(&self, call: RemoteCall) -> Result<(), AppError> {
        let operation = call.operation();
        guard(&self.calls)?.push(call);
        match guard(&self.failures)?.get(operation) {
            Some(failure) => Err(failure.to_error()),
            None => Ok(()),
        }
    }

    fn next_id(&self) -> Result<i64, AppError> {
        let mut id = guard(&self.next_id)?;
        let current = *id;
        *id += 1;
        Ok(current)
    }

    fn stored(&self, client_id: &str) -> Result<ApiClientResponse, AppError> {
        guard(&self.client)?
            .as_ref()
            .filter(|c| c.client_id == client_id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("API client {} not found", client_id)))
    }

    fn modify<F>(&self, client_id: &str, f: F) -> Result<ApiClientResponse, AppError>
    where
        F: FnOnce(&mut ApiClientResponse) -> Result<(), AppError>,
    {
        let mut slot = guard(&self.client)?;
        match slot.as_mut().filter(|c| c.client_id == client_id) {
            Some(client) => {
                f(client)?;
                Ok(client.clone())
            }
            None => Err(AppError::NotFound(anyhow::anyhow!(
                "API client {} not found",
                client_id
            ))),
        }
    }

    fn apply_request(
        &self,
        client: &mut ApiClientResponse,
        request: &ApiClientRequest,
    ) -> Result<(), AppError> {
        client.allow_account_switch = request.allow_account_switch;
        client.authorized_users = request.authorized_users.clone();
        client.can_auto_create_credential = request.can_auto_create_credential;
        client.client_description = request.client_description.clone();
        client.client_name = request.client_name.clone();
        client.client_type = request.client_type;
        client.notification_emails = request.notification_emails.clone();
        client.ip_acl = request.ip_acl.clone();
        client.purge_options = request.purge_options.clone();

        let apis = if request.api_access.all_accessible_apis {
            guard(&self.api_catalog)?.clone()
        } else {
            request
                .api_access
                .apis
                .iter()
                .map(|api| ApiAccessEntry {
                    api_id: api.api_id,
                    access_level: api.access_level,
                    api_name: None,
                    description: None,
                    documentation_url: None,
                    endpoint: None,
                })
                .collect()
        };
        client.api_access = ApiAccessResponse {
            all_accessible_apis: request.api_access.all_accessible_apis,
            apis,
        };

        let groups = if request.group_access.clone_authorized_user_groups {
            guard(&self.groups)?.clone()
        } else {
            group_nodes(&request.group_access.groups, None)
        };
        client.group_access = GroupAccessResponse {
            clone_authorized_user_groups: request.group_access.clone_authorized_user_groups,
            groups,
        };
        Ok(())
    }
}

fn group_nodes(requests: &[ClientGroupRequest], parent: Option<i64>) -> Vec<GrantNode> {
    requests
        .iter()
        .map(|r| GrantNode {
            group_id: r.group_id,
            group_name: Some(format!("group-{}", r.group_id)),
            parent_group_id: parent,
            role_id: r.role_id,
            role_name: r.role_id.map(|id| format!("role-{}", id)),
            role_description: r.role_id.map(|id| format!("Role {}", id)),
            is_blocked: false,
            sub_groups: group_nodes(&r.subgroups, Some(r.group_id)),
        })
        .collect()
}

fn auth_grant_nodes(requests: &[AuthGrantRequest], parent: Option<i64>) -> Vec<GrantNode> {
    requests
        .iter()
        .map(|r| GrantNode {
            group_id: r.group_id,
            group_name: Some(format!("group-{}", r.group_id)),
            parent_group_id: parent,
            role_id: r.role_id,
            role_name: r.role_id.map(|id| format!("role-{}", id)),
            role_description: None,
            is_blocked: r.is_blocked,
            sub_groups: auth_grant_nodes(&r.sub_groups, Some(r.group_id)),
        })
        .collect()
}

fn ensure_unlocked(client: &ApiClientResponse) -> Result<(), AppError> {
    if client.is_locked {
        return Err(AppError::Conflict(anyhow::anyhow!(
            "API client {} is locked",
            client.client_id
        )));
    }
    Ok(())
}

#[async_trait]
impl IdentityService for MockIdentityService {
    async fn create_api_client(
        &self,
        request: &ApiClientRequest,
    ) -> Result<ApiClientResponse, AppError> {
        self.record(RemoteCall::CreateApiClient(request.clone()))?;

        let id = self.next_id()?;
        let created_on = Utc::now();
        let credential = CredentialResponse {
            credential_id: 1000 + id,
            client_token: format!("akab-token-{}", id),
            client_secret: Some(Secret::new(format!("secret-{}", id))),
            description: None,
            created_on,
            expires_on: created_on + Duration::days(730),
            status: CredentialStatus::Active,
            actions: CredentialActionsPayload {
                delete: false,
                activate: false,
                deactivate: true,
                edit_description: true,
                edit_expiration: true,
            },
        };

        let mut client = ApiClientResponse {
            client_id: format!("client-{}", id),
            access_token: Some(format!("akab-access-{}", id)),
            actions: Some(ClientActionsPayload {
                delete: true,
                edit: true,
                lock: true,
                ..Default::default()
            }),
            active_credential_count: 1,
            allow_account_switch: false,
            api_access: ApiAccessResponse::default(),
            authorized_users: Vec::new(),
            base_url: Some("https://akab-host.luna.example.net".to_string()),
            can_auto_create_credential: false,
            client_description: None,
            client_name: None,
            client_type: request.client_type,
            created_by: request.authorized_users.first().cloned(),
            created_date: Some(created_on),
            credentials: vec![credential.clone()],
            group_access: GroupAccessResponse::default(),
            ip_acl: None,
            is_locked: false,
            notification_emails: Vec::new(),
            purge_options: None,
            service_provider_id: Some(1),
        };
        self.apply_request(&mut client, request)?;
        if client.notification_emails.is_empty() {
            client.notification_emails = vec![DEFAULT_NOTIFICATION_EMAIL.to_string()];
        }

        let mut stored = client.clone();
        for credential in &mut stored.credentials {
            credential.client_secret = None;
        }
        *guard(&self.client)? = Some(stored);
        Ok(client)
    }

    async fn get_api_client(&self, client_id: &str) -> Result<ApiClientResponse, AppError> {
        self.record(RemoteCall::GetApiClient(client_id.to_string()))?;
        self.stored(client_id)
    }

    async fn update_api_client(
        &self,
        client_id: &str,
        request: &ApiClientRequest,
    ) -> Result<ApiClientResponse, AppError> {
        self.record(RemoteCall::UpdateApiClient(
            client_id.to_string(),
            request.clone(),
        ))?;
        let mut client = self.stored(client_id)?;
        ensure_unlocked(&client)?;
        self.apply_request(&mut client, request)?;
        *guard(&self.client)? = Some(client.clone());
        Ok(client)
    }

    async fn delete_api_client(&self, client_id: &str) -> Result<(), AppError> {
        self.record(RemoteCall::DeleteApiClient(client_id.to_string()))?;
        self.stored(client_id)?;
        *guard(&self.client)? = None;
        Ok(())
    }

    async fn lock_api_client(&self, client_id: &str) -> Result<ApiClientResponse, AppError> {
        self.record(RemoteCall::LockApiClient(client_id.to_string()))?;
        self.modify(client_id, |client| {
            client.is_locked = true;
            if let Some(actions) = client.actions.as_mut() {
                actions.lock = false;
                actions.unlock = true;
            }
            Ok(())
        })
    }

    async fn unlock_api_client(&self, client_id: &str) -> Result<ApiClientResponse, AppError> {
        self.record(RemoteCall::UnlockApiClient(client_id.to_string()))?;
        self.modify(client_id, |client| {
            client.is_locked = false;
            if let Some(actions) = client.actions.as_mut() {
                actions.lock = true;
                actions.unlock = false;
            }
            Ok(())
        })
    }

    async fn update_credential(
        &self,
        client_id: &str,
        credential_id: i64,
        request: &UpdateCredentialRequest,
    ) -> Result<CredentialResponse, AppError> {
        self.record(RemoteCall::UpdateCredential {
            client_id: client_id.to_string(),
            credential_id,
            request: request.clone(),
        })?;

        let mut updated = None;
        self.modify(client_id, |client| {
            let credential = client
                .credentials
                .iter_mut()
                .find(|c| c.credential_id == credential_id)
                .ok_or_else(|| {
                    AppError::NotFound(anyhow::anyhow!("Credential {} not found", credential_id))
                })?;
            if request.description.is_some() {
                credential.description = request.description.clone();
            }
            credential.expires_on = request.expires_on;
            credential.status = request.status;
            updated = Some(credential.clone());
            Ok(())
        })?;

        updated.ok_or_else(|| AppError::InternalError(anyhow::anyhow!("Credential not updated")))
    }

    async fn deactivate_credential(
        &self,
        client_id: &str,
        credential_id: i64,
    ) -> Result<(), AppError> {
        self.record(RemoteCall::DeactivateCredential {
            client_id: client_id.to_string(),
            credential_id,
        })?;
        self.modify(client_id, |client| {
            let credential = client
                .credentials
                .iter_mut()
                .find(|c| c.credential_id == credential_id)
                .ok_or_else(|| {
                    AppError::NotFound(anyhow::anyhow!("Credential {} not found", credential_id))
                })?;
            if credential.status != CredentialStatus::Active {
                return Err(AppError::BadRequest(anyhow::anyhow!(
                    "Credential {} is already inactive",
                    credential_id
                )));
            }
            credential.status = CredentialStatus::Inactive;
            client.active_credential_count -= 1;
            Ok(())
        })?;
        Ok(())
    }

    async fn list_groups(&self) -> Result<Vec<GrantNode>, AppError> {
        self.record(RemoteCall::ListGroups)?;
        Ok(guard(&self.groups)?.clone())
    }

    async fn list_accessible_groups(&self, username: &str) -> Result<Vec<GrantNode>, AppError> {
        self.record(RemoteCall::ListAccessibleGroups(username.to_string()))?;
        Ok(guard(&self.groups)?.clone())
    }

    async fn get_user_auth_grants(
        &self,
        ui_identity_id: &str,
    ) -> Result<Vec<GrantNode>, AppError> {
        self.record(RemoteCall::GetUserAuthGrants(ui_identity_id.to_string()))?;
        guard(&self.auth_grants)?
            .get(ui_identity_id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("User {} not found", ui_identity_id)))
    }

    async fn update_user_auth_grants(
        &self,
        ui_identity_id: &str,
        grants: &[AuthGrantRequest],
    ) -> Result<Vec<GrantNode>, AppError> {
        self.record(RemoteCall::UpdateUserAuthGrants(
            ui_identity_id.to_string(),
            grants.to_vec(),
        ))?;
        let nodes = auth_grant_nodes(grants, None);
        guard(&self.auth_grants)?.insert(ui_identity_id.to_string(), nodes.clone());
        Ok(nodes)
    }
}
