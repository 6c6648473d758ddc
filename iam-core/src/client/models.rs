//! Wire models of the identity-management API.
//!
//! Response types only derive `Deserialize`: credential secrets are wrapped in
//! `secrecy::Secret` and are never serialized back.

use chrono::{DateTime, Utc};
use secrecy::Secret;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClientType {
    Client,
    UserClient,
    ServiceAccount,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum AccessLevel {
    #[serde(rename = "READ-ONLY")]
    ReadOnly,
    #[serde(rename = "READ-WRITE")]
    ReadWrite,
    #[serde(rename = "CREDENTIAL-READ-ONLY")]
    CredentialReadOnly,
    #[serde(rename = "CREDENTIAL-READ-WRITE")]
    CredentialReadWrite,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CredentialStatus {
    Active,
    Inactive,
    Deleted,
}

impl fmt::Display for CredentialStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CredentialStatus::Active => write!(f, "ACTIVE"),
            CredentialStatus::Inactive => write!(f, "INACTIVE"),
            CredentialStatus::Deleted => write!(f, "DELETED"),
        }
    }
}

/// One node of a group, sub-group or auth-grant tree as returned by the server.
///
/// Group listings name the child list `subGroups`, API client group access
/// names it `subgroups`; both deserialize here.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GrantNode {
    pub group_id: i64,
    #[serde(default)]
    pub group_name: Option<String>,
    #[serde(default)]
    pub parent_group_id: Option<i64>,
    #[serde(default)]
    pub role_id: Option<i64>,
    #[serde(default)]
    pub role_name: Option<String>,
    #[serde(default)]
    pub role_description: Option<String>,
    #[serde(default)]
    pub is_blocked: bool,
    #[serde(default, rename = "subGroups", alias = "subgroups")]
    pub sub_groups: Vec<GrantNode>,
}

/// Group access entry on API client create/update.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ClientGroupRequest {
    pub group_id: i64,
    pub role_id: Option<i64>,
    pub subgroups: Vec<ClientGroupRequest>,
}

/// Auth grant entry on user update.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AuthGrantRequest {
    pub group_id: i64,
    pub role_id: Option<i64>,
    pub is_blocked: bool,
    pub sub_groups: Vec<AuthGrantRequest>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ApiAccessEntry {
    pub api_id: i64,
    pub access_level: AccessLevel,
    #[serde(default)]
    pub api_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub documentation_url: Option<String>,
    #[serde(default, rename = "endPoint")]
    pub endpoint: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ApiAccessResponse {
    pub all_accessible_apis: bool,
    #[serde(default)]
    pub apis: Vec<ApiAccessEntry>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GroupAccessResponse {
    pub clone_authorized_user_groups: bool,
    #[serde(default)]
    pub groups: Vec<GrantNode>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct IpAclPayload {
    pub enable: bool,
    #[serde(default)]
    pub cidr: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CpCodeAccessPayload {
    #[serde(rename = "allCurrentAndNewCpcodes")]
    pub all_current_and_new_cp_codes: bool,
    #[serde(default, rename = "cpcodes")]
    pub cp_codes: Vec<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PurgeOptionsPayload {
    pub can_purge_by_cache_tag: bool,
    pub can_purge_by_cp_code: bool,
    #[serde(rename = "cpcodeAccess")]
    pub cp_code_access: CpCodeAccessPayload,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ClientActionsPayload {
    #[serde(default)]
    pub delete: bool,
    #[serde(default)]
    pub deactivate_all: bool,
    #[serde(default)]
    pub edit: bool,
    #[serde(default)]
    pub edit_apis: bool,
    #[serde(default)]
    pub edit_auth: bool,
    #[serde(default)]
    pub edit_groups: bool,
    #[serde(default)]
    pub edit_ip_acl: bool,
    #[serde(default)]
    pub edit_switch_account: bool,
    #[serde(default)]
    pub lock: bool,
    #[serde(default)]
    pub transfer: bool,
    #[serde(default)]
    pub unlock: bool,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CredentialActionsPayload {
    #[serde(default)]
    pub delete: bool,
    #[serde(default)]
    pub activate: bool,
    #[serde(default)]
    pub deactivate: bool,
    #[serde(default)]
    pub edit_description: bool,
    #[serde(default)]
    pub edit_expiration: bool,
}

/// A credential as listed by the server. `client_secret` is only populated
/// on the response that created the credential.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialResponse {
    pub credential_id: i64,
    pub client_token: String,
    #[serde(default)]
    pub client_secret: Option<Secret<String>>,
    #[serde(default)]
    pub description: Option<String>,
    pub created_on: DateTime<Utc>,
    pub expires_on: DateTime<Utc>,
    pub status: CredentialStatus,
    #[serde(default)]
    pub actions: CredentialActionsPayload,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiClientResponse {
    pub client_id: String,
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub actions: Option<ClientActionsPayload>,
    #[serde(default)]
    pub active_credential_count: i64,
    #[serde(default)]
    pub allow_account_switch: bool,
    #[serde(default)]
    pub api_access: ApiAccessResponse,
    #[serde(default)]
    pub authorized_users: Vec<String>,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub can_auto_create_credential: bool,
    #[serde(default)]
    pub client_description: Option<String>,
    #[serde(default)]
    pub client_name: Option<String>,
    pub client_type: ClientType,
    #[serde(default)]
    pub created_by: Option<String>,
    #[serde(default)]
    pub created_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub credentials: Vec<CredentialResponse>,
    #[serde(default)]
    pub group_access: GroupAccessResponse,
    #[serde(default)]
    pub ip_acl: Option<IpAclPayload>,
    #[serde(default)]
    pub is_locked: bool,
    #[serde(default)]
    pub notification_emails: Vec<String>,
    #[serde(default)]
    pub purge_options: Option<PurgeOptionsPayload>,
    #[serde(default)]
    pub service_provider_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ApiAccessRequest {
    pub all_accessible_apis: bool,
    pub apis: Vec<ApiRequestItem>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ApiRequestItem {
    pub api_id: i64,
    pub access_level: AccessLevel,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GroupAccessRequest {
    pub clone_authorized_user_groups: bool,
    pub groups: Vec<ClientGroupRequest>,
}

/// Body of API client create and update. `create_credential` is only sent on
/// create.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ApiClientRequest {
    pub allow_account_switch: bool,
    pub api_access: ApiAccessRequest,
    pub authorized_users: Vec<String>,
    pub can_auto_create_credential: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_name: Option<String>,
    pub client_type: ClientType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub create_credential: Option<bool>,
    pub group_access: GroupAccessRequest,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip_acl: Option<IpAclPayload>,
    pub notification_emails: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purge_options: Option<PurgeOptionsPayload>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCredentialRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub expires_on: DateTime<Utc>,
    pub status: CredentialStatus,
}

/// Subset of a user identity carrying its auth grants.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserIdentityResponse {
    pub ui_identity_id: String,
    #[serde(default)]
    pub auth_grants: Vec<GrantNode>,
}

/// Problem body returned by the API on failures.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProblemDetail {
    #[serde(default, rename = "type")]
    pub problem_type: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub detail: Option<String>,
    #[serde(default)]
    pub status: Option<u16>,
}
