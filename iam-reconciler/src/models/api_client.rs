//! Desired configuration and persisted state of an API client.

use chrono::{DateTime, Utc};
use iam_core::client::{
    AccessLevel, ApiAccessEntry, ClientActionsPayload, ClientType, CpCodeAccessPayload,
    CredentialActionsPayload, CredentialResponse, CredentialStatus, IpAclPayload,
    PurgeOptionsPayload,
};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize, Serializer};
use validator::{Validate, ValidateEmail, ValidationError};

use super::{GrantTree, GroupGrant};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApiAccess {
    pub api_id: i64,
    pub access_level: AccessLevel,
    #[serde(default)]
    pub api_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub documentation_url: Option<String>,
    #[serde(default)]
    pub endpoint: Option<String>,
}

impl ApiAccess {
    pub fn new(api_id: i64, access_level: AccessLevel) -> Self {
        Self {
            api_id,
            access_level,
            api_name: None,
            description: None,
            documentation_url: None,
            endpoint: None,
        }
    }

    pub fn named(mut self, api_name: &str) -> Self {
        self.api_name = Some(api_name.to_string());
        self
    }
}

impl From<&ApiAccessEntry> for ApiAccess {
    fn from(entry: &ApiAccessEntry) -> Self {
        Self {
            api_id: entry.api_id,
            access_level: entry.access_level,
            api_name: entry.api_name.clone(),
            description: entry.description.clone(),
            documentation_url: entry.documentation_url.clone(),
            endpoint: entry.endpoint.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApiAccessConfig {
    pub all_accessible_apis: bool,
    #[serde(default)]
    pub apis: Vec<ApiAccess>,
}

/// Group access as declared. The tree is depth-checked before it is encoded.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct GroupAccessConfig {
    pub clone_authorized_user_groups: bool,
    #[serde(default)]
    pub groups: Vec<GroupGrant>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct GroupAccessState {
    pub clone_authorized_user_groups: bool,
    #[serde(default)]
    pub groups: GrantTree,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CpCodeAccess {
    pub all_current_and_new_cp_codes: bool,
    #[serde(default)]
    pub cp_codes: Vec<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PurgeOptions {
    pub can_purge_by_cache_tag: bool,
    pub can_purge_by_cp_code: bool,
    #[serde(default)]
    pub cp_code_access: CpCodeAccess,
}

impl From<&PurgeOptionsPayload> for PurgeOptions {
    fn from(payload: &PurgeOptionsPayload) -> Self {
        Self {
            can_purge_by_cache_tag: payload.can_purge_by_cache_tag,
            can_purge_by_cp_code: payload.can_purge_by_cp_code,
            cp_code_access: CpCodeAccess {
                all_current_and_new_cp_codes: payload.cp_code_access.all_current_and_new_cp_codes,
                cp_codes: payload.cp_code_access.cp_codes.clone(),
            },
        }
    }
}

impl From<&PurgeOptions> for PurgeOptionsPayload {
    fn from(options: &PurgeOptions) -> Self {
        Self {
            can_purge_by_cache_tag: options.can_purge_by_cache_tag,
            can_purge_by_cp_code: options.can_purge_by_cp_code,
            cp_code_access: CpCodeAccessPayload {
                all_current_and_new_cp_codes: options.cp_code_access.all_current_and_new_cp_codes,
                cp_codes: options.cp_code_access.cp_codes.clone(),
            },
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct IpAcl {
    pub enable: bool,
    #[serde(default)]
    pub cidr: Vec<String>,
}

impl From<&IpAclPayload> for IpAcl {
    fn from(payload: &IpAclPayload) -> Self {
        Self {
            enable: payload.enable,
            cidr: payload.cidr.clone(),
        }
    }
}

impl From<&IpAcl> for IpAclPayload {
    fn from(acl: &IpAcl) -> Self {
        Self {
            enable: acl.enable,
            cidr: acl.cidr.clone(),
        }
    }
}

/// Declared credential fields. `None` leaves the server value alone.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CredentialConfig {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub expires_on: Option<DateTime<Utc>>,
    #[serde(default)]
    pub status: Option<CredentialStatus>,
}

/// Desired API client as written by the operator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Validate)]
pub struct ApiClientConfig {
    #[validate(length(min = 1, message = "at least one authorized user is required"))]
    pub authorized_users: Vec<String>,
    pub client_type: ClientType,
    #[serde(default)]
    pub client_name: Option<String>,
    #[serde(default)]
    pub client_description: Option<String>,
    #[serde(default)]
    pub allow_account_switch: bool,
    #[serde(default)]
    pub can_auto_create_credential: bool,
    #[serde(default)]
    #[validate(custom(function = "validate_notification_emails"))]
    pub notification_emails: Vec<String>,
    pub api_access: ApiAccessConfig,
    pub group_access: GroupAccessConfig,
    #[serde(default)]
    pub purge_options: Option<PurgeOptions>,
    #[serde(default)]
    pub ip_acl: Option<IpAcl>,
    #[serde(default)]
    pub lock: bool,
    #[serde(default)]
    pub credential: Option<CredentialConfig>,
}

#[allow(clippy::ptr_arg)]
fn validate_notification_emails(emails: &Vec<String>) -> Result<(), ValidationError> {
    if emails.iter().all(|email| email.validate_email()) {
        Ok(())
    } else {
        let mut error = ValidationError::new("email");
        error.message = Some("notification emails must be valid addresses".into());
        Err(error)
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClientActions {
    pub delete: bool,
    pub deactivate_all: bool,
    pub edit: bool,
    pub edit_apis: bool,
    pub edit_auth: bool,
    pub edit_groups: bool,
    pub edit_ip_acl: bool,
    pub edit_switch_account: bool,
    pub lock: bool,
    pub transfer: bool,
    pub unlock: bool,
}

impl From<ClientActionsPayload> for ClientActions {
    fn from(p: ClientActionsPayload) -> Self {
        Self {
            delete: p.delete,
            deactivate_all: p.deactivate_all,
            edit: p.edit,
            edit_apis: p.edit_apis,
            edit_auth: p.edit_auth,
            edit_groups: p.edit_groups,
            edit_ip_acl: p.edit_ip_acl,
            edit_switch_account: p.edit_switch_account,
            lock: p.lock,
            transfer: p.transfer,
            unlock: p.unlock,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CredentialActions {
    pub delete: bool,
    pub activate: bool,
    pub deactivate: bool,
    pub edit_description: bool,
    pub edit_expiration: bool,
}

impl From<CredentialActionsPayload> for CredentialActions {
    fn from(p: CredentialActionsPayload) -> Self {
        Self {
            delete: p.delete,
            activate: p.activate,
            deactivate: p.deactivate,
            edit_description: p.edit_description,
            edit_expiration: p.edit_expiration,
        }
    }
}

/// The credential tracked for an API client.
///
/// `client_secret` is only known when this process saw the response that
/// issued it; the server never discloses it again.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialState {
    pub credential_id: i64,
    pub client_token: String,
    #[serde(default, serialize_with = "serialize_secret")]
    pub client_secret: Option<Secret<String>>,
    #[serde(default)]
    pub description: Option<String>,
    pub created_on: DateTime<Utc>,
    pub expires_on: DateTime<Utc>,
    pub status: CredentialStatus,
    #[serde(default)]
    pub actions: CredentialActions,
}

impl CredentialState {
    /// Non-secret fields of a fetched credential, with the given secret.
    pub fn from_response(response: &CredentialResponse, secret: Option<Secret<String>>) -> Self {
        Self {
            credential_id: response.credential_id,
            client_token: response.client_token.clone(),
            client_secret: secret,
            description: response.description.clone(),
            created_on: response.created_on,
            expires_on: response.expires_on,
            status: response.status,
            actions: response.actions.into(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == CredentialStatus::Active
    }

    /// The declarable subset, as compared against [`CredentialConfig`].
    pub fn declared(&self) -> CredentialConfig {
        CredentialConfig {
            description: self.description.clone(),
            expires_on: Some(self.expires_on),
            status: Some(self.status),
        }
    }
}

// The state store holds secrets in the clear, like any other sensitive attribute.
fn serialize_secret<S>(secret: &Option<Secret<String>>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match secret {
        Some(secret) => serializer.serialize_some(secret.expose_secret()),
        None => serializer.serialize_none(),
    }
}

/// Last-known state of an API client, as persisted between reconciliations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiClientState {
    pub client_id: String,
    pub authorized_users: Vec<String>,
    pub client_type: ClientType,
    #[serde(default)]
    pub client_name: Option<String>,
    #[serde(default)]
    pub client_description: Option<String>,
    pub allow_account_switch: bool,
    pub can_auto_create_credential: bool,
    #[serde(default)]
    pub notification_emails: Vec<String>,
    pub api_access: ApiAccessConfig,
    pub group_access: GroupAccessState,
    #[serde(default)]
    pub purge_options: Option<PurgeOptions>,
    #[serde(default)]
    pub ip_acl: Option<IpAcl>,
    pub lock: bool,
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub actions: Option<ClientActions>,
    #[serde(default)]
    pub active_credential_count: i64,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub created_by: Option<String>,
    #[serde(default)]
    pub created_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub service_provider_id: Option<i64>,
    #[serde(default)]
    pub credential: Option<CredentialState>,
}

impl ApiClientState {
    /// Project the state back onto the declarable fields.
    pub fn declared(&self) -> ApiClientConfig {
        ApiClientConfig {
            authorized_users: self.authorized_users.clone(),
            client_type: self.client_type,
            client_name: self.client_name.clone(),
            client_description: self.client_description.clone(),
            allow_account_switch: self.allow_account_switch,
            can_auto_create_credential: self.can_auto_create_credential,
            notification_emails: self.notification_emails.clone(),
            api_access: self.api_access.clone(),
            group_access: GroupAccessConfig {
                clone_authorized_user_groups: self.group_access.clone_authorized_user_groups,
                groups: self.group_access.groups.to_vec(),
            },
            purge_options: self.purge_options.clone(),
            ip_acl: self.ip_acl.clone(),
            lock: self.lock,
            credential: self.credential.as_ref().map(CredentialState::declared),
        }
    }

    pub fn credential_id(&self) -> Option<i64> {
        self.credential.as_ref().map(|c| c.credential_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use validator::Validate;

    fn config() -> ApiClientConfig {
        ApiClientConfig {
            authorized_users: vec!["jdoe".to_string()],
            client_type: ClientType::Client,
            client_name: Some("ci".to_string()),
            client_description: None,
            allow_account_switch: false,
            can_auto_create_credential: false,
            notification_emails: vec!["ops@example.com".to_string()],
            api_access: ApiAccessConfig {
                all_accessible_apis: true,
                apis: vec![],
            },
            group_access: GroupAccessConfig {
                clone_authorized_user_groups: true,
                groups: vec![],
            },
            purge_options: None,
            ip_acl: None,
            lock: false,
            credential: None,
        }
    }

    #[test]
    fn test_config_field_validation() {
        assert!(config().validate().is_ok());

        let mut no_users = config();
        no_users.authorized_users.clear();
        let errors = no_users.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("authorized_users"));

        let mut bad_email = config();
        bad_email.notification_emails.push("not-an-email".to_string());
        let errors = bad_email.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("notification_emails"));
    }

    #[test]
    fn test_credential_secret_is_written_to_state() {
        let credential = CredentialState {
            credential_id: 7,
            client_token: "akab-token".to_string(),
            client_secret: Some(Secret::new("s3cr3t".to_string())),
            description: None,
            created_on: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
            expires_on: Utc.with_ymd_and_hms(2028, 1, 1, 0, 0, 0).unwrap(),
            status: CredentialStatus::Active,
            actions: CredentialActions::default(),
        };
        let json = serde_json::to_value(&credential).unwrap();
        assert_eq!(json["client_secret"], "s3cr3t");
        assert_eq!(json["status"], "ACTIVE");

        let back: CredentialState = serde_json::from_value(json).unwrap();
        assert_eq!(back.client_secret.unwrap().expose_secret(), "s3cr3t");
        assert!(!format!("{:?}", credential).contains("s3cr3t"));
    }

    #[test]
    fn test_purge_options_payload_conversion() {
        let options = PurgeOptions {
            can_purge_by_cache_tag: true,
            can_purge_by_cp_code: true,
            cp_code_access: CpCodeAccess {
                all_current_and_new_cp_codes: false,
                cp_codes: vec![101, 102],
            },
        };
        let payload = PurgeOptionsPayload::from(&options);
        assert_eq!(payload.cp_code_access.cp_codes, vec![101, 102]);
        assert_eq!(PurgeOptions::from(&payload), options);
    }
}
