//! API client request encoding and state decoding.

use iam_core::client::{
    ApiAccessRequest, ApiClientRequest, ApiClientResponse, ApiRequestItem, GroupAccessRequest,
};

use super::depth::DepthExceeded;
use super::grant_tree::GrantTreeCodec;
use crate::models::{
    ApiAccess, ApiAccessConfig, ApiClientConfig, ApiClientState, CredentialState,
    GroupAccessState, GrantTree,
};

pub struct ApiClientCodec;

impl ApiClientCodec {
    /// Build the create/update body for `config`.
    ///
    /// `groups` is the declared group tree after its depth check. APIs are
    /// left out when every accessible API is granted, groups when they are
    /// cloned from the authorized user.
    pub fn encode_request(
        config: &ApiClientConfig,
        groups: &GrantTree,
        create: bool,
    ) -> ApiClientRequest {
        let mut apis: Vec<ApiRequestItem> = if config.api_access.all_accessible_apis {
            Vec::new()
        } else {
            config
                .api_access
                .apis
                .iter()
                .map(|api| ApiRequestItem {
                    api_id: api.api_id,
                    access_level: api.access_level,
                })
                .collect()
        };
        // APIs are a set on the server side.
        apis.sort_by_key(|api| api.api_id);

        let groups = if config.group_access.clone_authorized_user_groups {
            Vec::new()
        } else {
            GrantTreeCodec::encode_group_access(groups)
        };

        ApiClientRequest {
            allow_account_switch: config.allow_account_switch,
            api_access: ApiAccessRequest {
                all_accessible_apis: config.api_access.all_accessible_apis,
                apis,
            },
            authorized_users: config.authorized_users.clone(),
            can_auto_create_credential: config.can_auto_create_credential,
            client_description: config.client_description.clone(),
            client_name: config.client_name.clone(),
            client_type: config.client_type,
            create_credential: create.then_some(true),
            group_access: GroupAccessRequest {
                clone_authorized_user_groups: config.group_access.clone_authorized_user_groups,
                groups,
            },
            ip_acl: config.ip_acl.as_ref().map(Into::into),
            notification_emails: config.notification_emails.clone(),
            purge_options: config.purge_options.as_ref().map(Into::into),
        }
    }

    /// Build state from a fetched API client and an already matched credential.
    pub fn decode_state(
        response: &ApiClientResponse,
        credential: Option<CredentialState>,
    ) -> Result<ApiClientState, DepthExceeded> {
        let groups = GrantTreeCodec::decode_checked(&response.group_access.groups)?;

        Ok(ApiClientState {
            client_id: response.client_id.clone(),
            authorized_users: response.authorized_users.clone(),
            client_type: response.client_type,
            client_name: response.client_name.clone(),
            client_description: response.client_description.clone(),
            allow_account_switch: response.allow_account_switch,
            can_auto_create_credential: response.can_auto_create_credential,
            notification_emails: response.notification_emails.clone(),
            api_access: ApiAccessConfig {
                all_accessible_apis: response.api_access.all_accessible_apis,
                apis: response.api_access.apis.iter().map(ApiAccess::from).collect(),
            },
            group_access: GroupAccessState {
                clone_authorized_user_groups: response.group_access.clone_authorized_user_groups,
                groups,
            },
            purge_options: response.purge_options.as_ref().map(Into::into),
            ip_acl: response.ip_acl.as_ref().map(Into::into),
            lock: response.is_locked,
            access_token: response.access_token.clone(),
            actions: response.actions.map(Into::into),
            active_credential_count: response.active_credential_count,
            base_url: response.base_url.clone(),
            created_by: response.created_by.clone(),
            created_date: response.created_date,
            service_provider_id: response.service_provider_id,
            credential,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{GroupAccessConfig, GroupGrant};
    use iam_core::client::{AccessLevel, ClientType};

    fn config() -> ApiClientConfig {
        ApiClientConfig {
            authorized_users: vec!["jdoe".to_string()],
            client_type: ClientType::Client,
            client_name: Some("ci".to_string()),
            client_description: Some("pipeline".to_string()),
            allow_account_switch: false,
            can_auto_create_credential: false,
            notification_emails: vec![],
            api_access: ApiAccessConfig {
                all_accessible_apis: false,
                apis: vec![
                    ApiAccess::new(9, AccessLevel::ReadWrite),
                    ApiAccess::new(3, AccessLevel::ReadOnly),
                ],
            },
            group_access: GroupAccessConfig {
                clone_authorized_user_groups: false,
                groups: vec![GroupGrant::new(123, Some(340))],
            },
            purge_options: None,
            ip_acl: None,
            lock: false,
            credential: None,
        }
    }

    fn groups(config: &ApiClientConfig) -> GrantTree {
        GrantTree::new(config.group_access.groups.clone()).unwrap()
    }

    #[test]
    fn test_encode_request_sorts_apis_and_flags_create() {
        let config = config();
        let request = ApiClientCodec::encode_request(&config, &groups(&config), true);
        let ids: Vec<i64> = request.api_access.apis.iter().map(|a| a.api_id).collect();
        assert_eq!(ids, vec![3, 9]);
        assert_eq!(request.create_credential, Some(true));
        assert_eq!(request.group_access.groups[0].group_id, 123);

        let update = ApiClientCodec::encode_request(&config, &groups(&config), false);
        assert_eq!(update.create_credential, None);
        let json = serde_json::to_value(&update).unwrap();
        assert!(json.get("createCredential").is_none());
    }

    #[test]
    fn test_encode_request_omits_gated_lists() {
        let mut config = config();
        config.api_access.all_accessible_apis = true;
        config.group_access.clone_authorized_user_groups = true;
        let request = ApiClientCodec::encode_request(&config, &groups(&config), false);
        assert!(request.api_access.apis.is_empty());
        assert!(request.group_access.groups.is_empty());
    }
}
