//! Planned API client: desired values plus the attributes only known after apply.

use std::collections::BTreeSet;

use super::ApiClientConfig;

/// Attribute paths a plan can mark as unknown.
pub mod paths {
    pub const CLIENT_ID: &str = "client_id";
    pub const ACTIONS: &str = "actions";
    pub const ACTIONS_LOCK: &str = "actions.lock";
    pub const ACTIONS_UNLOCK: &str = "actions.unlock";
    pub const CREDENTIAL: &str = "credential";
    pub const API_ACCESS_APIS: &str = "api_access.apis";
    pub const GROUP_ACCESS_GROUPS: &str = "group_access.groups";
    pub const FIRST_GROUP_NAME: &str = "group_access.groups[0].group_name";
    pub const FIRST_GROUP_ROLE_DESCRIPTION: &str = "group_access.groups[0].role_description";
    pub const FIRST_GROUP_PARENT_GROUP_ID: &str = "group_access.groups[0].parent_group_id";
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedApiClient {
    pub desired: ApiClientConfig,
    pub unknown: BTreeSet<String>,
}

impl PlannedApiClient {
    pub fn new(desired: ApiClientConfig) -> Self {
        Self {
            desired,
            unknown: BTreeSet::new(),
        }
    }

    pub fn mark_unknown(&mut self, path: &str) {
        self.unknown.insert(path.to_string());
    }

    pub fn is_unknown(&self, path: &str) -> bool {
        self.unknown.contains(path)
    }
}
