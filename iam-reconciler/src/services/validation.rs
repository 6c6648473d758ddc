//! Checks run on a desired API client before any remote call.

use validator::Validate;

use super::error::ReconcileError;
use crate::models::{ApiClientConfig, GrantTree};

/// Name of the API whose selection requires purge options.
pub const PURGE_CAPABLE_API_NAME: &str = "CCU APIs";

pub const GROUPS_REQUIRED: &str =
    "group_access.groups must be set unless clone_authorized_user_groups is true";
pub const APIS_REQUIRED: &str = "api_access.apis must be set unless all_accessible_apis is true";
pub const APIS_FORBIDDEN: &str = "api_access.apis must be empty when all_accessible_apis is true";
pub const PURGE_OPTIONS_REQUIRED: &str =
    "purge_options must be set when all_accessible_apis is true or CCU APIs are selected";
pub const CP_CODES_FORBIDDEN: &str =
    "purge_options.cp_code_access.cp_codes must be empty when all_current_and_new_cp_codes is true";
pub const CIDR_REQUIRED: &str = "ip_acl.cidr must be set when ip_acl.enable is true";
pub const UNLOCK_FIRST: &str =
    "API client is locked: set lock to false before changing other attributes";

/// Validate `config` and return its group tree, bounded for encoding.
pub fn validate_api_client(config: &ApiClientConfig) -> Result<GrantTree, ReconcileError> {
    config.validate()?;

    let violations = cross_field_violations(config);
    if !violations.is_empty() {
        tracing::debug!(?violations, "API client configuration rejected");
        return Err(ReconcileError::Validation(violations.join("; ")));
    }

    Ok(GrantTree::new(config.group_access.groups.clone())?)
}

fn cross_field_violations(config: &ApiClientConfig) -> Vec<&'static str> {
    let mut violations = Vec::new();

    if !config.group_access.clone_authorized_user_groups && config.group_access.groups.is_empty()
    {
        violations.push(GROUPS_REQUIRED);
    }

    let api_access = &config.api_access;
    if api_access.all_accessible_apis {
        if !api_access.apis.is_empty() {
            violations.push(APIS_FORBIDDEN);
        }
    } else if api_access.apis.is_empty() {
        violations.push(APIS_REQUIRED);
    }

    let purge_capable_selected = api_access
        .apis
        .iter()
        .any(|api| api.api_name.as_deref() == Some(PURGE_CAPABLE_API_NAME));
    match &config.purge_options {
        None if api_access.all_accessible_apis || purge_capable_selected => {
            violations.push(PURGE_OPTIONS_REQUIRED);
        }
        Some(options)
            if options.cp_code_access.all_current_and_new_cp_codes
                && !options.cp_code_access.cp_codes.is_empty() =>
        {
            violations.push(CP_CODES_FORBIDDEN);
        }
        _ => {}
    }

    if let Some(acl) = &config.ip_acl {
        if acl.enable && acl.cidr.is_empty() {
            violations.push(CIDR_REQUIRED);
        }
    }

    violations
}
