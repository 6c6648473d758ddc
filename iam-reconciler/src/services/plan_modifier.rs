//! Plan-time adjustments for API clients. No remote calls.

use super::changes::{ApiClientChanges, LockTransition};
use super::error::ReconcileError;
use super::validation::UNLOCK_FIRST;
use crate::models::{ApiClientConfig, ApiClientState, GrantTree, PlannedApiClient, paths};

/// Plan `desired` against the last-known state, marking the attributes the
/// apply will only learn from the server.
pub fn plan_api_client(
    prior: Option<&ApiClientState>,
    desired: ApiClientConfig,
) -> Result<PlannedApiClient, ReconcileError> {
    let Some(prior) = prior else {
        return Ok(plan_create(desired));
    };

    let groups = GrantTree::new(desired.group_access.groups.clone())?;
    let changes = ApiClientChanges::between(prior, &desired, &groups);

    if prior.lock && desired.lock && (changes.fields || changes.credential) {
        tracing::debug!(client_id = %prior.client_id, "Rejecting change to a locked API client");
        return Err(ReconcileError::Validation(UNLOCK_FIRST.to_string()));
    }

    let mut planned = PlannedApiClient::new(desired);

    // The server answers with its full catalog, never the declared list.
    if planned.desired.api_access.all_accessible_apis {
        planned.mark_unknown(paths::API_ACCESS_APIS);
    }

    let was_cloned = prior.group_access.clone_authorized_user_groups;
    let cloned = planned.desired.group_access.clone_authorized_user_groups;
    if cloned && !was_cloned {
        planned.mark_unknown(paths::GROUP_ACCESS_GROUPS);
    } else if was_cloned && !cloned {
        if let Some(first) = planned.desired.group_access.groups.first_mut() {
            first.clear_server_fields();
            planned.mark_unknown(paths::FIRST_GROUP_NAME);
            planned.mark_unknown(paths::FIRST_GROUP_ROLE_DESCRIPTION);
            planned.mark_unknown(paths::FIRST_GROUP_PARENT_GROUP_ID);
        }
    }

    if changes.lock != LockTransition::NoChange {
        planned.mark_unknown(paths::ACTIONS_LOCK);
        planned.mark_unknown(paths::ACTIONS_UNLOCK);
    }

    Ok(planned)
}

fn plan_create(desired: ApiClientConfig) -> PlannedApiClient {
    let mut planned = PlannedApiClient::new(desired);
    planned.mark_unknown(paths::CLIENT_ID);
    planned.mark_unknown(paths::ACTIONS);
    planned.mark_unknown(paths::CREDENTIAL);
    if planned.desired.api_access.all_accessible_apis {
        planned.mark_unknown(paths::API_ACCESS_APIS);
    }
    if planned.desired.group_access.clone_authorized_user_groups {
        planned.mark_unknown(paths::GROUP_ACCESS_GROUPS);
    }
    planned
}
