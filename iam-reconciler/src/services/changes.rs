use crate::codec::ApiClientCodec;
use crate::models::{ApiClientConfig, ApiClientState, CredentialConfig, CredentialState, GrantTree};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockTransition {
    NoChange,
    Locking,
    Unlocking,
}

impl LockTransition {
    pub fn between(was_locked: bool, lock: bool) -> Self {
        match (was_locked, lock) {
            (false, true) => LockTransition::Locking,
            (true, false) => LockTransition::Unlocking,
            _ => LockTransition::NoChange,
        }
    }
}

/// What an update has to do to move `prior` to the desired configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApiClientChanges {
    pub lock: LockTransition,
    /// Some write-significant field outside `lock` and `credential` differs.
    pub fields: bool,
    pub credential: bool,
}

impl ApiClientChanges {
    pub fn between(prior: &ApiClientState, desired: &ApiClientConfig, groups: &GrantTree) -> Self {
        let current =
            ApiClientCodec::encode_request(&prior.declared(), &prior.group_access.groups, false);
        let wanted = ApiClientCodec::encode_request(desired, groups, false);

        Self {
            lock: LockTransition::between(prior.lock, desired.lock),
            fields: current != wanted,
            credential: credential_changed(prior.credential.as_ref(), desired.credential.as_ref()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.lock == LockTransition::NoChange && !self.fields && !self.credential
    }
}

pub(crate) fn credential_changed(
    prior: Option<&CredentialState>,
    desired: Option<&CredentialConfig>,
) -> bool {
    let (Some(prior), Some(desired)) = (prior, desired) else {
        return false;
    };

    let description = desired.description.is_some() && desired.description != prior.description;
    let expiry = desired.expires_on.is_some_and(|e| e != prior.expires_on);
    let status = desired.status.is_some_and(|s| s != prior.status);
    description || expiry || status
}
