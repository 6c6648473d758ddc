//! API client lifecycle against the identity service.
//!
//! Every operation is a strict sequence of awaited remote calls. A failure
//! stops the sequence and is returned as is; completed calls are not rolled
//! back, the next read picks up whatever state they left.

use iam_core::client::{ApiClientResponse, UpdateCredentialRequest};
use std::sync::Arc;
use tracing::instrument;

use super::changes::{ApiClientChanges, LockTransition, credential_changed};
use super::credential::{CredentialMatcher, SecretSource};
use super::error::ReconcileError;
use super::metrics::remote_call;
use super::remote::IdentityService;
use super::validation::{UNLOCK_FIRST, validate_api_client};
use crate::codec::ApiClientCodec;
use crate::models::{ApiClientConfig, ApiClientState, CredentialConfig, CredentialState};

pub struct ApiClientReconciler {
    service: Arc<dyn IdentityService>,
}

impl ApiClientReconciler {
    pub fn new(service: Arc<dyn IdentityService>) -> Self {
        Self { service }
    }

    #[instrument(skip(self, desired), fields(client_name = ?desired.client_name))]
    pub async fn create(&self, desired: &ApiClientConfig) -> Result<ApiClientState, ReconcileError> {
        let groups = validate_api_client(desired)?;

        let request = ApiClientCodec::encode_request(desired, &groups, true);
        let created = remote_call(
            "create_api_client",
            self.service.create_api_client(&request),
        )
        .await?;
        let client_id = created.client_id.as_str();
        tracing::info!(client_id = %client_id, "API client created");

        // The server fills an empty notification list with the creator's address.
        if desired.notification_emails.is_empty() {
            let update = ApiClientCodec::encode_request(desired, &groups, false);
            remote_call(
                "update_api_client",
                self.service.update_api_client(client_id, &update),
            )
            .await?;
        }

        if let (Some(issued), Some(declared)) = (created.credentials.first(), &desired.credential) {
            let issued_state = CredentialState::from_response(issued, None);
            if credential_changed(Some(&issued_state), Some(declared)) {
                self.update_credential(client_id, &issued_state, declared)
                    .await?;
            }
        }

        if desired.lock {
            remote_call("lock_api_client", self.service.lock_api_client(client_id)).await?;
            tracing::info!(client_id = %client_id, "API client locked");
        }

        let source = created
            .credentials
            .first()
            .map(SecretSource::Issued)
            .unwrap_or(SecretSource::None);
        let fetched = self.fetch(client_id).await?;
        Self::decode(fetched, source, None)
    }

    /// Refresh state from the server. `None` when the client no longer exists.
    #[instrument(skip(self, prior), fields(client_id = %prior.client_id))]
    pub async fn read(
        &self,
        prior: &ApiClientState,
    ) -> Result<Option<ApiClientState>, ReconcileError> {
        let fetched = match self.fetch(&prior.client_id).await {
            Ok(fetched) => fetched,
            Err(e) if e.is_not_found() => {
                tracing::info!(client_id = %prior.client_id, "API client no longer exists");
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        let held = prior.credential.as_ref();
        Self::decode(fetched, SecretSource::from_state(held), held).map(Some)
    }

    /// Adopt an existing client. Its credential secret stays unknown.
    #[instrument(skip(self))]
    pub async fn import(&self, client_id: &str) -> Result<ApiClientState, ReconcileError> {
        let fetched = self.fetch(client_id).await?;
        tracing::info!(client_id = %client_id, "API client imported");
        Self::decode(fetched, SecretSource::None, None)
    }

    #[instrument(skip(self, prior, desired), fields(client_id = %prior.client_id))]
    pub async fn update(
        &self,
        prior: &ApiClientState,
        desired: &ApiClientConfig,
    ) -> Result<ApiClientState, ReconcileError> {
        let groups = validate_api_client(desired)?;
        let changes = ApiClientChanges::between(prior, desired, &groups);
        let client_id = prior.client_id.as_str();

        if prior.lock && desired.lock && (changes.fields || changes.credential) {
            return Err(ReconcileError::Validation(UNLOCK_FIRST.to_string()));
        }
        if changes.is_empty() {
            tracing::debug!(client_id = %client_id, "API client already up to date");
        } else {
            tracing::debug!(client_id = %client_id, ?changes, "Updating API client");
        }

        if changes.lock == LockTransition::Unlocking {
            remote_call(
                "unlock_api_client",
                self.service.unlock_api_client(client_id),
            )
            .await?;
            tracing::info!(client_id = %client_id, "API client unlocked");
        }

        if changes.fields {
            let request = ApiClientCodec::encode_request(desired, &groups, false);
            remote_call(
                "update_api_client",
                self.service.update_api_client(client_id, &request),
            )
            .await?;
        }

        if changes.lock == LockTransition::Locking {
            remote_call("lock_api_client", self.service.lock_api_client(client_id)).await?;
            tracing::info!(client_id = %client_id, "API client locked");
        }

        if changes.credential {
            if let (Some(current), Some(declared)) = (&prior.credential, &desired.credential) {
                self.update_credential(client_id, current, declared).await?;
            }
        }

        let held = prior.credential.as_ref();
        let fetched = self.fetch(client_id).await?;
        Self::decode(fetched, SecretSource::from_state(held), held)
    }

    /// Deactivate the credential, best effort, then delete the client.
    #[instrument(skip(self, state), fields(client_id = %state.client_id))]
    pub async fn delete(&self, state: &ApiClientState) -> Result<(), ReconcileError> {
        let client_id = state.client_id.as_str();
        let mut deactivation_error = None;

        if let Some(credential) = state.credential.as_ref().filter(|c| c.is_active()) {
            let result = remote_call(
                "deactivate_credential",
                self.service
                    .deactivate_credential(client_id, credential.credential_id),
            )
            .await;

            match result {
                Ok(()) => tracing::info!(
                    client_id = %client_id,
                    credential_id = credential.credential_id,
                    "Credential deactivated"
                ),
                Err(e) if is_already_inactive(&e) => tracing::debug!(
                    client_id = %client_id,
                    credential_id = credential.credential_id,
                    "Credential already inactive"
                ),
                Err(e) => {
                    tracing::warn!(
                        client_id = %client_id,
                        credential_id = credential.credential_id,
                        error = %e,
                        "Failed to deactivate credential"
                    );
                    deactivation_error = Some(e.to_string());
                }
            }
        }

        match remote_call(
            "delete_api_client",
            self.service.delete_api_client(client_id),
        )
        .await
        {
            Ok(()) => {
                tracing::info!(client_id = %client_id, "API client deleted");
                Ok(())
            }
            Err(e) if e.is_not_found() => {
                tracing::info!(client_id = %client_id, "API client already deleted");
                Ok(())
            }
            Err(e) => {
                tracing::error!(
                    client_id = %client_id,
                    error = %e,
                    deactivation_error = ?deactivation_error,
                    "Failed to delete API client"
                );
                Err(e)
            }
        }
    }

    async fn fetch(&self, client_id: &str) -> Result<ApiClientResponse, ReconcileError> {
        remote_call("get_api_client", self.service.get_api_client(client_id)).await
    }

    async fn update_credential(
        &self,
        client_id: &str,
        current: &CredentialState,
        declared: &CredentialConfig,
    ) -> Result<(), ReconcileError> {
        let request = UpdateCredentialRequest {
            description: declared
                .description
                .clone()
                .or_else(|| current.description.clone()),
            expires_on: declared.expires_on.unwrap_or(current.expires_on),
            status: declared.status.unwrap_or(current.status),
        };
        remote_call(
            "update_credential",
            self.service
                .update_credential(client_id, current.credential_id, &request),
        )
        .await?;
        tracing::info!(
            client_id = %client_id,
            credential_id = current.credential_id,
            status = %request.status,
            "Credential updated"
        );
        Ok(())
    }

    fn decode(
        fetched: ApiClientResponse,
        source: SecretSource<'_>,
        held: Option<&CredentialState>,
    ) -> Result<ApiClientState, ReconcileError> {
        let credential =
            CredentialMatcher::resolve(&fetched.client_id, source, &fetched.credentials)?
                .into_state(held);
        Ok(ApiClientCodec::decode_state(&fetched, Some(credential))?)
    }
}

fn is_already_inactive(err: &ReconcileError) -> bool {
    match err {
        ReconcileError::RemoteCall { source, .. } => {
            source.detail().to_lowercase().contains("already inactive")
        }
        _ => false,
    }
}
