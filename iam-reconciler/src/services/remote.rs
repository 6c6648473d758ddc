use async_trait::async_trait;
use iam_core::client::{
    ApiClientRequest, ApiClientResponse, AuthGrantRequest, CredentialResponse, GrantNode,
    IdentityClient, UpdateCredentialRequest,
};
use iam_core::error::AppError;
use std::sync::Arc;

use crate::config::IdentityApiConfig;

/// Single-call operations of the identity-management API.
#[async_trait]
pub trait IdentityService: Send + Sync {
    async fn create_api_client(
        &self,
        request: &ApiClientRequest,
    ) -> Result<ApiClientResponse, AppError>;

    async fn get_api_client(&self, client_id: &str) -> Result<ApiClientResponse, AppError>;

    async fn update_api_client(
        &self,
        client_id: &str,
        request: &ApiClientRequest,
    ) -> Result<ApiClientResponse, AppError>;

    async fn delete_api_client(&self, client_id: &str) -> Result<(), AppError>;

    async fn lock_api_client(&self, client_id: &str) -> Result<ApiClientResponse, AppError>;

    async fn unlock_api_client(&self, client_id: &str) -> Result<ApiClientResponse, AppError>;

    async fn update_credential(
        &self,
        client_id: &str,
        credential_id: i64,
        request: &UpdateCredentialRequest,
    ) -> Result<CredentialResponse, AppError>;

    async fn deactivate_credential(&self, client_id: &str, credential_id: i64)
    -> Result<(), AppError>;

    async fn list_groups(&self) -> Result<Vec<GrantNode>, AppError>;

    async fn list_accessible_groups(&self, username: &str) -> Result<Vec<GrantNode>, AppError>;

    async fn get_user_auth_grants(&self, ui_identity_id: &str)
    -> Result<Vec<GrantNode>, AppError>;

    async fn update_user_auth_grants(
        &self,
        ui_identity_id: &str,
        grants: &[AuthGrantRequest],
    ) -> Result<Vec<GrantNode>, AppError>;
}

/// HTTP-backed service handle for `config`.
pub fn connect(config: &IdentityApiConfig) -> Result<Arc<dyn IdentityService>, AppError> {
    let client = IdentityClient::new(config.client_config())?;
    tracing::info!(base_url = %config.base_url, "Identity API client initialized");
    Ok(Arc::new(client))
}

#[async_trait]
impl IdentityService for IdentityClient {
    async fn create_api_client(
        &self,
        request: &ApiClientRequest,
    ) -> Result<ApiClientResponse, AppError> {
        IdentityClient::create_api_client(self, request).await
    }

    async fn get_api_client(&self, client_id: &str) -> Result<ApiClientResponse, AppError> {
        IdentityClient::get_api_client(self, client_id).await
    }

    async fn update_api_client(
        &self,
        client_id: &str,
        request: &ApiClientRequest,
    ) -> Result<ApiClientResponse, AppError> {
        IdentityClient::update_api_client(self, client_id, request).await
    }

    async fn delete_api_client(&self, client_id: &str) -> Result<(), AppError> {
        IdentityClient::delete_api_client(self, client_id).await
    }

    async fn lock_api_client(&self, client_id: &str) -> Result<ApiClientResponse, AppError> {
        IdentityClient::lock_api_client(self, client_id).await
    }

    async fn unlock_api_client(&self, client_id: &str) -> Result<ApiClientResponse, AppError> {
        IdentityClient::unlock_api_client(self, client_id).await
    }

    async fn update_credential(
        &self,
        client_id: &str,
        credential_id: i64,
        request: &UpdateCredentialRequest,
    ) -> Result<CredentialResponse, AppError> {
        IdentityClient::update_credential(self, client_id, credential_id, request).await
    }

    async fn deactivate_credential(
        &self,
        client_id: &str,
        credential_id: i64,
    ) -> Result<(), AppError> {
        IdentityClient::deactivate_credential(self, client_id, credential_id).await
    }

    async fn list_groups(&self) -> Result<Vec<GrantNode>, AppError> {
        IdentityClient::list_groups(self).await
    }

    async fn list_accessible_groups(&self, username: &str) -> Result<Vec<GrantNode>, AppError> {
        IdentityClient::list_accessible_groups(self, username).await
    }

    async fn get_user_auth_grants(
        &self,
        ui_identity_id: &str,
    ) -> Result<Vec<GrantNode>, AppError> {
        IdentityClient::get_user_auth_grants(self, ui_identity_id).await
    }

    async fn update_user_auth_grants(
        &self,
        ui_identity_id: &str,
        grants: &[AuthGrantRequest],
    ) -> Result<Vec<GrantNode>, AppError> {
        IdentityClient::update_user_auth_grants(self, ui_identity_id, grants).await
    }
}
