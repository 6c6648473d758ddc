//! HTTP client for the identity-management API.

use reqwest::Client;
use reqwest::header::RETRY_AFTER;
use secrecy::{ExposeSecret, Secret};
use serde::de::DeserializeOwned;
use std::time::{Duration, Instant};
use tracing::{debug, instrument};

use super::error::error_from_response;
use super::models::{
    ApiClientRequest, ApiClientResponse, AuthGrantRequest, CredentialResponse, GrantNode,
    UpdateCredentialRequest, UserIdentityResponse,
};
use crate::error::AppError;
use crate::observability::{TracedClientExt, TracedRequest};

const API_CLIENTS_PATH: &str = "/identity-management/v3/api-clients";
const GROUPS_PATH: &str = "/identity-management/v3/user-admin/groups";
const UI_IDENTITIES_PATH: &str = "/identity-management/v3/user-admin/ui-identities";
const USERS_PATH: &str = "/identity-management/v3/users";

/// Configuration for the identity API client.
#[derive(Clone, Debug)]
pub struct IdentityClientConfig {
    /// Base URL of the API host (e.g., "https://akab-xxxx.luna.akamaiapis.net").
    pub base_url: String,
    /// Bearer token, when the transport in front of the API expects one.
    pub access_token: Option<Secret<String>>,
    /// Account to act on behalf of, sent as `accountSwitchKey`.
    pub account_switch_key: Option<String>,
    /// Connection timeout.
    pub connect_timeout: Duration,
    /// Request timeout.
    pub request_timeout: Duration,
}

impl Default for IdentityClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            access_token: None,
            account_switch_key: None,
            connect_timeout: Duration::from_secs(5),
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// Identity API client. Cheap to clone; connections are pooled by `reqwest`.
#[derive(Clone)]
pub struct IdentityClient {
    http: Client,
    config: IdentityClientConfig,
}

impl IdentityClient {
    pub fn new(config: IdentityClientConfig) -> Result<Self, AppError> {
        let http = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .build()?;

        tracing::info!(
            base_url = %config.base_url,
            account_switch = config.account_switch_key.is_some(),
            "Identity API client configured"
        );

        Ok(Self { http, config })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    fn prepare(&self, request: TracedRequest, query: &[(&str, &str)]) -> TracedRequest {
        let mut params: Vec<(&str, &str)> = query.to_vec();
        if let Some(key) = self.config.account_switch_key.as_deref() {
            params.push(("accountSwitchKey", key));
        }

        let request = request.query(&params);
        match &self.config.access_token {
            Some(token) => request.bearer_auth(token.expose_secret()),
            None => request,
        }
    }

    async fn execute(&self, operation: &'static str, request: TracedRequest) -> Result<String, AppError> {
        let start = Instant::now();
        let result = self.execute_inner(request).await;

        let outcome = if result.is_ok() { "success" } else { "error" };
        metrics::counter!("iam_http_requests_total", "operation" => operation, "outcome" => outcome)
            .increment(1);
        metrics::histogram!("iam_http_request_duration_seconds", "operation" => operation)
            .record(start.elapsed().as_secs_f64());

        result
    }

    async fn execute_inner(&self, request: TracedRequest) -> Result<String, AppError> {
        let response = request.send().await?;
        let status = response.status();
        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse().ok());
        let body = response.text().await?;

        if !status.is_success() {
            debug!(status = status.as_u16(), "Identity API returned an error");
            return Err(error_from_response(status, &body, retry_after));
        }

        Ok(body)
    }

    async fn execute_json<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        request: TracedRequest,
    ) -> Result<T, AppError> {
        let body = self.execute(operation, request).await?;
        Ok(serde_json::from_str(&body)?)
    }

    // =========================================================================
    // API clients
    // =========================================================================

    /// Create an API client, requesting its first credential.
    #[instrument(skip(self, request))]
    pub async fn create_api_client(
        &self,
        request: &ApiClientRequest,
    ) -> Result<ApiClientResponse, AppError> {
        let req = self.prepare(self.http.traced_post(&self.url(API_CLIENTS_PATH)), &[]);
        self.execute_json("create_api_client", req.json(request)).await
    }

    /// Fetch an API client with actions, credentials, groups, APIs and IP ACL.
    #[instrument(skip(self))]
    pub async fn get_api_client(&self, client_id: &str) -> Result<ApiClientResponse, AppError> {
        let url = self.url(&format!("{}/{}", API_CLIENTS_PATH, client_id));
        let req = self.prepare(
            self.http.traced_get(&url),
            &[
                ("actions", "true"),
                ("apiAccess", "true"),
                ("credentials", "true"),
                ("groupAccess", "true"),
                ("ipAcl", "true"),
            ],
        );
        self.execute_json("get_api_client", req).await
    }

    #[instrument(skip(self, request))]
    pub async fn update_api_client(
        &self,
        client_id: &str,
        request: &ApiClientRequest,
    ) -> Result<ApiClientResponse, AppError> {
        let url = self.url(&format!("{}/{}", API_CLIENTS_PATH, client_id));
        let req = self.prepare(self.http.traced_put(&url), &[]);
        self.execute_json("update_api_client", req.json(request)).await
    }

    #[instrument(skip(self))]
    pub async fn delete_api_client(&self, client_id: &str) -> Result<(), AppError> {
        let url = self.url(&format!("{}/{}", API_CLIENTS_PATH, client_id));
        let req = self.prepare(self.http.traced_delete(&url), &[]);
        self.execute("delete_api_client", req).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn lock_api_client(&self, client_id: &str) -> Result<ApiClientResponse, AppError> {
        let url = self.url(&format!("{}/{}/lock", API_CLIENTS_PATH, client_id));
        let req = self.prepare(self.http.traced_put(&url), &[]);
        self.execute_json("lock_api_client", req).await
    }

    #[instrument(skip(self))]
    pub async fn unlock_api_client(&self, client_id: &str) -> Result<ApiClientResponse, AppError> {
        let url = self.url(&format!("{}/{}/unlock", API_CLIENTS_PATH, client_id));
        let req = self.prepare(self.http.traced_put(&url), &[]);
        self.execute_json("unlock_api_client", req).await
    }

    // =========================================================================
    // Credentials
    // =========================================================================

    #[instrument(skip(self, request))]
    pub async fn update_credential(
        &self,
        client_id: &str,
        credential_id: i64,
        request: &UpdateCredentialRequest,
    ) -> Result<CredentialResponse, AppError> {
        let url = self.url(&format!(
            "{}/{}/credentials/{}",
            API_CLIENTS_PATH, client_id, credential_id
        ));
        let req = self.prepare(self.http.traced_put(&url), &[]);
        self.execute_json("update_credential", req.json(request)).await
    }

    #[instrument(skip(self))]
    pub async fn deactivate_credential(
        &self,
        client_id: &str,
        credential_id: i64,
    ) -> Result<(), AppError> {
        let url = self.url(&format!(
            "{}/{}/credentials/{}/deactivate",
            API_CLIENTS_PATH, client_id, credential_id
        ));
        let req = self.prepare(self.http.traced_post(&url), &[]);
        self.execute("deactivate_credential", req).await?;
        Ok(())
    }

    // =========================================================================
    // Groups and auth grants
    // =========================================================================

    /// List the account's group tree.
    #[instrument(skip(self))]
    pub async fn list_groups(&self) -> Result<Vec<GrantNode>, AppError> {
        let req = self.prepare(
            self.http.traced_get(&self.url(GROUPS_PATH)),
            &[("actions", "true")],
        );
        self.execute_json("list_groups", req).await
    }

    /// List the groups a user may grant to an API client.
    #[instrument(skip(self))]
    pub async fn list_accessible_groups(&self, username: &str) -> Result<Vec<GrantNode>, AppError> {
        let url = self.url(&format!("{}/{}/groups", USERS_PATH, username));
        let req = self.prepare(self.http.traced_get(&url), &[]);
        self.execute_json("list_accessible_groups", req).await
    }

    #[instrument(skip(self))]
    pub async fn get_user_auth_grants(
        &self,
        ui_identity_id: &str,
    ) -> Result<Vec<GrantNode>, AppError> {
        let url = self.url(&format!("{}/{}", UI_IDENTITIES_PATH, ui_identity_id));
        let req = self.prepare(self.http.traced_get(&url), &[("authGrants", "true")]);
        let user: UserIdentityResponse = self.execute_json("get_user_auth_grants", req).await?;
        Ok(user.auth_grants)
    }

    #[instrument(skip(self, grants))]
    pub async fn update_user_auth_grants(
        &self,
        ui_identity_id: &str,
        grants: &[AuthGrantRequest],
    ) -> Result<Vec<GrantNode>, AppError> {
        let url = self.url(&format!(
            "{}/{}/auth-grants",
            UI_IDENTITIES_PATH, ui_identity_id
        ));
        let req = self.prepare(self.http.traced_put(&url), &[]);
        self.execute_json("update_user_auth_grants", req.json(grants))
            .await
    }
}
