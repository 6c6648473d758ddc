//! Identity-management API client layer.
//!
//! - Wire models for API clients, credentials, groups and auth grants
//! - Mapping of HTTP failures onto `AppError`
//! - A `reqwest` client with trace-context propagation

pub mod error;
pub mod identity_client;
pub mod models;

pub use error::error_from_response;
pub use identity_client::{IdentityClient, IdentityClientConfig};
pub use models::{
    AccessLevel, ApiAccessEntry, ApiAccessRequest, ApiAccessResponse, ApiClientRequest,
    ApiClientResponse, ApiRequestItem, AuthGrantRequest, ClientActionsPayload,
    ClientGroupRequest, ClientType, CpCodeAccessPayload, CredentialActionsPayload,
    CredentialResponse, CredentialStatus, GrantNode, GroupAccessRequest, GroupAccessResponse,
    IpAclPayload, PurgeOptionsPayload, UpdateCredentialRequest, UserIdentityResponse,
};
