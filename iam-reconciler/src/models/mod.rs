pub mod api_client;
pub mod grant;
pub mod plan;

pub use api_client::{
    ApiAccess, ApiAccessConfig, ApiClientConfig, ApiClientState, ClientActions, CpCodeAccess,
    CredentialActions, CredentialConfig, CredentialState, GroupAccessConfig, GroupAccessState,
    IpAcl, PurgeOptions,
};
pub use grant::{BoundedGrants, GrantTree, GroupGrant};
pub use plan::{PlannedApiClient, paths};
