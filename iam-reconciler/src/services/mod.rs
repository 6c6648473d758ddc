//! Reconciliation services.
//!
//! The identity API is reached through the [`IdentityService`] trait, so the
//! reconciler and readers run the same against [`IdentityClient`] and
//! [`MockIdentityService`].
//!
//! [`IdentityClient`]: iam_core::client::IdentityClient

pub mod changes;
pub mod credential;
pub mod error;
mod grants;
pub mod metrics;
pub mod mock;
pub mod plan_modifier;
mod reconciler;
mod remote;
pub mod validation;

pub use changes::{ApiClientChanges, LockTransition};
pub use credential::{CredentialMatch, CredentialMatcher, SecretResolution, SecretSource};
pub use error::ReconcileError;
pub use grants::GrantReader;
pub use mock::{MockFailure, MockIdentityService, RemoteCall};
pub use plan_modifier::plan_api_client;
pub use reconciler::ApiClientReconciler;
pub use remote::{IdentityService, connect};
pub use validation::validate_api_client;
