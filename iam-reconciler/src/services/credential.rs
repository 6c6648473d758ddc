//! Credential continuity across reads.
//!
//! The server lists an API client's credentials but never re-discloses a
//! secret after the response that issued it, and offers no stable pointer to
//! the "current" credential. The matcher decides which fetched credential the
//! state tracks and whether a known secret survives.

use iam_core::client::CredentialResponse;
use secrecy::Secret;

use super::error::ReconcileError;
use crate::models::CredentialState;

/// Where a secret for the tracked credential can come from.
#[derive(Debug, Clone, Copy)]
pub enum SecretSource<'a> {
    /// The credential tracked in prior state, with its secret if known.
    Prior {
        credential_id: i64,
        secret: Option<&'a Secret<String>>,
    },
    /// The credential issued by a create in this same call chain.
    Issued(&'a CredentialResponse),
    None,
}

impl<'a> SecretSource<'a> {
    pub fn from_state(prior: Option<&'a CredentialState>) -> Self {
        match prior {
            Some(c) => SecretSource::Prior {
                credential_id: c.credential_id,
                secret: c.client_secret.as_ref(),
            },
            None => SecretSource::None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretResolution {
    /// Prior credential still present; its secret is kept.
    Carried,
    /// Secret taken from the issuing response.
    Issued,
    /// Prior credential gone; another one is tracked without a secret.
    Dropped { prior_credential_id: i64 },
    /// Nothing to take a secret from.
    NotComputable,
}

#[derive(Debug, Clone)]
pub struct CredentialMatch {
    pub credential: CredentialState,
    pub resolution: SecretResolution,
}

impl CredentialMatch {
    /// Final credential state. A secret that is not computable never replaces
    /// one the caller already holds for the same credential.
    pub fn into_state(self, held: Option<&CredentialState>) -> CredentialState {
        let mut credential = self.credential;
        if self.resolution == SecretResolution::NotComputable {
            credential.client_secret = held
                .filter(|h| h.credential_id == credential.credential_id)
                .and_then(|h| h.client_secret.clone());
        }
        credential
    }
}

pub struct CredentialMatcher;

impl CredentialMatcher {
    pub fn resolve(
        client_id: &str,
        source: SecretSource<'_>,
        fetched: &[CredentialResponse],
    ) -> Result<CredentialMatch, ReconcileError> {
        let Some(first) = fetched.first() else {
            tracing::error!(client_id = %client_id, "API client has no credentials");
            return Err(ReconcileError::NoCredentialsFound {
                client_id: client_id.to_string(),
            });
        };

        let matched = match source {
            SecretSource::Prior {
                credential_id,
                secret,
            } => match fetched.iter().find(|c| c.credential_id == credential_id) {
                Some(current) => CredentialMatch {
                    credential: CredentialState::from_response(current, secret.cloned()),
                    resolution: SecretResolution::Carried,
                },
                None => {
                    tracing::info!(
                        client_id = %client_id,
                        prior_credential_id = credential_id,
                        credential_id = first.credential_id,
                        "Tracked credential no longer exists, dropping its secret"
                    );
                    CredentialMatch {
                        credential: CredentialState::from_response(first, None),
                        resolution: SecretResolution::Dropped {
                            prior_credential_id: credential_id,
                        },
                    }
                }
            },
            SecretSource::Issued(issued) => {
                match fetched.iter().find(|c| c.credential_id == issued.credential_id) {
                    Some(current) => CredentialMatch {
                        credential: CredentialState::from_response(
                            current,
                            issued.client_secret.clone(),
                        ),
                        resolution: SecretResolution::Issued,
                    },
                    None => {
                        tracing::warn!(
                            client_id = %client_id,
                            issued_credential_id = issued.credential_id,
                            credential_id = first.credential_id,
                            "Issued credential not listed, tracking another without a secret"
                        );
                        CredentialMatch {
                            credential: CredentialState::from_response(first, None),
                            resolution: SecretResolution::NotComputable,
                        }
                    }
                }
            }
            SecretSource::None => CredentialMatch {
                credential: CredentialState::from_response(first, None),
                resolution: SecretResolution::NotComputable,
            },
        };

        tracing::debug!(
            client_id = %client_id,
            credential_id = matched.credential.credential_id,
            resolution = ?matched.resolution,
            "Resolved credential"
        );
        Ok(matched)
    }
}
