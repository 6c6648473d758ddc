use iam_core::error::AppError;
use thiserror::Error;

use crate::codec::DepthExceeded;

#[derive(Error, Debug)]
pub enum ReconcileError {
    #[error(transparent)]
    DepthExceeded(#[from] DepthExceeded),

    #[error("{0}")]
    Validation(String),

    #[error("{operation} failed: {source}")]
    RemoteCall {
        operation: &'static str,
        #[source]
        source: AppError,
    },

    #[error("API client {client_id} has no credentials")]
    NoCredentialsFound { client_id: String },

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl ReconcileError {
    pub fn remote(operation: &'static str) -> impl FnOnce(AppError) -> Self {
        move |source| ReconcileError::RemoteCall { operation, source }
    }

    /// True when a remote call reported the resource as missing.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ReconcileError::RemoteCall { source, .. } if source.is_not_found())
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, ReconcileError::Validation(_))
    }
}

impl From<validator::ValidationErrors> for ReconcileError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut messages: Vec<String> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| match &e.message {
                    Some(message) => message.to_string(),
                    None => format!("{} is invalid", field),
                })
            })
            .collect();
        messages.sort();
        ReconcileError::Validation(messages.join("; "))
    }
}

impl From<ReconcileError> for AppError {
    fn from(err: ReconcileError) -> Self {
        match err {
            ReconcileError::DepthExceeded(e) => AppError::BadRequest(anyhow::anyhow!(e)),
            ReconcileError::Validation(e) => AppError::BadRequest(anyhow::anyhow!(e)),
            ReconcileError::RemoteCall { source, .. } => source,
            e @ ReconcileError::NoCredentialsFound { .. } => {
                AppError::InternalError(anyhow::anyhow!(e.to_string()))
            }
            ReconcileError::Internal(e) => AppError::InternalError(e),
        }
    }
}
