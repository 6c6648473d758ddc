//! Reconciles IAM API clients, group listings and user auth grants against
//! the identity-management API.

pub mod codec;
pub mod config;
pub mod models;
pub mod services;
