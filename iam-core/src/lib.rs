//! iam-core: Shared infrastructure for the IAM reconciler.
pub mod client;
pub mod config;
pub mod error;
pub mod observability;

pub use async_trait;
pub use chrono;
pub use reqwest;
pub use secrecy;
pub use serde;
pub use serde_json;
pub use tokio;
pub use tracing;
pub use validator;
