//! Conversions between server payloads and attribute trees.

pub mod api_client;
pub mod depth;
pub mod grant_tree;

pub use api_client::ApiClientCodec;
pub use depth::{DEPTH_EXCEEDED_MESSAGE, DepthExceeded, DepthGuard, MAX_GRANT_DEPTH, TreeNode};
pub use grant_tree::GrantTreeCodec;
