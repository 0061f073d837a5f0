//! Application plumbing: context, path resolution and store access.

mod context;
mod passphrase;
mod resolver;
mod store;

pub use context::{parse_timezone, AppContext};
pub use resolver::{missing_store_error, resolve_config_path};
pub use store::OpenStore;
