pub mod loader;
pub mod types;

pub use loader::{load_credentials, parse_credentials, FileFormat};
pub use types::{Credentials, PublishTarget};
