pub mod error;
pub mod http;
pub mod memory;
pub mod types;

pub use error::MgmtError;
pub use http::HttpManager;
pub use memory::MemoryManager;
pub use types::{QueryOutcome, SharedFsManager};
