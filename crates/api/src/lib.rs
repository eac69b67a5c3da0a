pub mod client;
pub mod error;
pub mod interview;
pub mod session;
pub mod types;

pub use client::ApiClient;
pub use error::{ApiError, ApiResult};
pub use session::SessionStore;
pub use types::*;
