pub mod http;
pub mod navigator;
pub mod token_store;

pub use http::HttpBackend;
pub use navigator::RecordingNavigator;
pub use token_store::{FileTokenStore, MemoryTokenStore};
