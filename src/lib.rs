pub mod app;
pub mod assist;
pub mod config;
pub mod core;
pub mod error;
pub mod notify;
pub mod session;
pub mod store;

pub use config::AppConfig;
pub use error::{Error, Result};
pub use session::SessionState;
pub use store::Store;
