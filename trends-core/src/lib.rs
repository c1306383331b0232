pub mod config;
pub mod error;
pub mod error_utils;
pub mod series;
pub mod types;

pub use config::AppConfig;
pub use error::*;
pub use error_utils::*;
pub use types::*;
