pub mod config;
pub mod models;
pub mod storage;
pub mod utils;
pub mod validation;

pub use config::*;
pub use models::api::*;
pub use models::session::*;
pub use storage::{FileStorage, LocalStorage, MemoryStorage, StorageError};
pub use utils::*;
pub use validation::{LoginForm, RegisterForm, ValidationError};
