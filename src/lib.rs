// Airflow user provisioning - Core Library
// Exposes all modules for use in the CLI and tests

pub mod config;
pub mod db;
pub mod prompt;
pub mod provision;
pub mod user;

// Re-export commonly used types
pub use config::Settings;
pub use db::{Session, setup_database, insert_user, find_user, count_users};
pub use prompt::{Console, Prompt, Scripted};
pub use provision::{collect_user, is_confirmed, persist, run};
pub use user::{PasswordUser, User};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
