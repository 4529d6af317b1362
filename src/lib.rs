pub mod commands;
pub mod config;
pub mod error;
pub mod error_handling;
pub mod git;
pub mod gitignore;
pub mod identity;
pub mod interactive;
pub mod models;
pub mod ui;

pub use error::{Result, SyncError};
pub use models::*;
