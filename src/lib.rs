pub mod config;
pub mod domain;
pub mod error;
pub mod git;
pub mod release;
pub mod storage;
pub mod ui;

pub use error::{Result, VersionManagerError};
