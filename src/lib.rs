pub mod cli;
pub mod config;
pub mod draft;
pub mod export;
pub mod remote;
pub mod storage;

pub use config::{AppConfig, ConfigLoader, ConfigPaths};
