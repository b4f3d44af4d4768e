pub mod analyze;
pub mod collect;
pub mod config;
pub mod init;
pub mod models;
pub mod report;
