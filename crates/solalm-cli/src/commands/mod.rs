//! CLI command handlers.

pub mod connect;
pub mod donate;
pub mod featured;
pub mod info;
pub mod run;
