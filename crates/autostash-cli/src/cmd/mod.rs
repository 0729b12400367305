pub mod add;
pub mod clear;
pub mod config;
pub mod list;
pub mod remove;
pub mod version;
pub mod watch;
