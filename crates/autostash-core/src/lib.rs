pub mod audit;
pub mod capture;
pub mod clear;
pub mod config;
pub mod error;
pub mod git;
pub mod job;
pub mod outcome;
pub mod paths;
pub mod persist;
pub mod probe;
pub mod report;
pub mod scheduler;
pub mod tracklist;

pub use error::{Result, StashError};
