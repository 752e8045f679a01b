pub mod config;
pub mod logging;

pub mod api;
pub mod auth;
pub mod batch;
pub mod control;
pub mod driver;
pub mod gather;
pub mod job;
pub mod progress;
pub mod retry;
pub mod snapshot;
