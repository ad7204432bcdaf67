pub mod cache;
pub mod config;
pub mod observability;
pub mod targets;
pub mod throttle;
pub mod worker;
