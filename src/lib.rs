pub mod commands;
pub mod config;
pub mod http;
pub mod projects;
pub mod scrape;
pub mod services;
pub mod source;
pub mod stats;

pub use config::{Config, LookupPolicy};
pub use stats::{Aggregator, RepositoryStats};
