pub mod api;
pub mod args;
pub mod cache;
pub mod commands;
mod config;
mod error;
pub mod filter;
pub mod model;
pub mod months;
pub mod pipeline;
pub mod report;
pub mod scheduler;
pub mod server;
mod utils;

pub use config::Config;
pub use error::Error;
pub use error::Result;
