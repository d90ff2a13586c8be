pub mod ai_provider;
pub mod analyzer;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod scanner;
pub mod store;
pub mod summary;
