pub mod analyzers;
pub mod batch;
pub mod config;
pub mod error;
pub mod export;
pub mod fetch;
pub mod fetcher;
pub mod output;
pub mod overrides;
pub mod parser;
pub mod record;
