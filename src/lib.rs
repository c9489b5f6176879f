pub mod builder;
pub mod config;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod model;
pub mod parser;
pub mod pipeline;
pub mod units;
