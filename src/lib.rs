pub mod config;
pub mod engine;
pub mod export;
pub mod filter;
pub mod parse;
pub mod record;
pub mod schema;
pub mod source;
pub mod tui;
