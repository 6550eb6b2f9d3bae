pub mod config;
pub mod moralis;
pub mod observability;
pub mod store;
pub mod types;
