pub mod config;
pub mod dataset;
pub mod download;
pub mod fetcher;
pub mod http;
pub mod layout;
pub mod resolve;
