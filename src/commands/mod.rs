pub mod check;
pub mod config;
pub mod fetch;
pub mod url;
