//! Qdata Library
//!
//! Resolves, downloads and installs prebuilt market data sets. This library
//! provides the core functionality for the `qdata` CLI.

pub mod commands;
pub mod core;
pub mod error;
pub mod utils;

pub use crate::core::dataset::DatasetRequest;
pub use crate::core::fetcher::{DataFetcher, FetchOptions, FetchOutcome};
pub use crate::error::{QdataError, Result};
