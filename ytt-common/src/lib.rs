//! # YTT Common Library
//!
//! Shared code for the trending-analytics pipeline and query service:
//! - Analytical store schema, connection setup and staged table swaps
//! - Row models for the canonical fact table and every derived table
//! - Layered configuration loading
//! - Error types

pub mod config;
pub mod db;
pub mod error;

pub use error::{Error, Result};
