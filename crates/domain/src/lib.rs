//! # TideSync Domain
//!
//! Business domain types and models for TideSync.
//!
//! This crate contains:
//! - Remote collection types (pages, cursors, hierarchy nodes)
//! - Calendar and drive records persisted by the sync engine
//! - Domain error types and Result definitions
//! - Configuration structures
//!
//! ## Architecture
//! - No dependencies on other TideSync crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod config;
pub mod constants;
pub mod errors;
pub mod macros;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
