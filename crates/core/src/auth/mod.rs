//! Credential handling for outbound remote calls

pub mod token;

pub use token::{TokenProvider, TokenSource};
