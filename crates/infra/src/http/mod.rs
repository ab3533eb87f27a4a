//! HTTP transport and the remote listing adapter

pub mod client;
pub mod page_source;

pub use client::{HttpClient, HttpClientBuilder};
pub use page_source::HttpPageSource;
