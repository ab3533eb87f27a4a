//! Sync engine: pagination, retry, hierarchy crawling and orchestration

pub mod crawler;
pub mod orchestrator;
pub mod pagination;
pub mod ports;
pub mod retry;
