//! History Aggregator
//!
//! Rebuilds the per-account view: balance, owned merch and grouped coin
//! history.

mod service;

pub use service::HistoryService;
