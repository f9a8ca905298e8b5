//! folio library
//!
//! Storage, expiring cache, and widget layout store for the portfolio
//! dashboard, plus the cached feeds and CLI built on them.

pub mod app;
pub mod cache;
pub mod cli;
pub mod feeds;
pub mod layout;
pub mod session;
pub mod storage;
