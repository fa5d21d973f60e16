//! Core types and trait definitions for the SARAL case-intake service.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! The store backend and the API layer both depend on it.

// We intentionally use native `async fn` in trait impls (stabilised in Rust
// 1.75). Suppress the advisory lint about `Send` bounds on the futures.
#![allow(async_fn_in_trait)]

pub mod bundle;
pub mod case;
pub mod citizen;
pub mod disposition;
pub mod eligibility;
pub mod error;
pub mod event;
pub mod lifecycle;
pub mod metrics;
pub mod scheme;
pub mod store;
pub mod time;
pub mod user;

pub use error::{Error, Result};
