//! Core types and trait definitions for the CDR backend.
//!
//! This crate is deliberately free of database, runtime, and randomness
//! dependencies. Every other crate in the workspace builds on it.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod call;
pub mod error;
pub mod report;
pub mod store;
pub mod subscriber;

pub use error::{Error, Result};
