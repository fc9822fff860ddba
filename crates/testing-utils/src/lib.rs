//! # Gateway Testing Utils
//!
//! Shared testing utilities for the entity linking gateway.
//! This crate provides in-memory implementations of every port in
//! `gateway-domain` and builders for evaluation samples and worker replies.
//!
//! ## Usage
//!
//! ```toml
//! [dev-dependencies]
//! gateway-testing-utils = { path = "../testing-utils" }
//! ```
//!
//! ```rust
//! use gateway_testing_utils::mocks::*;
//! use gateway_testing_utils::builders::*;
//! ```

pub mod builders;
pub mod mocks;

pub use builders::*;
pub use mocks::*;
