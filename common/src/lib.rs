//! Common utilities shared across the customer intake service
//!
//! This crate provides functionality used by both the service library and
//! the deployable binary (including its build script):
//!
//! - Configuration types and loading
//! - YAML `!include` resolution for layered config files
//! - Shared test utilities

pub mod config;
pub mod yaml_include;

// Test helpers module - available for both development and test builds
#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;

#[cfg(any(test, feature = "test-helpers"))]
pub use test_helpers::{TestError, TestResult, get_test_database_url};
