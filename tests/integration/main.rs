//! Integration tests for workforce-planner
//!
//! These tests drive the planner end to end through the library API and
//! the CLI binary.

// Test utilities and common setup
mod common;

mod aggregation_tests;
mod cli_tests;
mod host_tests;
mod planner_tests;

// Re-export common utilities for use by test modules
pub use common::*;
