//! Shared utilities for feature modules
//!
//! - **test_helpers**: fixtures for handler tests (test-only)

#[cfg(test)]
pub mod test_helpers;
