//! Property-based tests for admission and rate limiting

mod admission;
