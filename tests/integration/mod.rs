//! Integration tests for smart-line.

pub mod connection_test;
pub mod pipeline_test;
pub mod query_test;
