//! Tests for the incremental frame parser

mod error_handling;
