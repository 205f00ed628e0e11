//! End-to-end scenarios grouped by command class.

pub mod handshake_tests;
pub mod search_tests;
pub mod workflow_tests;
