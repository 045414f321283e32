//! Test utilities for the Conference Controller.

pub mod server_harness;

pub use server_harness::TestCcServer;
