//! Background tasks.

pub mod session_reaper;
