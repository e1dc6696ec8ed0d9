//! Core configuration, errors, and the partition clock.

pub mod clock;
pub mod config;
pub mod errors;
