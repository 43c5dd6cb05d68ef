//! Open home competition scoring.
//!
//! Given an address, a date and the shape of the caller's own property, the
//! engine finds comparable open homes nearby, buckets them into half-hour
//! slots and recommends the quietest times to hold an inspection.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
