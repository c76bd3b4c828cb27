//! Loudness matching for dubbed dialogue.
//!
//! Each target-language file is measured against its source-language
//! counterpart and, when the RMS levels differ by more than a tolerance,
//! rendered through an external compressor → gain → limiter chain. The
//! result is re-measured, corrected at most once, and reported.

pub mod analyzer;
pub mod batch;
pub mod config;
pub mod error;
pub mod format;
pub mod inventory;
pub mod models;
pub mod pairing;
pub mod planner;
pub mod processor;
pub mod report;
pub mod verify;
