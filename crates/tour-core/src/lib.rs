//! Core types for the tour booking reports.
//!
//! Holds the booking data model, the currency normalizer, timezone-aware
//! month bucketing, aggregation parameters, CLI settings, display
//! formatting and the shared error type.

pub mod amount;
pub mod config;
pub mod error;
pub mod formatting;
pub mod models;
pub mod settings;
pub mod time_utils;
