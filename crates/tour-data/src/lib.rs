//! Data layer for Tour Report.
//!
//! Loads booking exports from disk, groups bookings by month, destination
//! and customer, and runs the top-level report pipeline.

pub mod aggregator;
pub mod analysis;
pub mod dashboard;
pub mod destinations;
pub mod ordered;
pub mod reader;
pub mod roster;

pub use tour_core as core;
