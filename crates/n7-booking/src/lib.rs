//! Booking rules for N7awsou
//!
//! This crate holds the pure domain logic behind the booking API: review
//! rating aggregation, booking totals and capacity checks, tour schedule
//! validation, guide availability for custom tours and currency conversion.
//! Nothing in here touches the database or the network, so every rule can be
//! unit tested in isolation.

pub mod booking;
pub mod currency;
pub mod error;
pub mod rating;
pub mod schedule;
pub mod tour;

pub use error::BookingError;
