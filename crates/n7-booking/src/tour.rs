//! Tour schedule, price and capacity validation plus the search price range.

use chrono::{DateTime, Utc};

use crate::BookingError;

/// Seats offered when a seller does not say otherwise.
pub const DEFAULT_MAX_CAPACITY: i32 = 20;

/// Validate a tour's dates against the current time.
///
/// The departure has to be strictly in the future and the return strictly
/// after the departure.
pub fn validate_schedule(
    departure: DateTime<Utc>,
    return_date: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Result<(), BookingError> {
    if departure <= now {
        return Err(BookingError::DepartureInPast);
    }
    if return_date <= departure {
        return Err(BookingError::ReturnBeforeDeparture);
    }
    Ok(())
}

/// A tour must cost something.
pub fn validate_price(price: f64) -> Result<(), BookingError> {
    if price.is_nan() || price <= 0.0 {
        return Err(BookingError::NonPositivePrice);
    }
    Ok(())
}

/// Capacity given when a tour is created: must leave at least one seat.
pub fn validate_initial_capacity(capacity: i32) -> Result<(), BookingError> {
    if capacity <= 0 {
        return Err(BookingError::NonPositiveCapacity);
    }
    Ok(())
}

/// Capacity given on update: a sold-out tour may drop to zero.
pub fn validate_updated_capacity(capacity: i32) -> Result<(), BookingError> {
    if capacity < 0 {
        return Err(BookingError::NegativeCapacity);
    }
    Ok(())
}

/// Open seats can never outnumber the tour's maximum.
pub fn validate_capacity_bounds(available: i32, max: i32) -> Result<(), BookingError> {
    if max < 0 {
        return Err(BookingError::NegativeMaxCapacity);
    }
    if available > max {
        return Err(BookingError::CapacityAboveMaximum);
    }
    Ok(())
}

/// Length of a trip in whole days, rounded up.
pub fn duration_days(departure: DateTime<Utc>, return_date: DateTime<Utc>) -> i32 {
    let seconds = (return_date - departure).num_seconds().max(0);
    let days = (seconds + 86_399) / 86_400;
    i32::try_from(days).unwrap_or(i32::MAX)
}

/// Optional price bounds of a tour search.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PriceRange {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl PriceRange {
    /// Build and validate a price range from search parameters.
    pub fn new(min: Option<f64>, max: Option<f64>) -> Result<Self, BookingError> {
        if min.is_some_and(|m| m < 0.0) {
            return Err(BookingError::NegativeMinPrice);
        }
        if max.is_some_and(|m| m < 0.0) {
            return Err(BookingError::NegativeMaxPrice);
        }
        if let (Some(min), Some(max)) = (min, max) {
            if max < min {
                return Err(BookingError::InvertedPriceRange);
            }
        }
        Ok(Self { min, max })
    }
}

/// Append new image URLs, skipping ones the tour already has.
pub fn append_images(existing: &[String], added: &[String]) -> Vec<String> {
    let mut images = existing.to_vec();
    for url in added {
        if !images.contains(url) {
            images.push(url.clone());
        }
    }
    images
}

/// Drop every listed URL from a tour's images, keeping the original order.
pub fn remove_images(existing: &[String], removed: &[String]) -> Vec<String> {
    existing
        .iter()
        .filter(|url| !removed.contains(url))
        .cloned()
        .collect()
}
