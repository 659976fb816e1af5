//! Review rating rules and the tour average.

use crate::BookingError;

/// Lowest rating a review may carry.
pub const MIN_RATING: i16 = 1;
/// Highest rating a review may carry.
pub const MAX_RATING: i16 = 5;

/// Check that a rating is on the 1..=5 scale.
pub fn validate_rating(rating: i16) -> Result<(), BookingError> {
    if !(MIN_RATING..=MAX_RATING).contains(&rating) {
        return Err(BookingError::RatingOutOfRange);
    }
    Ok(())
}

/// Turn a rating as sent by a client into a stored one.
///
/// Clients send JSON numbers, so anything from `4.5` to `40000` can arrive here.
pub fn parse_rating(raw: f64) -> Result<i16, BookingError> {
    if !raw.is_finite() || raw.fract() != 0.0 {
        return Err(BookingError::RatingNotWhole);
    }
    // Saturating cast: anything past i16 lands outside 1..=5 too
    let rating = raw as i16;
    validate_rating(rating)?;
    Ok(rating)
}

/// Arithmetic mean of a tour's review ratings.
///
/// A tour without reviews has an average of `0.0`.
pub fn average_rating(ratings: &[i16]) -> f64 {
    if ratings.is_empty() {
        return 0.0;
    }

    let sum: i64 = ratings.iter().map(|&r| i64::from(r)).sum();
    sum as f64 / ratings.len() as f64
}
