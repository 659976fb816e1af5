use thiserror::Error;

/// Violations of a booking rule.
///
/// The display string is the message returned to API clients.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BookingError {
    #[error("Rating must be between 1 and 5.")]
    RatingOutOfRange,
    #[error("Rating must be a whole number.")]
    RatingNotWhole,
    #[error("Tour price must be greater than 0")]
    NonPositivePrice,
    #[error("Number of people must be at least 1")]
    EmptyParty,
    #[error("Not enough capacity for the selected tour")]
    NotEnoughCapacity,
    #[error("Available capacity must be greater than 0")]
    NonPositiveCapacity,
    #[error("Available capacity cannot be negative")]
    NegativeCapacity,
    #[error("Maximum capacity cannot be negative")]
    NegativeMaxCapacity,
    #[error("Available capacity cannot exceed maximum capacity")]
    CapacityAboveMaximum,
    #[error("Departure date must be in the future")]
    DepartureInPast,
    #[error("Return date must be after departure date")]
    ReturnBeforeDeparture,
    #[error("Minimum price cannot be negative")]
    NegativeMinPrice,
    #[error("Maximum price cannot be negative")]
    NegativeMaxPrice,
    #[error("Maximum price must be greater than minimum price")]
    InvertedPriceRange,
    #[error("Refund amount must be greater than 0 and at most {paid}")]
    InvalidRefundAmount { paid: f64 },
}
