//! Party size, price and capacity rules applied when a tour is booked.

use crate::BookingError;

/// Total price of a booking: the per-person tour price times the party size.
pub fn booking_total(price_per_person: f64, number_of_people: i32) -> Result<f64, BookingError> {
    if number_of_people < 1 {
        return Err(BookingError::EmptyParty);
    }
    if price_per_person <= 0.0 {
        return Err(BookingError::NonPositivePrice);
    }

    Ok(price_per_person * f64::from(number_of_people))
}

/// Check that a party fits in the seats still open on a tour.
pub fn check_capacity(number_of_people: i32, available_capacity: i32) -> Result<(), BookingError> {
    if number_of_people < 1 {
        return Err(BookingError::EmptyParty);
    }
    if number_of_people > available_capacity {
        return Err(BookingError::NotEnoughCapacity);
    }
    Ok(())
}

/// Seats left once a party of `number_of_people` is confirmed.
pub fn remaining_after(available_capacity: i32, number_of_people: i32) -> Result<i32, BookingError> {
    check_capacity(number_of_people, available_capacity)?;
    Ok(available_capacity - number_of_people)
}

/// Amount to give back for a refund.
///
/// Without an explicit amount the whole payment is refunded. A partial refund
/// must be positive and can never exceed what was paid.
pub fn resolve_refund_amount(paid: f64, requested: Option<f64>) -> Result<f64, BookingError> {
    match requested {
        None => Ok(paid),
        Some(amount) if amount > 0.0 && amount <= paid => Ok(amount),
        Some(_) => Err(BookingError::InvalidRefundAmount { paid }),
    }
}
