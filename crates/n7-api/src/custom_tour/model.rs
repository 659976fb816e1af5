//! Request bodies for custom tours.

use chrono::{DateTime, NaiveDate, Utc};
use n7_booking::{
    BookingError,
    schedule::{TripWindow, day_end, day_start},
    tour::{duration_days, validate_price},
};
use n7_db::models::CustomTourWrite;
use serde::Deserialize;

use crate::error::ApiError;

/// Either a calendar day (`2026-01-07`) or a full RFC 3339 timestamp
///
/// A bare day covers all of it: a departure starts at midnight UTC and a
/// return ends on the day's last millisecond.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum TripDate {
    Day(NaiveDate),
    Instant(DateTime<Utc>),
}

impl TripDate {
    pub fn as_departure(self) -> DateTime<Utc> {
        match self {
            Self::Day(date) => day_start(date),
            Self::Instant(instant) => instant,
        }
    }

    pub fn as_return(self) -> DateTime<Utc> {
        match self {
            Self::Day(date) => day_end(date),
            Self::Instant(instant) => instant,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCustomTourRequest {
    pub guests: i32,
    pub departure_date: TripDate,
    pub return_date: TripDate,
    pub departure_location: String,
    pub destination_location: String,
    pub country_id: Option<i64>,
    pub city_id: Option<i64>,
    pub hotel_id: Option<i64>,
    pub room_id: Option<i64>,
    pub transport_id: Option<i64>,
    pub with_guide: Option<bool>,
    pub duration: Option<i32>,
    pub price: f64,
}

fn validate_guests(guests: i32) -> Result<(), ApiError> {
    if guests < 1 {
        return Err(BookingError::EmptyParty.into());
    }
    Ok(())
}

fn validate_duration(duration: i32) -> Result<(), ApiError> {
    if duration < 0 {
        return Err(ApiError::Validation(
            "Duration cannot be negative".to_string(),
        ));
    }
    Ok(())
}

fn required_location(value: String, field: &str) -> Result<String, ApiError> {
    let value = value.trim().to_string();
    if value.is_empty() {
        return Err(ApiError::Validation(format!("{field} is required")));
    }
    Ok(value)
}

/// The trip has to start in the future and cannot end before it starts
fn validate_window(
    departure: DateTime<Utc>,
    return_date: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Result<TripWindow, ApiError> {
    if departure <= now {
        return Err(BookingError::DepartureInPast.into());
    }
    Ok(TripWindow::new(departure, return_date)?)
}

impl CreateCustomTourRequest {
    /// Validate and fill in the duration from the dates when absent
    ///
    /// `with_guide` carries the request; the handler clears it when no guide is free.
    pub fn into_write(self, now: DateTime<Utc>) -> Result<CustomTourWrite, ApiError> {
        validate_guests(self.guests)?;
        validate_price(self.price)?;

        let departure_date = self.departure_date.as_departure();
        let return_date = self.return_date.as_return();
        validate_window(departure_date, return_date, now)?;

        let duration = match self.duration {
            Some(duration) => {
                validate_duration(duration)?;
                duration
            }
            None => duration_days(departure_date, return_date),
        };

        Ok(CustomTourWrite {
            guests: self.guests,
            departure_date,
            return_date,
            departure_location: required_location(self.departure_location, "Departure location")?,
            destination_location: required_location(
                self.destination_location,
                "Destination location",
            )?,
            country_id: self.country_id,
            city_id: self.city_id,
            hotel_id: self.hotel_id,
            room_id: self.room_id,
            transport_id: self.transport_id,
            with_guide: self.with_guide.unwrap_or(false),
            duration,
            price: self.price,
        })
    }
}

/// Partial update; absent fields keep their current value
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCustomTourRequest {
    pub guests: Option<i32>,
    pub departure_date: Option<TripDate>,
    pub return_date: Option<TripDate>,
    pub departure_location: Option<String>,
    pub destination_location: Option<String>,
    pub country_id: Option<i64>,
    pub city_id: Option<i64>,
    pub hotel_id: Option<i64>,
    pub room_id: Option<i64>,
    pub transport_id: Option<i64>,
    pub with_guide: Option<bool>,
    pub duration: Option<i32>,
    pub price: Option<f64>,
}

impl UpdateCustomTourRequest {
    /// Merge onto the stored custom tour
    ///
    /// `with_guide` in the result is the wish after the update, not the assignment.
    pub fn apply(
        self,
        current: CustomTourWrite,
        now: DateTime<Utc>,
    ) -> Result<CustomTourWrite, ApiError> {
        let mut tour = current;

        if self.departure_date.is_some() || self.return_date.is_some() {
            let departure = self
                .departure_date
                .map_or(tour.departure_date, TripDate::as_departure);
            let return_date = self.return_date.map_or(tour.return_date, TripDate::as_return);
            validate_window(departure, return_date, now)?;
            tour.departure_date = departure;
            tour.return_date = return_date;
        }

        if let Some(guests) = self.guests {
            validate_guests(guests)?;
            tour.guests = guests;
        }
        if let Some(price) = self.price {
            validate_price(price)?;
            tour.price = price;
        }
        if let Some(duration) = self.duration {
            validate_duration(duration)?;
            tour.duration = duration;
        }
        if let Some(location) = self.departure_location {
            tour.departure_location = required_location(location, "Departure location")?;
        }
        if let Some(location) = self.destination_location {
            tour.destination_location = required_location(location, "Destination location")?;
        }

        tour.country_id = self.country_id.or(tour.country_id);
        tour.city_id = self.city_id.or(tour.city_id);
        tour.hotel_id = self.hotel_id.or(tour.hotel_id);
        tour.room_id = self.room_id.or(tour.room_id);
        tour.transport_id = self.transport_id.or(tour.transport_id);

        if let Some(with_guide) = self.with_guide {
            tour.with_guide = with_guide;
        }

        Ok(tour)
    }
}
