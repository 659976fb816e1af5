//! Request bodies for the tour endpoints and their conversion into rows.

use chrono::{DateTime, Utc};
use n7_booking::tour::{
    DEFAULT_MAX_CAPACITY, duration_days, validate_capacity_bounds, validate_initial_capacity,
    validate_price, validate_schedule, validate_updated_capacity,
};
use n7_db::models::{PaymentWithPayer, Tour, TourWrite, TripType};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTourRequest {
    pub name: String,
    pub description: String,
    pub price: f64,
    pub trip_type: Option<TripType>,
    pub category: Option<String>,
    pub departure_date: DateTime<Utc>,
    pub return_date: DateTime<Utc>,
    pub departure_location: String,
    pub destination_location: String,
    #[serde(default)]
    pub included_features: Vec<String>,
    #[serde(default)]
    pub images: Vec<String>,
    pub dress_code: Option<String>,
    pub duration: Option<i32>,
    pub available: Option<bool>,
    pub available_capacity: Option<i32>,
    pub max_capacity: Option<i32>,
}

impl CreateTourRequest {
    /// Validate the request and fill in defaults
    ///
    /// Capacity defaults to the maximum capacity, itself 20 when absent.
    /// Duration is derived from the dates when not given.
    pub fn into_write(self, now: DateTime<Utc>) -> Result<TourWrite, ApiError> {
        let name = self.name.trim().to_string();
        let description = self.description.trim().to_string();
        if name.is_empty() || description.is_empty() {
            return Err(ApiError::Validation(
                "Tour name and description are required".to_string(),
            ));
        }

        validate_price(self.price)?;
        validate_schedule(self.departure_date, self.return_date, now)?;

        let max_capacity = self.max_capacity.unwrap_or(DEFAULT_MAX_CAPACITY);
        let available_capacity = self.available_capacity.unwrap_or(max_capacity);
        validate_initial_capacity(available_capacity)?;
        validate_capacity_bounds(available_capacity, max_capacity)?;

        let duration = match self.duration {
            Some(d) if d < 0 => {
                return Err(ApiError::Validation(
                    "Duration cannot be negative".to_string(),
                ));
            }
            Some(d) => d,
            None => duration_days(self.departure_date, self.return_date),
        };

        validate_image_urls(&self.images)?;

        Ok(TourWrite {
            name,
            description,
            price: self.price,
            trip_type: self.trip_type.unwrap_or_default(),
            category: self.category,
            departure_date: self.departure_date,
            return_date: self.return_date,
            departure_location: self.departure_location,
            destination_location: self.destination_location,
            included_features: self.included_features,
            images: self.images,
            dress_code: self.dress_code,
            duration,
            available: self.available.unwrap_or(true),
            available_capacity,
            max_capacity,
        })
    }
}

/// Partial update; absent fields keep their current value
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTourRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub trip_type: Option<TripType>,
    pub category: Option<String>,
    pub departure_date: Option<DateTime<Utc>>,
    pub return_date: Option<DateTime<Utc>>,
    pub departure_location: Option<String>,
    pub destination_location: Option<String>,
    pub included_features: Option<Vec<String>>,
    pub images: Option<Vec<String>>,
    pub dress_code: Option<String>,
    pub duration: Option<i32>,
    pub available: Option<bool>,
    pub available_capacity: Option<i32>,
    pub max_capacity: Option<i32>,
}

impl UpdateTourRequest {
    /// Merge onto the stored tour
    ///
    /// Dates are only re-checked when one of them changes, against the merged pair.
    pub fn apply(self, current: TourWrite, now: DateTime<Utc>) -> Result<TourWrite, ApiError> {
        let mut tour = current;

        if self.departure_date.is_some() || self.return_date.is_some() {
            let departure = self.departure_date.unwrap_or(tour.departure_date);
            let return_date = self.return_date.unwrap_or(tour.return_date);
            validate_schedule(departure, return_date, now)?;
            tour.departure_date = departure;
            tour.return_date = return_date;
        }

        if let Some(price) = self.price {
            validate_price(price)?;
            tour.price = price;
        }

        if let Some(capacity) = self.available_capacity {
            validate_updated_capacity(capacity)?;
            tour.available_capacity = capacity;
        }

        if let Some(name) = self.name {
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err(ApiError::Validation("Tour name cannot be empty".to_string()));
            }
            tour.name = name;
        }

        if let Some(description) = self.description {
            let description = description.trim().to_string();
            if description.is_empty() {
                return Err(ApiError::Validation(
                    "Tour description cannot be empty".to_string(),
                ));
            }
            tour.description = description;
        }

        if let Some(duration) = self.duration {
            if duration < 0 {
                return Err(ApiError::Validation(
                    "Duration cannot be negative".to_string(),
                ));
            }
            tour.duration = duration;
        }

        if let Some(images) = self.images {
            validate_image_urls(&images)?;
            tour.images = images;
        }

        if let Some(trip_type) = self.trip_type {
            tour.trip_type = trip_type;
        }
        if let Some(category) = self.category {
            tour.category = Some(category);
        }
        if let Some(location) = self.departure_location {
            tour.departure_location = location;
        }
        if let Some(location) = self.destination_location {
            tour.destination_location = location;
        }
        if let Some(features) = self.included_features {
            tour.included_features = features;
        }
        if let Some(dress_code) = self.dress_code {
            tour.dress_code = Some(dress_code);
        }
        if let Some(available) = self.available {
            tour.available = available;
        }
        if let Some(max_capacity) = self.max_capacity {
            tour.max_capacity = max_capacity;
        }
        validate_capacity_bounds(tour.available_capacity, tour.max_capacity)?;

        Ok(tour)
    }
}

/// Body of the image add/remove endpoints
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TourImagesRequest {
    #[serde(default)]
    pub image_urls: Vec<String>,
}

/// Query string of the public tour listing
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TourFilters {
    pub departure_location: Option<String>,
    pub destination_location: Option<String>,
    pub category: Option<String>,
    pub trip_type: Option<TripType>,
    pub availability: Option<bool>,
    pub departure_date: Option<DateTime<Utc>>,
    pub return_date: Option<DateTime<Utc>>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
}

/// A seller's tour with the payments made on it
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SellerTour {
    #[serde(flatten)]
    pub tour: Tour,
    pub payments: Vec<PaymentWithPayer>,
}

/// Image references must be absolute http(s) URLs
pub fn validate_image_urls(urls: &[String]) -> Result<(), ApiError> {
    for url in urls {
        let valid = reqwest::Url::parse(url)
            .is_ok_and(|parsed| matches!(parsed.scheme(), "http" | "https"));
        if !valid {
            return Err(ApiError::Validation(format!("Invalid image URL: {url}")));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn create_request(now: DateTime<Utc>) -> CreateTourRequest {
        CreateTourRequest {
            name: "Tassili n'Ajjer trek".to_string(),
            description: "Five days among the rock art of Djanet".to_string(),
            price: 45_000.0,
            trip_type: None,
            category: Some("Desert".to_string()),
            departure_date: now + Duration::days(10),
            return_date: now + Duration::days(14) + Duration::hours(2),
            departure_location: "Alger".to_string(),
            destination_location: "Djanet".to_string(),
            included_features: vec!["Guide".to_string()],
            images: vec!["https://cdn.example.com/tassili.jpg".to_string()],
            dress_code: None,
            duration: None,
            available: None,
            available_capacity: None,
            max_capacity: None,
        }
    }

    #[test]
    fn test_create_defaults() {
        let now = Utc::now();
        let tour = create_request(now).into_write(now).unwrap();

        assert_eq!(tour.max_capacity, 20);
        assert_eq!(tour.available_capacity, 20);
        assert_eq!(tour.duration, 5);
        assert_eq!(tour.trip_type, TripType::Standard);
        assert!(tour.available);
    }

    #[test]
    fn test_create_rejects_invalid_input() {
        let now = Utc::now();

        let mut request = create_request(now);
        request.name = "  ".to_string();
        assert!(matches!(request.into_write(now), Err(ApiError::Validation(_))));

        let mut request = create_request(now);
        request.price = 0.0;
        assert!(request.into_write(now).is_err());

        let mut request = create_request(now);
        request.departure_date = now - Duration::days(1);
        assert!(request.into_write(now).is_err());

        let mut request = create_request(now);
        request.return_date = request.departure_date;
        assert!(request.into_write(now).is_err());

        let mut request = create_request(now);
        request.available_capacity = Some(0);
        assert!(request.into_write(now).is_err());

        let mut request = create_request(now);
        request.images = vec!["javascript:alert(1)".to_string()];
        assert!(request.into_write(now).is_err());
    }

    #[test]
    fn test_update_merges_fields() {
        let now = Utc::now();
        let current = create_request(now).into_write(now).unwrap();

        let update = UpdateTourRequest {
            price: Some(50_000.0),
            available_capacity: Some(0),
            ..Default::default()
        };
        let merged = update.apply(current.clone(), now).unwrap();

        assert_eq!(merged.price, 50_000.0);
        assert_eq!(merged.available_capacity, 0);
        assert_eq!(merged.name, current.name);
        assert_eq!(merged.departure_date, current.departure_date);
    }

    #[test]
    fn test_update_validates_merged_dates() {
        let now = Utc::now();
        let current = create_request(now).into_write(now).unwrap();

        let update = UpdateTourRequest {
            return_date: Some(current.departure_date - Duration::hours(1)),
            ..Default::default()
        };

        assert!(matches!(
            update.apply(current, now),
            Err(ApiError::Validation(msg)) if msg == "Return date must be after departure date"
        ));
    }

    #[test]
    fn test_update_rejects_negative_capacity() {
        let now = Utc::now();
        let current = create_request(now).into_write(now).unwrap();

        let update = UpdateTourRequest {
            available_capacity: Some(-1),
            ..Default::default()
        };

        assert!(update.apply(current, now).is_err());
    }

    #[test]
    fn test_update_checks_merged_capacity() {
        let now = Utc::now();
        let current = create_request(now).into_write(now).unwrap();

        let update = UpdateTourRequest {
            available_capacity: Some(25),
            ..Default::default()
        };
        assert!(matches!(
            update.apply(current.clone(), now),
            Err(ApiError::Validation(msg)) if msg == "Available capacity cannot exceed maximum capacity"
        ));

        let update = UpdateTourRequest {
            max_capacity: Some(10),
            ..Default::default()
        };
        assert!(update.apply(current.clone(), now).is_err());

        let update = UpdateTourRequest {
            available_capacity: Some(0),
            max_capacity: Some(-5),
            ..Default::default()
        };
        assert!(matches!(
            update.apply(current.clone(), now),
            Err(ApiError::Validation(msg)) if msg == "Maximum capacity cannot be negative"
        ));

        let update = UpdateTourRequest {
            available_capacity: Some(30),
            max_capacity: Some(30),
            ..Default::default()
        };
        let merged = update.apply(current, now).unwrap();
        assert_eq!(merged.available_capacity, 30);
    }

    #[test]
    fn test_validate_image_urls() {
        assert!(validate_image_urls(&["http://a.dz/x.png".to_string()]).is_ok());
        assert!(validate_image_urls(&["ftp://a.dz/x.png".to_string()]).is_err());
        assert!(validate_image_urls(&["not a url".to_string()]).is_err());
    }
}
