use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Account role, stored as the `user_role` Postgres enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Tourist,
    Guide,
    Admin,
    /// Seller allowed to publish and manage tours
    Vendeur,
}

impl Role {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Tourist => "TOURIST",
            Self::Guide => "GUIDE",
            Self::Admin => "ADMIN",
            Self::Vendeur => "VENDEUR",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "TOURIST" => Ok(Self::Tourist),
            "GUIDE" => Ok(Self::Guide),
            "ADMIN" => Ok(Self::Admin),
            "VENDEUR" => Ok(Self::Vendeur),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// Tour tier, stored as the `trip_type` Postgres enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "trip_type", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum TripType {
    #[default]
    Standard,
    Premium,
    Luxury,
    Custom,
}

/// Payment lifecycle, stored as the `payment_status` Postgres enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "payment_status", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum PaymentStatus {
    Processing,
    Completed,
    Failed,
    Refunded,
}

/// Public view of a user (never carries the password hash)
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

/// Row used to check a password at sign-in
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserCredentials {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RefreshTokenRecord {
    pub id: i64,
    pub user_id: i64,
    pub expires_at: DateTime<Utc>,
}

/// Tour model - a bookable travel package
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Tour {
    pub id: i64,
    /// Seller (VENDEUR or ADMIN) who published the tour
    pub seller_id: Option<i64>,
    pub name: String,
    pub description: String,
    /// Price per person
    pub price: f64,
    pub trip_type: TripType,
    pub category: Option<String>,
    pub departure_date: DateTime<Utc>,
    pub return_date: DateTime<Utc>,
    pub departure_location: String,
    pub destination_location: String,
    pub included_features: Vec<String>,
    pub images: Vec<String>,
    pub dress_code: Option<String>,
    /// Trip length in days
    pub duration: i32,
    pub available: bool,
    /// Seats still open for booking
    pub available_capacity: i32,
    pub max_capacity: i32,
    /// Average of the tour's review ratings, 0 without reviews
    #[serde(rename = "Rating")]
    pub rating: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Every writable column of a tour, used for both insert and full update
#[derive(Debug, Clone)]
pub struct TourWrite {
    pub name: String,
    pub description: String,
    pub price: f64,
    pub trip_type: TripType,
    pub category: Option<String>,
    pub departure_date: DateTime<Utc>,
    pub return_date: DateTime<Utc>,
    pub departure_location: String,
    pub destination_location: String,
    pub included_features: Vec<String>,
    pub images: Vec<String>,
    pub dress_code: Option<String>,
    pub duration: i32,
    pub available: bool,
    pub available_capacity: i32,
    pub max_capacity: i32,
}

impl From<Tour> for TourWrite {
    fn from(tour: Tour) -> Self {
        Self {
            name: tour.name,
            description: tour.description,
            price: tour.price,
            trip_type: tour.trip_type,
            category: tour.category,
            departure_date: tour.departure_date,
            return_date: tour.return_date,
            departure_location: tour.departure_location,
            destination_location: tour.destination_location,
            included_features: tour.included_features,
            images: tour.images,
            dress_code: tour.dress_code,
            duration: tour.duration,
            available: tour.available,
            available_capacity: tour.available_capacity,
            max_capacity: tour.max_capacity,
        }
    }
}

/// Tour in search results, with the head count of completed bookings
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TourListing {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub tour: Tour,
    pub booked_people: i64,
    pub remaining_capacity: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct TourImages {
    pub id: i64,
    pub name: String,
    pub images: Vec<String>,
}

/// Search filters for the public tour listing
#[derive(Debug, Clone, Default)]
pub struct TourSearch {
    pub departure_location: Option<String>,
    pub destination_location: Option<String>,
    pub category: Option<String>,
    pub trip_type: Option<TripType>,
    /// Only tours that still have seats
    pub with_seats_only: bool,
    pub departure_from: Option<DateTime<Utc>>,
    pub return_until: Option<DateTime<Utc>>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: i64,
    pub user_id: i64,
    pub tour_id: i64,
    /// 1 to 5
    pub rating: i16,
    pub review: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Review with its author's name and the tour's name
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ReviewWithContext {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub review: Review,
    pub username: String,
    pub tour_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: i64,
    pub user_id: i64,
    pub tour_id: Option<i64>,
    pub custom_tour_id: Option<i64>,
    pub amount: f64,
    pub number_of_people: i32,
    pub currency: String,
    pub status: PaymentStatus,
    /// Order number issued by the payment gateway
    pub transaction_id: Option<String>,
    pub form_url: Option<String>,
    pub notes: Option<String>,
    pub refund_amount: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
    pub refunded_at: Option<DateTime<Utc>>,
}

/// What a payment pays for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingTarget {
    Tour(i64),
    CustomTour(i64),
}

impl BookingTarget {
    pub const fn tour_id(&self) -> Option<i64> {
        match self {
            Self::Tour(id) => Some(*id),
            Self::CustomTour(_) => None,
        }
    }

    pub const fn custom_tour_id(&self) -> Option<i64> {
        match self {
            Self::CustomTour(id) => Some(*id),
            Self::Tour(_) => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewPayment {
    pub user_id: i64,
    pub target: BookingTarget,
    pub amount: f64,
    pub number_of_people: i32,
    pub currency: String,
    pub transaction_id: Option<String>,
    pub form_url: Option<String>,
    pub notes: Option<String>,
}

/// Payment with a short summary of the booked tour
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PaymentWithTour {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub payment: Payment,
    pub tour_name: Option<String>,
    pub tour_departure_date: Option<DateTime<Utc>>,
    pub tour_departure_location: Option<String>,
    pub tour_price: Option<f64>,
}

/// Payment with the payer's contact details
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PaymentWithPayer {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub payment: Payment,
    pub username: String,
    pub email: String,
}

/// Trip a traveller assembles themselves, optionally with a guide
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CustomTour {
    pub id: i64,
    pub user_id: i64,
    pub guests: i32,
    pub departure_date: DateTime<Utc>,
    pub return_date: DateTime<Utc>,
    pub departure_location: String,
    pub destination_location: String,
    pub country_id: Option<i64>,
    pub city_id: Option<i64>,
    pub hotel_id: Option<i64>,
    pub room_id: Option<i64>,
    pub transport_id: Option<i64>,
    /// True only once a guide was actually assigned
    pub with_guide: bool,
    pub duration: i32,
    /// Price per person
    pub price: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CustomTourWrite {
    pub guests: i32,
    pub departure_date: DateTime<Utc>,
    pub return_date: DateTime<Utc>,
    pub departure_location: String,
    pub destination_location: String,
    pub country_id: Option<i64>,
    pub city_id: Option<i64>,
    pub hotel_id: Option<i64>,
    pub room_id: Option<i64>,
    pub transport_id: Option<i64>,
    pub with_guide: bool,
    pub duration: i32,
    pub price: f64,
}

impl From<CustomTour> for CustomTourWrite {
    fn from(tour: CustomTour) -> Self {
        Self {
            guests: tour.guests,
            departure_date: tour.departure_date,
            return_date: tour.return_date,
            departure_location: tour.departure_location,
            destination_location: tour.destination_location,
            country_id: tour.country_id,
            city_id: tour.city_id,
            hotel_id: tour.hotel_id,
            room_id: tour.room_id,
            transport_id: tour.transport_id,
            with_guide: tour.with_guide,
            duration: tour.duration,
            price: tour.price,
        }
    }
}

/// Custom tour with the guide assigned to it, if any
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CustomTourWithGuide {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub custom_tour: CustomTour,
    pub guide_id: Option<i64>,
}

/// One trip a guide is committed to
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct GuideCommitment {
    pub guide_id: i64,
    pub departure_date: DateTime<Utc>,
    pub return_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: i64,
    pub user_id: i64,
    pub tour_id: i64,
    /// Number of times the user opened the tour
    pub interaction: i32,
    pub viewed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct HistoryWithTour {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub entry: HistoryEntry,
    pub tour_name: String,
    pub destination_location: String,
}
