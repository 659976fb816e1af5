//! HTTP service for the N7awsou travel-booking platform.

pub mod auth;
pub mod config;
pub mod currency;
pub mod custom_tour;
pub mod error;
pub mod extract;
pub mod health;
pub mod history;
pub mod jobs;
pub mod metrics;
pub mod middleware;
pub mod payment;
pub mod review;
pub mod router;
pub mod state;
pub mod tour;
pub mod tracing;
pub mod user;

pub use config::ApiConfig;
pub use error::ApiError;
pub use state::{ApiState, AuthConfig};
