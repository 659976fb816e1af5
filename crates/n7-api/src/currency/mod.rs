pub mod client;
pub mod routes;

pub use client::{ExchangeRateClient, RateSource};
pub use routes::routes;
