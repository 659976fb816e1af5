pub mod gateway;
pub mod routes;

pub use gateway::{GatewayTransaction, PaymentGateway};
pub use routes::routes;
