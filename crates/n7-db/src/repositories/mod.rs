// All repository functions are generic over `E: Executor<'e, Database = Postgres>`
// so they accept both a `&PgPool` (direct query) and a `&mut Transaction` (atomic operations).

pub mod custom_tour;
pub mod history;
pub mod payment;
pub mod review;
pub mod token;
pub mod tour;
pub mod user;
