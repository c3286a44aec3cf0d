pub mod health;
pub mod queue;
pub mod routes;

pub use health::{system_health_response, HealthResponseBody};
