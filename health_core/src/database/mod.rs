pub mod connection;

pub use connection::{connect_lazy, DatabaseManager};
