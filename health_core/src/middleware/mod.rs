pub mod logging;

pub use logging::with_request_logging;
