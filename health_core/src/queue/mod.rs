pub mod registry;

pub use registry::{HeartbeatRequest, WorkerRegistry};
