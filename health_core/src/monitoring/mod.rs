pub mod system;

pub use system::SysinfoSampler;
