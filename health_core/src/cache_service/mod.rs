pub mod redis_client;

pub use redis_client::{parse_info, RedisCacheClient};
