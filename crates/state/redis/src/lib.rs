mod cache;
mod config;
mod key_render;

pub use cache::RedisDistributedCache;
pub use config::RedisConfig;
