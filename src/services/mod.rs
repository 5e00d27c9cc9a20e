// src/services/mod.rs
pub mod cache;
pub mod gemini_service;
pub mod image_processor;
pub mod redis_service;

pub use cache::{NoCache, ResultCache, search_cache_key};
pub use gemini_service::GeminiService;
pub use image_processor::{ImageProcessor, PreparedImage};
pub use redis_service::RedisService;
