// src/services/redis_service.rs
use async_trait::async_trait;
use log::info;
use redis::{AsyncCommands, Client};

use crate::errors::QuanBuyError;
use crate::services::cache::ResultCache;

pub struct RedisService {
    client: Client,
    ttl_secs: u64,
}

impl RedisService {
    pub async fn new(redis_url: &str, ttl_secs: u64) -> Result<Self, QuanBuyError> {
        let client = Client::open(redis_url).map_err(|e| QuanBuyError::Cache(e.to_string()))?;

        // Test connection
        let mut conn = client
            .get_async_connection()
            .await
            .map_err(|e| QuanBuyError::Cache(e.to_string()))?;

        redis::cmd("PING")
            .query_async::<_, String>(&mut conn)
            .await
            .map_err(|e| QuanBuyError::Cache(e.to_string()))?;

        info!("Connected to Redis, caching results for {}s", ttl_secs);
        Ok(Self { client, ttl_secs })
    }

    async fn connection(&self) -> Result<redis::aio::Connection, QuanBuyError> {
        self.client
            .get_async_connection()
            .await
            .map_err(|e| QuanBuyError::Cache(e.to_string()))
    }
}

#[async_trait]
impl ResultCache for RedisService {
    async fn get(&self, key: &str) -> Result<Option<String>, QuanBuyError> {
        let mut conn = self.connection().await?;
        conn.get::<_, Option<String>>(key)
            .await
            .map_err(|e| QuanBuyError::Cache(format!("Lookup of {} failed: {}", key, e)))
    }

    async fn put(&self, key: &str, value: &str) -> Result<(), QuanBuyError> {
        let mut conn = self.connection().await?;
        conn.set_ex::<_, _, ()>(key, value, self.ttl_secs as usize)
            .await
            .map_err(|e| QuanBuyError::Cache(e.to_string()))
    }
}
