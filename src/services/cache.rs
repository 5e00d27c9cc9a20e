// src/services/cache.rs
use async_trait::async_trait;
use uuid::Uuid;

use crate::errors::QuanBuyError;
use crate::models::SearchRequest;

/// Stores serialized search results between identical requests.
#[async_trait]
pub trait ResultCache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, QuanBuyError>;
    async fn put(&self, key: &str, value: &str) -> Result<(), QuanBuyError>;
}

/// Used when no Redis is configured.
pub struct NoCache;

#[async_trait]
impl ResultCache for NoCache {
    async fn get(&self, _key: &str) -> Result<Option<String>, QuanBuyError> {
        Ok(None)
    }

    async fn put(&self, _key: &str, _value: &str) -> Result<(), QuanBuyError> {
        Ok(())
    }
}

/// Cache key for a search. The requesting user is not part of it.
pub fn search_cache_key(request: &SearchRequest) -> Result<String, QuanBuyError> {
    let material = serde_json::to_vec(&(
        request.search_type,
        &request.image_data,
        request.prompt_text.as_deref().map(str::trim),
        &request.store_list,
    ))?;
    Ok(format!(
        "search:{}",
        Uuid::new_v5(&Uuid::NAMESPACE_OID, &material)
    ))
}
