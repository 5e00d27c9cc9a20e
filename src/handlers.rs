// src/handlers.rs
use std::sync::Arc;

use actix_web::{HttpResponse, web};
use log::{error, info, warn};

use crate::dispatcher::{ANALYZE_STYLE_PATH, SEARCH_PATH};
use crate::errors::QuanBuyError;
use crate::models::*;
use crate::services::gemini_service::fallback_analysis;
use crate::services::{GeminiService, ImageProcessor, ResultCache, search_cache_key};

/// Base64 of a 5 MB photo plus the rest of the request body.
const JSON_BODY_LIMIT: usize = 8 * 1024 * 1024;

pub const MOCK_SEARCH_MESSAGE: &str =
    "AI product search is unavailable: GEMINI_API_KEY is not configured";

#[derive(Clone)]
pub struct AppState {
    pub gemini: Arc<GeminiService>,
    pub cache: Arc<dyn ResultCache>,
    pub image_processor: Arc<ImageProcessor>,
}

/// Registers the assistant routes; shared by the server and tests.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().limit(JSON_BODY_LIMIT))
        .route(SEARCH_PATH, web::post().to(search_products))
        .route(ANALYZE_STYLE_PATH, web::post().to(analyze_style))
        .route("/health", web::get().to(health_check));
}

pub async fn search_products(
    body: web::Json<SearchRequest>,
    data: web::Data<AppState>,
) -> Result<HttpResponse, QuanBuyError> {
    let mut request = body.into_inner();
    request.validate()?;
    if !request.search_type.needs_photo() {
        request.image_data = None;
    }

    let key = search_cache_key(&request)?;
    match data.cache.get(&key).await {
        Ok(Some(cached)) => match serde_json::from_str::<SearchResult>(&cached) {
            Ok(result) => {
                info!("Serving cached results for {}", key);
                return Ok(HttpResponse::Ok().json(result));
            }
            Err(e) => warn!("Discarding unreadable cache entry {}: {}", key, e),
        },
        Ok(None) => {}
        Err(e) => warn!("Cache lookup failed: {}", e),
    }

    if !data.gemini.is_configured() {
        return Ok(HttpResponse::Ok().json(SearchResult::from_error(MOCK_SEARCH_MESSAGE)));
    }

    let image = request
        .image_data
        .as_deref()
        .map(|payload| data.image_processor.prepare_base64(payload))
        .transpose()?;

    let result = match data.gemini.search_products(&request, image.as_ref()).await {
        Ok(result) => {
            let serialized = serde_json::to_string(&result)?;
            if let Err(e) = data.cache.put(&key, &serialized).await {
                warn!("Failed to cache results: {}", e);
            }
            result
        }
        Err(e) => {
            error!("Product search failed: {}", e);
            SearchResult::from_error(format!("AI product search failed: {}", e))
        }
    };

    Ok(HttpResponse::Ok().json(result))
}

pub async fn analyze_style(
    body: web::Json<StyleRequest>,
    data: web::Data<AppState>,
) -> Result<HttpResponse, QuanBuyError> {
    let request = body.into_inner();
    if request.image_base64.trim().is_empty() {
        return Err(QuanBuyError::Validation(
            "Please upload a photo for style advice".to_string(),
        ));
    }
    let image = data.image_processor.prepare_base64(&request.image_base64)?;

    if !data.gemini.is_configured() {
        return Ok(HttpResponse::Ok().json(fallback_analysis()));
    }

    let result = match data.gemini.analyze_style(&request, &image).await {
        Ok(result) => result,
        Err(e) => {
            error!("Style analysis failed: {}", e);
            fallback_analysis()
        }
    };

    Ok(HttpResponse::Ok().json(result))
}

pub async fn health_check(data: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "service": "quanbuy-assistant",
        "version": env!("CARGO_PKG_VERSION"),
        "gemini_configured": data.gemini.is_configured(),
        "model": data.gemini.model(),
        "timestamp": chrono::Utc::now()
    }))
}
