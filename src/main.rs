// src/main.rs
use std::sync::Arc;

use actix_web::{App, HttpServer, middleware, web};
use log::{info, warn};

use quanbuy::AppConfig;
use quanbuy::handlers::{self, AppState};
use quanbuy::services::{GeminiService, ImageProcessor, NoCache, RedisService, ResultCache};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    info!("Starting quanBuy assistant service...");

    let config = AppConfig::load()?;

    let gemini = Arc::new(GeminiService::from_config(&config)?);
    if gemini.is_configured() {
        info!("Using Gemini model {}", config.gemini_model);
    } else {
        warn!("GEMINI_API_KEY not set or in mock mode, AI features will use fallbacks");
    }

    let cache: Arc<dyn ResultCache> = match &config.redis_url {
        Some(url) => match RedisService::new(url, config.cache_ttl_secs).await {
            Ok(redis) => Arc::new(redis),
            Err(e) => {
                warn!("Redis unavailable, caching disabled: {}", e);
                Arc::new(NoCache)
            }
        },
        None => {
            info!("No Redis configured, caching disabled");
            Arc::new(NoCache)
        }
    };

    let app_state = AppState {
        gemini,
        cache,
        image_processor: Arc::new(ImageProcessor::new()),
    };

    info!("Starting HTTP server on {}", config.bind_addr);

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .wrap(middleware::Logger::default())
            .configure(handlers::configure)
    })
    .bind(config.bind_addr)?
    .run()
    .await?;

    Ok(())
}
