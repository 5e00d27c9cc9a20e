// src/services/gemini_service.rs
use std::time::{Duration, Instant};

use chrono::Utc;
use log::{debug, info, warn};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Value, json};
use uuid::Uuid;

use crate::config::AppConfig;
use crate::errors::QuanBuyError;
use crate::models::*;
use crate::services::image_processor::PreparedImage;

pub struct GeminiService {
    api_key: Option<String>,
    model: String,
    endpoint: String,
    client: Client,
}

#[derive(Debug, Deserialize)]
struct SearchReply {
    #[serde(default)]
    search_query: Option<String>,
    #[serde(default)]
    products: Vec<Value>,
}

impl GeminiService {
    pub fn new(
        api_key: Option<String>,
        model: &str,
        endpoint: &str,
        timeout_secs: u64,
    ) -> Result<Self, QuanBuyError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| QuanBuyError::Transport(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            api_key,
            model: model.to_string(),
            endpoint: endpoint.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, QuanBuyError> {
        Self::new(
            config.gemini_api_key.clone(),
            &config.gemini_model,
            &config.gemini_endpoint,
            config.request_timeout_secs,
        )
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub async fn search_products(
        &self,
        request: &SearchRequest,
        image: Option<&PreparedImage>,
    ) -> Result<SearchResult, QuanBuyError> {
        let stores = if request.store_list.is_empty() {
            "any major online retailer".to_string()
        } else {
            request
                .store_list
                .iter()
                .map(|s| format!("{} ({})", s.name, s.url))
                .collect::<Vec<_>>()
                .join(", ")
        };
        let wants = match (request.search_type, request.prompt_text.as_deref()) {
            (SearchType::Photo, _) | (_, None) => {
                "the products shown in the attached photo".to_string()
            }
            (SearchType::Prompt, Some(text)) => format!("\"{text}\""),
            (SearchType::Both, Some(text)) => {
                format!("the products in the attached photo, refined by: \"{text}\"")
            }
        };

        let prompt = format!(
            r#"
        You are a shopping assistant searching online stores for a customer.

        Find products matching {wants}.
        Search these stores: {stores}.

        Return JSON matching this structure:
        {{
            "search_query": "the query you searched for",
            "products": [{{
                "name": "...",
                "price": "$0.00",
                "original_price": "$0.00 or null",
                "discount": "e.g. 20% off, or null",
                "store": "store name",
                "confidence": 0.0,
                "rating": 0.0,
                "review_count": 0,
                "availability": "In stock",
                "shipping": "Free shipping",
                "url": "product page",
                "buy_now_url": "checkout link or null",
                "image_url": "image link or null"
            }}]
        }}

        "confidence" is how well the product matches, between 0 and 1.
        Only include products sold by the listed stores.
        "#
        );

        let data = self.generate(&prompt, image).await?;
        let reply: SearchReply = serde_json::from_value(data)
            .map_err(|e| QuanBuyError::Gemini(format!("Unexpected search reply: {}", e)))?;

        let products = products_from_reply(&reply.products);

        Ok(SearchResult {
            total_found: products.len() as u32,
            stores_searched: request.store_list.len() as u32,
            search_query: reply.search_query.or_else(|| request.prompt_text.clone()),
            products,
            error: None,
            searched_at: Some(Utc::now()),
        })
    }

    pub async fn analyze_style(
        &self,
        request: &StyleRequest,
        image: &PreparedImage,
    ) -> Result<AnalysisResult, QuanBuyError> {
        let question = if request.user_question.is_empty() {
            "What would go well with this?"
        } else {
            request.user_question.as_str()
        };
        let occasion = if request.occasion.is_empty() {
            "everyday"
        } else {
            request.occasion.as_str()
        };
        let budget = if request.budget_range.is_empty() {
            "flexible"
        } else {
            request.budget_range.as_str()
        };

        let prompt = format!(
            r#"
        You are a personal stylist. Look at the attached photo and answer the customer.

        Question: {question}
        Occasion: {occasion}
        Budget: {budget}

        Return JSON matching this structure:
        {{
            "analysis": "style analysis of the photo, 2-4 sentences",
            "confidence_score": 0.0,
            "recommendations": [{{"id": "...", "name": "...", "price": "$0.00", "reason": "..."}}],
            "persuasion_points": ["short styling tip", "..."],
            "voice_response": "one friendly sentence to read aloud"
        }}

        "confidence_score" is between 0 and 1. Recommend 3 to 5 items within budget.
        "#
        );

        let data = self.generate(&prompt, Some(image)).await?;
        let mut result: AnalysisResult = serde_json::from_value(data)
            .map_err(|e| QuanBuyError::Gemini(format!("Unexpected analysis reply: {}", e)))?;

        result.confidence_score = clamp_unit(result.confidence_score);
        for rec in &mut result.recommendations {
            if rec.id.is_empty() {
                rec.id = Uuid::new_v4().to_string();
            }
        }
        result.error = None;
        Ok(result)
    }

    async fn generate(
        &self,
        prompt: &str,
        image: Option<&PreparedImage>,
    ) -> Result<serde_json::Value, QuanBuyError> {
        let api_key = self
            .api_key
            .as_ref()
            .ok_or_else(|| QuanBuyError::Gemini("Gemini API key not configured".to_string()))?;
        let start = Instant::now();

        let mut parts = vec![json!({ "text": prompt })];
        if let Some(image) = image {
            parts.push(json!({
                "inline_data": {
                    "mime_type": image.content_type,
                    "data": image.base64
                }
            }));
        }

        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.endpoint, self.model
        );
        let response = self
            .client
            .post(&url)
            .query(&[("key", api_key.as_str())])
            .json(&json!({
                "contents": [{ "role": "user", "parts": parts }],
                "generationConfig": {
                    "temperature": 0.4,
                    "responseMimeType": "application/json"
                }
            }))
            .send()
            .await
            .map_err(|e| QuanBuyError::Gemini(format!("Gemini request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(QuanBuyError::Gemini(format!(
                "Gemini error ({}): {}",
                status, error_text
            )));
        }

        let result: serde_json::Value = response
            .json()
            .await
            .map_err(|e| QuanBuyError::Gemini(format!("Failed to parse Gemini response: {}", e)))?;

        let content = result["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .ok_or_else(|| QuanBuyError::Gemini("No content in Gemini response".to_string()))?;

        info!(
            "Gemini {} answered in {}ms",
            self.model,
            start.elapsed().as_millis()
        );
        debug!("Gemini raw reply: {}", content);

        serde_json::from_str(strip_json_fence(content))
            .map_err(|e| QuanBuyError::Gemini(format!("Failed to parse reply JSON: {}", e)))
    }
}

/// Removes a surrounding ```` ```json ```` fence if the model added one.
pub fn strip_json_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

/// Converts the model's product list, skipping entries without a usable name.
fn products_from_reply(values: &[Value]) -> Vec<Product> {
    values
        .iter()
        .enumerate()
        .filter_map(|(i, value)| {
            let product = parse_product(value);
            if product.is_none() {
                warn!("Skipping unusable product #{} in Gemini reply: {}", i, value);
            }
            product
        })
        .collect()
}

fn parse_product(p: &Value) -> Option<Product> {
    let name = p["name"].as_str().map(str::trim).filter(|n| !n.is_empty())?;

    Some(Product {
        name: name.to_string(),
        price: price_text(&p["price"]).unwrap_or_else(|| "Price unavailable".to_string()),
        original_price: price_text(&p["original_price"]),
        discount: optional_text(&p["discount"]),
        store: optional_text(&p["store"]).unwrap_or_else(|| "Unknown".to_string()),
        confidence: clamp_unit(p["confidence"].as_f64().unwrap_or(0.5) as f32),
        rating: p["rating"].as_f64().map(|r| r as f32),
        review_count: p["review_count"].as_u64().map(|c| c as u32),
        availability: optional_text(&p["availability"]),
        shipping: optional_text(&p["shipping"]),
        url: p["url"].as_str().unwrap_or("").to_string(),
        buy_now_url: optional_text(&p["buy_now_url"]),
        image_url: optional_text(&p["image_url"]),
    })
}

fn optional_text(value: &Value) -> Option<String> {
    value
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty() && *s != "null")
        .map(str::to_string)
}

/// Prices may come back as display strings or bare numbers.
fn price_text(value: &Value) -> Option<String> {
    match value {
        Value::Number(n) => n.as_f64().map(|n| format!("${n:.2}")),
        _ => optional_text(value),
    }
}

fn clamp_unit(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Canned advice returned when Gemini is unavailable.
pub fn fallback_analysis() -> AnalysisResult {
    AnalysisResult {
        analysis: "We couldn't reach our stylist right now, but classic, well-fitted pieces \
                   in neutral tones are always a safe choice."
            .to_string(),
        confidence_score: 0.5,
        recommendations: vec![
            Recommendation {
                id: "fallback-1".to_string(),
                name: "White cotton shirt".to_string(),
                price: "$30-60".to_string(),
                reason: "Pairs with almost anything".to_string(),
            },
            Recommendation {
                id: "fallback-2".to_string(),
                name: "Dark denim jeans".to_string(),
                price: "$50-90".to_string(),
                reason: "Works for casual and smart-casual occasions".to_string(),
            },
        ],
        persuasion_points: vec![
            "Neutral colors are easy to mix and match".to_string(),
            "A good fit matters more than the brand".to_string(),
        ],
        voice_response: None,
        error: None,
    }
}
