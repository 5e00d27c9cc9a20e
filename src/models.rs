// src/models.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::QuanBuyError;

/// Confidence shown for a style analysis when the backend omits one.
pub const DEFAULT_CONFIDENCE_SCORE: f32 = 0.9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchType {
    Photo,
    Prompt,
    Both,
}

impl SearchType {
    pub fn needs_photo(self) -> bool {
        matches!(self, SearchType::Photo | SearchType::Both)
    }

    pub fn needs_prompt(self) -> bool {
        matches!(self, SearchType::Prompt | SearchType::Both)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreRef {
    pub name: String,
    pub url: String,
}

impl StoreRef {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRequest {
    pub search_type: SearchType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_data: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_text: Option<String>,
    #[serde(default)]
    pub store_list: Vec<StoreRef>,
    pub user_id: String,
}

impl SearchRequest {
    /// Checks that the inputs required by `search_type` are present.
    pub fn validate(&self) -> Result<(), QuanBuyError> {
        if self.search_type.needs_photo()
            && self.image_data.as_deref().is_none_or(str::is_empty)
        {
            return Err(QuanBuyError::Validation(
                "Please upload a photo to search by image".to_string(),
            ));
        }
        if self.search_type.needs_prompt()
            && self
                .prompt_text
                .as_deref()
                .is_none_or(|t| t.trim().is_empty())
        {
            return Err(QuanBuyError::Validation(
                "Please describe what you are looking for".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub name: String,
    pub price: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_price: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount: Option<String>,
    pub store: String,
    #[serde(default)]
    pub confidence: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub availability: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shipping: Option<String>,
    #[serde(default)]
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buy_now_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    #[serde(default)]
    pub products: Vec<Product>,
    #[serde(default)]
    pub total_found: u32,
    #[serde(default)]
    pub stores_searched: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_query: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub searched_at: Option<DateTime<Utc>>,
}

impl SearchResult {
    /// An error-only payload: no products, zero counts.
    pub fn from_error(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub price: String,
    #[serde(default)]
    pub reason: String,
}

fn default_confidence_score() -> f32 {
    DEFAULT_CONFIDENCE_SCORE
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    #[serde(default)]
    pub analysis: String,
    #[serde(default = "default_confidence_score")]
    pub confidence_score: f32,
    #[serde(default)]
    pub recommendations: Vec<Recommendation>,
    #[serde(default)]
    pub persuasion_points: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice_response: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AnalysisResult {
    pub fn from_error(message: impl Into<String>) -> Self {
        Self {
            analysis: String::new(),
            confidence_score: DEFAULT_CONFIDENCE_SCORE,
            recommendations: Vec::new(),
            persuasion_points: Vec::new(),
            voice_response: None,
            error: Some(message.into()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StyleRequest {
    pub image_base64: String,
    #[serde(default)]
    pub user_question: String,
    #[serde(default)]
    pub occasion: String,
    #[serde(default)]
    pub budget_range: String,
    pub user_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prompt_request(text: Option<&str>) -> SearchRequest {
        SearchRequest {
            search_type: SearchType::Prompt,
            image_data: None,
            prompt_text: text.map(str::to_string),
            store_list: vec![],
            user_id: "u1".to_string(),
        }
    }

    #[test]
    fn prompt_search_with_text_is_valid() {
        assert!(prompt_request(Some("red sneakers")).validate().is_ok());
    }

    #[test]
    fn prompt_search_rejects_empty_and_blank_text() {
        assert!(prompt_request(None).validate().is_err());
        assert!(prompt_request(Some("")).validate().is_err());
        assert!(prompt_request(Some("   ")).validate().is_err());
    }

    #[test]
    fn photo_search_requires_image_data() {
        let mut req = prompt_request(None);
        req.search_type = SearchType::Photo;
        let err = req.validate().unwrap_err();
        assert!(err.is_validation());

        req.image_data = Some("aGVsbG8=".to_string());
        assert!(req.validate().is_ok());
    }

    #[test]
    fn combined_search_requires_both_inputs() {
        let mut req = prompt_request(Some("linen shirt"));
        req.search_type = SearchType::Both;
        assert!(req.validate().is_err());
        req.image_data = Some("aGVsbG8=".to_string());
        assert!(req.validate().is_ok());
    }

    #[test]
    fn search_type_uses_snake_case_on_the_wire() {
        let json = serde_json::to_value(prompt_request(Some("x"))).unwrap();
        assert_eq!(json["search_type"], "prompt");
        assert!(json.get("image_data").is_none());
    }

    #[test]
    fn analysis_confidence_defaults_when_absent() {
        let parsed: AnalysisResult =
            serde_json::from_str(r#"{"analysis": "Warm earth tones suit you"}"#).unwrap();
        assert_eq!(parsed.confidence_score, DEFAULT_CONFIDENCE_SCORE);
        assert!(parsed.recommendations.is_empty());
    }

    #[test]
    fn error_only_search_result_has_no_products() {
        let result = SearchResult::from_error("timeout");
        assert!(result.products.is_empty());
        assert_eq!(result.total_found, 0);
        assert_eq!(result.error.as_deref(), Some("timeout"));
    }
}
