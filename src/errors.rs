// src/errors.rs
use actix_web::{HttpResponse, ResponseError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum QuanBuyError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Gemini error: {0}")]
    Gemini(String),

    #[error("Image processing error: {0}")]
    ImageProcessing(String),

    #[error("Cache error: {0}")]
    Cache(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Share error: {0}")]
    Share(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

impl QuanBuyError {
    /// True for errors the user can fix by changing their input.
    pub fn is_validation(&self) -> bool {
        matches!(self, QuanBuyError::Validation(_))
    }
}

impl From<serde_json::Error> for QuanBuyError {
    fn from(e: serde_json::Error) -> Self {
        QuanBuyError::Serialization(e.to_string())
    }
}

impl ResponseError for QuanBuyError {
    fn error_response(&self) -> HttpResponse {
        match self {
            QuanBuyError::Validation(_) => HttpResponse::BadRequest().json(serde_json::json!({
                "error": "Validation error",
                "message": self.to_string()
            })),
            QuanBuyError::ImageProcessing(_) => {
                HttpResponse::BadRequest().json(serde_json::json!({
                    "error": "Image processing error",
                    "message": self.to_string()
                }))
            }
            QuanBuyError::Gemini(_) | QuanBuyError::Transport(_) => {
                HttpResponse::ServiceUnavailable().json(serde_json::json!({
                    "error": "AI service error",
                    "message": self.to_string()
                }))
            }
            QuanBuyError::Cache(_) => HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "Cache error",
                "message": self.to_string()
            })),
            QuanBuyError::Share(_) => HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "Share error",
                "message": self.to_string()
            })),
            QuanBuyError::Serialization(_) => {
                HttpResponse::InternalServerError().json(serde_json::json!({
                    "error": "Data processing error",
                    "message": self.to_string()
                }))
            }
            QuanBuyError::InvalidEnvVar { .. } => {
                HttpResponse::InternalServerError().json(serde_json::json!({
                    "error": "Configuration error",
                    "message": self.to_string()
                }))
            }
        }
    }
}
