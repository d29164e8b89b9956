//! AI product model and DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::catalog::CatalogStatus;

/// An AI product that entitlements grant access to.
#[derive(Debug, Clone)]
pub struct AiProduct {
    pub ai_product_id: String,
    pub ai_product_name: String,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AiProduct {
    pub fn status(&self) -> CatalogStatus {
        CatalogStatus::from_deleted_flag(self.is_deleted)
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateAiProductRequest {
    #[validate(length(min = 1, max = 50, message = "ai_product_name must be 1-50 characters"))]
    pub ai_product_name: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateAiProductRequest {
    #[validate(length(min = 1, max = 50, message = "ai_product_name must be 1-50 characters"))]
    pub ai_product_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AiProductLookupRequest {
    pub ai_product_id: Option<String>,
    pub ai_product_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AiProductSearchRequest {
    #[validate(length(min = 1, message = "product_name_prefix must not be empty"))]
    pub product_name_prefix: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AiProductResponse {
    pub ai_product_id: String,
    pub ai_product_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<AiProduct> for AiProductResponse {
    fn from(product: AiProduct) -> Self {
        Self {
            ai_product_id: product.ai_product_id,
            ai_product_name: product.ai_product_name,
            created_at: product.created_at,
            updated_at: product.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_request_length_bounds() {
        let request = CreateAiProductRequest {
            ai_product_name: "a".repeat(51),
        };
        assert!(request.validate().is_err());

        let request = CreateAiProductRequest {
            ai_product_name: "ChatBot".into(),
        };
        assert!(request.validate().is_ok());
    }
}
