//! AI product entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;

use domain::models::AiProduct;

/// Database row mapping for the ai_products table.
#[derive(Debug, Clone, FromRow)]
pub struct AiProductEntity {
    pub ai_product_id: String,
    pub ai_product_name: String,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<AiProductEntity> for AiProduct {
    fn from(entity: AiProductEntity) -> Self {
        Self {
            ai_product_id: entity.ai_product_id,
            ai_product_name: entity.ai_product_name,
            is_deleted: entity.is_deleted,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}
