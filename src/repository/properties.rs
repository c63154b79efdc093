use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::repository::map_db_error;

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PropertyRow {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

pub async fn get_property(pool: &PgPool, property_id: Uuid) -> AppResult<PropertyRow> {
    sqlx::query_as::<_, PropertyRow>("SELECT id, name, created_at FROM properties WHERE id = $1")
        .bind(property_id)
        .fetch_optional(pool)
        .await
        .map_err(map_db_error)?
        .ok_or_else(|| AppError::NotFound("Property not found.".to_string()))
}

/// Number of rentable properties, used as the occupancy-rate denominator.
pub async fn count_properties(pool: &PgPool) -> AppResult<i64> {
    sqlx::query_scalar::<_, i64>("SELECT count(*) FROM properties")
        .fetch_one(pool)
        .await
        .map_err(map_db_error)
}
