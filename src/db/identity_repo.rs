// src/db/identity_repo.rs

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::{common::error::AppError, models::person::Person};

// Uma entrada do cache de identidade: o resultado de um enriquecimento
// e-mail -> pessoa do roster que já aconteceu.
#[derive(Debug, Clone, FromRow)]
pub struct CachedIdentity {
    pub email: String,
    pub person_id: Uuid,
    pub display_name: String,
    pub resolved_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct IdentityRepository {
    pool: PgPool,
}

impl IdentityRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn load(&self, email: &str) -> Result<Option<CachedIdentity>, AppError> {
        let cached = sqlx::query_as::<_, CachedIdentity>(
            "SELECT email, person_id, display_name, resolved_at FROM identity_cache WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(cached)
    }

    // ON CONFLICT DO NOTHING de propósito: o enriquecimento é uma
    // transição de mão única e a primeira resolução vence.
    pub async fn save(&self, email: &str, person: &Person) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO identity_cache (email, person_id, display_name)
            VALUES ($1, $2, $3)
            ON CONFLICT (email) DO NOTHING
            "#,
        )
        .bind(email)
        .bind(person.id)
        .bind(&person.display_name)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
