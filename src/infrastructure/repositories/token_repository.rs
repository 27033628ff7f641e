//! Token Repository Implementation
//!
//! PostgreSQL implementation of the TokenRepository trait for single-use
//! purpose tokens.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::domain::{Token, TokenRepository, TokenType};
use crate::shared::error::AppError;

/// Database row representation matching the tokens table schema.
#[derive(Debug, sqlx::FromRow)]
struct TokenRow {
    id: i64,
    body: String,
    user_id: i64,
    token_type: String,
    created_at: DateTime<Utc>,
}

impl TokenRow {
    /// Convert database row to domain Token entity. Rows with an unknown
    /// type string cannot occur under the schema's CHECK constraint.
    fn into_token(self) -> Result<Token, AppError> {
        let token_type = TokenType::from_str(&self.token_type)
            .ok_or_else(|| AppError::Internal(format!("Unknown token type: {}", self.token_type)))?;

        Ok(Token {
            id: self.id,
            body: self.body,
            user_id: self.user_id,
            token_type,
            created_at: self.created_at,
        })
    }
}

/// PostgreSQL token repository implementation.
#[derive(Clone)]
pub struct PgTokenRepository {
    pool: PgPool,
}

impl PgTokenRepository {
    /// Create a new PgTokenRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TokenRepository for PgTokenRepository {
    async fn create(&self, token: &Token) -> Result<Token, AppError> {
        let row = sqlx::query_as::<_, TokenRow>(
            r#"
            INSERT INTO tokens (id, body, user_id, token_type)
            VALUES ($1, $2, $3, $4)
            RETURNING id, body, user_id, token_type, created_at
            "#,
        )
        .bind(token.id)
        .bind(&token.body)
        .bind(token.user_id)
        .bind(token.token_type.as_str())
        .fetch_one(&self.pool)
        .await?;

        row.into_token()
    }

    async fn find_by_body(
        &self,
        body: &str,
        token_type: TokenType,
    ) -> Result<Option<Token>, AppError> {
        let row = sqlx::query_as::<_, TokenRow>(
            r#"
            SELECT id, body, user_id, token_type, created_at
            FROM tokens
            WHERE body = $1 AND token_type = $2
            "#,
        )
        .bind(body)
        .bind(token_type.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.into_token()).transpose()
    }

    async fn delete(&self, id: i64) -> Result<(), AppError> {
        sqlx::query("DELETE FROM tokens WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn delete_for_user(&self, user_id: i64) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM tokens WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
